use super::*;
use client_core::{FieldError, StudentForm};
use shared::domain::StudentId;

fn student(id: i64, name: &str, course: &str, email: &str) -> Student {
    Student {
        id: StudentId(id),
        name: name.to_string(),
        course: course.to_string(),
        year: 2,
        email: email.to_string(),
        phone: String::new(),
        address: None,
    }
}

#[test]
fn renders_aligned_table_with_placeholders() {
    let state = RosterState {
        students: vec![
            student(1, "Leanne Graham", "Romaguera-Crona", "Sincere@april.biz"),
            student(1000, "Ann Lee", "", ""),
        ],
        loaded: true,
        ..RosterState::default()
    };

    let rendered = render_roster(&state);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "  ID    Name           Course           Year  Email"
    );
    assert_eq!(
        lines[2],
        "  1     Leanne Graham  Romaguera-Crona  2     Sincere@april.biz"
    );
    assert_eq!(lines[3], "  1000  Ann Lee        Undeclared       2     -");
}

#[test]
fn marks_row_under_edit() {
    let state = RosterState {
        students: vec![student(1, "Leanne Graham", "CS", "")],
        editing: Some(StudentId(1)),
        ..RosterState::default()
    };
    let rendered = render_roster(&state);
    assert!(rendered.lines().nth(2).expect("row").starts_with("> 1"));
}

#[test]
fn empty_loaded_roster_has_hint() {
    let state = RosterState {
        loaded: true,
        ..RosterState::default()
    };
    assert!(render_roster(&state).starts_with("No students found."));
}

#[test]
fn failed_load_without_data_offers_retry() {
    let state = RosterState {
        error: Some("Unable to load students. 503 Service Unavailable".to_string()),
        ..RosterState::default()
    };
    let rendered = render_roster(&state);
    assert!(rendered.starts_with("Error: Unable to load students."));
    assert!(rendered.contains("reload"));
}

#[test]
fn validation_messages_are_listed_per_field() {
    let err = StudentForm::new("Ann123", "").validate().expect_err("invalid");
    assert_eq!(err.name, Some(FieldError::InvalidCharacters));
    assert_eq!(
        render_validation(&err),
        "  name: Name should contain only letters, spaces, hyphens, and apostrophes\n  course: Course is required"
    );
}
