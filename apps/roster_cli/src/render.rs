//! Plain-text rendering of the roster for the terminal.

use std::fmt::Write as _;

use client_core::{Notice, NoticeKind, RosterState, ValidationError};
use shared::domain::{Student, UNDECLARED_COURSE};

const HEADERS: [&str; 5] = ["ID", "Name", "Course", "Year", "Email"];

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn row(student: &Student) -> [String; 5] {
    let course = if student.course.is_empty() {
        UNDECLARED_COURSE
    } else {
        student.course.as_str()
    };
    [
        student.id.to_string(),
        student.name.clone(),
        course.to_string(),
        student.year.to_string(),
        or_dash(&student.email).to_string(),
    ]
}

pub fn render_roster(state: &RosterState) -> String {
    if state.is_loading {
        return "Loading students...".to_string();
    }
    if state.needs_retry() {
        let error = state.error.as_deref().unwrap_or("Failed to load students.");
        return format!("Error: {error}\nRun `reload` to try again.");
    }
    if state.students.is_empty() {
        return "No students found. Use `add` to register your first student!".to_string();
    }

    let rows: Vec<[String; 5]> = state.students.iter().map(row).collect();
    let mut widths = HEADERS.map(str::len);
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, "  ", &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, "  ", &rule, &widths);
    for (student, cells) in state.students.iter().zip(&rows) {
        let marker = if state.editing == Some(student.id) {
            "> "
        } else {
            "  "
        };
        push_line(&mut out, marker, cells, &widths);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_line(out: &mut String, marker: &str, cells: &[String], widths: &[usize; 5]) {
    out.push_str(marker);
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        let _ = write!(out, "{cell}{}  ", " ".repeat(pad));
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Success => format!("[ok] {}", notice.message),
        NoticeKind::Warning => format!("[warn] {}", notice.message),
    }
}

pub fn render_validation(err: &ValidationError) -> String {
    let mut lines = Vec::new();
    if let Some(message) = err.name_message() {
        lines.push(format!("  name: {message}"));
    }
    if let Some(message) = err.course_message() {
        lines.push(format!("  course: {message}"));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
