use std::fmt;

use serde::{Deserialize, Serialize};

/// Course assigned when the remote record carries no company name.
pub const UNDECLARED_COURSE: &str = "Undeclared";

/// First id handed out when the local collection is empty. Sits above the
/// id range the remote collaborator uses for its seeded records.
pub const FIRST_LOCAL_ID: i64 = 1000;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(StudentId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub course: String,
    pub year: u8,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Student {
    /// Shallow merge: every field set in `changes` replaces the current value.
    pub fn apply(&mut self, changes: &StudentChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(course) = &changes.course {
            self.course = course.clone();
        }
        if let Some(year) = changes.year {
            self.year = year;
        }
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
        if let Some(address) = &changes.address {
            self.address = Some(address.clone());
        }
    }
}

/// Partial update for a [`Student`]. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl StudentChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        Student {
            id: StudentId(3),
            name: "Clementine Bauch".into(),
            course: "Romaguera-Jacobson".into(),
            year: 4,
            email: "nathan@yesenia.net".into(),
            phone: "1-463-123-4447".into(),
            address: Some("Douglas Extension, McKenziehaven".into()),
        }
    }

    #[test]
    fn apply_only_touches_fields_that_are_set() {
        let mut student = sample();
        student.apply(&StudentChanges {
            course: Some("Physics".into()),
            ..StudentChanges::default()
        });

        assert_eq!(student.course, "Physics");
        assert_eq!(student.name, "Clementine Bauch");
        assert_eq!(student.year, 4);
        assert_eq!(student.email, "nathan@yesenia.net");
    }

    #[test]
    fn empty_changes_leave_student_identical() {
        let mut student = sample();
        let changes = StudentChanges::default();
        assert!(changes.is_empty());
        student.apply(&changes);
        assert_eq!(student, sample());
    }

    #[test]
    fn student_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&StudentId(1000)).expect("serialize");
        assert_eq!(json, "1000");
    }
}
