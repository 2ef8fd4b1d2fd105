//! Translation between the remote user record and the [`Student`] shape.

use shared::{
    domain::{Student, StudentId, UNDECLARED_COURSE},
    protocol::{CompanyPayload, ExternalUser, UserPayload},
};

/// Year derived from the remote id. Only there to give the list some variety.
pub fn year_for_id(id: i64) -> u8 {
    (id.rem_euclid(4) + 1) as u8
}

pub fn student_from_user(user: &ExternalUser) -> Student {
    let course = user
        .company
        .as_ref()
        .and_then(|company| company.name.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNDECLARED_COURSE)
        .to_string();

    // Literal concatenation; missing parts are empty strings.
    let (street, city) = user
        .address
        .as_ref()
        .map(|address| (address.street.as_deref(), address.city.as_deref()))
        .unwrap_or_default();
    let address = format!(
        "{}, {}",
        street.unwrap_or_default(),
        city.unwrap_or_default()
    );

    Student {
        id: StudentId(user.id),
        name: user.name.clone(),
        course,
        year: year_for_id(user.id),
        email: user.email.clone().unwrap_or_default(),
        phone: user.phone.clone().unwrap_or_default(),
        address: Some(address),
    }
}

pub fn students_from_users(users: &[ExternalUser]) -> Vec<Student> {
    users.iter().map(student_from_user).collect()
}

/// Payload for `POST /users`.
pub fn create_payload(name: &str, course: &str, email: Option<&str>) -> UserPayload {
    UserPayload {
        id: None,
        name: name.to_string(),
        company: CompanyPayload {
            name: course.to_string(),
        },
        email: email.unwrap_or_default().to_string(),
    }
}

/// Payload for `PUT /users/{id}`, built from the merged local record.
pub fn update_payload(student: &Student) -> UserPayload {
    let mut payload = create_payload(&student.name, &student.course, Some(&student.email));
    payload.id = Some(student.id);
    payload
}

#[cfg(test)]
#[path = "tests/mapper_tests.rs"]
mod tests;
