//! People enrolled in or teaching courses.

use super::{require_text, EntityId, EntityValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

/// Person variant. Drives mapper and table selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonKind {
    Student,
    Teacher,
}

impl PersonKind {
    /// Parses the lowercase factory tag (`student` / `teacher`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Option<EntityId>,
    pub kind: PersonKind,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

impl Person {
    pub fn new(
        kind: PersonKind,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
        }
    }

    pub fn student(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::new(PersonKind::Student, firstname, lastname, email)
    }

    pub fn teacher(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::new(PersonKind::Teacher, firstname, lastname, email)
    }

    /// Builds a transient person from a factory tag such as `"student"`.
    ///
    /// Returns `None` for unknown tags.
    pub fn from_tag(
        tag: &str,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Option<Self> {
        PersonKind::from_tag(tag).map(|kind| Self::new(kind, firstname, lastname, email))
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        require_text("firstname", &self.firstname)?;
        require_text("lastname", &self.lastname)?;
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(EntityValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.firstname, self.lastname)
    }
}
