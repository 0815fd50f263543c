//! Plain catalog entities.
//!
//! # Responsibility
//! - Define the records persisted by mappers: people, categories, courses and
//!   enrollments.
//! - Provide the typed runtime tag used to resolve mappers.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one; it never changes afterwards.
//!   The field is public for construction and row mapping only. Callers must
//!   not reassign the `id` of a loaded entity; mappers key updates and deletes
//!   on it.
//! - Entities carry no persistence state; staging lives in the unit of work.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category;
pub mod course;
pub mod course_student;
pub mod person;

use category::Category;
use course::Course;
use course_student::CourseStudent;
use person::{Person, PersonKind};

/// Store-assigned identity shared by every entity type.
pub type EntityId = i64;

/// Typed tag naming one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Student,
    Teacher,
    Category,
    Course,
    CourseStudent,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Student,
        EntityKind::Teacher,
        EntityKind::Category,
        EntityKind::Course,
        EntityKind::CourseStudent,
    ];

    /// Canonical type name, as accepted by `parse`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Category => "Category",
            Self::Course => "Course",
            Self::CourseStudent => "CourseStudent",
        }
    }

    /// Parses a canonical type name. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any catalog entity, tagged by its runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    Person(Person),
    Category(Category),
    Course(Course),
    CourseStudent(CourseStudent),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Person(person) => match person.kind {
                PersonKind::Student => EntityKind::Student,
                PersonKind::Teacher => EntityKind::Teacher,
            },
            Self::Category(_) => EntityKind::Category,
            Self::Course(_) => EntityKind::Course,
            Self::CourseStudent(_) => EntityKind::CourseStudent,
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        match self {
            Self::Person(person) => person.id,
            Self::Category(category) => category.id,
            Self::Course(course) => course.id,
            Self::CourseStudent(link) => link.id,
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        match self {
            Self::Person(person) => person.validate(),
            Self::Category(category) => category.validate(),
            Self::Course(course) => course.validate(),
            Self::CourseStudent(link) => link.validate(),
        }
    }
}

impl From<Person> for Entity {
    fn from(value: Person) -> Self {
        Self::Person(value)
    }
}

impl From<Category> for Entity {
    fn from(value: Category) -> Self {
        Self::Category(value)
    }
}

impl From<Course> for Entity {
    fn from(value: Course) -> Self {
        Self::Course(value)
    }
}

impl From<CourseStudent> for Entity {
    fn from(value: CourseStudent) -> Self {
        Self::CourseStudent(value)
    }
}

/// Field-level validation failure raised before any SQL mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    BlankField(&'static str),
    InvalidEmail(String),
    NonPositiveReference(&'static str),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::NonPositiveReference(field) => {
                write!(f, "reference `{field}` must be a positive id")
            }
        }
    }
}

impl Error for EntityValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), EntityValidationError> {
    if value.trim().is_empty() {
        return Err(EntityValidationError::BlankField(field));
    }
    Ok(())
}
