//! Enrollment of a student in a course.

use super::{EntityId, EntityValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStudent {
    pub id: Option<EntityId>,
    pub course_id: EntityId,
    pub student_id: EntityId,
}

impl CourseStudent {
    pub fn new(course_id: EntityId, student_id: EntityId) -> Self {
        Self {
            id: None,
            course_id,
            student_id,
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.course_id <= 0 {
            return Err(EntityValidationError::NonPositiveReference("course_id"));
        }
        if self.student_id <= 0 {
            return Err(EntityValidationError::NonPositiveReference("student_id"));
        }
        Ok(())
    }
}
