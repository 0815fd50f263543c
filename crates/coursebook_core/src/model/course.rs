//! Courses offered within a category.

use super::{require_text, EntityId, EntityValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A course. `category_id` is not checked against `categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<EntityId>,
    pub title: String,
    pub category_id: EntityId,
    pub description: String,
}

impl Course {
    pub fn new(
        title: impl Into<String>,
        category_id: EntityId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            category_id,
            description: description.into(),
        }
    }

    /// Returns a transient copy with identical field values and no identity.
    pub fn clone_transient(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        require_text("title", &self.title)
    }
}

impl Display for Course {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
