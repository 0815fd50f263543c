//! Course categories.

use super::{require_text, EntityId, EntityValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Sentinel category id for courses whose category was removed.
///
/// No row ever carries this id; the store starts numbering at 1.
pub const UNCATEGORIZED_ID: EntityId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<EntityId>,
    pub title: String,
    pub short_title: String,
    pub description: String,
}

impl Category {
    pub fn new(
        title: impl Into<String>,
        short_title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            short_title: short_title.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        require_text("title", &self.title)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
