use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum title length, counted in characters after trimming.
pub const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title and content are required")]
    MissingField,

    #[error("Title and content cannot be empty")]
    EmptyField,

    #[error("Title cannot exceed 100 characters")]
    TitleTooLong,

    #[error("Invalid note ID format")]
    InvalidId,

    #[error("Invalid request body")]
    InvalidBody,
}

/// Title and content that passed validation and can be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validates raw fields the same way for create and update.
    ///
    /// Absent and empty strings are reported as missing; strings that only
    /// become empty once trimmed are reported as empty.
    pub fn parse(title: Option<&str>, content: Option<&str>) -> Result<Self, ValidationError> {
        let (Some(title), Some(content)) = (title, content) else {
            return Err(ValidationError::MissingField);
        };
        if title.is_empty() || content.is_empty() {
            return Err(ValidationError::MissingField);
        }

        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ValidationError::EmptyField);
        }

        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }

        Ok(Self {
            title: title.to_owned(),
            content: content.to_owned(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

pub fn parse_note_id(raw: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidId)
}
