//! Document entity and validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docman_core::{AppError, AppResult, RoleRank, UserId};

use crate::access::AccessLevel;

/// Maximum number of characters in a document title.
pub const TITLE_MAX_LENGTH: usize = 30;

/// Maximum number of characters in a document body.
pub const CONTENT_MAX_LENGTH: usize = 10_000;

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Creates a document identifier from a storage value.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A persisted document.
///
/// `owner_role_rank` is the author's privilege tier captured at creation
/// time; role-scoped visibility compares against this value, not against the
/// author's current role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Globally unique title.
    pub title: String,
    /// Document body.
    pub content: String,
    /// Declared visibility tier.
    pub access: AccessLevel,
    /// Owning account.
    pub author_id: UserId,
    /// Author's role tier at creation time.
    pub owner_role_rank: RoleRank,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Validates a document title: non-blank and at most [`TITLE_MAX_LENGTH`]
/// characters.
pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_owned()));
    }

    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "title must not exceed {TITLE_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validates a document body: non-empty and at most [`CONTENT_MAX_LENGTH`]
/// characters.
pub fn validate_content(content: &str) -> AppResult<()> {
    if content.is_empty() {
        return Err(AppError::Validation(
            "content must not be empty".to_owned(),
        ));
    }

    if content.chars().count() > CONTENT_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "content must not exceed {CONTENT_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validated input for creating a document.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    title: String,
    content: String,
    access: AccessLevel,
}

impl DocumentDraft {
    /// Creates a draft after validating title and content.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        access: AccessLevel,
    ) -> AppResult<Self> {
        let title = title.into();
        let content = content.into();
        validate_title(&title)?;
        validate_content(&content)?;

        Ok(Self {
            title,
            content,
            access,
        })
    }

    /// Returns the validated title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the validated body.
    #[must_use]
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Returns the declared visibility tier.
    #[must_use]
    pub fn access(&self) -> AccessLevel {
        self.access
    }
}

/// Explicit allow-list of client-mutable document fields.
///
/// Anything not named here (identity, authorship, owner rank, timestamps)
/// cannot be changed through an update request.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    /// Replacement title, if requested.
    pub title: Option<String>,
    /// Replacement body, if requested.
    pub content: Option<String>,
    /// Replacement visibility tier, if requested.
    pub access: Option<AccessLevel>,
}

impl DocumentUpdate {
    /// Returns whether the update names no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.access.is_none()
    }

    /// Validates every named field against the document invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::Validation(
                "update must name at least one field".to_owned(),
            ));
        }

        if let Some(ref title) = self.title {
            validate_title(title)?;
        }

        if let Some(ref content) = self.content {
            validate_content(content)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use docman_core::AppError;

    use crate::access::AccessLevel;

    use super::{CONTENT_MAX_LENGTH, DocumentDraft, DocumentUpdate, TITLE_MAX_LENGTH};

    #[test]
    fn draft_accepts_valid_input() {
        let draft = DocumentDraft::new("meeting notes", "agenda", AccessLevel::Public);
        assert!(draft.is_ok());
    }

    #[test]
    fn draft_rejects_blank_title() {
        let draft = DocumentDraft::new("   ", "agenda", AccessLevel::Public);
        assert!(matches!(draft, Err(AppError::Validation(_))));
    }

    #[test]
    fn draft_rejects_overlong_title() {
        let title = "t".repeat(TITLE_MAX_LENGTH + 1);
        let draft = DocumentDraft::new(title, "agenda", AccessLevel::Private);
        assert!(draft.is_err());
    }

    #[test]
    fn draft_rejects_overlong_content() {
        let content = "c".repeat(CONTENT_MAX_LENGTH + 1);
        let draft = DocumentDraft::new("notes", content, AccessLevel::Private);
        assert!(draft.is_err());
    }

    #[test]
    fn draft_accepts_maximum_lengths() {
        let title = "t".repeat(TITLE_MAX_LENGTH);
        let content = "c".repeat(CONTENT_MAX_LENGTH);
        assert!(DocumentDraft::new(title, content, AccessLevel::Role).is_ok());
    }

    #[test]
    fn empty_update_is_rejected() {
        let update = DocumentUpdate::default();
        assert!(update.is_empty());
        assert!(update.validate().is_err());
    }

    #[test]
    fn partial_update_validates_named_fields_only() {
        let update = DocumentUpdate {
            content: Some("revised body".to_owned()),
            ..DocumentUpdate::default()
        };
        assert!(update.validate().is_ok());

        let update = DocumentUpdate {
            title: Some(String::new()),
            ..DocumentUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
