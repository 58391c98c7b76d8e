//! Request and response payloads for the API surface.

use chrono::{DateTime, Utc};
use docman_core::{AppError, AppResult, RoleRank};
use docman_domain::{AccessLevel, Document, PageMetadata, PageRequest, UserAccount};
use serde::{Deserialize, Serialize};

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Document creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_access")]
    pub access: AccessLevel,
}

fn default_access() -> AccessLevel {
    AccessLevel::Public
}

/// Document update payload. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub access: Option<AccessLevel>,
}

/// Account update payload. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
}

/// Optional pagination bounds on listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PageQuery {
    /// Converts the raw query into validated pagination bounds.
    ///
    /// An offset without a limit is rejected because page metadata cannot
    /// be computed without a page size.
    pub fn into_page_request(self) -> AppResult<Option<PageRequest>> {
        match (self.limit, self.offset) {
            (Some(limit), offset) => Ok(Some(PageRequest::new(limit, offset.unwrap_or(0))?)),
            (None, Some(_)) => Err(AppError::Validation(
                "offset requires a limit".to_owned(),
            )),
            (None, None) => Ok(None),
        }
    }
}

/// Text search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// API representation of a document.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub access: AccessLevel,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id.as_i64(),
            title: document.title,
            content: document.content,
            access: document.access,
            author_id: document.author_id.as_i64(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// A document listing with optional page metadata.
#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMetadata>,
}

/// API representation of a user account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub role: RoleRank,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.as_i64(),
            email: account.email,
            username: account.username,
            full_name: account.full_name,
            bio: account.bio,
            role: account.role,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// A user listing with optional page metadata.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMetadata>,
}

/// Generic message response for auth flows.
#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use docman_core::AppError;

    use super::PageQuery;

    #[test]
    fn absent_bounds_mean_no_pagination() {
        let query = PageQuery::default();
        assert!(matches!(query.into_page_request(), Ok(None)));
    }

    #[test]
    fn offset_defaults_to_zero() {
        let query = PageQuery {
            limit: Some(10),
            offset: None,
        };
        match query.into_page_request() {
            Ok(Some(bounds)) => {
                assert_eq!(bounds.limit(), 10);
                assert_eq!(bounds.offset(), 0);
            }
            other => panic!("expected bounds, got {other:?}"),
        }
    }

    #[test]
    fn zero_limit_is_rejected() {
        let query = PageQuery {
            limit: Some(0),
            offset: Some(5),
        };
        assert!(matches!(
            query.into_page_request(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn offset_without_limit_is_rejected() {
        let query = PageQuery {
            limit: None,
            offset: Some(5),
        };
        assert!(matches!(
            query.into_page_request(),
            Err(AppError::Validation(_))
        ));
    }
}
