//! User account entity and validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docman_core::{AppError, AppResult, Principal, RoleRank, UserId};

/// Minimum username length.
pub const USERNAME_MIN_LENGTH: usize = 4;

/// Maximum username length.
pub const USERNAME_MAX_LENGTH: usize = 15;

/// Maximum display-name length.
pub const FULL_NAME_MAX_LENGTH: usize = 25;

/// Maximum biography length.
pub const BIO_MAX_LENGTH: usize = 240;

/// Minimum password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Maximum password length, allowing passphrases while bounding hash cost.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// A persisted user account.
///
/// Deliberately not serializable: the opaque password hash must never reach
/// a wire format, so transport representations are built field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Unique identifier.
    pub id: UserId,
    /// Canonical (lowercased) email address.
    pub email: String,
    /// Unique username.
    pub username: String,
    /// Opaque one-way password hash.
    pub password_hash: String,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Optional biography.
    pub bio: Option<String>,
    /// Privilege tier.
    pub role: RoleRank,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Returns the principal this account authenticates as.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated, lowercased email address.
    ///
    /// Structural checks only: one `@`, non-empty local part, dotted domain,
    /// at most 254 characters.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@' with a local part".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Validates a username: 4 to 15 characters, ASCII letters, digits, and
/// underscores only.
pub fn validate_username(username: &str) -> AppResult<()> {
    let char_count = username.chars().count();

    if char_count < USERNAME_MIN_LENGTH || char_count > USERNAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
        )));
    }

    if !username
        .chars()
        .all(|character| character.is_ascii_alphanumeric() || character == '_')
    {
        return Err(AppError::Validation(
            "username may contain only letters, digits, and underscores".to_owned(),
        ));
    }

    Ok(())
}

/// Validates a display name against [`FULL_NAME_MAX_LENGTH`].
pub fn validate_full_name(full_name: &str) -> AppResult<()> {
    if full_name.chars().count() > FULL_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "full name must not exceed {FULL_NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validates a biography against [`BIO_MAX_LENGTH`].
pub fn validate_bio(bio: &str) -> AppResult<()> {
    if bio.chars().count() > BIO_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "bio must not exceed {BIO_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validates a plaintext password against the length policy.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validated input for registering an account.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    email: EmailAddress,
    username: String,
}

impl AccountDraft {
    /// Creates a draft after validating email and username.
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> AppResult<Self> {
        let email = EmailAddress::new(email)?;
        let username = username.into();
        validate_username(&username)?;

        Ok(Self { email, username })
    }

    /// Returns the canonical email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the validated username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }
}

/// Explicit allow-list of client-mutable account fields.
///
/// Identity, role, timestamps, and the password hash are not updatable here;
/// password changes go through a dedicated flow that verifies the current
/// password first.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// Replacement email address, if requested.
    pub email: Option<String>,
    /// Replacement username, if requested.
    pub username: Option<String>,
    /// Replacement display name, if requested.
    pub full_name: Option<String>,
    /// Replacement biography, if requested.
    pub bio: Option<String>,
}

impl AccountUpdate {
    /// Returns whether the update names no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.full_name.is_none()
            && self.bio.is_none()
    }

    /// Validates every named field, canonicalizing the email in place.
    pub fn validate(&mut self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::Validation(
                "update must name at least one field".to_owned(),
            ));
        }

        if let Some(ref email) = self.email {
            self.email = Some(EmailAddress::new(email.clone())?.into());
        }

        if let Some(ref username) = self.username {
            validate_username(username)?;
        }

        if let Some(ref full_name) = self.full_name {
            validate_full_name(full_name)?;
        }

        if let Some(ref bio) = self.bio {
            validate_bio(bio)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AccountDraft, AccountUpdate, BIO_MAX_LENGTH, EmailAddress, FULL_NAME_MAX_LENGTH,
        PASSWORD_MAX_LENGTH, USERNAME_MAX_LENGTH, validate_bio, validate_full_name,
        validate_password, validate_username,
    };

    #[test]
    fn email_is_lowercased_and_accepted() {
        let email = EmailAddress::new("Reader@Example.COM");
        assert_eq!(email.ok().map(String::from), Some("reader@example.com".to_owned()));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
        assert!(EmailAddress::new("@example.com").is_err());
        assert!(EmailAddress::new("user@nodot").is_err());
        assert!(EmailAddress::new("a@b@example.com").is_err());
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn username_length_bounds_are_enforced() {
        assert!(validate_username("abc").is_err());
        assert!(validate_username("abcd").is_ok());
        assert!(validate_username(&"u".repeat(USERNAME_MAX_LENGTH)).is_ok());
        assert!(validate_username(&"u".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn username_rejects_unexpected_characters() {
        assert!(validate_username("good_name9").is_ok());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("bad-name").is_err());
    }

    #[test]
    fn profile_field_limits_are_enforced() {
        assert!(validate_full_name(&"f".repeat(FULL_NAME_MAX_LENGTH)).is_ok());
        assert!(validate_full_name(&"f".repeat(FULL_NAME_MAX_LENGTH + 1)).is_err());
        assert!(validate_bio(&"b".repeat(BIO_MAX_LENGTH)).is_ok());
        assert!(validate_bio(&"b".repeat(BIO_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn password_length_bounds_are_enforced() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("a-reasonable-passphrase").is_ok());
        assert!(validate_password(&"p".repeat(PASSWORD_MAX_LENGTH)).is_ok());
        assert!(validate_password(&"p".repeat(PASSWORD_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn draft_validates_both_fields() {
        assert!(AccountDraft::new("reader@example.com", "reader_1").is_ok());
        assert!(AccountDraft::new("reader@example.com", "no").is_err());
        assert!(AccountDraft::new("not-an-email", "reader_1").is_err());
    }

    #[test]
    fn empty_account_update_is_rejected() {
        let mut update = AccountUpdate::default();
        assert!(update.validate().is_err());
    }

    #[test]
    fn account_update_canonicalizes_email() {
        let mut update = AccountUpdate {
            email: Some("Reader@Example.COM".to_owned()),
            ..AccountUpdate::default()
        };
        assert!(update.validate().is_ok());
        assert_eq!(update.email.as_deref(), Some("reader@example.com"));
    }
}
