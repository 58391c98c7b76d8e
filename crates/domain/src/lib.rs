//! Domain entities, access policy, and pagination rules.

#![forbid(unsafe_code)]

mod access;
mod account;
mod document;
mod pagination;
mod scope;

pub use access::{
    AccessDecision, AccessLevel, AccessReason, author_listing_allows, can_manage_account,
    can_mutate, can_view, filter_visible,
};
pub use account::{
    AccountDraft, AccountUpdate, BIO_MAX_LENGTH, EmailAddress, FULL_NAME_MAX_LENGTH,
    PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
    UserAccount, validate_bio, validate_full_name, validate_password, validate_username,
};
pub use document::{
    CONTENT_MAX_LENGTH, Document, DocumentDraft, DocumentId, DocumentUpdate, TITLE_MAX_LENGTH,
    validate_content, validate_title,
};
pub use pagination::{PageMetadata, PageRequest, compute};
pub use scope::{Predicate, scope_for_listing, scope_for_user_documents};
