//! Application services and persistence ports.

#![forbid(unsafe_code)]

mod account_service;
mod document_service;

pub use account_service::{
    AccountListing, AccountPage, AccountService, AuthOutcome, NewUserRecord, PasswordHasher,
    RegisterParams, UserRepository,
};
pub use document_service::{
    DocumentListing, DocumentPage, DocumentRepository, DocumentService, NewDocumentRecord,
};
