use docman_application::{AccountService, DocumentService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub document_service: DocumentService,
    pub account_service: AccountService,
    pub frontend_url: String,
}
