//! Document ports and application service.
//!
//! Owns the document lifecycle: creation, scoped listings, single-document
//! reads, allow-listed updates, and deletion. Every operation runs through
//! the domain access policy; repositories only ever see scope predicates,
//! never raw visibility rules.

use std::sync::Arc;

use async_trait::async_trait;

use docman_core::{AppError, AppResult, Principal, RoleRank, UserId};
use docman_domain::{
    AccessDecision, AccessLevel, AccessReason, Document, DocumentDraft, DocumentId,
    DocumentUpdate, PageMetadata, PageRequest, Predicate, can_mutate, can_view, compute,
    scope_for_listing, scope_for_user_documents,
};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Insert values for a new document row.
#[derive(Debug, Clone)]
pub struct NewDocumentRecord {
    /// Globally unique title.
    pub title: String,
    /// Document body.
    pub content: String,
    /// Declared visibility tier.
    pub access: AccessLevel,
    /// Owning account.
    pub author_id: UserId,
    /// Author's role tier, captured at creation time.
    pub owner_role_rank: RoleRank,
}

/// One fetched page of documents plus the scope-wide total.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    /// Rows within the requested bounds, in storage order.
    pub rows: Vec<Document>,
    /// Total rows matching the scope, ignoring pagination bounds.
    pub total_count: u64,
}

/// Repository port for document persistence.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Inserts a new document. Duplicate titles surface as a conflict.
    async fn create(&self, record: NewDocumentRecord) -> AppResult<Document>;

    /// Finds a document by its identifier.
    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<Document>>;

    /// Lists documents matching `scope`, optionally bounded by `page`.
    async fn list(&self, scope: &Predicate, page: Option<PageRequest>) -> AppResult<DocumentPage>;

    /// Applies an allow-listed update to a document.
    async fn update(&self, id: DocumentId, update: &DocumentUpdate) -> AppResult<Document>;

    /// Deletes a document.
    async fn delete(&self, id: DocumentId) -> AppResult<()>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// A document listing annotated with pagination metadata when requested.
#[derive(Debug, Clone)]
pub struct DocumentListing {
    /// Visible documents, in storage order.
    pub documents: Vec<Document>,
    /// Total documents matching the scope.
    pub total_count: u64,
    /// Present when the caller requested pagination.
    pub page: Option<PageMetadata>,
}

/// Application service for document operations.
#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    /// Creates a new document service.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }

    /// Creates a document owned by `principal`, capturing the principal's
    /// current role tier as the document's owner rank.
    pub async fn create(&self, principal: Principal, draft: DocumentDraft) -> AppResult<Document> {
        self.documents
            .create(NewDocumentRecord {
                title: draft.title().to_owned(),
                content: draft.content().to_owned(),
                access: draft.access(),
                author_id: principal.id(),
                owner_role_rank: principal.role(),
            })
            .await
    }

    /// Fetches a single document, enforcing the visibility rule.
    pub async fn fetch(
        &self,
        principal: Option<Principal>,
        id: DocumentId,
    ) -> AppResult<Document> {
        let Some(document) = self.documents.find_by_id(id).await? else {
            return Err(decision_error(AccessDecision::not_found(), "view"));
        };

        let decision = can_view(principal, &document);
        if !decision.is_allowed() {
            return Err(decision_error(decision, "view"));
        }

        Ok(document)
    }

    /// Lists documents visible to `principal`, with page metadata when
    /// pagination bounds were supplied.
    pub async fn list(
        &self,
        principal: Option<Principal>,
        page: Option<PageRequest>,
    ) -> AppResult<DocumentListing> {
        let scope = scope_for_listing(principal);
        self.list_scoped(&scope, page).await
    }

    /// Lists documents authored by `author` that `principal` may see.
    pub async fn list_for_author(
        &self,
        principal: Option<Principal>,
        author: UserId,
        page: Option<PageRequest>,
    ) -> AppResult<DocumentListing> {
        let scope = scope_for_user_documents(principal, author);
        self.list_scoped(&scope, page).await
    }

    /// Searches visible documents by title substring.
    pub async fn search(
        &self,
        principal: Option<Principal>,
        query: &str,
    ) -> AppResult<Vec<Document>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation(
                "search query must not be empty".to_owned(),
            ));
        }

        let scope =
            scope_for_listing(principal).and(Predicate::TitleContains(query.to_owned()));
        let page = self.documents.list(&scope, None).await?;

        Ok(page.rows)
    }

    /// Applies an allow-listed update after the mutation check.
    pub async fn update(
        &self,
        principal: Principal,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> AppResult<Document> {
        update.validate()?;

        let Some(document) = self.documents.find_by_id(id).await? else {
            return Err(decision_error(AccessDecision::not_found(), "update"));
        };

        let decision = can_mutate(Some(principal), &document);
        if !decision.is_allowed() {
            return Err(decision_error(decision, "update"));
        }

        self.documents.update(id, &update).await
    }

    /// Deletes a document after the mutation check.
    pub async fn delete(&self, principal: Principal, id: DocumentId) -> AppResult<()> {
        let Some(document) = self.documents.find_by_id(id).await? else {
            return Err(decision_error(AccessDecision::not_found(), "delete"));
        };

        let decision = can_mutate(Some(principal), &document);
        if !decision.is_allowed() {
            return Err(decision_error(decision, "delete"));
        }

        self.documents.delete(id).await
    }

    async fn list_scoped(
        &self,
        scope: &Predicate,
        page: Option<PageRequest>,
    ) -> AppResult<DocumentListing> {
        let fetched = self.documents.list(scope, page).await?;
        let metadata = page.map(|bounds| {
            compute(
                bounds.limit(),
                bounds.offset(),
                fetched.total_count,
                fetched.rows.len(),
            )
        });

        Ok(DocumentListing {
            documents: fetched.rows,
            total_count: fetched.total_count,
            page: metadata,
        })
    }
}

/// Maps a denied policy decision to the application error the HTTP layer
/// translates into a status code.
fn decision_error(decision: AccessDecision, action: &str) -> AppError {
    match decision.reason() {
        AccessReason::NotFound => AppError::NotFound("document not found".to_owned()),
        AccessReason::InsufficientRole => AppError::Forbidden(format!(
            "your role does not permit you to {action} this document"
        )),
        AccessReason::Ok | AccessReason::NotOwner => AppError::Forbidden(format!(
            "you are not permitted to {action} this document"
        )),
    }
}
