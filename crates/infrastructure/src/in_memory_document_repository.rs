//! In-memory document repository implementation.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use docman_application::{DocumentPage, DocumentRepository, NewDocumentRecord};
use docman_core::{AppError, AppResult};
use docman_domain::{Document, DocumentId, DocumentUpdate, PageRequest, Predicate};

/// In-memory document repository, for tests and local development without
/// a database.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    rows: RwLock<Vec<Document>>,
    next_id: AtomicI64,
}

impl InMemoryDocumentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, record: NewDocumentRecord) -> AppResult<Document> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|row| row.title == record.title) {
            return Err(AppError::Conflict(format!(
                "a document titled '{}' already exists",
                record.title
            )));
        }

        let now = Utc::now();
        let document = Document {
            id: DocumentId::from_i64(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            title: record.title,
            content: record.content,
            access: record.access,
            author_id: record.author_id,
            owner_role_rank: record.owner_role_rank,
            created_at: now,
            updated_at: now,
        };
        rows.push(document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<Document>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn list(&self, scope: &Predicate, page: Option<PageRequest>) -> AppResult<DocumentPage> {
        let rows = self.rows.read().await;

        // Newest first, matching the SQL adapter's ordering.
        let mut matching: Vec<Document> = rows
            .iter()
            .filter(|row| scope.matches(row))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });

        let total_count = matching.len() as u64;
        let selected = match page {
            Some(bounds) => matching
                .into_iter()
                .skip(usize::try_from(bounds.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(bounds.limit()).unwrap_or(usize::MAX))
                .collect(),
            None => matching,
        };

        Ok(DocumentPage {
            rows: selected,
            total_count,
        })
    }

    async fn update(&self, id: DocumentId, update: &DocumentUpdate) -> AppResult<Document> {
        let mut rows = self.rows.write().await;

        if let Some(ref title) = update.title
            && rows.iter().any(|row| row.id != id && &row.title == title)
        {
            return Err(AppError::Conflict(format!(
                "a document titled '{title}' already exists"
            )));
        }

        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Err(AppError::NotFound("document not found".to_owned()));
        };

        if let Some(ref title) = update.title {
            row.title = title.clone();
        }
        if let Some(ref content) = update.content {
            row.content = content.clone();
        }
        if let Some(access) = update.access {
            row.access = access;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: DocumentId) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id != id);

        if rows.len() == before {
            return Err(AppError::NotFound("document not found".to_owned()));
        }

        Ok(())
    }
}
