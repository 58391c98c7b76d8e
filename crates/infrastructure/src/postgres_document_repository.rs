//! PostgreSQL-backed document repository.
//!
//! Translates abstract scope predicates into SQL so that visibility
//! filtering happens inside the database, not after the fetch.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::warn;

use docman_application::{DocumentPage, DocumentRepository, NewDocumentRecord};
use docman_core::{AppError, AppResult, RoleRank, UserId};
use docman_domain::{AccessLevel, Document, DocumentId, DocumentUpdate, PageRequest, Predicate};

/// PostgreSQL implementation of the document repository port.
#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    title: String,
    content: String,
    access: String,
    author_id: i64,
    owner_role_rank: i16,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl DocumentRow {
    /// Converts a stored row into the domain entity.
    ///
    /// Rows carrying an unrecognized access level or role rank convert to
    /// `None` so callers treat them as not visible rather than failing the
    /// whole request.
    fn into_document(self) -> Option<Document> {
        let Some(access) = AccessLevel::parse_stored(&self.access) else {
            warn!(document_id = self.id, access = %self.access, "skipping document with unrecognized access level");
            return None;
        };
        let Ok(owner_role_rank) = RoleRank::from_rank(self.owner_role_rank) else {
            warn!(document_id = self.id, rank = self.owner_role_rank, "skipping document with unrecognized owner rank");
            return None;
        };

        Some(Document {
            id: DocumentId::from_i64(self.id),
            title: self.title,
            content: self.content,
            access,
            author_id: UserId::from_i64(self.author_id),
            owner_role_rank,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const DOCUMENT_COLUMNS: &str =
    "id, title, content, access, author_id, owner_role_rank, created_at, updated_at";

/// Appends the SQL condition for `predicate` to the builder.
///
/// Empty conjunctions render as `TRUE` and empty disjunctions as `FALSE`,
/// matching the in-memory evaluation.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::AccessIs(level) => {
            builder.push("access = ");
            builder.push_bind(level.as_str());
        }
        Predicate::AuthorIs(author) => {
            builder.push("author_id = ");
            builder.push_bind(author.as_i64());
        }
        Predicate::OwnerRoleVisibleTo(role) => {
            // Lower rank means more privileged, so the requester covers the
            // owner's tier when the stored rank is at least the requester's.
            builder.push("owner_role_rank >= ");
            builder.push_bind(role.rank());
        }
        Predicate::TitleContains(text) => {
            builder.push("title ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(text)));
        }
        Predicate::And(children) => push_children(builder, children, " AND ", "TRUE"),
        Predicate::Or(children) => push_children(builder, children, " OR ", "FALSE"),
    }
}

fn push_children(
    builder: &mut QueryBuilder<'_, Postgres>,
    children: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if children.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push('(');
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_predicate(builder, child);
    }
    builder.push(')');
}

/// Escapes LIKE metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn create(&self, record: NewDocumentRecord) -> AppResult<Document> {
        let result = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (title, content, access, author_id, owner_role_rank)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, content, access, author_id, owner_role_rank, created_at, updated_at
            "#,
        )
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.access.as_str())
        .bind(record.author_id.as_i64())
        .bind(record.owner_role_rank.rank())
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "a document titled '{}' already exists",
                        record.title
                    )));
                }

                return Err(AppError::Internal(format!(
                    "failed to create document: {error}"
                )));
            }
        };

        row.into_document()
            .ok_or_else(|| AppError::Internal("stored document row is malformed".to_owned()))
    }

    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, content, access, author_id, owner_role_rank, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load document: {error}")))?;

        Ok(row.and_then(DocumentRow::into_document))
    }

    async fn list(&self, scope: &Predicate, page: Option<PageRequest>) -> AppResult<DocumentPage> {
        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE ");
        push_predicate(&mut count_builder, scope);

        let total_count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count documents: {error}")))?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE "));
        push_predicate(&mut builder, scope);
        builder.push(" ORDER BY created_at DESC, id DESC");

        if let Some(bounds) = page {
            let limit = i64::try_from(bounds.limit()).map_err(|error| {
                AppError::Validation(format!("invalid listing limit: {error}"))
            })?;
            let offset = i64::try_from(bounds.offset()).map_err(|error| {
                AppError::Validation(format!("invalid listing offset: {error}"))
            })?;

            builder.push(" LIMIT ");
            builder.push_bind(limit);
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list documents: {error}")))?;

        Ok(DocumentPage {
            rows: rows
                .into_iter()
                .filter_map(DocumentRow::into_document)
                .collect(),
            total_count: u64::try_from(total_count).unwrap_or(0),
        })
    }

    async fn update(&self, id: DocumentId, update: &DocumentUpdate) -> AppResult<Document> {
        if update.is_empty() {
            return Err(AppError::Validation(
                "update must name at least one field".to_owned(),
            ));
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE documents SET ");
        let mut assignments = builder.separated(", ");

        if let Some(ref title) = update.title {
            assignments.push("title = ");
            assignments.push_bind_unseparated(title.clone());
        }
        if let Some(ref content) = update.content {
            assignments.push("content = ");
            assignments.push_bind_unseparated(content.clone());
        }
        if let Some(access) = update.access {
            assignments.push("access = ");
            assignments.push_bind_unseparated(access.as_str());
        }
        assignments.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id.as_i64());
        builder.push(format!(" RETURNING {DOCUMENT_COLUMNS}"));

        let result = builder
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await;

        let row = match result {
            Ok(Some(row)) => row,
            Ok(None) => return Err(AppError::NotFound("document not found".to_owned())),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(
                        "a document with this title already exists".to_owned(),
                    ));
                }

                return Err(AppError::Internal(format!(
                    "failed to update document: {error}"
                )));
            }
        };

        row.into_document()
            .ok_or_else(|| AppError::Internal("stored document row is malformed".to_owned()))
    }

    async fn delete(&self, id: DocumentId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete document: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("document not found".to_owned()));
        }

        Ok(())
    }
}
