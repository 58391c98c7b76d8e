//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use sqlx::PgPool;

use docman_application::{AccountPage, NewUserRecord, UserRepository};
use docman_core::{AppError, AppResult, RoleRank, UserId};
use docman_domain::{AccountUpdate, PageRequest, UserAccount};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    password_hash: String,
    full_name: Option<String>,
    bio: Option<String>,
    role_rank: i16,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    fn into_account(self) -> AppResult<UserAccount> {
        let role = RoleRank::from_rank(self.role_rank).map_err(|_| {
            AppError::Internal(format!(
                "account {} carries unrecognized role rank {}",
                self.id, self.role_rank
            ))
        })?;

        Ok(UserAccount {
            id: UserId::from_i64(self.id),
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            full_name: self.full_name,
            bio: self.bio,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, username, password_hash, full_name, bio, role_rank, created_at, updated_at";

/// Escapes LIKE metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, record: NewUserRecord) -> AppResult<UserAccount> {
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, password_hash, role_rank)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password_hash, full_name, bio, role_rank, created_at, updated_at
            "#,
        )
        .bind(&record.email)
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(record.role.rank())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.into_account(),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(
                        "an account with this email or username already exists".to_owned(),
                    ));
                }

                Err(AppError::Internal(format!(
                    "failed to create account: {error}"
                )))
            }
        }
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password_hash, full_name, bio, role_rank, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load account: {error}")))?;

        row.map(UserRow::into_account).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password_hash, full_name, bio, role_rank, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load account: {error}")))?;

        row.map(UserRow::into_account).transpose()
    }

    async fn list(&self, page: Option<PageRequest>) -> AppResult<AccountPage> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count accounts: {error}")))?;

        let rows = match page {
            Some(bounds) => {
                let limit = i64::try_from(bounds.limit()).map_err(|error| {
                    AppError::Validation(format!("invalid listing limit: {error}"))
                })?;
                let offset = i64::try_from(bounds.offset()).map_err(|error| {
                    AppError::Validation(format!("invalid listing offset: {error}"))
                })?;

                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY id"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| AppError::Internal(format!("failed to list accounts: {error}")))?;

        Ok(AccountPage {
            rows: rows
                .into_iter()
                .map(UserRow::into_account)
                .collect::<AppResult<Vec<_>>>()?,
            total_count: u64::try_from(total_count).unwrap_or(0),
        })
    }

    async fn search_by_username(&self, fragment: &str) -> AppResult<Vec<UserAccount>> {
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username ILIKE $1 ORDER BY username"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to search accounts: {error}")))?;

        rows.into_iter().map(UserRow::into_account).collect()
    }

    async fn update(&self, id: UserId, update: &AccountUpdate) -> AppResult<UserAccount> {
        if update.is_empty() {
            return Err(AppError::Validation(
                "update must name at least one field".to_owned(),
            ));
        }

        let mut builder: sqlx::QueryBuilder<'_, sqlx::Postgres> =
            sqlx::QueryBuilder::new("UPDATE users SET ");
        let mut assignments = builder.separated(", ");

        if let Some(ref email) = update.email {
            assignments.push("email = ");
            assignments.push_bind_unseparated(email.clone());
        }
        if let Some(ref username) = update.username {
            assignments.push("username = ");
            assignments.push_bind_unseparated(username.clone());
        }
        if let Some(ref full_name) = update.full_name {
            assignments.push("full_name = ");
            assignments.push_bind_unseparated(full_name.clone());
        }
        if let Some(ref bio) = update.bio {
            assignments.push("bio = ");
            assignments.push_bind_unseparated(bio.clone());
        }
        assignments.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id.as_i64());
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let result = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => row.into_account(),
            Ok(None) => Err(AppError::NotFound("user not found".to_owned())),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(
                        "an account with this email or username already exists".to_owned(),
                    ));
                }

                Err(AppError::Internal(format!(
                    "failed to update account: {error}"
                )))
            }
        }
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_i64())
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update password hash: {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        Ok(())
    }

    async fn delete(&self, id: UserId) -> AppResult<()> {
        // Document rows cascade via the schema's foreign key.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete account: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        Ok(())
    }
}
