//! In-memory user repository implementation.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use docman_application::{AccountPage, NewUserRecord, UserRepository};
use docman_core::{AppError, AppResult, UserId};
use docman_domain::{AccountUpdate, PageRequest, UserAccount};

/// In-memory user repository, for tests and local development without a
/// database.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<Vec<UserAccount>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, record: NewUserRecord) -> AppResult<UserAccount> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|row| {
            row.email.eq_ignore_ascii_case(&record.email) || row.username == record.username
        }) {
            return Err(AppError::Conflict(
                "an account with this email or username already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let account = UserAccount {
            id: UserId::from_i64(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            email: record.email,
            username: record.username,
            password_hash: record.password_hash,
            full_name: None,
            bio: None,
            role: record.role,
            created_at: now,
            updated_at: now,
        };
        rows.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserAccount>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, page: Option<PageRequest>) -> AppResult<AccountPage> {
        let rows = self.rows.read().await;
        let total_count = rows.len() as u64;

        let selected = match page {
            Some(bounds) => rows
                .iter()
                .skip(usize::try_from(bounds.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(bounds.limit()).unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            None => rows.clone(),
        };

        Ok(AccountPage {
            rows: selected,
            total_count,
        })
    }

    async fn search_by_username(&self, fragment: &str) -> AppResult<Vec<UserAccount>> {
        let rows = self.rows.read().await;
        let fragment = fragment.to_lowercase();
        Ok(rows
            .iter()
            .filter(|row| row.username.to_lowercase().contains(&fragment))
            .cloned()
            .collect())
    }

    async fn update(&self, id: UserId, update: &AccountUpdate) -> AppResult<UserAccount> {
        let mut rows = self.rows.write().await;

        let taken = rows.iter().any(|row| {
            row.id != id
                && (update
                    .email
                    .as_deref()
                    .is_some_and(|email| row.email.eq_ignore_ascii_case(email))
                    || update
                        .username
                        .as_deref()
                        .is_some_and(|username| row.username == username))
        });
        if taken {
            return Err(AppError::Conflict(
                "an account with this email or username already exists".to_owned(),
            ));
        }

        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Err(AppError::NotFound("user not found".to_owned()));
        };

        if let Some(ref email) = update.email {
            row.email = email.clone();
        }
        if let Some(ref username) = update.username {
            row.username = username.clone();
        }
        if let Some(ref full_name) = update.full_name {
            row.full_name = Some(full_name.clone());
        }
        if let Some(ref bio) = update.bio {
            row.bio = Some(bio.clone());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Err(AppError::NotFound("user not found".to_owned()));
        };
        row.password_hash = password_hash.to_owned();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: UserId) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id != id);

        if rows.len() == before {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use docman_core::RoleRank;

    use super::*;

    fn record(email: &str, username: &str) -> NewUserRecord {
        NewUserRecord {
            email: email.to_owned(),
            username: username.to_owned(),
            password_hash: "hash".to_owned(),
            role: RoleRank::Member,
        }
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() -> AppResult<()> {
        let repository = InMemoryUserRepository::new();
        repository.create(record("reader@example.com", "reader_1")).await?;

        let found = repository.find_by_email("Reader@Example.COM").await?;
        assert!(found.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() -> AppResult<()> {
        let repository = InMemoryUserRepository::new();
        repository.create(record("a@example.com", "reader_1")).await?;

        let duplicate = repository.create(record("b@example.com", "reader_1")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_refuses_a_taken_username() -> AppResult<()> {
        let repository = InMemoryUserRepository::new();
        repository.create(record("a@example.com", "reader_1")).await?;
        let second = repository.create(record("b@example.com", "reader_2")).await?;

        let rename = AccountUpdate {
            username: Some("reader_1".to_owned()),
            ..AccountUpdate::default()
        };
        let result = repository.update(second.id, &rename).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        Ok(())
    }
}
