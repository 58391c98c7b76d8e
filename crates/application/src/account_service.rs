//! Account ports and application service.
//!
//! Owns the account lifecycle: registration, authentication, profile
//! updates, and deletion. Follows the usual guidance of generic failure
//! messages so login and registration never reveal whether an email is
//! taken.

use std::sync::Arc;

use async_trait::async_trait;

use docman_core::{AppError, AppResult, Principal, RoleRank, UserId};
use docman_domain::{
    AccountDraft, AccountUpdate, PageMetadata, PageRequest, UserAccount, can_manage_account,
    compute, validate_password,
};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Insert values for a new account row.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Canonical email address.
    pub email: String,
    /// Unique username.
    pub username: String,
    /// Opaque one-way password hash.
    pub password_hash: String,
    /// Privilege tier.
    pub role: RoleRank,
}

/// One fetched page of accounts plus the overall total.
#[derive(Debug, Clone)]
pub struct AccountPage {
    /// Rows within the requested bounds, in storage order.
    pub rows: Vec<UserAccount>,
    /// Total account rows, ignoring pagination bounds.
    pub total_count: u64,
}

/// Repository port for account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new account. Duplicate email or username surfaces as a
    /// conflict.
    async fn create(&self, record: NewUserRecord) -> AppResult<UserAccount>;

    /// Finds an account by its identifier.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserAccount>>;

    /// Finds an account by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>>;

    /// Lists accounts, optionally bounded by `page`.
    async fn list(&self, page: Option<PageRequest>) -> AppResult<AccountPage>;

    /// Finds accounts whose username contains `fragment`, case-insensitively.
    async fn search_by_username(&self, fragment: &str) -> AppResult<Vec<UserAccount>>;

    /// Applies an allow-listed profile update.
    async fn update(&self, id: UserId, update: &AccountUpdate) -> AppResult<UserAccount>;

    /// Replaces the stored password hash.
    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> AppResult<()>;

    /// Deletes an account and, through storage cascade, its documents.
    async fn delete(&self, id: UserId) -> AppResult<()>;
}

/// Port for password hashing. Keeps the application layer free of direct
/// cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Result of a login attempt.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials verified; a session can be established.
    Authenticated(UserAccount),
    /// Authentication failed. Deliberately carries no detail.
    Failed,
}

/// Parameters for account registration.
#[derive(Debug, Clone)]
pub struct RegisterParams {
    /// Email address for the new account.
    pub email: String,
    /// Requested username.
    pub username: String,
    /// Plaintext password, validated against the length policy.
    pub password: String,
}

/// An account listing annotated with pagination metadata when requested.
#[derive(Debug, Clone)]
pub struct AccountListing {
    /// Accounts, in storage order.
    pub accounts: Vec<UserAccount>,
    /// Total accounts.
    pub total_count: u64,
    /// Present when the caller requested pagination.
    pub page: Option<PageMetadata>,
}

/// Application service for account management and authentication.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, password_hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            password_hasher,
        }
    }

    /// Registers a new member account.
    pub async fn register(&self, params: RegisterParams) -> AppResult<UserAccount> {
        let draft = AccountDraft::new(params.email.as_str(), params.username.as_str())?;
        validate_password(&params.password)?;

        // Hash before the existence check so the timing of a duplicate email
        // is indistinguishable from a fresh registration.
        let password_hash = self.password_hasher.hash_password(&params.password)?;

        if self.users.find_by_email(draft.email()).await?.is_some() {
            return Err(AppError::Conflict(
                "an account with this email or username already exists".to_owned(),
            ));
        }

        self.users
            .create(NewUserRecord {
                email: draft.email().to_owned(),
                username: draft.username().to_owned(),
                password_hash,
                role: RoleRank::Member,
            })
            .await
    }

    /// Authenticates an account with email and password.
    ///
    /// Returns [`AuthOutcome::Failed`] for any failure so callers cannot
    /// distinguish an unknown email from a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let Some(account) = self.users.find_by_email(email).await? else {
            // Hash anyway to keep the unknown-email path constant-time.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if self
            .password_hasher
            .verify_password(password, &account.password_hash)?
        {
            Ok(AuthOutcome::Authenticated(account))
        } else {
            Ok(AuthOutcome::Failed)
        }
    }

    /// Fetches an account by identifier.
    pub async fn fetch(&self, id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))
    }

    /// Lists accounts with page metadata when pagination was requested.
    pub async fn list(&self, page: Option<PageRequest>) -> AppResult<AccountListing> {
        let fetched = self.users.list(page).await?;
        let metadata = page.map(|bounds| {
            compute(
                bounds.limit(),
                bounds.offset(),
                fetched.total_count,
                fetched.rows.len(),
            )
        });

        Ok(AccountListing {
            accounts: fetched.rows,
            total_count: fetched.total_count,
            page: metadata,
        })
    }

    /// Searches accounts by username substring.
    pub async fn search(&self, query: &str) -> AppResult<Vec<UserAccount>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation(
                "search query must not be empty".to_owned(),
            ));
        }

        self.users.search_by_username(query).await
    }

    /// Applies a profile update; permitted for the account owner or an
    /// administrator.
    pub async fn update_profile(
        &self,
        principal: Principal,
        target: UserId,
        mut update: AccountUpdate,
    ) -> AppResult<UserAccount> {
        update.validate()?;

        if !can_manage_account(Some(principal), target).is_allowed() {
            return Err(AppError::Forbidden(
                "you are not permitted to update this account".to_owned(),
            ));
        }

        if self.users.find_by_id(target).await?.is_none() {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        self.users.update(target, &update).await
    }

    /// Changes the account password after verifying the current one.
    ///
    /// Restricted to the account owner; administrators cannot rotate another
    /// user's password because they cannot present the current one.
    pub async fn change_password(
        &self,
        principal: Principal,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let account = self.fetch(principal.id()).await?;

        let current_valid = self
            .password_hasher
            .verify_password(current_password, &account.password_hash)?;
        if !current_valid {
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_owned(),
            ));
        }

        validate_password(new_password)?;
        let new_hash = self.password_hasher.hash_password(new_password)?;
        self.users
            .update_password_hash(principal.id(), &new_hash)
            .await
    }

    /// Deletes an account; permitted for the account owner or an
    /// administrator.
    pub async fn delete(&self, principal: Principal, target: UserId) -> AppResult<()> {
        // Authorization comes before the lookup, matching `update_profile`,
        // so a denied caller cannot learn whether the account exists.
        if !can_manage_account(Some(principal), target).is_allowed() {
            return Err(AppError::Forbidden(
                "you are not permitted to delete this account".to_owned(),
            ));
        }

        if self.users.find_by_id(target).await?.is_none() {
            return Err(AppError::NotFound("user not found".to_owned()));
        }

        self.users.delete(target).await
    }

    /// Ensures an administrator account with the given credentials exists.
    ///
    /// Used by startup bootstrap seeding; a no-op when the email is already
    /// registered.
    pub async fn ensure_admin(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> AppResult<()> {
        let draft = AccountDraft::new(email, username)?;
        validate_password(password)?;

        if self.users.find_by_email(draft.email()).await?.is_some() {
            return Ok(());
        }

        let password_hash = self.password_hasher.hash_password(password)?;
        self.users
            .create(NewUserRecord {
                email: draft.email().to_owned(),
                username: draft.username().to_owned(),
                password_hash,
                role: RoleRank::Admin,
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use docman_core::{AppError, AppResult, Principal, RoleRank, UserId};
    use docman_domain::{AccountUpdate, PageRequest, UserAccount};
    use tokio::sync::Mutex;

    use super::{
        AccountPage, AccountService, AuthOutcome, NewUserRecord, PasswordHasher, RegisterParams,
        UserRepository,
    };

    /// Reversible stand-in for the hashing port; tests never need real
    /// key-stretching.
    struct FakePasswordHasher;

    impl PasswordHasher for FakePasswordHasher {
        fn hash_password(&self, password: &str) -> AppResult<String> {
            Ok(format!("hashed:{password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
            Ok(hash == format!("hashed:{password}"))
        }
    }

    #[derive(Default)]
    struct FakeUserRepository {
        rows: Mutex<Vec<UserAccount>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl UserRepository for FakeUserRepository {
        async fn create(&self, record: NewUserRecord) -> AppResult<UserAccount> {
            let mut rows = self.rows.lock().await;
            if rows
                .iter()
                .any(|row| row.email == record.email || row.username == record.username)
            {
                return Err(AppError::Conflict(
                    "an account with this email or username already exists".to_owned(),
                ));
            }

            let account = UserAccount {
                id: UserId::from_i64(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
                email: record.email,
                username: record.username,
                password_hash: record.password_hash,
                full_name: None,
                bio: None,
                role: record.role,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            rows.push(account.clone());
            Ok(account)
        }

        async fn find_by_id(&self, id: UserId) -> AppResult<Option<UserAccount>> {
            let rows = self.rows.lock().await;
            Ok(rows.iter().find(|row| row.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
            let rows = self.rows.lock().await;
            Ok(rows
                .iter()
                .find(|row| row.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn list(&self, page: Option<PageRequest>) -> AppResult<AccountPage> {
            let rows = self.rows.lock().await;
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
            let rows = self.rows.lock().await;
            let fragment = fragment.to_lowercase();
            Ok(rows
                .iter()
                .filter(|row| row.username.to_lowercase().contains(&fragment))
                .cloned()
                .collect())
        }

        async fn update(&self, id: UserId, update: &AccountUpdate) -> AppResult<UserAccount> {
            let mut rows = self.rows.lock().await;
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
            let mut rows = self.rows.lock().await;
            let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
                return Err(AppError::NotFound("user not found".to_owned()));
            };
            row.password_hash = password_hash.to_owned();
            Ok(())
        }

        async fn delete(&self, id: UserId) -> AppResult<()> {
            let mut rows = self.rows.lock().await;
            rows.retain(|row| row.id != id);
            Ok(())
        }
    }

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(FakeUserRepository::default()),
            Arc::new(FakePasswordHasher),
        )
    }

    fn params(email: &str, username: &str) -> RegisterParams {
        RegisterParams {
            email: email.to_owned(),
            username: username.to_owned(),
            password: "a-long-password".to_owned(),
        }
    }

    async fn register(service: &AccountService, email: &str, username: &str) -> UserAccount {
        match service.register(params(email, username)).await {
            Ok(account) => account,
            Err(error) => panic!("registration failed: {error}"),
        }
    }

    #[tokio::test]
    async fn registration_creates_a_member_with_a_hashed_password() {
        let service = service();
        let account = register(&service, "reader@example.com", "reader_1").await;

        assert_eq!(account.role, RoleRank::Member);
        assert_eq!(account.password_hash, "hashed:a-long-password");
    }

    #[tokio::test]
    async fn duplicate_email_registration_conflicts() {
        let service = service();
        register(&service, "reader@example.com", "reader_1").await;

        let duplicate = service.register(params("Reader@example.com", "reader_2")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_verifies_credentials_generically() {
        let service = service();
        register(&service, "reader@example.com", "reader_1").await;

        let ok = service.login("reader@example.com", "a-long-password").await;
        assert!(matches!(ok, Ok(AuthOutcome::Authenticated(_))));

        let wrong_password = service.login("reader@example.com", "wrong-password").await;
        assert!(matches!(wrong_password, Ok(AuthOutcome::Failed)));

        let unknown_email = service.login("nobody@example.com", "a-long-password").await;
        assert!(matches!(unknown_email, Ok(AuthOutcome::Failed)));
    }

    #[tokio::test]
    async fn profile_updates_are_self_or_admin_only() {
        let service = service();
        let owner = register(&service, "reader@example.com", "reader_1").await;
        let other = register(&service, "writer@example.com", "writer_1").await;

        let update = AccountUpdate {
            bio: Some("writes documentation".to_owned()),
            ..AccountUpdate::default()
        };

        let denied = service
            .update_profile(other.principal(), owner.id, update.clone())
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let by_self = service
            .update_profile(owner.principal(), owner.id, update.clone())
            .await;
        assert!(by_self.is_ok());

        let admin = Principal::new(UserId::from_i64(99), RoleRank::Admin);
        let by_admin = service.update_profile(admin, owner.id, update).await;
        assert!(by_admin.is_ok());
    }

    #[tokio::test]
    async fn password_change_requires_the_current_password() {
        let service = service();
        let account = register(&service, "reader@example.com", "reader_1").await;

        let wrong = service
            .change_password(account.principal(), "not-the-password", "another-long-pass")
            .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let changed = service
            .change_password(account.principal(), "a-long-password", "another-long-pass")
            .await;
        assert!(changed.is_ok());

        let relogin = service.login("reader@example.com", "another-long-pass").await;
        assert!(matches!(relogin, Ok(AuthOutcome::Authenticated(_))));
    }

    #[tokio::test]
    async fn deletion_is_self_or_admin_only() {
        let service = service();
        let owner = register(&service, "reader@example.com", "reader_1").await;
        let other = register(&service, "writer@example.com", "writer_1").await;

        let denied = service.delete(other.principal(), owner.id).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let admin = Principal::new(UserId::from_i64(99), RoleRank::Admin);
        assert!(service.delete(admin, owner.id).await.is_ok());

        let missing = service.delete(admin, owner.id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn deletion_denial_does_not_reveal_whether_the_account_exists() {
        let service = service();
        let owner = register(&service, "reader@example.com", "reader_1").await;
        let other = register(&service, "writer@example.com", "writer_1").await;

        let existing = service.delete(other.principal(), owner.id).await;
        assert!(matches!(existing, Err(AppError::Forbidden(_))));

        let absent = service
            .delete(other.principal(), UserId::from_i64(404))
            .await;
        assert!(matches!(absent, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn listing_carries_pagination_metadata() {
        let service = service();
        for index in 0..5 {
            register(
                &service,
                &format!("user{index}@example.com"),
                &format!("user_{index}"),
            )
            .await;
        }

        let bounds = match PageRequest::new(2, 4) {
            Ok(bounds) => bounds,
            Err(error) => panic!("page bounds rejected: {error}"),
        };
        let listing = match service.list(Some(bounds)).await {
            Ok(listing) => listing,
            Err(error) => panic!("list failed: {error}"),
        };

        assert_eq!(listing.accounts.len(), 1);
        match listing.page {
            Some(metadata) => {
                assert_eq!(metadata.total_count, 5);
                assert_eq!(metadata.current_page, 3);
                assert_eq!(metadata.page_count, 3);
                assert!(!metadata.exhausted);
            }
            None => panic!("expected page metadata"),
        }
    }

    #[tokio::test]
    async fn username_search_requires_a_query() {
        let service = service();
        register(&service, "reader@example.com", "doc_reader").await;
        register(&service, "writer@example.com", "doc_writer").await;

        assert!(matches!(
            service.search("  ").await,
            Err(AppError::Validation(_))
        ));

        let found = match service.search("READER").await {
            Ok(found) => found,
            Err(error) => panic!("search failed: {error}"),
        };
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "doc_reader");
    }

    #[tokio::test]
    async fn admin_bootstrap_is_idempotent() {
        let service = service();

        let first = service
            .ensure_admin("admin@example.com", "site_admin", "bootstrap-pass")
            .await;
        assert!(first.is_ok());

        let second = service
            .ensure_admin("admin@example.com", "site_admin", "bootstrap-pass")
            .await;
        assert!(second.is_ok());

        let login = service.login("admin@example.com", "bootstrap-pass").await;
        match login {
            Ok(AuthOutcome::Authenticated(account)) => assert_eq!(account.role, RoleRank::Admin),
            other => panic!("expected admin login to succeed, got {other:?}"),
        }
    }
}
