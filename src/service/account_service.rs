use crate::config::database::Database;
use crate::config::parameter;
use crate::dto::user_dto::{LoginDto, SignUpDto};
use crate::entity::token::UserToken;
use crate::entity::user::{User, UserStatus};
use crate::error::config_error::ConfigError;
use crate::error::db_error::DbError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use crate::error::AppError;
use crate::repository::token_repository::{TokenRepository, TokenRepositoryTrait};
use crate::repository::user_repository::{UserRepository, UserRepositoryTrait};
use crate::service::device_service::DeviceDescriptor;
use crate::service::password_service::PasswordService;
use crate::service::token_service::TokenService;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates registration, login, token refresh and status changes.
///
/// The order of validation checks in `register` and `login` is part of the
/// contract: empty-field checks run before existence checks, which run before
/// format and match checks, so callers always receive the specific error the
/// flow defines for a given malformed input.
///
/// Generic over the two store traits; production wiring uses the Postgres
/// repositories, tests run the same flows against in-memory stores.
#[derive(Clone)]
pub struct AccountService<U, T> {
    user_repo: U,
    token_repo: T,
    token_service: TokenService,
    password_min_length: usize,
}

impl AccountService<UserRepository, TokenRepository> {
    pub fn new(db_conn: &Arc<Database>, token_service: TokenService) -> Result<Self, ConfigError> {
        Ok(Self::with_repositories(
            UserRepository::new(db_conn),
            TokenRepository::new(db_conn),
            token_service,
            parameter::get_usize("PASSWORD_MIN_LENGTH")?,
        ))
    }
}

impl<U, T> AccountService<U, T>
where
    U: UserRepositoryTrait + Send + Sync,
    T: TokenRepositoryTrait + Send + Sync,
{
    pub fn with_repositories(
        user_repo: U,
        token_repo: T,
        token_service: TokenService,
        password_min_length: usize,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            token_service,
            password_min_length,
        }
    }

    pub async fn register(&self, payload: SignUpDto) -> Result<User, AppError> {
        validate_email_present(&payload.email)?;

        if self.user_repo.find_by_email(&payload.email).await?.is_some() {
            warn!("Registration rejected, email already in use: {}", payload.email);
            return Err(UserError::EmailInUse)?;
        }

        validate_password(
            &payload.password,
            &payload.confirmation_password,
            self.password_min_length,
        )?;

        let user = User::new(
            payload.full_name,
            payload.email,
            payload.phone,
            PasswordService::hash(&payload.password),
            UserStatus::Active,
        );

        // The pre-check above is advisory; a concurrent duplicate loses here
        // on the unique index and gets the same business error.
        let user = match self.user_repo.create(user).await {
            Ok(user) => user,
            Err(AppError::Db(DbError::Conflict(constraint))) => {
                warn!("Registration lost uniqueness race on '{}'", constraint);
                if constraint.contains("identity") {
                    return Err(UserError::IdentityInUse)?;
                }
                return Err(UserError::EmailInUse)?;
            }
            Err(e) => return Err(e),
        };

        info!("User registered: {}", user.identity);
        Ok(user)
    }

    pub async fn login(
        &self,
        payload: LoginDto,
        device: DeviceDescriptor,
    ) -> Result<UserToken, AppError> {
        // Validation takes precedence over not-found for an empty email.
        validate_email_present(&payload.email)?;

        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed, user not found: {}", payload.email);
                UserError::UserNotFound
            })?;

        if !PasswordService::verify(&payload.password, &user.password) {
            warn!("Login failed, invalid credentials for user: {}", user.identity);
            return Err(UserError::InvalidCredentials)?;
        }

        let token = self.token_service.issue(&user, &device)?;

        // Token row and LastLoggedIn commit together or not at all.
        let token = self
            .token_repo
            .save_for_login(token, &user, Utc::now())
            .await?;

        info!("Login successful for user: {}", user.identity);
        Ok(token)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<UserToken, AppError> {
        let (user, old_token) = self
            .token_repo
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                warn!("Refresh failed, token not found");
                TokenError::TokenNotFound
            })?;

        if old_token.refresh_token_expired(Utc::now()) {
            warn!("Refresh failed, token expired for user: {}", user.identity);
            return Err(TokenError::TokenExpired)?;
        }

        // Re-issue for the same user and device; the old pair is kept as a
        // superseded row for the audit trail.
        let new_token = self.token_service.issue(&user, &old_token.device())?;

        match self.token_repo.rotate(&old_token, new_token).await {
            Ok(new_token) => {
                info!("Token pair refreshed for user: {}", user.identity);
                Ok(new_token)
            }
            // A concurrent rotation claimed the old pair between our lookup
            // and the guarded update; treat the loser like an unknown token.
            Err(DbError::NotFound) => {
                warn!("Refresh lost rotation race for user: {}", user.identity);
                Err(TokenError::TokenNotFound)?
            }
            Err(e) => Err(e)?,
        }
    }

    pub async fn set_active_status(&self, identity: Uuid, active: bool) -> Result<User, AppError> {
        let status = if active {
            UserStatus::Active
        } else {
            UserStatus::Inactive
        };

        match self.user_repo.update_status(identity, status).await {
            Ok(user) => {
                info!("Status of user {} set to {}", identity, status.as_str());
                Ok(user)
            }
            Err(AppError::Db(DbError::NotFound)) => Err(UserError::UserNotFound)?,
            Err(e) => Err(e),
        }
    }
}

fn validate_email_present(email: &str) -> Result<(), UserError> {
    if email.trim().is_empty() {
        return Err(UserError::EmptyEmail);
    }
    Ok(())
}

/// Password checks in contract order: presence, then minimum length, then
/// confirmation match. Length counts characters, not bytes, so multibyte
/// input is not over-credited.
fn validate_password(
    password: &str,
    confirmation: &str,
    min_length: usize,
) -> Result<(), UserError> {
    if password.is_empty() {
        return Err(UserError::PasswordRequirements);
    }
    if password.chars().count() < min_length {
        return Err(UserError::PasswordRequirements);
    }
    if password != confirmation {
        return Err(UserError::PasswordsDontMatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::audit::{stamp_insert, stamp_update};
    use crate::service::token_service::TokenConfig;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const MIN: usize = 8;

    #[test]
    fn empty_email_is_a_validation_error() {
        assert_eq!(validate_email_present(""), Err(UserError::EmptyEmail));
        assert_eq!(validate_email_present("   "), Err(UserError::EmptyEmail));
        assert_eq!(validate_email_present("carlos@itguy.com"), Ok(()));
    }

    #[test]
    fn empty_password_fails_requirements() {
        assert_eq!(
            validate_password("", "S3cretP@$$", MIN),
            Err(UserError::PasswordRequirements)
        );
    }

    #[test]
    fn short_password_fails_requirements() {
        assert_eq!(
            validate_password("S3cr", "S3cretP@$$", MIN),
            Err(UserError::PasswordRequirements)
        );
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // Four two-byte characters: 8 bytes, but only 4 characters.
        assert_eq!(
            validate_password("ääää", "ääää", MIN),
            Err(UserError::PasswordRequirements)
        );
        // Eight multibyte characters clear the minimum.
        assert_eq!(validate_password("ääääääää", "ääääääää", MIN), Ok(()));
    }

    #[test]
    fn mismatch_is_only_reported_after_the_length_check_passes() {
        // Short and mismatched: the length error wins.
        assert_eq!(
            validate_password("S3cr", "different", MIN),
            Err(UserError::PasswordRequirements)
        );
        // Long enough but mismatched: the distinct mismatch error.
        assert_eq!(
            validate_password("Z3cretP@$$", "S3cretP@$$", MIN),
            Err(UserError::PasswordsDontMatch)
        );
    }

    #[test]
    fn matching_password_of_sufficient_length_passes() {
        assert_eq!(validate_password("S3cretP@$$", "S3cretP@$$", MIN), Ok(()));
    }

    // In-memory stores with the same observable semantics as the Postgres
    // repositories: unique email on create, superseded rows invisible to
    // refresh-token lookups, one-winner rotation.

    #[derive(Clone, Default)]
    struct InMemoryUserRepository {
        users: Arc<Mutex<Vec<User>>>,
        lookups: Arc<AtomicUsize>,
        // Simulates losing the uniqueness race: the pre-check sees nothing,
        // but the insert still hits the named constraint.
        conflict_on_create: Arc<Mutex<Option<String>>>,
    }

    #[async_trait]
    impl UserRepositoryTrait for InMemoryUserRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_identity(&self, identity: Uuid) -> Result<Option<User>, AppError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.identity == identity)
                .cloned())
        }

        async fn create(&self, mut user: User) -> Result<User, AppError> {
            if let Some(constraint) = self.conflict_on_create.lock().unwrap().clone() {
                return Err(AppError::Db(DbError::Conflict(constraint)));
            }

            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(AppError::Db(DbError::Conflict("users_email_key".to_string())));
            }

            stamp_insert(&mut user);
            user.id = users.len() as i64 + 1;
            users.push(user.clone());
            Ok(user)
        }

        async fn update_status(
            &self,
            identity: Uuid,
            status: UserStatus,
        ) -> Result<User, AppError> {
            let mut users = self.users.lock().unwrap();
            let Some(user) = users.iter_mut().find(|u| u.identity == identity) else {
                return Err(AppError::Db(DbError::NotFound));
            };

            let prior = user.clone();
            user.status = status;
            stamp_update(user, &prior);
            Ok(user.clone())
        }
    }

    #[derive(Clone, Default)]
    struct InMemoryTokenRepository {
        pairs: Arc<Mutex<Vec<(User, UserToken)>>>,
        // Simulates a concurrent rotation claiming the row between the
        // caller's lookup and the guarded update.
        claim_before_rotate: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TokenRepositoryTrait for InMemoryTokenRepository {
        async fn find_by_refresh_token(
            &self,
            refresh_token: &str,
        ) -> Result<Option<(User, UserToken)>, AppError> {
            Ok(self
                .pairs
                .lock()
                .unwrap()
                .iter()
                .find(|(_, t)| t.refresh_token == refresh_token && !t.superseded)
                .cloned())
        }

        async fn save_for_login(
            &self,
            mut token: UserToken,
            user: &User,
            at: DateTime<Utc>,
        ) -> Result<UserToken, DbError> {
            let mut pairs = self.pairs.lock().unwrap();
            stamp_insert(&mut token);
            token.id = pairs.len() as i64 + 1;

            let mut owner = user.clone();
            owner.last_logged_in = Some(at);
            pairs.push((owner, token.clone()));
            Ok(token)
        }

        async fn rotate(&self, old: &UserToken, mut new: UserToken) -> Result<UserToken, DbError> {
            let mut pairs = self.pairs.lock().unwrap();

            if self.claim_before_rotate.swap(false, Ordering::SeqCst) {
                if let Some((_, t)) = pairs.iter_mut().find(|(_, t)| t.id == old.id) {
                    t.superseded = true;
                }
            }

            // Same one-winner guard as the store's conditional update.
            let Some(idx) = pairs
                .iter()
                .position(|(_, t)| t.id == old.id && !t.superseded)
            else {
                return Err(DbError::NotFound);
            };

            pairs[idx].1.superseded = true;
            let owner = pairs[idx].0.clone();

            stamp_insert(&mut new);
            new.id = pairs.len() as i64 + 1;
            pairs.push((owner, new.clone()));
            Ok(new)
        }
    }

    fn service(
        users: InMemoryUserRepository,
        tokens: InMemoryTokenRepository,
    ) -> AccountService<InMemoryUserRepository, InMemoryTokenRepository> {
        let token_service = TokenService::from_config(TokenConfig {
            issuer: "authcore".to_string(),
            audience: "authcore-clients".to_string(),
            secret: "very-long-test-key-that-is-at-least-32-chars!!!".to_string(),
            access_ttl_hours: 7,
            refresh_ttl_hours: 60,
        })
        .unwrap();

        AccountService::with_repositories(users, tokens, token_service, MIN)
    }

    fn signup(email: &str) -> SignUpDto {
        SignUpDto {
            full_name: "Carlos Delgado".to_string(),
            password: "S3cretP@$$".to_string(),
            confirmation_password: "S3cretP@$$".to_string(),
            email: email.to_string(),
            phone: "+53 12345678".to_string(),
        }
    }

    fn login_dto(email: &str, password: &str) -> LoginDto {
        LoginDto {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_returns_a_pair_with_ordered_expiries() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        let user = service.register(signup("carlos@itguy.com")).await.unwrap();
        assert_eq!(user.status, UserStatus::Active);

        let pair = service
            .login(
                login_dto("carlos@itguy.com", "S3cretP@$$"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap();

        assert_eq!(pair.user_id, user.id);
        assert!(pair.refresh_token_expires_at > pair.access_token_expires_at);
        assert!(!pair.superseded);
    }

    #[tokio::test]
    async fn registering_the_same_email_twice_is_a_conflict() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        service.register(signup("carlos@itguy.com")).await.unwrap();
        let err = service.register(signup("carlos@itguy.com")).await.unwrap_err();

        assert!(matches!(err, AppError::User(UserError::EmailInUse)));
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_before_password_checks() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        service.register(signup("carlos@itguy.com")).await.unwrap();

        // Password is short AND mismatched; the duplicate email still wins.
        let mut payload = signup("carlos@itguy.com");
        payload.password = "x".to_string();
        payload.confirmation_password = "y".to_string();

        let err = service.register(payload).await.unwrap_err();
        assert!(matches!(err, AppError::User(UserError::EmailInUse)));
    }

    #[tokio::test]
    async fn losing_the_uniqueness_race_maps_the_constraint_to_a_business_error() {
        // Pre-check sees no duplicate; the insert itself reports the
        // violated constraint.
        let users = InMemoryUserRepository::default();
        *users.conflict_on_create.lock().unwrap() = Some("users_email_key".to_string());
        let service_email = service(users, InMemoryTokenRepository::default());

        let err = service_email.register(signup("carlos@itguy.com")).await.unwrap_err();
        assert!(matches!(err, AppError::User(UserError::EmailInUse)));

        let users = InMemoryUserRepository::default();
        *users.conflict_on_create.lock().unwrap() = Some("users_identity_key".to_string());
        let service_identity = service(users, InMemoryTokenRepository::default());

        let err = service_identity.register(signup("carlos@itguy.com")).await.unwrap_err();
        assert!(matches!(err, AppError::User(UserError::IdentityInUse)));
    }

    #[tokio::test]
    async fn login_with_empty_email_fails_before_any_store_lookup() {
        let users = InMemoryUserRepository::default();
        let lookups = Arc::clone(&users.lookups);
        let service = service(users, InMemoryTokenRepository::default());

        let err = service
            .login(login_dto("", "S3cretP@$$"), DeviceDescriptor::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::User(UserError::EmptyEmail)));
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_not_found() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        let err = service
            .login(
                login_dto("nobody@itguy.com", "S3cretP@$$"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::User(UserError::UserNotFound)));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        service.register(signup("carlos@itguy.com")).await.unwrap();
        let err = service
            .login(
                login_dto("carlos@itguy.com", "WrongP@$$word"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::User(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn refresh_rotates_the_pair_and_retires_the_old_token() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        service.register(signup("carlos@itguy.com")).await.unwrap();
        let first = service
            .login(
                login_dto("carlos@itguy.com", "S3cretP@$$"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap();

        let second = service.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert!(!second.superseded);

        // The retired token is indistinguishable from an unknown one.
        let err = service.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Token(TokenError::TokenNotFound)));
    }

    #[tokio::test]
    async fn refresh_with_an_expired_token_is_rejected() {
        let tokens = InMemoryTokenRepository::default();
        let service = service(InMemoryUserRepository::default(), tokens.clone());

        service.register(signup("carlos@itguy.com")).await.unwrap();
        let pair = service
            .login(
                login_dto("carlos@itguy.com", "S3cretP@$$"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap();

        tokens.pairs.lock().unwrap()[0].1.refresh_token_expires_at =
            Utc::now() - Duration::hours(1);

        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Token(TokenError::TokenExpired)));
    }

    #[tokio::test]
    async fn refresh_losing_the_rotation_race_is_rejected_as_unknown() {
        let tokens = InMemoryTokenRepository::default();
        let service = service(InMemoryUserRepository::default(), tokens.clone());

        service.register(signup("carlos@itguy.com")).await.unwrap();
        let pair = service
            .login(
                login_dto("carlos@itguy.com", "S3cretP@$$"),
                DeviceDescriptor::default(),
            )
            .await
            .unwrap();

        // The lookup sees the pair live, but another rotation claims it
        // before the guarded update runs; the loser gets the unknown-token
        // answer.
        tokens.claim_before_rotate.store(true, Ordering::SeqCst);

        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::Token(TokenError::TokenNotFound)));
    }

    #[tokio::test]
    async fn status_change_for_unknown_identity_is_not_found() {
        let service = service(
            InMemoryUserRepository::default(),
            InMemoryTokenRepository::default(),
        );

        let err = service
            .set_active_status(Uuid::new_v4(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::User(UserError::UserNotFound)));
    }

    #[tokio::test]
    async fn status_change_deactivates_and_reactivates() {
        let users = InMemoryUserRepository::default();
        let service = service(users, InMemoryTokenRepository::default());

        let user = service.register(signup("carlos@itguy.com")).await.unwrap();

        let updated = service.set_active_status(user.identity, false).await.unwrap();
        assert_eq!(updated.status, UserStatus::Inactive);

        let updated = service.set_active_status(user.identity, true).await.unwrap();
        assert_eq!(updated.status, UserStatus::Active);
    }
}
