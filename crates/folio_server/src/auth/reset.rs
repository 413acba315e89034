use crate::config::Config;
use crate::db::Repo;
use chrono::{Duration, Utc};
use folio_core::validate;
use std::sync::Arc;

/// Password reset service
pub struct PasswordResetService {
    repo: Arc<Repo>,
    config: Arc<Config>,
}

/// Error types for password reset operations
#[derive(Debug)]
pub enum ResetError {
    /// Token not found, expired, or already used
    InvalidToken,
    /// New password fails validation
    WeakPassword,
    /// Too many reset requests (rate limited)
    RateLimited,
    /// Password hashing error
    HashError(String),
    /// Database error
    DatabaseError(String),
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetError::InvalidToken => {
                write!(f, "Password reset token is invalid or has expired")
            }
            ResetError::WeakPassword => write!(
                f,
                "Password must be at least {} characters long",
                validate::MIN_PASSWORD_LEN
            ),
            ResetError::RateLimited => {
                write!(f, "Too many requests. Please try again later.")
            }
            ResetError::HashError(e) => write!(f, "Password hashing error: {}", e),
            ResetError::DatabaseError(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ResetError {}

impl PasswordResetService {
    /// Create a new PasswordResetService
    pub fn new(repo: Arc<Repo>, config: Arc<Config>) -> Self {
        Self { repo, config }
    }

    /// Create a reset token for the account registered under `email`.
    ///
    /// Returns `Ok(None)` when no such account exists; the caller answers
    /// with the same generic message either way so the endpoint does not
    /// reveal which emails are registered.
    pub fn request_reset(&self, email: &str) -> Result<Option<String>, ResetError> {
        let email = email.trim().to_lowercase();

        let user = self
            .repo
            .get_user_by_email(&email)
            .map_err(|e| ResetError::DatabaseError(e.to_string()))?;
        let Some(user) = user else {
            return Ok(None);
        };

        // Rate limiting: max 3 tokens per hour per account
        let one_hour_ago = Utc::now() - Duration::hours(1);
        let recent_count = self
            .repo
            .count_recent_reset_tokens(&user.id, one_hour_ago)
            .map_err(|e| ResetError::DatabaseError(e.to_string()))?;

        if recent_count >= 3 {
            return Err(ResetError::RateLimited);
        }

        let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_expiry_minutes);
        let token = self
            .repo
            .create_reset_token(&user.id, expires_at)
            .map_err(|e| ResetError::DatabaseError(e.to_string()))?;

        Ok(Some(token))
    }

    /// Redeem a reset token and set the account's new password.
    ///
    /// The token is single-use: the password update and the token deletion
    /// commit together.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        validate::validate_password(new_password).map_err(|_| ResetError::WeakPassword)?;

        let hash = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)
            .map_err(|e| ResetError::HashError(e.to_string()))?;

        let redeemed = self
            .repo
            .redeem_reset_token(token, &hash)
            .map_err(|e| ResetError::DatabaseError(e.to_string()))?;

        if !redeemed {
            return Err(ResetError::InvalidToken);
        }
        Ok(())
    }

    /// Build the reset URL for a token
    pub fn build_reset_url(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.config.app_base_url, token)
    }

    /// Clean up expired tokens (should be called periodically)
    pub fn cleanup_expired(&self) -> Result<usize, ResetError> {
        self.repo
            .cleanup_expired_reset_tokens()
            .map_err(|e| ResetError::DatabaseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use rusqlite::Connection;

    fn setup_test_service() -> (PasswordResetService, Arc<Repo>) {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        let repo = Arc::new(Repo::new(conn));
        let config = Arc::new(Config::from_env().unwrap());
        (PasswordResetService::new(repo.clone(), config), repo)
    }

    #[test]
    fn test_reset_flow() {
        let (service, repo) = setup_test_service();
        let user = repo.create_user("test@example.com", "old-hash").unwrap();

        let token = service.request_reset("test@example.com").unwrap().unwrap();
        service.reset_password(&token, "brand-new-password").unwrap();

        let updated = repo.get_user(&user.id).unwrap().unwrap();
        assert_ne!(updated.password_hash, "old-hash");
        assert!(bcrypt::verify("brand-new-password", &updated.password_hash).unwrap());

        // Token was consumed
        let second_try = service.reset_password(&token, "another-password");
        assert!(matches!(second_try, Err(ResetError::InvalidToken)));
    }

    #[test]
    fn test_unknown_email_yields_no_token() {
        let (service, _repo) = setup_test_service();
        assert!(service.request_reset("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_email_is_normalized() {
        let (service, repo) = setup_test_service();
        repo.create_user("test@example.com", "hash").unwrap();

        let token = service.request_reset("  Test@Example.COM ").unwrap();
        assert!(token.is_some());
    }

    #[test]
    fn test_short_password_is_rejected_before_touching_the_token() {
        let (service, repo) = setup_test_service();
        repo.create_user("test@example.com", "hash").unwrap();
        let token = service.request_reset("test@example.com").unwrap().unwrap();

        let result = service.reset_password(&token, "tiny");
        assert!(matches!(result, Err(ResetError::WeakPassword)));

        // The token survives a failed validation
        service.reset_password(&token, "long-enough").unwrap();
    }

    #[test]
    fn test_rate_limiting() {
        let (service, repo) = setup_test_service();
        repo.create_user("ratelimit@example.com", "hash").unwrap();

        // First 3 should succeed
        for _ in 0..3 {
            service.request_reset("ratelimit@example.com").unwrap();
        }

        // 4th should be rate limited
        let result = service.request_reset("ratelimit@example.com");
        assert!(matches!(result, Err(ResetError::RateLimited)));
    }
}
