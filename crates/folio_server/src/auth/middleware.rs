use crate::auth::AuthTokens;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;

/// Authenticated user identity decoded from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Extension carrying the token verifier for the extractors
#[derive(Clone)]
pub struct AuthExtractor {
    pub tokens: Arc<AuthTokens>,
}

/// Extractor for optional authentication
///
/// Use this when auth is optional (e.g., public documents readable without
/// an account)
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthUser>);

/// Extractor for required authentication
///
/// Use this for protected endpoints - returns 401 if not authenticated
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthUser);

impl AuthExtractor {
    pub fn new(tokens: Arc<AuthTokens>) -> Self {
        Self { tokens }
    }

    /// Extract and verify the bearer token from the Authorization header
    pub fn extract_auth(&self, parts: &Parts) -> Option<AuthUser> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))?;

        let claims = self.tokens.verify(token).ok()?;

        Some(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the AuthExtractor from extensions
        let extractor = parts
            .extensions
            .get::<AuthExtractor>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Auth not configured"))?;

        Ok(OptionalAuth(extractor.extract_auth(parts)))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(auth) = OptionalAuth::from_request_parts(parts, state).await?;

        match auth {
            Some(user) => Ok(RequireAuth(user)),
            None => Err((StatusCode::UNAUTHORIZED, "Authentication required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/documents");
        if let Some(v) = value {
            builder = builder.header("Authorization", v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_extracts_valid_bearer_token() {
        let tokens = Arc::new(AuthTokens::new("test-secret", 2));
        let token = tokens.issue("user-1", "test@example.com").unwrap();
        let extractor = AuthExtractor::new(tokens);

        let parts = parts_with_header(Some(&format!("Bearer {}", token)));
        let user = extractor.extract_auth(&parts).unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email, "test@example.com");
    }

    #[test]
    fn test_missing_or_malformed_header_yields_none() {
        let extractor = AuthExtractor::new(Arc::new(AuthTokens::new("test-secret", 2)));

        assert!(extractor.extract_auth(&parts_with_header(None)).is_none());
        assert!(
            extractor
                .extract_auth(&parts_with_header(Some("Basic abc")))
                .is_none()
        );
        assert!(
            extractor
                .extract_auth(&parts_with_header(Some("Bearer not-a-token")))
                .is_none()
        );
    }
}
