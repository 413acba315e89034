use crate::auth::{AuthTokens, PasswordResetService, RequireAuth, ResetError};
use crate::db::Repo;
use crate::email::EmailService;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use folio_core::validate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthState {
    pub repo: Arc<Repo>,
    pub tokens: Arc<AuthTokens>,
    pub reset_service: Arc<PasswordResetService>,
    pub email_service: Arc<EmailService>,
}

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for forgot-password
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for reset-password
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// User info in responses
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Response for forgot-password
#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Only included in dev mode when email is not configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_link: Option<String>,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create auth routes
pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_current_user))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
        .with_state(state)
}

/// POST /auth/register - Create an account
async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_lowercase();

    if let Err(e) = validate::validate_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response();
    }
    if let Err(e) = validate::validate_password(&body.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response();
    }

    match state.repo.get_user_by_email(&email) {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "User with this email already exists.".to_string(),
                }),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up user: {}", e);
            return internal_error();
        }
    }

    let password_hash = match bcrypt::hash(&body.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return internal_error();
        }
    };

    match state.repo.create_user(&email, &password_hash) {
        Ok(user) => {
            info!("Registered new user {}", user.email);
            (
                StatusCode::CREATED,
                Json(UserResponse {
                    id: user.id,
                    email: user.email,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to create user: {}", e);
            internal_error()
        }
    }
}

/// POST /auth/login - Exchange credentials for a bearer token
async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    let email = body.email.trim().to_lowercase();

    let user = match state.repo.get_user_by_email(&email) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return invalid_credentials();
        }
        Err(e) => {
            error!("Failed to look up user: {}", e);
            return internal_error();
        }
    };

    match bcrypt::verify(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return invalid_credentials();
        }
        Err(e) => {
            error!("Failed to verify password: {}", e);
            return internal_error();
        }
    }

    match state.tokens.issue(&user.id, &user.email) {
        Ok(token) => {
            info!("User {} logged in successfully", user.email);
            Json(TokenResponse { token }).into_response()
        }
        Err(e) => {
            error!("Failed to issue token: {}", e);
            internal_error()
        }
    }
}

/// GET /auth/me - Get current user info
async fn get_current_user(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
    Json(UserResponse {
        id: auth.id,
        email: auth.email,
    })
}

/// POST /auth/forgot-password - Request a password reset link
///
/// Always answers with the same generic message, whether or not the account
/// exists. The mail send is fire-and-forget: a failure is logged, never
/// surfaced.
async fn forgot_password(
    State(state): State<AuthState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> impl IntoResponse {
    let generic =
        "If an account with that email exists, a password reset link has been sent.".to_string();

    let token = match state.reset_service.request_reset(&body.email) {
        Ok(Some(token)) => token,
        Ok(None) => {
            return Json(ForgotPasswordResponse {
                message: generic,
                dev_link: None,
            })
            .into_response();
        }
        Err(ResetError::RateLimited) => {
            warn!("Rate limited password reset request");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    error: "Too many requests. Please try again later.".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            error!("Failed to create reset token: {}", e);
            return internal_error();
        }
    };

    let reset_url = state.reset_service.build_reset_url(&token);

    if state.email_service.is_configured() {
        let email_service = state.email_service.clone();
        let to = body.email.trim().to_lowercase();
        tokio::spawn(async move {
            if let Err(e) = email_service.send_password_reset(&to, &reset_url).await {
                warn!("Failed to send password reset email to {}: {}", to, e);
            }
        });

        Json(ForgotPasswordResponse {
            message: generic,
            dev_link: None,
        })
        .into_response()
    } else {
        // Dev mode: return the link directly
        warn!(
            "Email not configured, returning reset link directly (dev mode only!): {}",
            reset_url
        );
        Json(ForgotPasswordResponse {
            message: generic,
            dev_link: Some(reset_url),
        })
        .into_response()
    }
}

/// POST /auth/reset-password/{token} - Redeem a reset token
async fn reset_password(
    State(state): State<AuthState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> impl IntoResponse {
    match state.reset_service.reset_password(&token, &body.new_password) {
        Ok(()) => Json(MessageResponse {
            message: "Your password has been reset successfully.".to_string(),
        })
        .into_response(),
        Err(e @ (ResetError::InvalidToken | ResetError::WeakPassword)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to reset password: {}", e);
            internal_error()
        }
    }
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials.".to_string(),
        }),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
