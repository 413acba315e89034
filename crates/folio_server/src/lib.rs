//! Folio Server
//!
//! A collaborative document server: accounts, documents with view/edit
//! sharing, append-only version history, and mention-driven auto-sharing.
//!
//! ## Features
//!
//! - **Password authentication**: bcrypt-hashed credentials, stateless JWT
//!   bearer tokens
//! - **Document sharing**: per-user view/edit grants plus public visibility
//! - **Version history**: every content-changing save archives the previous
//!   content as an immutable, monotonically numbered version
//! - **Mention auto-sharing**: `@email` markers in saved content grant view
//!   access to the mentioned users
//! - **Password reset**: single-use emailed tokens via SMTP
//!
//! ## Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 5000)
//! - `DATABASE_PATH`: Path to SQLite database (default: ./folio.db)
//! - `APP_BASE_URL`: Base URL of the web client, used in reset links
//! - `JWT_SECRET`: Secret for signing bearer tokens
//! - `TOKEN_EXPIRY_HOURS`: Bearer token expiration (default: 2)
//! - `RESET_TOKEN_EXPIRY_MINUTES`: Reset token expiration (default: 60)
//! - `SMTP_HOST`: SMTP server host
//! - `SMTP_PORT`: SMTP server port
//! - `SMTP_USERNAME`: SMTP username
//! - `SMTP_PASSWORD`: SMTP password/API key
//! - `SMTP_FROM_EMAIL`: From email address
//! - `SMTP_FROM_NAME`: From name
//! - `CORS_ORIGINS`: Comma-separated list of allowed origins

pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod email;
pub mod handlers;

pub use config::Config;
