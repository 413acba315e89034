mod middleware;
mod reset;
mod tokens;

pub use middleware::{AuthExtractor, AuthUser, OptionalAuth, RequireAuth};
pub use reset::{PasswordResetService, ResetError};
pub use tokens::{AuthTokens, Claims};
