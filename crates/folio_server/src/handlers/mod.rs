pub mod auth;
pub mod documents;

pub use auth::auth_routes;
pub use documents::document_routes;
