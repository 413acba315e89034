mod service;

pub use service::{DocError, DocumentListing, DocumentService, DocumentView};
