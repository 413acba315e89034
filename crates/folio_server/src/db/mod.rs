mod repo;
mod schema;

pub use repo::{
    DocumentRecord, DocumentSummary, DocumentUpdate, Repo, ShareRecord, UserRecord, VersionRecord,
};
pub use schema::init_database;
