//! Core domain logic for Folio, a collaborative document service.
//!
//! This crate holds the pure, I/O-free pieces of the system:
//!
//! - **Access resolution**: a document has one owner, optional per-user
//!   share grants, and a visibility flag. [`access::resolve_access`] computes
//!   the effective [`access::Access`] of a requester from those inputs.
//! - **Mention scanning**: [`mentions::extract_mentioned_emails`] finds
//!   `@email` markers in document content; the server grants view access to
//!   each mentioned user on save.
//! - **Validation**: shape checks for user-supplied emails, passwords, and
//!   document titles.
//!
//! The server crate composes these against its persistence layer; nothing
//! here touches a database or the network.

#![warn(missing_docs)]

/// Document access model and permission resolution
pub mod access;

/// Mention scanning (`@email` markers in document content)
pub mod mentions;

/// Input validation (emails, passwords, titles)
pub mod validate;

pub use access::{Access, SharePermission, Visibility, resolve_access};
pub use mentions::extract_mentioned_emails;
