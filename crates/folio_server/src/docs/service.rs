use crate::db::{
    DocumentRecord, DocumentSummary, DocumentUpdate, Repo, ShareRecord, VersionRecord,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use folio_core::access::{Access, SharePermission, Visibility, resolve_access};
use folio_core::mentions::extract_mentioned_emails;
use folio_core::validate;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Document service: access-gated reads and writes, the version archiver,
/// and the sharing engine.
///
/// Every save runs the same pipeline: gate access, archive the previous
/// content if it changed, apply the present fields, then scan the new
/// content for mentions and extend sharing.
pub struct DocumentService {
    repo: Arc<Repo>,
}

/// A document together with the requester's resolved access
#[derive(Debug)]
pub struct DocumentView {
    pub document: DocumentRecord,
    pub owner_email: String,
    pub access: Access,
}

/// The requester's documents, split into owned and shared-with-them
#[derive(Debug)]
pub struct DocumentListing {
    pub owned: Vec<DocumentSummary>,
    pub shared: Vec<DocumentSummary>,
}

/// Error types for document operations
#[derive(Debug)]
pub enum DocError {
    /// Document does not exist, or the requester may not learn that it does
    NotFound,
    /// Requester lacks the permission for this operation
    Forbidden(&'static str),
    /// Request is malformed (empty title, empty update, ...)
    Validation(String),
    /// Share target could not be resolved to an account
    UnknownUser,
    /// A document cannot be shared with its owner
    SelfShare,
    /// Database error
    DatabaseError(String),
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocError::NotFound => write!(f, "Document not found or access denied."),
            DocError::Forbidden(msg) => write!(f, "{}", msg),
            DocError::Validation(msg) => write!(f, "{}", msg),
            DocError::UnknownUser => write!(f, "User not found."),
            DocError::SelfShare => write!(f, "Cannot share a document with yourself."),
            DocError::DatabaseError(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for DocError {}

impl From<rusqlite::Error> for DocError {
    fn from(e: rusqlite::Error) -> Self {
        DocError::DatabaseError(e.to_string())
    }
}

impl IntoResponse for DocError {
    fn into_response(self) -> Response {
        let status = match &self {
            DocError::NotFound | DocError::UnknownUser => StatusCode::NOT_FOUND,
            DocError::Forbidden(_) => StatusCode::FORBIDDEN,
            DocError::Validation(_) | DocError::SelfShare => StatusCode::BAD_REQUEST,
            DocError::DatabaseError(e) => {
                error!("Document operation failed: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error" })),
                )
                    .into_response();
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

impl DocumentService {
    /// Create a new DocumentService
    pub fn new(repo: Arc<Repo>) -> Self {
        Self { repo }
    }

    /// Load a document and resolve the requester's access to it
    fn load(
        &self,
        document_id: &str,
        requester: Option<&str>,
    ) -> Result<(DocumentRecord, Access), DocError> {
        let doc = self
            .repo
            .get_document(document_id)?
            .ok_or(DocError::NotFound)?;
        let share = match requester {
            Some(user_id) => self.repo.get_share(document_id, user_id)?,
            None => None,
        };
        let access = resolve_access(&doc.owner_id, doc.visibility, share, requester);
        Ok((doc, access))
    }

    /// Create a document owned by `owner_id`
    pub fn create(
        &self,
        owner_id: &str,
        title: &str,
        content: &str,
        visibility: Visibility,
    ) -> Result<DocumentRecord, DocError> {
        validate::validate_title(title).map_err(|e| DocError::Validation(e.to_string()))?;
        Ok(self.repo.create_document(owner_id, title, content, visibility)?)
    }

    /// Fetch a document for reading. Private documents are reported as
    /// missing to requesters without access, so their existence never leaks.
    pub fn get(&self, document_id: &str, requester: Option<&str>) -> Result<DocumentView, DocError> {
        let (doc, access) = self.load(document_id, requester)?;
        if !access.can_read() {
            return Err(DocError::NotFound);
        }
        let owner_email = self
            .repo
            .get_user(&doc.owner_id)?
            .map(|u| u.email)
            .unwrap_or_default();
        Ok(DocumentView {
            document: doc,
            owner_email,
            access,
        })
    }

    /// List the requester's own documents and those shared with them
    pub fn list(&self, user_id: &str, search: Option<&str>) -> Result<DocumentListing, DocError> {
        Ok(DocumentListing {
            owned: self.repo.list_owned(user_id, search)?,
            shared: self.repo.list_shared(user_id, search)?,
        })
    }

    /// Apply a save request.
    ///
    /// Gates on edit access, drops a non-owner's visibility field, archives
    /// the previous content when it changed, applies the present fields, and
    /// finally runs the mention pipeline over the new content. Mention
    /// failures never abort the save: by the time they run, the update is
    /// committed.
    pub fn update(
        &self,
        document_id: &str,
        editor_id: &str,
        mut update: DocumentUpdate,
    ) -> Result<DocumentRecord, DocError> {
        let (doc, access) = self.load(document_id, Some(editor_id))?;
        if !access.can_edit() {
            return Err(DocError::Forbidden("Permission denied to edit this document."));
        }

        // Only the owner may change visibility; a non-owner's visibility
        // field is dropped, not rejected.
        if !access.is_owner() {
            update.visibility = None;
        }
        if update.is_empty() {
            return Err(DocError::Validation("No fields to update provided.".to_string()));
        }

        let mention_content = update.content.clone();
        let Some((updated, archived)) = self.repo.apply_update(document_id, editor_id, &update)?
        else {
            return Err(DocError::NotFound);
        };
        if let Some(version) = archived {
            info!("Archived version {} of document {}", version, document_id);
        }

        if let Some(content) = mention_content {
            self.auto_share_mentions(&doc, editor_id, &content);
        }

        Ok(updated)
    }

    /// Scan `content` for mentions and grant view access to each resolved
    /// user. Each mention is handled independently: a failure is logged and
    /// the remaining mentions still run.
    fn auto_share_mentions(&self, doc: &DocumentRecord, editor_id: &str, content: &str) {
        for email in extract_mentioned_emails(content) {
            let user = match self.repo.get_user_by_email(&email.to_lowercase()) {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Mention lookup for {} failed: {}", email, e);
                    continue;
                }
            };

            // Never auto-share with the document owner or the editing user
            if user.id == doc.owner_id || user.id == editor_id {
                continue;
            }

            match self.repo.get_share(&doc.id, &user.id) {
                // An existing edit grant is never downgraded by a mention
                Ok(Some(SharePermission::Edit)) => {}
                Ok(_) => {
                    if let Err(e) = self.repo.upsert_share(&doc.id, &user.id, SharePermission::View)
                    {
                        warn!("Auto-share of document {} with {} failed: {}", doc.id, email, e);
                    } else {
                        info!("Auto-shared document {} with {} (view access)", doc.id, email);
                    }
                }
                Err(e) => {
                    warn!("Share lookup for {} failed: {}", email, e);
                }
            }
        }
    }

    /// Version history, newest first. Gated like a content read.
    pub fn versions(
        &self,
        document_id: &str,
        requester: Option<&str>,
    ) -> Result<Vec<VersionRecord>, DocError> {
        let (_, access) = self.load(document_id, requester)?;
        if !access.can_read() {
            return Err(DocError::NotFound);
        }
        Ok(self.repo.list_versions(document_id)?)
    }

    /// Users a document is shared with. Owner only.
    pub fn shares(&self, document_id: &str, requester: &str) -> Result<Vec<ShareRecord>, DocError> {
        let (_, access) = self.load(document_id, Some(requester))?;
        if !access.is_owner() {
            return Err(DocError::Forbidden(
                "Permission denied. Only the document owner can manage sharing.",
            ));
        }
        Ok(self.repo.list_shares(document_id)?)
    }

    /// Grant or overwrite a share. Owner only; an explicit grant may
    /// downgrade an existing one.
    pub fn share(
        &self,
        document_id: &str,
        requester: &str,
        target_email: &str,
        permission: SharePermission,
    ) -> Result<(), DocError> {
        let (doc, access) = self.load(document_id, Some(requester))?;
        if !access.is_owner() {
            return Err(DocError::Forbidden(
                "Permission denied. Only the document owner can manage sharing.",
            ));
        }

        let target = self
            .repo
            .get_user_by_email(&target_email.trim().to_lowercase())?
            .ok_or(DocError::UnknownUser)?;
        if target.id == doc.owner_id {
            return Err(DocError::SelfShare);
        }

        self.repo.upsert_share(document_id, &target.id, permission)?;
        Ok(())
    }

    /// Remove a share. Owner only; removing an absent share is a no-op.
    pub fn unshare(
        &self,
        document_id: &str,
        requester: &str,
        target_email: &str,
    ) -> Result<(), DocError> {
        let (_, access) = self.load(document_id, Some(requester))?;
        if !access.is_owner() {
            return Err(DocError::Forbidden(
                "Permission denied. Only the document owner can manage sharing.",
            ));
        }

        let target = self
            .repo
            .get_user_by_email(&target_email.trim().to_lowercase())?
            .ok_or(DocError::UnknownUser)?;
        self.repo.delete_share(document_id, &target.id)?;
        Ok(())
    }
}
