use crate::auth::{OptionalAuth, RequireAuth};
use crate::db::{DocumentRecord, DocumentSummary, DocumentUpdate};
use crate::docs::{DocError, DocumentService};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use folio_core::access::{SharePermission, Visibility};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for document handlers
#[derive(Clone)]
pub struct DocsState {
    pub docs: Arc<DocumentService>,
}

/// Query params for the document listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// Request body for document creation
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// Request body for a document save. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub content: Option<String>,
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Request body for granting or updating a share
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
    pub permission: SharePermission,
}

/// Request body for revoking a share
#[derive(Debug, Deserialize)]
pub struct UnshareRequest {
    pub email: String,
}

/// Full document in responses
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing entry in responses
#[derive(Debug, Serialize)]
pub struct DocumentSummaryResponse {
    pub id: String,
    pub title: String,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<SharePermission>,
    pub updated_at: String,
}

/// Response for the document listing
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub owned: Vec<DocumentSummaryResponse>,
    pub shared: Vec<DocumentSummaryResponse>,
}

/// Version snapshot in responses
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version_number: i64,
    pub content: String,
    pub modified_by_email: Option<String>,
    pub modified_at: String,
}

/// Share grant in responses
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub user_id: String,
    pub email: String,
    pub permission: SharePermission,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create document routes
pub fn document_routes(state: DocsState) -> Router {
    Router::new()
        .route("/", get(list_documents))
        .route("/", post(create_document))
        .route("/{id}", get(get_document))
        .route("/{id}", put(update_document))
        .route("/{id}/versions", get(get_version_history))
        .route("/{id}/shared", get(get_shared_users))
        .route("/{id}/share", post(update_sharing))
        .route("/{id}/share", delete(remove_sharing))
        .with_state(state)
}

fn document_response(doc: DocumentRecord, owner_email: Option<String>) -> DocumentResponse {
    DocumentResponse {
        id: doc.id,
        title: doc.title,
        content: doc.content,
        visibility: doc.visibility,
        owner_email,
        created_at: doc.created_at.to_rfc3339(),
        updated_at: doc.updated_at.to_rfc3339(),
    }
}

fn summary_response(doc: DocumentSummary) -> DocumentSummaryResponse {
    DocumentSummaryResponse {
        id: doc.id,
        title: doc.title,
        visibility: doc.visibility,
        permission: doc.permission,
        updated_at: doc.updated_at.to_rfc3339(),
    }
}

/// GET /api/documents - List owned and shared documents
async fn list_documents(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, DocError> {
    let listing = state.docs.list(&auth.id, query.search.as_deref())?;
    Ok(Json(ListResponse {
        owned: listing.owned.into_iter().map(summary_response).collect(),
        shared: listing.shared.into_iter().map(summary_response).collect(),
    }))
}

/// POST /api/documents - Create a new document
async fn create_document(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Json(body): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, DocError> {
    let doc = state.docs.create(
        &auth.id,
        &body.title,
        body.content.as_deref().unwrap_or(""),
        body.visibility.unwrap_or_default(),
    )?;
    Ok((StatusCode::CREATED, Json(document_response(doc, None))))
}

/// GET /api/documents/:id - Fetch a document
///
/// Auth is optional here: public documents are readable anonymously.
async fn get_document(
    State(state): State<DocsState>,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DocError> {
    let view = state
        .docs
        .get(&id, auth.as_ref().map(|u| u.id.as_str()))?;
    Ok(Json(document_response(
        view.document,
        Some(view.owner_email),
    )))
}

/// PUT /api/documents/:id - Save a document
async fn update_document(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(body): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, DocError> {
    let update = DocumentUpdate {
        content: body.content,
        title: body.title,
        visibility: body.visibility,
    };
    let doc = state.docs.update(&id, &auth.id, update)?;
    Ok(Json(document_response(doc, None)))
}

/// GET /api/documents/:id/versions - Version history, newest first
async fn get_version_history(
    State(state): State<DocsState>,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DocError> {
    let versions = state
        .docs
        .versions(&id, auth.as_ref().map(|u| u.id.as_str()))?;
    Ok(Json(
        versions
            .into_iter()
            .map(|v| VersionResponse {
                version_number: v.version_number,
                content: v.content,
                modified_by_email: v.modified_by_email,
                modified_at: v.modified_at.to_rfc3339(),
            })
            .collect::<Vec<_>>(),
    ))
}

/// GET /api/documents/:id/shared - Users the document is shared with
async fn get_shared_users(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DocError> {
    let shares = state.docs.shares(&id, &auth.id)?;
    Ok(Json(
        shares
            .into_iter()
            .map(|s| ShareResponse {
                user_id: s.user_id,
                email: s.email,
                permission: s.permission,
            })
            .collect::<Vec<_>>(),
    ))
}

/// POST /api/documents/:id/share - Grant or update a share
async fn update_sharing(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(body): Json<ShareRequest>,
) -> Result<impl IntoResponse, DocError> {
    state.docs.share(&id, &auth.id, &body.email, body.permission)?;
    Ok(Json(MessageResponse {
        message: "User sharing updated successfully.".to_string(),
    }))
}

/// DELETE /api/documents/:id/share - Revoke a share
async fn remove_sharing(
    State(state): State<DocsState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(body): Json<UnshareRequest>,
) -> Result<impl IntoResponse, DocError> {
    state.docs.unshare(&id, &auth.id, &body.email)?;
    Ok(Json(MessageResponse {
        message: "User sharing removed successfully.".to_string(),
    }))
}
