use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use docman_domain::{DocumentDraft, DocumentId, DocumentUpdate};
use tower_sessions::Session;

use crate::auth::{optional_principal, require_principal};
use crate::dto::{
    CreateDocumentRequest, DocumentListResponse, DocumentResponse, PageQuery,
    UpdateDocumentRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_document_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let principal = require_principal(&session).await?;
    let draft = DocumentDraft::new(payload.title, payload.content, payload.access)?;
    let document = state.document_service.create(principal, draft).await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

pub async fn list_documents_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<DocumentListResponse>> {
    let principal = optional_principal(&session).await?;
    let page = query.into_page_request()?;

    let listing = state.document_service.list(principal, page).await?;

    Ok(Json(DocumentListResponse {
        documents: listing
            .documents
            .into_iter()
            .map(DocumentResponse::from)
            .collect(),
        total_count: listing.total_count,
        page: listing.page,
    }))
}

pub async fn get_document_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<DocumentResponse>> {
    let principal = optional_principal(&session).await?;
    let document = state
        .document_service
        .fetch(principal, DocumentId::from_i64(id))
        .await?;

    Ok(Json(DocumentResponse::from(document)))
}

pub async fn update_document_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> ApiResult<Json<DocumentResponse>> {
    let principal = require_principal(&session).await?;
    let update = DocumentUpdate {
        title: payload.title,
        content: payload.content,
        access: payload.access,
    };
    let document = state
        .document_service
        .update(principal, DocumentId::from_i64(id), update)
        .await?;

    Ok(Json(DocumentResponse::from(document)))
}

pub async fn delete_document_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let principal = require_principal(&session).await?;
    state
        .document_service
        .delete(principal, DocumentId::from_i64(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
