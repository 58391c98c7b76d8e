use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use docman_core::{Principal, UserId};
use docman_domain::AccountUpdate;
use tower_sessions::Session;

use crate::auth::optional_principal;
use crate::dto::{
    DocumentListResponse, DocumentResponse, PageQuery, UpdateUserRequest, UserListResponse,
    UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let page = query.into_page_request()?;
    let listing = state.account_service.list(page).await?;

    Ok(Json(UserListResponse {
        users: listing
            .accounts
            .into_iter()
            .map(UserResponse::from)
            .collect(),
        total_count: listing.total_count,
        page: listing.page,
    }))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let account = state.account_service.fetch(UserId::from_i64(id)).await?;
    Ok(Json(UserResponse::from(account)))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let update = AccountUpdate {
        email: payload.email,
        username: payload.username,
        full_name: payload.full_name,
        bio: payload.bio,
    };
    let account = state
        .account_service
        .update_profile(principal, UserId::from_i64(id), update)
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .account_service
        .delete(principal, UserId::from_i64(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists one author's documents through the author-scoped visibility rule.
pub async fn list_user_documents_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<DocumentListResponse>> {
    let principal = optional_principal(&session).await?;
    let page = query.into_page_request()?;

    // Listing documents for an absent author yields not-found, matching the
    // user endpoints.
    state.account_service.fetch(UserId::from_i64(id)).await?;

    let listing = state
        .document_service
        .list_for_author(principal, UserId::from_i64(id), page)
        .await?;

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
