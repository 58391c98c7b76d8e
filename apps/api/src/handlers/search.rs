use axum::Json;
use axum::extract::{Query, State};
use tower_sessions::Session;

use crate::auth::optional_principal;
use crate::dto::{DocumentResponse, SearchQuery, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn search_documents_handler(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let principal = optional_principal(&session).await?;
    let documents = state
        .document_service
        .search(principal, &query.q)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();

    Ok(Json(documents))
}

pub async fn search_users_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .account_service
        .search(&query.q)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}
