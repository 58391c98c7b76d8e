//! Session-based authentication handlers.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use docman_application::{AuthOutcome, RegisterParams};
use docman_core::{AppError, Principal};
use tower_sessions::Session;

use crate::dto::{
    ChangePasswordRequest, GenericMessageResponse, LoginRequest, RegisterRequest, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "principal";

/// Reads the session principal without requiring one.
///
/// Listing and read endpoints serve anonymous requesters a reduced view
/// instead of rejecting them.
pub async fn optional_principal(session: &Session) -> ApiResult<Option<Principal>> {
    let principal = session
        .get::<Principal>(SESSION_USER_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read session identity: {error}"))
        })?;

    Ok(principal)
}

/// Reads the session principal, rejecting unauthenticated requesters.
pub async fn require_principal(session: &Session) -> ApiResult<Principal> {
    optional_principal(session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()).into())
}

/// POST /auth/register - Create a member account and sign it in.
pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let account = state
        .account_service
        .register(RegisterParams {
            email: payload.email,
            username: payload.username,
            password: payload.password,
        })
        .await?;

    session
        .insert(SESSION_USER_KEY, account.principal())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// POST /auth/login - Authenticate with email and password.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let outcome = state
        .account_service
        .login(&payload.email, &payload.password)
        .await?;

    let AuthOutcome::Authenticated(account) = outcome else {
        // Generic message to prevent account enumeration.
        return Err(AppError::Unauthorized("invalid email or password".to_owned()).into());
    };

    // New session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session: {error}")))?;
    session
        .insert(SESSION_USER_KEY, account.principal())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok(Json(UserResponse::from(account)))
}

/// POST /auth/logout - Terminate the current session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Return the authenticated account.
pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserResponse>> {
    let principal = optional_principal(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let account = state.account_service.fetch(principal.id()).await?;
    Ok(Json(UserResponse::from(account)))
}

/// PUT /api/profile/password - Rotate the account password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    state
        .account_service
        .change_password(principal, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(GenericMessageResponse {
        message: "password updated".to_owned(),
    }))
}
