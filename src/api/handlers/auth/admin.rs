//! Administrative endpoints.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::{error, info};

use super::account::Role;
use super::principal::{gate_response, require_role};
use super::storage::unblock_account;
use super::types::{ErrorResponse, UnblockRequest};
use super::utils::valid_username;

#[utoipa::path(
    post,
    path = "/v1/auth/unblock",
    request_body = UnblockRequest,
    responses(
        (status = 204, description = "Account unblocked, failure counter reset"),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn unblock(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<UnblockRequest>>,
) -> impl IntoResponse {
    let admin = match require_role(&headers, &pool, &[Role::Admin]).await {
        Ok(session) => session,
        Err(status) => return gate_response(status).into_response(),
    };

    let request: UnblockRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing payload")),
            )
                .into_response()
        }
    };

    let username = request.username.trim();
    if !valid_username(username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid username")),
        )
            .into_response();
    }

    match unblock_account(&pool, username).await {
        Ok(Some(_)) => {
            info!(admin = %admin.username, username, "account unblocked");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Unknown username")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to unblock account: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Unblock failed")),
            )
                .into_response()
        }
    }
}
