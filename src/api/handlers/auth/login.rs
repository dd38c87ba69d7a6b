//! Login endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

use super::lockout::{verify_credentials, VerifyOutcome};
use super::session::session_cookie;
use super::state::AuthConfig;
use super::storage::{persist_login, PgAccountStore};
use super::types::{ErrorResponse, LoginRequest, LoginResponse, ACCOUNT_BLOCKED, INVALID_CREDENTIALS};
use super::utils::{valid_password, valid_username};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unknown username or wrong password", body = ErrorResponse),
        (status = 403, description = "Account is blocked", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_config: Extension<AuthConfig>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
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

    if !valid_password(&request.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Password needs at least 6 characters, 1 letter and 1 digit",
            )),
        )
            .into_response();
    }

    let store = PgAccountStore::new(&pool);
    let outcome = match verify_credentials(&store, username, &request.password).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Login attempt failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Login failed")),
            )
                .into_response();
        }
    };

    match outcome {
        VerifyOutcome::Match(account) => {
            let token =
                match persist_login(&pool, &account, auth_config.session_ttl_seconds()).await {
                    Ok(token) => token,
                    Err(err) => {
                        error!("Failed to persist login: {err}");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(ErrorResponse::new("Login failed")),
                        )
                            .into_response();
                    }
                };

            let mut headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&auth_config, &token) {
                headers.insert(SET_COOKIE, cookie);
            }

            let response = LoginResponse {
                username: account.username,
                role: account.role.as_str().to_string(),
            };
            (StatusCode::OK, headers, Json(response)).into_response()
        }
        // Unknown username and wrong password share one payload.
        VerifyOutcome::NoAccount | VerifyOutcome::WrongPassword { locked_now: false } => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(INVALID_CREDENTIALS)),
        )
            .into_response(),
        VerifyOutcome::WrongPassword { locked_now: true } | VerifyOutcome::Blocked => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(ACCOUNT_BLOCKED)),
        )
            .into_response(),
    }
}
