//! Authorization gate: authentication and role membership checks.
//!
//! Two composable filters sit in front of protected operations: is there a
//! valid session at all, and does its role belong to the allowed set. The
//! decision itself is a pure function over the session snapshot, independent
//! of the transport, so it is testable without an HTTP harness. Rejections
//! distinguish `401` (no session) from `403` (role mismatch).

use axum::{http::HeaderMap, http::StatusCode, Json};
use sqlx::PgPool;

use super::account::Role;
use super::session::{authenticate_session, Session};
use super::types::ErrorResponse;

/// Decision of the pure authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Unauthenticated,
    Forbidden,
}

/// Pure gate over an already-resolved session.
///
/// An empty `allowed` set means any authenticated session passes; the role
/// filter only applies on top of authentication.
#[must_use]
pub fn authorize(session: Option<&Session>, allowed: &[Role]) -> Access {
    let Some(session) = session else {
        return Access::Unauthenticated;
    };
    if allowed.is_empty() || allowed.contains(&session.role) {
        Access::Granted
    } else {
        Access::Forbidden
    }
}

/// Resolve the request's session or reject with `401`.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Session, StatusCode> {
    require_role(headers, pool, &[]).await
}

/// Resolve the request's session and require role membership.
///
/// `401` for a missing/invalid session, `403` for a role outside `allowed`.
pub(crate) async fn require_role(
    headers: &HeaderMap,
    pool: &PgPool,
    allowed: &[Role],
) -> Result<Session, StatusCode> {
    let session = authenticate_session(headers, pool).await?;
    match authorize(session.as_ref(), allowed) {
        Access::Granted => session.ok_or(StatusCode::INTERNAL_SERVER_ERROR),
        Access::Unauthenticated => Err(StatusCode::UNAUTHORIZED),
        Access::Forbidden => Err(StatusCode::FORBIDDEN),
    }
}

/// Map a gate rejection to its user-visible payload.
pub(super) fn gate_response(status: StatusCode) -> (StatusCode, Json<ErrorResponse>) {
    let message = match status {
        StatusCode::UNAUTHORIZED => "Not signed in",
        StatusCode::FORBIDDEN => "Access denied",
        _ => "Session lookup failed",
    };
    (status, Json(ErrorResponse::new(message)))
}
