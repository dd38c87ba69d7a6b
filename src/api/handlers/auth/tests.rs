//! Auth module tests: lockout state machine, session issuance, and the
//! HTTP handlers' input handling.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::account::{Account, AccountStore, Role, LOCKOUT_THRESHOLD};
use super::lockout::{attempt_login, unblock, LoginOutcome};
use super::login::login;
use super::password::{generate_salt, hash_password};
use super::session::{logout, session};
use super::state::AuthConfig;
use super::types::{LoginRequest, UnblockRequest};

/// In-memory [`AccountStore`]: one mutex over the whole account map, so
/// every counter update is serialized the way a row-locked database would.
struct MemoryAccountStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(
                accounts
                    .into_iter()
                    .map(|account| (account.id, account))
                    .collect(),
            ),
        }
    }

    async fn failure_count(&self, account_id: Uuid) -> i32 {
        self.accounts
            .lock()
            .await
            .get(&account_id)
            .map_or(0, |account| account.failed_login_count)
    }

    async fn is_blocked(&self, account_id: Uuid) -> bool {
        self.accounts
            .lock()
            .await
            .get(&account_id)
            .is_some_and(|account| account.blocked)
    }
}

impl AccountStore for MemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .await
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn record_failure(&self, account_id: Uuid) -> Result<i32> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&account_id)
            .ok_or_else(|| anyhow!("no such account"))?;
        account.failed_login_count += 1;
        Ok(account.failed_login_count)
    }

    async fn set_blocked(&self, account_id: Uuid, blocked: bool) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&account_id)
            .ok_or_else(|| anyhow!("no such account"))?;
        account.blocked = blocked;
        Ok(())
    }

    async fn reset_failures(&self, account_id: Uuid) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(&account_id)
            .ok_or_else(|| anyhow!("no such account"))?;
        account.failed_login_count = 0;
        Ok(())
    }
}

fn new_account(username: &str, password: &str, role: Role) -> Account {
    let salt = generate_salt().expect("salt");
    Account {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: hash_password(password, &salt),
        salt,
        role,
        blocked: false,
        failed_login_count: 0,
    }
}

#[tokio::test]
async fn wrong_password_increments_by_one_below_threshold() -> Result<()> {
    let alice = new_account("alice", "P", Role::User);
    let id = alice.id;
    let store = MemoryAccountStore::new(vec![alice]);

    let outcome = attempt_login(&store, "alice", "wrong").await?;
    assert_eq!(outcome, LoginOutcome::InvalidCredentials);
    assert_eq!(store.failure_count(id).await, 1);
    assert!(!store.is_blocked(id).await);

    let outcome = attempt_login(&store, "alice", "wrong").await?;
    assert_eq!(outcome, LoginOutcome::InvalidCredentials);
    assert_eq!(store.failure_count(id).await, 2);
    assert!(!store.is_blocked(id).await);
    Ok(())
}

#[tokio::test]
async fn third_failure_blocks_and_blocking_is_sticky() -> Result<()> {
    let alice = new_account("alice", "P", Role::User);
    let id = alice.id;
    let store = MemoryAccountStore::new(vec![alice]);

    // wrong, wrong, wrong, correct -> 401, 401, 403(blocked), 403(blocked)
    assert_eq!(
        attempt_login(&store, "alice", "wrong").await?,
        LoginOutcome::InvalidCredentials
    );
    assert_eq!(
        attempt_login(&store, "alice", "wrong").await?,
        LoginOutcome::InvalidCredentials
    );
    assert_eq!(
        attempt_login(&store, "alice", "wrong").await?,
        LoginOutcome::Blocked
    );
    assert!(store.is_blocked(id).await);
    assert!(store.failure_count(id).await >= LOCKOUT_THRESHOLD);

    // The correct password after blocking still yields Blocked, not Success.
    assert_eq!(
        attempt_login(&store, "alice", "P").await?,
        LoginOutcome::Blocked
    );
    // Already-blocked attempts do not touch the counter.
    assert_eq!(store.failure_count(id).await, LOCKOUT_THRESHOLD);
    Ok(())
}

#[tokio::test]
async fn successful_login_resets_counter_and_never_blocks() -> Result<()> {
    let alice = new_account("alice", "P", Role::Moderator);
    let id = alice.id;
    let store = MemoryAccountStore::new(vec![alice]);

    assert_eq!(
        attempt_login(&store, "alice", "wrong").await?,
        LoginOutcome::InvalidCredentials
    );
    assert_eq!(store.failure_count(id).await, 1);

    let outcome = attempt_login(&store, "alice", "P").await?;
    let LoginOutcome::Success(session) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(session.account_id, id);
    assert_eq!(session.username, "alice");
    assert_eq!(session.role, Role::Moderator);
    assert_eq!(store.failure_count(id).await, 0);
    assert!(!store.is_blocked(id).await);
    Ok(())
}

#[tokio::test]
async fn unknown_username_is_indistinguishable_from_wrong_password() -> Result<()> {
    let alice = new_account("alice", "P", Role::User);
    let id = alice.id;
    let store = MemoryAccountStore::new(vec![alice]);

    let unknown = attempt_login(&store, "nobody", "whatever").await?;
    let wrong = attempt_login(&store, "alice", "wrong").await?;
    assert_eq!(unknown, LoginOutcome::InvalidCredentials);
    assert_eq!(unknown, wrong);

    // Unknown usernames never mutate any counter.
    assert_eq!(store.failure_count(id).await, 1);
    Ok(())
}

#[tokio::test]
async fn unblock_resets_counter_so_next_failure_counts_from_one() -> Result<()> {
    let alice = new_account("alice", "P", Role::User);
    let id = alice.id;
    let store = MemoryAccountStore::new(vec![alice]);

    for _ in 0..3 {
        attempt_login(&store, "alice", "wrong").await?;
    }
    assert!(store.is_blocked(id).await);

    unblock(&store, id).await?;
    assert!(!store.is_blocked(id).await);
    assert_eq!(store.failure_count(id).await, 0);

    assert_eq!(
        attempt_login(&store, "alice", "wrong").await?,
        LoginOutcome::InvalidCredentials
    );
    assert_eq!(store.failure_count(id).await, 1);

    // And the account can log in again with the right password.
    let outcome = attempt_login(&store, "alice", "P").await?;
    assert!(matches!(outcome, LoginOutcome::Success(_)));
    Ok(())
}

#[tokio::test]
async fn concurrent_failures_do_not_lose_updates() -> Result<()> {
    let alice = new_account("alice", "P", Role::User);
    let id = alice.id;
    let store = Arc::new(MemoryAccountStore::new(vec![alice]));

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { attempt_login(&*store, "alice", "wrong").await }
    });
    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { attempt_login(&*store, "alice", "wrong").await }
    });

    first.await??;
    second.await??;

    // Two attempts from count 0 must deterministically land on 2, not 1.
    assert_eq!(store.failure_count(id).await, 2);
    assert!(!store.is_blocked(id).await);
    Ok(())
}

fn lazy_pool() -> Result<PgPool> {
    Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
}

fn auth_config() -> AuthConfig {
    AuthConfig::new("http://localhost:4200".to_string())
}

#[tokio::test]
async fn login_missing_payload() -> Result<()> {
    let response = login(Extension(lazy_pool()?), Extension(auth_config()), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_rejects_malformed_username() -> Result<()> {
    let payload = Json(LoginRequest {
        username: "not a username!".to_string(),
        password: "P".to_string(),
    });
    let response = login(
        Extension(lazy_pool()?),
        Extension(auth_config()),
        Some(payload),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_rejects_weak_password_shape() -> Result<()> {
    // Too short and no digit; rejected before any store access, so the
    // lazy pool is never touched and the failure counter cannot move.
    let payload = Json(LoginRequest {
        username: "alice".to_string(),
        password: "abc".to_string(),
    });
    let response = login(
        Extension(lazy_pool()?),
        Extension(auth_config()),
        Some(payload),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn session_without_token_is_unauthenticated() -> Result<()> {
    let response = session(HeaderMap::new(), Extension(lazy_pool()?))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_without_token_still_clears_cookie() -> Result<()> {
    let response = logout(
        HeaderMap::new(),
        Extension(lazy_pool()?),
        Extension(auth_config()),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn unblock_without_session_is_unauthenticated() -> Result<()> {
    let payload = Json(UnblockRequest {
        username: "alice".to_string(),
    });
    let response = super::admin::unblock(HeaderMap::new(), Extension(lazy_pool()?), Some(payload))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unblock_rejects_malformed_bearer_header_without_store_error() -> Result<()> {
    // A non-UTF8-safe or empty bearer token resolves to "no session".
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_static("Bearer "),
    );
    let response = super::admin::unblock(headers, Extension(lazy_pool()?), None)
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
