//! Database access for accounts and sessions.

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::account::{Account, AccountStore, Role};
use super::session::Session;
use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Look up an account by its unique username.
pub(super) async fn lookup_account(pool: &PgPool, username: &str) -> Result<Option<Account>> {
    let query = r"
        SELECT id, username, password_hash, salt, role, blocked, failed_login_count
        FROM accounts
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account")?;

    Ok(row.map(|row| {
        let role: Option<String> = row.get("role");
        Account {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            salt: row.get("salt"),
            role: Role::from_db(role.as_deref()),
            blocked: row.get("blocked"),
            failed_login_count: row.get("failed_login_count"),
        }
    }))
}

async fn increment_failure_count(pool: &PgPool, account_id: Uuid) -> Result<i32> {
    // Single-statement increment; concurrent attempts cannot lose an update.
    let query = r"
        UPDATE accounts
        SET failed_login_count = failed_login_count + 1
        WHERE id = $1
        RETURNING failed_login_count
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to increment failure count")?;
    Ok(row.get("failed_login_count"))
}

async fn set_blocked_flag(pool: &PgPool, account_id: Uuid, blocked: bool) -> Result<()> {
    let query = "UPDATE accounts SET blocked = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(blocked)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update blocked flag")?;
    Ok(())
}

async fn reset_failure_count(pool: &PgPool, account_id: Uuid) -> Result<()> {
    let query = "UPDATE accounts SET failed_login_count = 0 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to reset failure count")?;
    Ok(())
}

/// [`AccountStore`] backed by the Postgres pool.
pub(super) struct PgAccountStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgAccountStore<'a> {
    pub(super) fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl AccountStore for PgAccountStore<'_> {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        lookup_account(self.pool, username).await
    }

    async fn record_failure(&self, account_id: Uuid) -> Result<i32> {
        increment_failure_count(self.pool, account_id).await
    }

    async fn set_blocked(&self, account_id: Uuid, blocked: bool) -> Result<()> {
        set_blocked_flag(self.pool, account_id, blocked).await
    }

    async fn reset_failures(&self, account_id: Uuid) -> Result<()> {
        reset_failure_count(self.pool, account_id).await
    }
}

/// Persist a successful login: reset the failure counter and insert the
/// session row in one transaction, so the caller observes both or neither.
///
/// Returns the raw session token; the database only keeps its hash.
pub(super) async fn persist_login(
    pool: &PgPool,
    account: &Account,
    ttl_seconds: i64,
) -> Result<String> {
    let reset_query = "UPDATE accounts SET failed_login_count = 0 WHERE id = $1";
    let insert_query = r"
        INSERT INTO sessions (session_hash, account_id, username, role, expires_at)
        VALUES ($1, $2, $3, $4, NOW() + ($5 * INTERVAL '1 second'))
    ";

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);

        let mut tx = pool.begin().await.context("begin login transaction")?;

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = reset_query
        );
        sqlx::query(reset_query)
            .bind(account.id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to reset failure count")?;

        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = insert_query
        );
        let result = sqlx::query(insert_query)
            .bind(&token_hash)
            .bind(account.id)
            .bind(&account.username)
            .bind(account.role.as_str())
            .bind(ttl_seconds)
            .execute(&mut *tx)
            .instrument(span)
            .await;

        match result {
            Ok(_) => {
                tx.commit().await.context("commit login transaction")?;
                return Ok(token);
            }
            // Token hash collision: a failed statement poisons the
            // transaction, so roll back and retry with a fresh token.
            Err(err) if is_unique_violation(&err) => {
                let _ = tx.rollback().await;
            }
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a session token hash into the stored snapshot, skipping expired rows.
pub(super) async fn lookup_session(pool: &PgPool, token_hash: &[u8]) -> Result<Option<Session>> {
    let query = r"
        SELECT account_id, username, role
        FROM sessions
        WHERE session_hash = $1
          AND expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| {
        let role: Option<String> = row.get("role");
        Session {
            account_id: row.get("account_id"),
            username: row.get("username"),
            role: Role::from_db(role.as_deref()),
        }
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

/// Clear the blocked flag and the failure counter in one statement, keeping
/// the invariant that an active account counts failures from zero.
pub(super) async fn unblock_account(pool: &PgPool, username: &str) -> Result<Option<Uuid>> {
    let query = r"
        UPDATE accounts
        SET blocked = FALSE, failed_login_count = 0
        WHERE username = $1
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to unblock account")?;
    Ok(row.map(|row| row.get("id")))
}
