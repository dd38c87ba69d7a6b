//! Credential verification and the lockout state machine.
//!
//! An account is `Active` while its consecutive-failure count stays below the
//! threshold and `Blocked` afterwards. Blocked is sticky: only an
//! administrative unblock leaves it. The functions here are framework-free
//! and generic over the [`AccountStore`] seam so the state machine is
//! testable without an HTTP harness or a database.

use anyhow::Result;
use tracing::info;

use super::account::{Account, AccountStore, LOCKOUT_THRESHOLD};
use super::password;
use super::session::Session;

/// Classification of a single login attempt.
#[derive(Debug)]
pub(crate) enum VerifyOutcome {
    /// Credentials match and the account is not blocked. The caller must
    /// reset the failure counter when issuing the session.
    Match(Account),
    /// Unknown username. No counter is touched for unknown names.
    NoAccount,
    /// Wrong password. `locked_now` is true only on the attempt that reached
    /// the lockout threshold, so the caller can answer with the blocked
    /// message instead of the generic one.
    WrongPassword { locked_now: bool },
    /// The account was already blocked; the password is not evaluated.
    Blocked,
}

/// Verify a presented username/password pair and drive the lockout
/// transitions for wrong passwords.
pub(crate) async fn verify_credentials<S: AccountStore>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<VerifyOutcome> {
    let Some(account) = store.find_by_username(username).await? else {
        return Ok(VerifyOutcome::NoAccount);
    };

    if account.blocked {
        return Ok(VerifyOutcome::Blocked);
    }

    if password::password_matches(&account, password) {
        return Ok(VerifyOutcome::Match(account));
    }

    let count = store.record_failure(account.id).await?;
    if count >= LOCKOUT_THRESHOLD {
        store.set_blocked(account.id, true).await?;
        info!(username, count, "account blocked after repeated failures");
        return Ok(VerifyOutcome::WrongPassword { locked_now: true });
    }

    Ok(VerifyOutcome::WrongPassword { locked_now: false })
}

/// Outcome of a full login attempt, collapsed to what the caller may see.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    Success(Session),
    /// Unknown username or wrong password below the threshold. The two are
    /// deliberately indistinguishable here.
    InvalidCredentials,
    /// Blocked, whether just now or on an earlier attempt.
    Blocked,
}

/// Full login flow over the store seam: verify, then reset the counter and
/// snapshot a session on match.
///
/// The HTTP handler uses the transactional Postgres variant in `storage` to
/// persist the session token; the sequencing here is the same.
pub(crate) async fn attempt_login<S: AccountStore>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    match verify_credentials(store, username, password).await? {
        VerifyOutcome::Match(account) => {
            store.reset_failures(account.id).await?;
            Ok(LoginOutcome::Success(Session::snapshot(&account)))
        }
        VerifyOutcome::NoAccount | VerifyOutcome::WrongPassword { locked_now: false } => {
            Ok(LoginOutcome::InvalidCredentials)
        }
        VerifyOutcome::WrongPassword { locked_now: true } | VerifyOutcome::Blocked => {
            Ok(LoginOutcome::Blocked)
        }
    }
}

/// Administrative unblock. Clearing the flag resets the counter as well,
/// restoring the invariant that an active account counts from zero.
pub(crate) async fn unblock<S: AccountStore>(store: &S, account_id: uuid::Uuid) -> Result<()> {
    store.set_blocked(account_id, false).await?;
    store.reset_failures(account_id).await?;
    Ok(())
}
