//! Account records and the credential store seam.

use anyhow::Result;
use uuid::Uuid;

/// Consecutive failed attempts that block an account.
pub(crate) const LOCKOUT_THRESHOLD: i32 = 3;

/// Closed set of role tags. Roles are assigned administratively; accounts
/// without a recognized role act as plain users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Parse the stored role tag, falling back to the baseline role.
    #[must_use]
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Self::Admin,
            Some("moderator") => Self::Moderator,
            _ => Self::User,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub salt: String,
    pub role: Role,
    pub blocked: bool,
    pub failed_login_count: i32,
}

/// Persistence seam for accounts.
///
/// `record_failure` and `reset_failures` must be atomic per account: two
/// concurrent failed attempts that both start from count N have to end at
/// N + 2, never N + 1. The Postgres implementation gets this from
/// single-statement increments; the in-memory test store from one mutex.
pub(crate) trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Increment the consecutive-failure count and return the new value.
    async fn record_failure(&self, account_id: Uuid) -> Result<i32>;

    async fn set_blocked(&self, account_id: Uuid, blocked: bool) -> Result<()>;

    /// Drive the consecutive-failure count back to zero.
    async fn reset_failures(&self, account_id: Uuid) -> Result<()>;
}
