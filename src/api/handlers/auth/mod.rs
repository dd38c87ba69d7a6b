//! Auth handlers and supporting modules.
//!
//! This module coordinates credential login, brute-force lockout, and
//! role-scoped session authorization.
//!
//! ## Lockout
//!
//! Each account carries a counter of consecutive failed logins since the last
//! success or administrative unblock. The third consecutive failure flips the
//! account to blocked, and a blocked account rejects every further attempt,
//! correct password included, until `/v1/auth/unblock` clears it.
//!
//! ## Responses
//!
//! An unknown username and a wrong password are indistinguishable on the wire
//! (`401`, same payload) so callers cannot enumerate accounts. A blocked
//! account always answers `403` with a distinct payload, including at the
//! moment the lockout threshold is reached.

pub(crate) mod account;
pub(crate) mod admin;
pub(crate) mod lockout;
pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use account::Role;
pub use principal::{authorize, Access};
pub use session::Session;
pub use state::AuthConfig;

#[cfg(test)]
mod tests;
