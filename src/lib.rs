//! # Mediateka (media collection backend)
//!
//! `mediateka` is the backend for a course-style media collection service
//! (users, collections, multimedia items). This crate carries the part of
//! the system with real design content: credential-based login with
//! brute-force lockout and role-scoped session authorization.
//!
//! ## Login & Lockout
//!
//! Passwords are verified against a per-account salted SHA-256 digest; the
//! plaintext never reaches the database. Each account keeps a counter of
//! consecutive failed attempts since the last successful login or unblock.
//! The third consecutive failure blocks the account, and a blocked account
//! rejects every attempt, correct password included, until an administrator
//! unblocks it.
//!
//! - **Enumeration safety:** an unknown username and a wrong password return
//!   the same `401` payload; only a blocked account answers distinctly (`403`).
//! - **Counter discipline:** failure counts are incremented with a single
//!   atomic `UPDATE ... RETURNING`, so concurrent attempts never lose an
//!   increment.
//!
//! ## Sessions & Authorization
//!
//! A successful login resets the failure counter and issues a session in the
//! same transaction. The session row stores a hash of the token plus a
//! snapshot of `account_id`, `username`, and `role` taken at login time;
//! later role or block changes only take effect at re-authentication.
//! Protected routes go through two composable checks: authenticated at all
//! (`401` when not), and role membership for the operation (`403` when not).
//!
//! Collection/multimedia CRUD, catalog search, and file uploads live in
//! collaborating services and consume this crate's session gate.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
