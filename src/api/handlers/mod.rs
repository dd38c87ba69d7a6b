//! API handlers for the auth core and service plumbing.

pub mod auth;
pub mod health;
