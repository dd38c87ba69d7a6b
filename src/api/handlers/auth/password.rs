//! Salted password hashing and verification.
//!
//! Passwords are digested as SHA-256 over `salt ‖ password` with a random
//! per-account salt. The stored hash is replaced wholesale on password
//! change; plaintext is never persisted or compared.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::account::Account;

/// Create a random per-account salt. Issued once, immutable afterwards.
pub(crate) fn generate_salt() -> Result<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate salt")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Digest the plaintext with the account salt mixed in full.
#[must_use]
pub(crate) fn hash_password(password: &str, salt: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Compare the presented password against the stored salted hash.
#[must_use]
pub(crate) fn password_matches(account: &Account, presented: &str) -> bool {
    hash_password(presented, &account.salt) == account.password_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::account::Role;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use uuid::Uuid;

    fn account_with(password: &str, salt: &str) -> Account {
        Account {
            id: Uuid::nil(),
            username: "alice".to_string(),
            password_hash: hash_password(password, salt),
            salt: salt.to_string(),
            role: Role::User,
            blocked: false,
            failed_login_count: 0,
        }
    }

    #[test]
    fn salt_is_random_and_decodable() {
        let first = generate_salt().unwrap();
        let second = generate_salt().unwrap();
        assert_ne!(first, second);
        assert_eq!(URL_SAFE_NO_PAD.decode(first.as_bytes()).unwrap().len(), 16);
    }

    #[test]
    fn same_password_different_salt_differs() {
        assert_ne!(hash_password("P", "salt-a"), hash_password("P", "salt-b"));
    }

    #[test]
    fn matches_only_with_correct_password() {
        let account = account_with("P", "salt");
        assert!(password_matches(&account, "P"));
        assert!(!password_matches(&account, "p"));
        assert!(!password_matches(&account, ""));
    }

    #[test]
    fn hash_is_not_plain_digest_of_password() {
        // A missing salt would make the digest equal to sha2(password).
        let mut hasher = sha2::Sha256::new();
        hasher.update("P".as_bytes());
        let unsalted = hasher.finalize().to_vec();
        assert_ne!(hash_password("P", "salt"), unsalted);
    }
}
