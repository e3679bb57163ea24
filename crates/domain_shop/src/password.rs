//! Salted password hashing (argon2id)
//!
//! Stored credentials are PHC strings; plaintext passwords are never
//! persisted or compared directly.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::OnceCell;

use crate::error::ShopError;

/// Hashes `password` with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, ShopError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ShopError::Hashing(e.to_string()))
}

/// Checks `password` against a stored PHC hash
///
/// A malformed stored hash is an error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ShopError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ShopError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when a login names no account, so misses cost as much as a wrong password
pub(crate) static UNKNOWN_ACCOUNT_HASH: OnceCell<String> = OnceCell::new();

fn unknown_account_hash() -> Result<&'static str, ShopError> {
    UNKNOWN_ACCOUNT_HASH
        .get_or_try_init(|| hash_password("unknown-account"))
        .map(String::as_str)
}

/// Spends one verification on a login whose username matched nothing
///
/// Always `Ok(false)` unless hashing itself fails.
pub async fn verify_unknown_account_blocking(password: String) -> Result<bool, ShopError> {
    let stored_hash = unknown_account_hash()?.to_string();
    verify_password_blocking(password, stored_hash)
        .await
        .map(|_| false)
}

/// Runs the hash on the blocking pool so request workers stay responsive
pub async fn hash_password_blocking(password: String) -> Result<String, ShopError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ShopError::Hashing(e.to_string()))?
}

pub async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool, ShopError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ShopError::Hashing(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let h1 = hash_password("s3cret-pass").unwrap();
        let h2 = hash_password("s3cret-pass").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_plaintext_stored_value_is_rejected() {
        assert!(matches!(
            verify_password("s3cret-pass", "s3cret-pass"),
            Err(ShopError::Hashing(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_account_never_verifies() {
        let hash = unknown_account_hash().unwrap();
        assert!(hash.starts_with("$argon2id"));
        assert_eq!(unknown_account_hash().unwrap(), hash);
        assert!(!verify_unknown_account_blocking("unknown-account".to_string()).await.unwrap());
        assert!(!verify_unknown_account_blocking("s3cret-pass".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hash = hash_password_blocking("s3cret-pass".to_string()).await.unwrap();
        assert!(verify_password_blocking("s3cret-pass".to_string(), hash).await.unwrap());
    }
}
