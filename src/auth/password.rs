use thiserror::Error;

use crate::validator::{matches_email, Validator};

/// bcrypt work factor
const COST: u32 = 12;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash a plaintext password. bcrypt is CPU heavy so it runs on the blocking pool.
pub async fn hash(plaintext: &str) -> Result<Vec<u8>, PasswordError> {
    let plaintext = plaintext.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, COST)).await??;
    Ok(hashed.into_bytes())
}

/// Compare a plaintext password against a stored hash
pub async fn matches(plaintext: &str, hash: &[u8]) -> Result<bool, PasswordError> {
    let plaintext = plaintext.to_string();
    let hash = String::from_utf8_lossy(hash).into_owned();

    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash)).await?;
    match outcome {
        Ok(matched) => Ok(matched),
        // A stored value that is not a bcrypt hash can never match
        Err(bcrypt::BcryptError::InvalidHash(_) | bcrypt::BcryptError::InvalidPrefix(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches_email(email), "email", "must be a valid email address");
}

pub fn validate_password(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}
