//! Credential store: one-way adaptive password hashing.
//!
//! bcrypt embeds a random salt in each digest, so hashing the same input
//! twice yields different strings while `verify_password` still matches
//! either of them. Plaintext passwords are never logged here or anywhere.

use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password with the configured work factor.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let cost = config::config().security.bcrypt_cost;
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify a plaintext password against a stored digest.
///
/// An unparseable digest verifies as false rather than erroring: rows
/// migrated from older systems must fail authentication, not break it.
pub fn verify_password(password: &str, digest: &str) -> bool {
    bcrypt::verify(password, digest).unwrap_or(false)
}
