//! Password hashing for the workspace login credential.
//!
//! The hash is a standard PHC string as produced by the `argon2` crate:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=4$<salt, 16 bytes, b64 no pad>$<tag, 32 bytes, b64 no pad>
//! ```
//!
//! This is the value operators place in `WS_AUTH_PASSWORD_HASHED`; the
//! authentication side verifies it with any PHC-aware Argon2 verifier
//! (`verify_password` below does the same).

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use super::kdf::{generate_salt, KdfParams};
use crate::errors::{Result, SecretsError};

/// Hash `password` into a PHC string using the pinned Argon2id parameters.
pub fn hash_password(password: &str) -> Result<String> {
    if password.trim().is_empty() {
        return Err(SecretsError::EmptyPassword);
    }

    let argon2 = KdfParams::PINNED.to_argon2()?;
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| SecretsError::KeyDerivation(format!("password salt: {e}")))?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SecretsError::KeyDerivation(format!("password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check `password` against a PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only when `phc` itself
/// cannot be parsed.
pub fn verify_password(password: &str, phc: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc.trim())
        .map_err(|e| SecretsError::Config(format!("invalid password hash: {e}")))?;

    let argon2 = KdfParams::PINNED.to_argon2()?;
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
