//! AES-256-GCM authenticated encryption, and the envelope-level
//! `encrypt_value` / `decrypt_value` built on it.
//!
//! Each call to `encrypt_value` draws a fresh 16-byte salt (for the KDF)
//! and a fresh 12-byte nonce, so two encryptions of the same value never
//! produce the same envelope.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use tracing::debug;
use zeroize::Zeroizing;

use super::envelope::{self, Envelope};
use super::kdf::{self, KdfParams, KEY_LEN};
use super::keys::MasterKey;
use crate::errors::{Result, SecretsError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` with a 32-byte `key` and empty AAD.
///
/// Returns the nonce and the sealed bytes (ciphertext || tag).
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SecretsError::Encryption(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| SecretsError::Encryption(format!("encryption error: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&nonce);
    Ok((nonce_bytes, sealed))
}

/// Open bytes produced by `seal`.
///
/// Any tag mismatch is reported as `AuthFailed`, without detail.
pub fn open(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SecretsError::Malformed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| SecretsError::AuthFailed)
}

/// Encrypt a value under the master key and return the envelope string.
pub fn encrypt_value(plaintext: &[u8], master: &MasterKey) -> Result<String> {
    let salt = kdf::generate_salt();
    let key = kdf::derive_key(master.as_bytes(), &salt)?;
    let (nonce, sealed) = seal(&key, plaintext)?;

    Ok(Envelope {
        params: KdfParams::PINNED,
        salt,
        nonce,
        sealed,
    }
    .encode())
}

/// Decrypt an envelope string (optionally `base64:`-wrapped).
///
/// The plaintext is returned in a buffer that is wiped on drop.
pub fn decrypt_value(envelope_str: &str, master: &MasterKey) -> Result<Zeroizing<Vec<u8>>> {
    let normalized = envelope::normalize(envelope_str)?;
    let env = Envelope::decode(&normalized)?;

    if env.params != KdfParams::PINNED {
        debug!(
            advertised = %env.params,
            "envelope advertises non-default KDF parameters; using pinned parameters"
        );
    }

    let key = kdf::derive_key(master.as_bytes(), &env.salt)?;
    let plaintext = open(&key, &env.nonce, &env.sealed)?;
    Ok(Zeroizing::new(plaintext))
}
