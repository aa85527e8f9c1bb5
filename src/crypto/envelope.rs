//! The textual envelope that carries one encrypted value.
//!
//! ```text
//! argon2id$v=19$m=<mem>,t=<time>,p=<threads>$<salt_b64>$<ciphertext_b64>
//! ```
//!
//! Both base64 fields use the unpadded standard alphabet.  The
//! ciphertext field holds `nonce || sealed` where `sealed` is the
//! AES-GCM output (ciphertext plus 16-byte tag).

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use super::encryption::NONCE_LEN;
use super::kdf::{KdfParams, SALT_LEN};
use crate::errors::{Result, SecretsError};

/// Algorithm token in the first field.
pub const ALGORITHM: &str = "argon2id";

/// Version token in the second field (Argon2 v1.3).
pub const VERSION: &str = "v=19";

/// Prefix marking an envelope that was itself base64-wrapped for transport.
const WRAPPED_PREFIX: &str = "base64:";

const FIELD_COUNT: usize = 5;

/// A parsed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The cost triple the envelope advertises.
    pub params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// AEAD output: ciphertext followed by the tag.
    pub sealed: Vec<u8>,
}

impl Envelope {
    /// Serialize to the five-field string form.
    pub fn encode(&self) -> String {
        let mut body = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        body.extend_from_slice(&self.nonce);
        body.extend_from_slice(&self.sealed);

        format!(
            "{ALGORITHM}${VERSION}${}${}${}",
            self.params,
            STANDARD_NO_PAD.encode(self.salt),
            STANDARD_NO_PAD.encode(body)
        )
    }

    /// Parse the five-field string form.
    pub fn decode(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.trim().split('$').collect();
        if fields.len() != FIELD_COUNT {
            return Err(SecretsError::InvalidFormat(fields.len()));
        }

        if fields[0] != ALGORITHM {
            return Err(SecretsError::UnsupportedAlgorithm(fields[0].to_string()));
        }
        if fields[1] != VERSION {
            return Err(SecretsError::Malformed);
        }

        let params: KdfParams = fields[2].parse()?;

        let salt_bytes = STANDARD_NO_PAD
            .decode(fields[3])
            .map_err(|_| SecretsError::Malformed)?;
        let salt: [u8; SALT_LEN] = salt_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SecretsError::Malformed)?;

        let body = STANDARD_NO_PAD
            .decode(fields[4])
            .map_err(|_| SecretsError::Malformed)?;
        if body.len() < NONCE_LEN {
            return Err(SecretsError::Malformed);
        }
        let (nonce_bytes, sealed) = body.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| SecretsError::Malformed)?;

        Ok(Self {
            params,
            salt,
            nonce,
            sealed: sealed.to_vec(),
        })
    }
}

/// Undo optional transport wrapping: `base64:<padded standard base64>`
/// is decoded back to the envelope string; anything else is returned
/// trimmed.
pub fn normalize(input: &str) -> Result<String> {
    let trimmed = input.trim();
    match trimmed.strip_prefix(WRAPPED_PREFIX) {
        Some(wrapped) => {
            let bytes = STANDARD
                .decode(wrapped.trim())
                .map_err(|_| SecretsError::Malformed)?;
            let inner = String::from_utf8(bytes).map_err(|_| SecretsError::Malformed)?;
            Ok(inner.trim().to_string())
        }
        None => Ok(trimmed.to_string()),
    }
}
