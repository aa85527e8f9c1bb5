//! Key derivation using Argon2id.
//!
//! Every envelope carries its own 16-byte salt; the master key and that
//! salt are stretched into a one-off 32-byte AES key.  The cost
//! parameters are pinned: decryption always uses `KdfParams::PINNED`,
//! whatever triple an envelope advertises.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{Result, SecretsError};

/// Length of the per-envelope salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters as they appear in an envelope (`m=…,t=…,p=…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Parallelism lanes.
    pub parallelism: u32,
}

impl KdfParams {
    /// The parameters every key in this crate is derived with
    /// (64 MiB, 3 passes, 4 lanes).
    pub const PINNED: KdfParams = KdfParams {
        memory_kib: 65_536,
        iterations: 3,
        parallelism: 4,
    };

    pub(crate) fn to_argon2(self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| SecretsError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::PINNED
    }
}

impl fmt::Display for KdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={},t={},p={}",
            self.memory_kib, self.iterations, self.parallelism
        )
    }
}

impl FromStr for KdfParams {
    type Err = SecretsError;

    /// Parse `m=<mem>,t=<time>,p=<threads>`.  All three must be present.
    fn from_str(s: &str) -> Result<Self> {
        let (mut m, mut t, mut p) = (None, None, None);
        for part in s.split(',') {
            let (k, v) = part.split_once('=').ok_or(SecretsError::Malformed)?;
            let v: u32 = v.parse().map_err(|_| SecretsError::Malformed)?;
            match k {
                "m" => m = Some(v),
                "t" => t = Some(v),
                "p" => p = Some(v),
                _ => return Err(SecretsError::Malformed),
            }
        }
        match (m, t, p) {
            (Some(memory_kib), Some(iterations), Some(parallelism)) => Ok(Self {
                memory_kib,
                iterations,
                parallelism,
            }),
            _ => Err(SecretsError::Malformed),
        }
    }
}

/// Derive a 32-byte AES key from the master key and a salt using the
/// pinned Argon2id parameters.
pub fn derive_key(master: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let argon2 = KdfParams::PINNED.to_argon2()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(master, salt, &mut key[..])
        .map_err(|e| SecretsError::KeyDerivation(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_display_matches_envelope_field() {
        assert_eq!(KdfParams::PINNED.to_string(), "m=65536,t=3,p=4");
    }

    #[test]
    fn params_parse_roundtrip() {
        let parsed: KdfParams = "m=65536,t=3,p=4".parse().unwrap();
        assert_eq!(parsed, KdfParams::PINNED);

        let reordered: KdfParams = "p=1,t=2,m=8192".parse().unwrap();
        assert_eq!(reordered.memory_kib, 8192);
        assert_eq!(reordered.iterations, 2);
        assert_eq!(reordered.parallelism, 1);
    }

    #[test]
    fn params_parse_rejects_missing_or_garbage() {
        assert!("m=65536,t=3".parse::<KdfParams>().is_err());
        assert!("m=abc,t=3,p=4".parse::<KdfParams>().is_err());
        assert!("x=1,t=3,p=4".parse::<KdfParams>().is_err());
        assert!("".parse::<KdfParams>().is_err());
    }

    #[test]
    fn derive_is_deterministic_per_salt() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(b"0123456789abcdef", &salt).unwrap();
        let b = derive_key(b"0123456789abcdef", &salt).unwrap();
        assert_eq!(*a, *b);

        let c = derive_key(b"0123456789abcdef", &[8u8; SALT_LEN]).unwrap();
        assert_ne!(*a, *c);
    }

    #[test]
    fn salts_are_fresh() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
