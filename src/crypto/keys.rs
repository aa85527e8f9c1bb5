//! The master key and its textual forms.
//!
//! Operators hand the master key over either as a human-typed
//! passphrase or as base64 of random bytes.  `MasterKey::parse` accepts
//! both: when the trimmed text base64-decodes to at least 16 bytes the
//! decoded bytes are the key, otherwise the text itself is.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{Result, SecretsError};

/// Minimum master key length in bytes.
pub const MIN_KEY_LEN: usize = 16;

/// Default length of a generated master key in bytes.
pub const DEFAULT_GENERATED_LEN: usize = 32;

/// Master key bytes, wiped from memory on drop.
#[derive(Clone)]
pub struct MasterKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl MasterKey {
    /// Wrap raw key bytes, enforcing the minimum length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() < MIN_KEY_LEN {
            return Err(SecretsError::InvalidKey(format!(
                "master key must be at least {MIN_KEY_LEN} bytes (got {})",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Parse key material: base64 when it decodes to ≥ 16 bytes,
    /// otherwise the trimmed text.
    pub fn parse(material: &str) -> Result<Self> {
        let trimmed = material.trim();
        if trimmed.is_empty() {
            return Err(SecretsError::InvalidKey("master key is empty".into()));
        }

        match BASE64.decode(trimmed) {
            Ok(decoded) if decoded.len() >= MIN_KEY_LEN => Self::from_bytes(decoded),
            Ok(mut decoded) => {
                zeroize::Zeroize::zeroize(&mut decoded);
                Self::from_bytes(trimmed.as_bytes().to_vec())
            }
            Err(_) => Self::from_bytes(trimmed.as_bytes().to_vec()),
        }
    }

    /// Parse the contents of a key file.
    ///
    /// UTF-8 contents go through `parse`; anything else is taken as raw
    /// binary key bytes.
    pub fn from_file_contents(contents: Vec<u8>) -> Result<Self> {
        match String::from_utf8(contents) {
            Ok(text) => {
                let text = Zeroizing::new(text);
                Self::parse(&text)
            }
            Err(e) => Self::from_bytes(e.into_bytes()),
        }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Generate `length` random bytes and return them as padded standard base64.
pub fn generate_master_key<R: RngCore + ?Sized>(length: usize, rng: &mut R) -> Result<String> {
    if length < MIN_KEY_LEN {
        return Err(SecretsError::InvalidKey(format!(
            "generated key length must be at least {MIN_KEY_LEN} bytes (got {length})"
        )));
    }

    let mut bytes = Zeroizing::new(vec![0u8; length]);
    rng.fill_bytes(bytes.as_mut_slice());
    Ok(BASE64.encode(bytes.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_decodes_base64_key() {
        let key = MasterKey::parse("MTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTI=").unwrap();
        assert_eq!(key.as_bytes(), b"12345678901234567890123456789012");
    }

    #[test]
    fn parse_keeps_non_base64_text() {
        let raw = "this-is-not-base64-because-of-symbols!";
        let key = MasterKey::parse(raw).unwrap();
        assert_eq!(key.as_bytes(), raw.as_bytes());
    }

    #[test]
    fn parse_trims_whitespace() {
        let key = MasterKey::parse("  a-long-enough-passphrase!!\n").unwrap();
        assert_eq!(key.as_bytes(), b"a-long-enough-passphrase!!");
    }

    #[test]
    fn parse_uses_text_when_base64_is_too_short() {
        // "YWJjZGVmZ2hpams=" decodes to 11 bytes, so the text itself is the key.
        let key = MasterKey::parse("YWJjZGVmZ2hpams=").unwrap();
        assert_eq!(key.as_bytes(), b"YWJjZGVmZ2hpams=");
    }

    #[test]
    fn parse_rejects_short_and_empty() {
        assert!(matches!(
            MasterKey::parse("short!").unwrap_err(),
            SecretsError::InvalidKey(_)
        ));
        assert!(MasterKey::parse("   ").is_err());
    }

    #[test]
    fn binary_file_contents_are_raw_key() {
        let bytes = vec![0xFFu8; 32];
        let key = MasterKey::from_file_contents(bytes.clone()).unwrap();
        assert_eq!(key.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn debug_does_not_print_bytes() {
        let key = MasterKey::parse("this-is-not-base64-because-of-symbols!").unwrap();
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("symbols"));
    }

    #[test]
    fn generated_key_has_requested_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let encoded = generate_master_key(16, &mut rng).unwrap();
        assert_eq!(encoded.len(), 24);
        assert_eq!(BASE64.decode(&encoded).unwrap().len(), 16);

        let default = generate_master_key(DEFAULT_GENERATED_LEN, &mut rng).unwrap();
        assert_eq!(BASE64.decode(&default).unwrap().len(), 32);
    }

    #[test]
    fn generated_key_parses_back_to_same_bytes() {
        let mut rng = StdRng::seed_from_u64(42);
        let encoded = generate_master_key(32, &mut rng).unwrap();
        let key = MasterKey::parse(&encoded).unwrap();
        assert_eq!(key.len(), 32);
        assert_eq!(key.as_bytes(), BASE64.decode(&encoded).unwrap().as_slice());
    }

    #[test]
    fn generate_rejects_tiny_lengths() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_master_key(8, &mut rng).is_err());
    }
}
