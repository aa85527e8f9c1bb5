//! Master key and password hash generation.

use std::io::BufRead;

use crate::crypto::{self, keys};
use crate::errors::{Result, SecretsError};

/// Generate `length` random bytes and return them base64-encoded.
pub fn generate_master_key(length: usize) -> Result<String> {
    keys::generate_master_key(length, &mut rand::rng())
}

/// Read one line from `reader` and return its argon2id PHC hash.
///
/// The trailing newline is dropped; a blank line is `EmptyPassword`.
pub fn generate_password_hash<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = zeroize::Zeroizing::new(String::new());
    reader.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.trim().is_empty() {
        return Err(SecretsError::EmptyPassword);
    }
    crypto::hash_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use std::io::Cursor;

    #[test]
    fn generated_key_decodes_to_requested_length() {
        for len in [16, 32, 64] {
            let key = generate_master_key(len).unwrap();
            assert_eq!(STANDARD.decode(&key).unwrap().len(), len);
        }
        assert_ne!(generate_master_key(32).unwrap(), generate_master_key(32).unwrap());
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(matches!(
            generate_master_key(8).unwrap_err(),
            SecretsError::InvalidKey(_)
        ));
    }

    #[test]
    fn password_hash_reads_first_line() {
        let hash = generate_password_hash(Cursor::new("hunter2\nignored\n")).unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=3,p=4$"));
        assert!(crypto::verify_password("hunter2", &hash).unwrap());
        assert!(!crypto::verify_password("ignored", &hash).unwrap());
    }

    #[test]
    fn blank_password_is_rejected() {
        for input in ["", "\n", "   \r\n"] {
            assert!(matches!(
                generate_password_hash(Cursor::new(input)).unwrap_err(),
                SecretsError::EmptyPassword
            ));
        }
    }
}
