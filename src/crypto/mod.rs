//! Cryptographic layer.
//!
//! - `envelope`: the `argon2id$v=19$…` text format
//! - `kdf`: pinned Argon2id key derivation
//! - `encryption`: AES-256-GCM and envelope-level encrypt/decrypt
//! - `password`: PHC password hashes for the workspace login
//! - `keys` / `resolve`: the master key, its parsing and its sources

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod password;
pub mod resolve;

pub use encryption::{decrypt_value, encrypt_value};
pub use envelope::Envelope;
pub use kdf::KdfParams;
pub use keys::{generate_master_key, MasterKey};
pub use password::{hash_password, verify_password};
pub use resolve::{resolve_master_key, resolve_master_key_with, KeySource};
