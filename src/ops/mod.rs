//! The operations behind `ws secrets`.
//!
//! Each function takes its master key and `Layout` explicitly; resolving
//! them from flags, env and config is the CLI's job.

pub mod encrypt;
pub mod generate;
pub mod process;

pub use encrypt::{derive_name, encrypt_to_vault, encrypt_value, VaultChange, VaultEntryRequest};
pub use generate::{generate_master_key, generate_password_hash};
pub use process::{decrypt_value, process_vault, ProcessOptions, SecretResult};
