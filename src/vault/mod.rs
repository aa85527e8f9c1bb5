//! Vault module — YAML documents of encrypted secrets.
//!
//! This module provides:
//! - `Secret` and `SecretType` (`secret`)
//! - Ordered YAML load/save (`format`)
//! - Mode string parsing (`mode`)
//! - Normalization, destination resolution and validation (`validate`)

pub mod format;
pub mod mode;
pub mod secret;
pub mod validate;

// Re-export the most commonly used items.
pub use format::Vault;
pub use mode::parse_mode;
pub use secret::{Secret, SecretType};
pub use validate::{
    normalize, resolve_destination, select_keys, validate_destination, validate_secret, Destination,
};
