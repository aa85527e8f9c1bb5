//! Encrypting values, on their own or into a vault.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Layout;
use crate::crypto::{self, MasterKey};
use crate::errors::{Result, SecretsError};
use crate::vault::mode::parse_mode;
use crate::vault::validate::validate_destination;
use crate::vault::{Secret, SecretType, Vault};

/// Encrypt one value and return its envelope.
pub fn encrypt_value(plaintext: &[u8], master: &MasterKey) -> Result<String> {
    crypto::encrypt_value(plaintext, master)
}

/// A value to add to a vault file.
#[derive(Debug, Clone)]
pub struct VaultEntryRequest {
    pub vault_path: PathBuf,
    pub destination: String,
    pub kind: SecretType,
    /// Entry name; derived from the destination when `None`.
    pub name: Option<String>,
    /// Mode string stored on the entry.
    pub mode: Option<String>,
    pub force: bool,
    pub dry_run: bool,
}

/// What `encrypt_to_vault` did to the vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultChange {
    pub name: String,
    /// An existing entry of the same name was replaced.
    pub replaced: bool,
    /// Nothing was written.
    pub dry_run: bool,
}

/// Encrypt `plaintext` and store it as an entry of the vault at
/// `req.vault_path`, creating the vault if needed.
///
/// Existing entries are kept in order; an entry of the same name is only
/// replaced with `force`.
pub fn encrypt_to_vault(
    plaintext: &[u8],
    req: &VaultEntryRequest,
    master: &MasterKey,
    layout: &Layout,
) -> Result<VaultChange> {
    let mut vault = Vault::load_or_default(&req.vault_path)?;

    let name = match &req.name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => derive_name(&req.destination, req.kind),
    };

    let replaced = vault.contains(&name);
    if replaced && !req.force {
        return Err(SecretsError::Exists(format!(
            "secret '{name}' in {}",
            req.vault_path.display()
        )));
    }

    if let Some(mode) = &req.mode {
        parse_mode(mode, req.kind.default_mode())?;
    }

    let mut secret = Secret::new(req.kind, String::new(), req.destination.clone());
    secret.mode = req.mode.clone();
    validate_destination(&secret, layout).map_err(|e| e.for_secret(&name))?;

    if req.dry_run {
        info!(
            secret = %name,
            vault = %req.vault_path.display(),
            replaced,
            "dry-run: would add secret to vault"
        );
        return Ok(VaultChange {
            name,
            replaced,
            dry_run: true,
        });
    }

    secret.encrypted = crypto::encrypt_value(plaintext, master)?;
    vault.insert(name.clone(), secret);
    vault.save(&req.vault_path)?;
    info!(secret = %name, vault = %req.vault_path.display(), replaced, "added secret to vault");

    Ok(VaultChange {
        name,
        replaced,
        dry_run: false,
    })
}

/// Default entry name: the variable name for env secrets, otherwise the
/// destination's file name reduced to `[a-z0-9-]`.
pub fn derive_name(destination: &str, kind: SecretType) -> String {
    if kind == SecretType::Env {
        return destination.to_string();
    }

    let base = Path::new(destination)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('-') {
            name.push('-');
        }
    }
    let name = name.trim_matches('-');

    if name.is_empty() {
        kind.as_str().to_string()
    } else {
        format!("{}-{name}", kind.as_str())
    }
}
