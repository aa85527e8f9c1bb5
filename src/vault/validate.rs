//! Normalization, destination resolution and validation of vault entries.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::format::Vault;
use super::mode::{format_mode, parse_mode_opt};
use super::secret::{Secret, SecretType};
use crate::config::layout::clean_path;
use crate::config::Layout;
use crate::errors::{Result, SecretsError};

/// Where a secret materializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// An absolute, cleaned file path.
    File(PathBuf),
    /// A variable exported in the env file.
    Env(String),
}

fn env_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("static regex is valid"))
}

/// Whether `name` is a valid environment variable name for env secrets.
pub fn is_env_name(name: &str) -> bool {
    env_name_regex().is_match(name)
}

/// Resolve a secret's destination.
///
/// `env` secrets resolve to their variable name.  Everything else has
/// `~` and `$VAR` expanded, is placed under the type's default
/// directory when relative, and is cleaned.  A relative `generic`
/// destination is `InvalidPath`.
pub fn resolve_destination(secret: &Secret, layout: &Layout) -> Result<Destination> {
    let kind = secret.secret_type()?;
    if kind == SecretType::Env {
        return Ok(Destination::Env(secret.destination.clone()));
    }

    let expanded = layout.expand_path(&secret.destination);

    let placed = if expanded.is_relative() {
        match kind.default_dir(&layout.home) {
            Some(dir) => dir.join(expanded),
            None => return Err(SecretsError::InvalidPath(secret.destination.clone())),
        }
    } else {
        expanded
    };

    Ok(Destination::File(clean_path(&absolute(&placed)?)))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Fill in the type and mode defaults and store the resolved destination
/// back onto the secret.
pub fn normalize_secret(secret: &mut Secret, layout: &Layout) -> Result<()> {
    let kind = secret.secret_type()?;
    if secret.kind.is_empty() {
        secret.kind = kind.as_str().to_string();
    }
    if secret.mode.as_deref().map_or(true, str::is_empty) {
        secret.mode = Some(format_mode(kind.default_mode()));
    }
    if !secret.destination.is_empty() {
        if let Destination::File(path) = resolve_destination(secret, layout)? {
            secret.destination = path.to_string_lossy().into_owned();
        }
    }
    Ok(())
}

/// Normalize every entry of `vault`.
pub fn normalize(vault: &mut Vault, layout: &Layout) -> Result<()> {
    for (name, secret) in vault.iter_mut() {
        normalize_secret(secret, layout).map_err(|e| e.for_secret(name))?;
    }
    Ok(())
}

/// Check one entry.  Returns the parsed type and resolved destination.
///
/// File secrets must also carry a parseable mode; env secrets ignore it.
pub fn validate_secret(secret: &Secret, layout: &Layout) -> Result<(SecretType, Destination)> {
    if secret.encrypted.trim().is_empty() {
        return Err(SecretsError::EncryptedRequired);
    }
    let (kind, destination) = validate_destination(secret, layout)?;
    if kind != SecretType::Env {
        parse_mode_opt(secret.mode.as_deref(), kind.default_mode())?;
    }
    Ok((kind, destination))
}

/// Check an entry's type and destination, ignoring its payload.
pub fn validate_destination(secret: &Secret, layout: &Layout) -> Result<(SecretType, Destination)> {
    if secret.destination.trim().is_empty() {
        return Err(SecretsError::DestinationRequired);
    }

    let kind = secret.secret_type()?;
    if kind == SecretType::Env {
        if !is_env_name(&secret.destination) {
            return Err(SecretsError::InvalidEnvName(secret.destination.clone()));
        }
        return Ok((kind, Destination::Env(secret.destination.clone())));
    }

    let destination = resolve_destination(secret, layout)?;
    if let Destination::File(path) = &destination {
        if !layout.allow_list.permits(path) {
            return Err(SecretsError::NotAllowed(path.clone()));
        }
    }
    Ok((kind, destination))
}

/// The names to process: everything in document order when `requested`
/// is empty, otherwise `requested` as given.
pub fn select_keys(vault: &Vault, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        vault.names().map(String::from).collect()
    } else {
        requested.to_vec()
    }
}
