//! `ws secrets encrypt` — encrypt a value, or add it to a vault.

use std::path::Path;

use tracing::debug;

use crate::cli::{self, output, EncryptArgs};
use crate::config::Layout;
use crate::crypto::{resolve_master_key, MasterKey};
use crate::errors::{Result, SecretsError};
use crate::ops::{self, VaultEntryRequest};
use crate::vault::SecretType;
use crate::writer::write_secure_file;

/// Execute the `encrypt` command.
pub fn execute(args: &EncryptArgs) -> Result<()> {
    let layout = cli::layout()?;
    let master = resolve_master_key(args.master.as_deref(), &layout)?;

    if args.value.is_some() {
        output::warning("Value provided on command line — it may appear in shell history.");
    }
    let value = cli::read_value(args.value.as_deref(), "Value to encrypt")?;
    debug!(bytes = value.len(), "read value to encrypt");

    if let Some(vault_path) = &args.vault {
        return add_to_vault(args, vault_path, &value, &master, &layout);
    }

    let envelope = ops::encrypt_value(&value, &master)?;

    match &args.output {
        Some(_) if args.dry_run && args.raw => {}
        Some(path) if args.dry_run => {
            output::info(&format!("[dry-run] would write envelope to {}", path.display()));
        }
        Some(path) => {
            let mode = args.mode.as_deref().unwrap_or_default();
            write_secure_file(path, envelope.as_bytes(), mode, args.force)?;
            if !args.raw {
                output::success(&format!("Envelope written to {}", path.display()));
            }
        }
        None if args.raw => output::raw(envelope.as_bytes())?,
        None => output::payload(envelope.as_bytes())?,
    }

    Ok(())
}

fn add_to_vault(
    args: &EncryptArgs,
    vault_path: &Path,
    value: &[u8],
    master: &MasterKey,
    layout: &Layout,
) -> Result<()> {
    let destination = args
        .dest
        .clone()
        .filter(|d| !d.trim().is_empty())
        .ok_or(SecretsError::DestinationRequired)?;
    let kind = match args.kind.as_deref() {
        Some(k) => k.parse()?,
        None => SecretType::Generic,
    };

    let req = VaultEntryRequest {
        vault_path: vault_path.to_path_buf(),
        destination,
        kind,
        name: args.name.clone(),
        mode: args.mode.clone(),
        force: args.force,
        dry_run: args.dry_run,
    };
    let change = ops::encrypt_to_vault(value, &req, master, layout)?;

    if args.raw {
        return Ok(());
    }

    let verb = if change.replaced { "replace" } else { "add" };
    if change.dry_run {
        output::info(&format!(
            "[dry-run] would {verb} secret '{}' in {}",
            change.name,
            vault_path.display()
        ));
    } else {
        let done = if change.replaced { "Replaced" } else { "Added" };
        output::success(&format!(
            "{done} secret '{}' in {}",
            change.name,
            vault_path.display()
        ));
    }

    Ok(())
}
