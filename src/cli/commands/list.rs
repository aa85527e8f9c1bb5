//! `ws secrets list` — display the entries of a vault.

use crate::cli::{output, require_vault_path};
use crate::errors::{Result, SecretsError};
use crate::vault::mode::{format_mode, parse_mode_opt};
use crate::vault::Vault;

/// Execute the `list` command.
pub fn execute(input: Option<std::path::PathBuf>, json: bool) -> Result<()> {
    let path = require_vault_path(input)?;
    let vault = Vault::load(&path)?;

    if json {
        println!("{}", to_json(&vault)?);
        return Ok(());
    }

    output::info(&format!(
        "{} — {} secret(s)",
        path.display(),
        vault.len()
    ));
    output::print_vault_table(&vault);

    Ok(())
}

/// Render vault entries as a JSON array, without their payloads.
fn to_json(vault: &Vault) -> Result<String> {
    let entries: Vec<serde_json::Value> = vault
        .iter()
        .map(|(name, secret)| {
            let kind = secret.secret_type().ok();
            let mode = kind
                .and_then(|k| parse_mode_opt(secret.mode.as_deref(), k.default_mode()).ok())
                .map(format_mode);
            serde_json::json!({
                "name": name,
                "type": kind.map_or(secret.kind.as_str(), |k| k.as_str()),
                "destination": secret.destination,
                "mode": mode,
            })
        })
        .collect();

    serde_json::to_string_pretty(&entries)
        .map_err(|e| SecretsError::Serialization(format!("JSON encoding failed: {e}")))
}
