//! `ws secrets decrypt` — decrypt one envelope, or materialize a vault.

use console::style;

use crate::cli::{self, output, DecryptArgs};
use crate::config::Layout;
use crate::crypto::{resolve_master_key, MasterKey};
use crate::errors::Result;
use crate::ops::{self, ProcessOptions, SecretResult};
use crate::vault::Vault;
use crate::writer::{write_secure_file, WriteOutcome};

/// Execute the `decrypt` command.
pub fn execute(args: &DecryptArgs) -> Result<()> {
    let layout = cli::layout()?;
    let master = resolve_master_key(args.master.as_deref(), &layout)?;

    match &args.envelope {
        Some(envelope) => decrypt_single(args, envelope, &master),
        None => process(args, &master, &layout),
    }
}

fn decrypt_single(args: &DecryptArgs, envelope: &str, master: &MasterKey) -> Result<()> {
    let plaintext = ops::decrypt_value(envelope, master)?;

    match &args.output {
        Some(_) if args.dry_run && args.raw => {}
        Some(path) if args.dry_run => {
            output::info(&format!("[dry-run] would write value to {}", path.display()));
        }
        Some(path) => {
            let mode = args.mode.as_deref().unwrap_or_default();
            write_secure_file(path, &plaintext, mode, args.force)?;
            if !args.raw {
                output::success(&format!("Value written to {}", path.display()));
            }
        }
        None if args.raw => output::raw(&plaintext)?,
        None => output::payload(&plaintext)?,
    }

    Ok(())
}

fn process(args: &DecryptArgs, master: &MasterKey, layout: &Layout) -> Result<()> {
    let path = cli::require_vault_path(args.input.clone())?;
    let vault = Vault::load(&path)?;

    let opts = ProcessOptions {
        keys: args.keys.clone(),
        stdout: args.stdout,
        force: args.force,
        dry_run: args.dry_run,
        mode_override: args.mode.clone(),
    };
    let results = ops::process_vault(&vault, &opts, master, layout)?;

    if results.is_empty() {
        if !args.raw {
            output::info(&format!("No secrets in {}", path.display()));
        }
        return Ok(());
    }

    for (name, result) in &results {
        match result {
            SecretResult::Plaintext(value) if args.raw => output::raw(value)?,
            SecretResult::Plaintext(value) => {
                println!("{}", style(format!("{name}:")).bold());
                output::payload(value)?;
            }
            SecretResult::Written(_) if args.raw => {}
            SecretResult::Written(
                outcome @ (WriteOutcome::WouldWriteFile { .. } | WriteOutcome::WouldExport { .. }),
            ) => output::info(&format!("{name}: {outcome}")),
            SecretResult::Written(outcome) => output::success(&format!("{name}: {outcome}")),
        }
    }

    if !args.stdout && !args.raw {
        if args.dry_run {
            output::tip("Run again without --dry-run to apply.");
        } else if results
            .iter()
            .any(|(_, r)| matches!(r, SecretResult::Written(WriteOutcome::Exported { .. })))
        {
            output::tip(&format!(
                "Run `source {}` to load exported variables.",
                layout.env_file.display()
            ));
        }
    }

    Ok(())
}
