//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.  Payloads meant for pipes
//! (`--raw`) bypass them and go straight to stdout.

use std::io::{self, Write};

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::errors::Result;
use crate::vault::mode::{format_mode, parse_mode_opt};
use crate::vault::Vault;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Write payload bytes to stdout as-is.
pub fn raw(bytes: &[u8]) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}

/// Print a payload followed by a newline, for human use.
pub fn payload(bytes: &[u8]) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Print a table of vault entries (Name, Type, Destination, Mode).
pub fn print_vault_table(vault: &Vault) {
    if vault.is_empty() {
        info("No secrets in this vault yet.");
        tip("Run `ws secrets encrypt --vault <FILE> --dest <DEST>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Type", "Destination", "Mode"]);

    for (name, secret) in vault.iter() {
        let kind = secret
            .secret_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|_| format!("{} (invalid)", secret.kind));
        let mode = match secret.secret_type() {
            Ok(t) => parse_mode_opt(secret.mode.as_deref(), t.default_mode())
                .map(format_mode)
                .unwrap_or_else(|_| secret.mode.clone().unwrap_or_default()),
            Err(_) => secret.mode.clone().unwrap_or_default(),
        };
        table.add_row(vec![name.to_string(), kind, secret.destination.clone(), mode]);
    }

    println!("{table}");
}
