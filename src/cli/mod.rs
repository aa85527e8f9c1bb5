//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{Layout, Settings};
use crate::errors::{Result, SecretsError};

/// Environment variable naming the default vault file.
pub const VAULT_ENV: &str = "WS_SECRETS_VAULT";

/// ws: workspace companion CLI.
#[derive(Parser)]
#[command(name = "ws", about = "Workspace companion CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt, decrypt and materialize workspace secrets
    Secrets {
        #[command(subcommand)]
        action: SecretsAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

/// `ws secrets` subcommands.
#[derive(clap::Subcommand)]
pub enum SecretsAction {
    /// Encrypt a value, printing the envelope or adding it to a vault
    Encrypt(EncryptArgs),

    /// Decrypt a single envelope, or materialize the secrets of a vault
    Decrypt(DecryptArgs),

    /// List the entries of a vault without decrypting them
    List {
        /// Vault file (default: $WS_SECRETS_VAULT)
        #[arg(short, long, env = VAULT_ENV)]
        input: Option<PathBuf>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a random base64 master key
    GenerateKey {
        /// Key length in bytes
        #[arg(short, long, default_value_t = crate::crypto::keys::DEFAULT_GENERATED_LEN)]
        length: usize,

        /// Write the key to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Mode for the output file (e.g. 0o600)
        #[arg(long, default_value = "0o600")]
        mode: String,

        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Hash a password for WS_AUTH_PASSWORD_HASHED (prompt or stdin)
    HashPassword,
}

#[derive(clap::Args)]
pub struct EncryptArgs {
    /// Value to encrypt (omit to read a pipe or prompt)
    pub value: Option<String>,

    /// Master key (default: WS_SECRETS_MASTER_KEY, then key files)
    #[arg(long)]
    pub master: Option<String>,

    /// Add the encrypted value to this vault file
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Destination of the vault entry (path, or variable name for env)
    #[arg(short, long, requires = "vault")]
    pub dest: Option<String>,

    /// Secret type of the vault entry (default: generic)
    #[arg(short = 't', long = "type", requires = "vault")]
    pub kind: Option<String>,

    /// Vault entry name (default: derived from the destination)
    #[arg(short, long, requires = "vault")]
    pub name: Option<String>,

    /// File mode stored on the vault entry, or used for --output
    #[arg(long)]
    pub mode: Option<String>,

    /// Replace an existing vault entry or output file
    #[arg(short, long)]
    pub force: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the envelope only, without styling
    #[arg(long)]
    pub raw: bool,

    /// Write the envelope to this file
    #[arg(short, long, conflicts_with = "vault")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct DecryptArgs {
    /// Envelope to decrypt (omit to process a vault)
    pub envelope: Option<String>,

    /// Master key (default: WS_SECRETS_MASTER_KEY, then key files)
    #[arg(long)]
    pub master: Option<String>,

    /// Vault file to process (default: $WS_SECRETS_VAULT)
    #[arg(short, long, env = VAULT_ENV)]
    pub input: Option<PathBuf>,

    /// Only process these secrets (repeatable)
    #[arg(short, long = "key")]
    pub keys: Vec<String>,

    /// Print decrypted values instead of writing them
    #[arg(long)]
    pub stdout: bool,

    /// Override the mode of every written file
    #[arg(long)]
    pub mode: Option<String>,

    /// Overwrite existing files and exports
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be written without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print values only, without styling
    #[arg(long)]
    pub raw: bool,

    /// Write a single decrypted value to this file
    #[arg(short, long, requires = "envelope")]
    pub output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Build the filesystem layout from settings and the process environment.
pub fn layout() -> Result<Layout> {
    Ok(Settings::discover()?.layout())
}

/// Get a secret value, trying in order:
/// 1. The command-line argument
/// 2. Piped stdin (one trailing newline dropped)
/// 3. Interactive hidden prompt
pub fn read_value(arg: Option<&str>, prompt: &str) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(v) = arg {
        return Ok(Zeroizing::new(v.as_bytes().to_vec()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(Vec::new());
        io::stdin().read_to_end(&mut buf)?;
        strip_newline(&mut buf);
        return Ok(buf);
    }

    let value = prompt_hidden(prompt)?;
    Ok(Zeroizing::new(value.as_bytes().to_vec()))
}

/// Read a password with confirmation on a terminal, or from piped stdin.
pub fn read_password() -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']);
        return Ok(Zeroizing::new(trimmed.to_string()));
    }

    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| SecretsError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(password))
}

fn prompt_hidden(prompt: &str) -> Result<Zeroizing<String>> {
    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| SecretsError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Drop one trailing `\n` or `\r\n`.
fn strip_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// The vault file to process, or an error naming where it could come from.
pub fn require_vault_path(input: Option<PathBuf>) -> Result<PathBuf> {
    input.ok_or_else(|| {
        SecretsError::CommandFailed(format!(
            "no vault given — pass --input or set {VAULT_ENV}"
        ))
    })
}
