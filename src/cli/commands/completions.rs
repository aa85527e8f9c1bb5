//! `ws completions` — generate shell completion scripts.
//!
//! Usage:
//!   ws completions bash > ~/.bash_completion.d/ws
//!   ws completions zsh > "${fpath[1]}/_ws"
//!   ws completions fish

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, SecretsError};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    render(parse_shell(shell)?, &mut io::stdout())
}

fn render(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "ws", out);
    Ok(())
}

/// Parse a shell name string into a `Shell` enum.
fn parse_shell(name: &str) -> Result<Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "pwsh" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        other => Err(SecretsError::CommandFailed(format!(
            "unknown shell '{other}' — supported: bash, zsh, fish, powershell, elvish"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shells_parse_case_insensitively() {
        for (name, shell) in [
            ("bash", Shell::Bash),
            ("ZSH", Shell::Zsh),
            ("Fish", Shell::Fish),
            ("pwsh", Shell::PowerShell),
            ("elvish", Shell::Elvish),
        ] {
            assert_eq!(parse_shell(name).unwrap(), shell, "{name}");
        }
    }

    #[test]
    fn unknown_shell_fails() {
        assert!(parse_shell("csh").is_err());
        assert!(parse_shell("").is_err());
    }

    #[test]
    fn bash_script_covers_secrets_subcommands() {
        let mut buf = Vec::new();
        render(Shell::Bash, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("generate-key"));
        assert!(script.contains("hash-password"));
    }
}
