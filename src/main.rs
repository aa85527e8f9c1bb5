use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ws::cli::{commands, output, Cli, Commands, SecretsAction};
use ws::errors::SecretsError;

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so `--raw` output on stdout stays pipeable.
    let filter = EnvFilter::try_from_env("WS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("ws=debug")
        } else {
            EnvFilter::new("ws=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Secrets { ref action } => match action {
            SecretsAction::Encrypt(args) => commands::encrypt::execute(args),
            SecretsAction::Decrypt(args) => commands::decrypt::execute(args),
            SecretsAction::List { input, json } => {
                commands::list::execute(input.clone(), *json)
            }
            SecretsAction::GenerateKey {
                length,
                output,
                mode,
                force,
            } => commands::generate_key::execute(*length, output.as_deref(), mode, *force),
            SecretsAction::HashPassword => commands::hash_password::execute(),
        },
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if let SecretsError::KeyNotFound(_) = e.root() {
            output::tip("Run `ws secrets generate-key --output <FILE>` to create one.");
        }
        std::process::exit(1);
    }
}
