use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in the secrets layer.
///
/// Each variant is a stable kind; callers match on the variant rather
/// than on the rendered message.
#[derive(Debug, Error)]
pub enum SecretsError {
    // --- Master key errors ---
    #[error(
        "no master key found — pass --master, set WS_SECRETS_MASTER_KEY or \
         WS_SECRETS_MASTER_KEY_FILE, or create {0}"
    )]
    KeyNotFound(PathBuf),

    #[error("Invalid master key: {0}")]
    InvalidKey(String),

    // --- Envelope errors ---
    #[error("Invalid envelope format: expected 5 '$'-separated fields, got {0}")]
    InvalidFormat(usize),

    #[error("Unsupported envelope algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    // Malformed and AuthFailed share a message so the CLI is not an oracle.
    #[error("Decryption failed — wrong master key or corrupted data")]
    Malformed,

    #[error("Decryption failed — wrong master key or corrupted data")]
    AuthFailed,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // --- Vault document errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Invalid vault {path}: {reason}")]
    InvalidVault { path: PathBuf, reason: String },

    #[error("Secret '{0}' not found in vault")]
    NotFound(String),

    // --- Validation errors ---
    #[error("Invalid secret type '{0}' (expected generic, ssh, env, kubeconfig or dockerconfigjson)")]
    InvalidType(String),

    #[error("Invalid environment variable name '{0}'")]
    InvalidEnvName(String),

    #[error("Invalid destination path '{0}' — generic secrets need an absolute path")]
    InvalidPath(String),

    #[error("Destination {0} is outside the allowed locations")]
    NotAllowed(PathBuf),

    #[error("Field 'encrypted' is required")]
    EncryptedRequired,

    #[error("Field 'destination' is required")]
    DestinationRequired,

    #[error("Invalid file mode '{0}'")]
    InvalidMode(String),

    // --- Materialization errors ---
    #[error("{0} already exists (use --force to overwrite)")]
    Exists(String),

    #[error("Variable {0} is already exported in the env file (use --force to replace)")]
    EnvExists(String),

    #[error("IO error on {path}: {source}")]
    IoFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Input errors ---
    #[error("Password must not be empty")]
    EmptyPassword,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Attaches the vault entry name to the error that stopped a batch.
    #[error("secret '{name}': {source}")]
    Secret {
        name: String,
        #[source]
        source: Box<SecretsError>,
    },
}

impl SecretsError {
    /// Build an `IoFailed` for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailed {
            path: path.into(),
            source,
        }
    }

    /// Wrap this error with the name of the secret being processed.
    pub fn for_secret(self, name: &str) -> Self {
        Self::Secret {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// The underlying error kind, looking through any `Secret` wrapper.
    pub fn root(&self) -> &SecretsError {
        match self {
            Self::Secret { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convenience type alias for secrets results.
pub type Result<T> = std::result::Result<T, SecretsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failed_and_malformed_render_identically() {
        assert_eq!(
            SecretsError::AuthFailed.to_string(),
            SecretsError::Malformed.to_string()
        );
    }

    #[test]
    fn root_unwraps_secret_context() {
        let err = SecretsError::EnvExists("FOO".into()).for_secret("token");
        assert!(err.to_string().starts_with("secret 'token'"));
        assert!(matches!(err.root(), SecretsError::EnvExists(n) if n == "FOO"));
    }
}
