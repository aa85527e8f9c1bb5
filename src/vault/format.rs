//! Vault document format.
//!
//! A vault is a UTF-8 YAML file:
//!
//! ```yaml
//! secrets:
//!   kube:
//!     type: kubeconfig
//!     encrypted: argon2id$v=19$...
//!     destination: ~/.kube/config
//!   token:
//!     type: env
//!     encrypted: argon2id$v=19$...
//!     destination: MY_SECRET_TOKEN
//! ```
//!
//! Entry order is preserved on load and on save.  Unknown keys are
//! ignored, at the top level and inside entries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::secret::Secret;
use crate::errors::{Result, SecretsError};

/// On-disk shape.  `secrets` stays a `Mapping` so entry order survives.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VaultDocument {
    #[serde(default)]
    secrets: Option<Mapping>,
}

/// An ordered collection of named secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vault {
    entries: Vec<(String, Secret)>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the vault at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SecretsError::VaultNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|e| SecretsError::io(path, e))?;
        let vault = Self::from_yaml(&contents, path)?;
        debug!(path = %path.display(), secrets = vault.len(), "loaded vault");
        Ok(vault)
    }

    /// Load the vault at `path`, or start an empty one if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SecretsError::VaultNotFound(_)) => Ok(Self::new()),
            other => other,
        }
    }

    /// Parse a YAML document.  `origin` is only used in error messages.
    pub fn from_yaml(contents: &str, origin: &Path) -> Result<Self> {
        let invalid = |reason: String| SecretsError::InvalidVault {
            path: origin.to_path_buf(),
            reason,
        };

        if contents.trim().is_empty() {
            return Ok(Self::new());
        }

        let doc: VaultDocument = serde_yaml::from_str(contents).map_err(|e| invalid(e.to_string()))?;

        let mut entries = Vec::new();
        for (key, value) in doc.secrets.unwrap_or_default() {
            let name = match key {
                Value::String(s) => s,
                other => return Err(invalid(format!("secret name must be a string, got {other:?}"))),
            };
            let secret: Secret = serde_yaml::from_value(value)
                .map_err(|e| invalid(format!("secret '{name}': {e}")))?;
            entries.push((name, secret));
        }

        Ok(Self { entries })
    }

    /// Serialize to YAML, entries in order.
    pub fn to_yaml(&self) -> Result<String> {
        let mut secrets = Mapping::new();
        for (name, secret) in &self.entries {
            let value = serde_yaml::to_value(secret)
                .map_err(|e| SecretsError::Serialization(format!("secret '{name}': {e}")))?;
            secrets.insert(Value::String(name.clone()), value);
        }

        serde_yaml::to_string(&VaultDocument {
            secrets: Some(secrets),
        })
        .map_err(|e| SecretsError::Serialization(format!("vault YAML: {e}")))
    }

    /// Write the vault to `path` atomically with mode `0o600`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        crate::writer::write_atomic(path, yaml.as_bytes(), 0o600)?;
        debug!(path = %path.display(), secrets = self.len(), "saved vault");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Secret> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace `name`.  A replaced entry keeps its position.
    /// Returns the previous secret, if any.
    pub fn insert(&mut self, name: impl Into<String>, secret: Secret) -> Option<Secret> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, secret)),
            None => {
                self.entries.push((name, secret));
                None
            }
        }
    }

    /// Secret names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Secret)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Secret)> {
        self.entries.iter_mut().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
