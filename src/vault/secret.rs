//! A single vault entry and the closed set of secret types.
//!
//! `Secret` mirrors the YAML document as written by people: the type is
//! kept as free text so an unknown type surfaces as a validation error
//! (`InvalidType`) rather than a parse failure, and `mode` accepts both
//! quoted strings and bare YAML integers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Result, SecretsError};

/// What a secret is, which drives its default mode, default directory
/// and whether it is written to a file or exported as a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretType {
    Generic,
    Ssh,
    Env,
    Kubeconfig,
    DockerConfigJson,
}

impl SecretType {
    pub const ALL: [SecretType; 5] = [
        SecretType::Generic,
        SecretType::Ssh,
        SecretType::Env,
        SecretType::Kubeconfig,
        SecretType::DockerConfigJson,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SecretType::Generic => "generic",
            SecretType::Ssh => "ssh",
            SecretType::Env => "env",
            SecretType::Kubeconfig => "kubeconfig",
            SecretType::DockerConfigJson => "dockerconfigjson",
        }
    }

    /// File mode used when the entry does not set one.
    pub fn default_mode(self) -> u32 {
        match self {
            SecretType::Env => 0o644,
            _ => 0o600,
        }
    }

    /// Directory relative destinations are placed under, if any.
    pub fn default_dir(self, home: &Path) -> Option<PathBuf> {
        match self {
            SecretType::Ssh => Some(home.join(".ssh")),
            SecretType::Kubeconfig => Some(home.join(".kube")),
            SecretType::DockerConfigJson => Some(home.join(".docker")),
            SecretType::Generic | SecretType::Env => None,
        }
    }

    /// Parse the `type` field; empty means `generic`.
    pub fn from_field(field: &str) -> Result<Self> {
        if field.is_empty() {
            return Ok(SecretType::Generic);
        }
        field.parse()
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self> {
        SecretType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SecretsError::InvalidType(s.to_string()))
    }
}

/// One entry of a vault document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Secret type as written; empty means `generic`.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// The envelope string.
    #[serde(default)]
    pub encrypted: String,

    /// A filesystem path, or a variable name for `env` secrets.
    #[serde(default)]
    pub destination: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_mode"
    )]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl Secret {
    pub fn new(kind: SecretType, encrypted: String, destination: String) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            encrypted,
            destination,
            mode: None,
            force: None,
        }
    }

    /// The parsed type (`InvalidType` for anything outside the closed set).
    pub fn secret_type(&self) -> Result<SecretType> {
        SecretType::from_field(&self.kind)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMode {
    Text(String),
    Number(u64),
}

/// Accept `mode: "0o600"` as well as `mode: 384`.
fn deserialize_mode<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<RawMode>::deserialize(deserializer)?.map(|raw| match raw {
            RawMode::Text(s) => s,
            RawMode::Number(n) => n.to_string(),
        }),
    )
}
