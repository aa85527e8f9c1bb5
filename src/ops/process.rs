//! Decrypting values and processing whole vaults.

use std::fmt;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::Layout;
use crate::crypto::{self, MasterKey};
use crate::errors::{Result, SecretsError};
use crate::vault::mode::parse_mode;
use crate::vault::validate::{normalize_secret, select_keys, validate_secret};
use crate::vault::{Secret, Vault};
use crate::writer::{SecretWriter, WriteOptions, WriteOutcome};

/// Decrypt one envelope (optionally `base64:`-wrapped).
pub fn decrypt_value(envelope: &str, master: &MasterKey) -> Result<Zeroizing<Vec<u8>>> {
    crypto::decrypt_value(envelope, master)
}

/// How `process_vault` should treat the selected secrets.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Names to process; empty means every secret in document order.
    pub keys: Vec<String>,
    /// Collect plaintexts instead of writing them.
    pub stdout: bool,
    pub force: bool,
    pub dry_run: bool,
    /// Mode string that replaces every selected secret's mode.
    pub mode_override: Option<String>,
}

/// Result for one processed secret.
pub enum SecretResult {
    /// Decrypted value, when processing with `stdout`.
    Plaintext(Zeroizing<Vec<u8>>),
    Written(WriteOutcome),
}

impl fmt::Debug for SecretResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretResult::Plaintext(value) => f
                .debug_struct("Plaintext")
                .field("len", &value.len())
                .finish_non_exhaustive(),
            SecretResult::Written(outcome) => f.debug_tuple("Written").field(outcome).finish(),
        }
    }
}

/// Validate, decrypt and materialize the selected secrets of `vault`.
///
/// Every selected secret is looked up, normalized and validated before
/// anything is decrypted or written, so validation errors have no side
/// effects.  After that, secrets are handled one at a time in order and
/// the first failure stops the batch; secrets already written stay
/// written.  Errors name the secret they came from.
pub fn process_vault(
    vault: &Vault,
    opts: &ProcessOptions,
    master: &MasterKey,
    layout: &Layout,
) -> Result<Vec<(String, SecretResult)>> {
    if let Some(mode) = &opts.mode_override {
        parse_mode(mode, 0)?;
    }

    let names = select_keys(vault, &opts.keys);
    let mut prepared: Vec<(String, Secret)> = Vec::with_capacity(names.len());

    for name in names {
        let mut secret = vault
            .get(&name)
            .cloned()
            .ok_or_else(|| SecretsError::NotFound(name.clone()))?;
        if let Some(mode) = &opts.mode_override {
            secret.mode = Some(mode.clone());
        }
        normalize_secret(&mut secret, layout).map_err(|e| e.for_secret(&name))?;
        validate_secret(&secret, layout).map_err(|e| e.for_secret(&name))?;
        prepared.push((name, secret));
    }
    debug!(count = prepared.len(), "validated selected secrets");

    let writer = SecretWriter::new(layout);
    let write_opts = WriteOptions {
        force: opts.force,
        dry_run: opts.dry_run,
    };

    let mut results = Vec::with_capacity(prepared.len());
    for (name, secret) in prepared {
        let plaintext =
            crypto::decrypt_value(&secret.encrypted, master).map_err(|e| e.for_secret(&name))?;

        let result = if opts.stdout {
            SecretResult::Plaintext(plaintext)
        } else {
            let outcome = writer
                .write(&secret, &plaintext, write_opts)
                .map_err(|e| e.for_secret(&name))?;
            info!(secret = %name, "{outcome}");
            SecretResult::Written(outcome)
        };
        results.push((name, result));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::SecretType;
    use std::fs;
    use tempfile::TempDir;

    fn master() -> MasterKey {
        MasterKey::parse("unit-test-master-key-material!").unwrap()
    }

    fn entry(kind: SecretType, dest: &str, plaintext: &str) -> Secret {
        Secret::new(
            kind,
            crypto::encrypt_value(plaintext.as_bytes(), &master()).unwrap(),
            dest.into(),
        )
    }

    #[test]
    fn unknown_key_is_not_found_before_any_write() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        vault.insert("tok", entry(SecretType::Env, "TOK", "v"));

        let opts = ProcessOptions {
            keys: vec!["tok".into(), "nope".into()],
            ..ProcessOptions::default()
        };
        let err = process_vault(&vault, &opts, &master(), &layout).unwrap_err();
        assert!(matches!(err, SecretsError::NotFound(n) if n == "nope"));
        assert!(!layout.env_file.exists());
    }

    #[test]
    fn validation_failure_names_secret_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        vault.insert("tok", entry(SecretType::Env, "TOK", "v"));
        vault.insert("bad", entry(SecretType::Generic, "/invalid/path/config", "x"));

        let err =
            process_vault(&vault, &ProcessOptions::default(), &master(), &layout).unwrap_err();
        assert!(err.to_string().contains("secret 'bad'"));
        assert!(matches!(err.root(), SecretsError::NotAllowed(_)));
        assert!(!layout.env_file.exists());
    }

    #[test]
    fn bad_secret_mode_fails_before_earlier_secrets_are_written() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        vault.insert("first", entry(SecretType::Ssh, "first", "one"));
        let mut second = entry(SecretType::Ssh, "second", "two");
        second.mode = Some("abc".into());
        vault.insert("second", second);

        let err =
            process_vault(&vault, &ProcessOptions::default(), &master(), &layout).unwrap_err();
        assert!(matches!(err.root(), SecretsError::InvalidMode(m) if m == "abc"));
        assert!(err.to_string().contains("secret 'second'"));
        assert!(!layout.home.join(".ssh/first").exists());
    }

    #[test]
    fn stdout_mode_collects_plaintexts_in_order() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        vault.insert("b", entry(SecretType::Env, "B", "beta"));
        vault.insert("a", entry(SecretType::Ssh, "id", "alpha"));

        let opts = ProcessOptions {
            stdout: true,
            ..ProcessOptions::default()
        };
        let results = process_vault(&vault, &opts, &master(), &layout).unwrap();

        let got: Vec<(String, Vec<u8>)> = results
            .into_iter()
            .map(|(n, r)| match r {
                SecretResult::Plaintext(p) => (n, p.to_vec()),
                SecretResult::Written(o) => panic!("unexpected write: {o}"),
            })
            .collect();
        assert_eq!(
            got,
            [("b".to_string(), b"beta".to_vec()), ("a".to_string(), b"alpha".to_vec())]
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn partial_failure_keeps_earlier_writes() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        vault.insert("first", entry(SecretType::Ssh, "first", "one"));
        let mut broken = entry(SecretType::Ssh, "second", "two");
        let other = MasterKey::parse("another-master-key-material!!").unwrap();
        broken.encrypted = crypto::encrypt_value(b"two", &other).unwrap();
        vault.insert("second", broken);

        let err =
            process_vault(&vault, &ProcessOptions::default(), &master(), &layout).unwrap_err();
        assert!(matches!(err.root(), SecretsError::AuthFailed));
        assert!(err.to_string().contains("secret 'second'"));

        assert_eq!(fs::read(layout.home.join(".ssh/first")).unwrap(), b"one");
        assert!(!layout.home.join(".ssh/second").exists());
    }

    #[test]
    fn mode_override_applies_to_every_secret() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::for_home(dir.path());
        let mut vault = Vault::new();
        let mut s = entry(SecretType::Ssh, "id", "k");
        s.mode = Some("0o600".into());
        vault.insert("id", s);

        let opts = ProcessOptions {
            mode_override: Some("0o640".into()),
            ..ProcessOptions::default()
        };
        let results = process_vault(&vault, &opts, &master(), &layout).unwrap();
        match &results[0].1 {
            SecretResult::Written(WriteOutcome::File { mode, .. }) => assert_eq!(*mode, 0o640),
            other => panic!("unexpected result: {other:?}"),
        }

        let bad = ProcessOptions {
            mode_override: Some("abc".into()),
            ..ProcessOptions::default()
        };
        assert!(matches!(
            process_vault(&vault, &bad, &master(), &layout).unwrap_err(),
            SecretsError::InvalidMode(_)
        ));
    }
}
