//! Master key resolution.
//!
//! Sources are consulted in a fixed order and the first one that yields
//! material wins:
//!
//! 1. `--master`: a path to an existing file, or the key itself.
//! 2. `WS_SECRETS_MASTER_KEY`: the key itself.
//! 3. `WS_SECRETS_MASTER_KEY_FILE`: a path that must exist once set.
//! 4. The layout's default key file, when present.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::keys::MasterKey;
use crate::config::Layout;
use crate::errors::{Result, SecretsError};

/// Inline master key variable.
pub const MASTER_KEY_ENV: &str = "WS_SECRETS_MASTER_KEY";

/// Master key file variable.
pub const MASTER_KEY_FILE_ENV: &str = "WS_SECRETS_MASTER_KEY_FILE";

/// Where a resolved key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    FlagFile(PathBuf),
    Env,
    EnvFile(PathBuf),
    DefaultFile(PathBuf),
}

/// Resolve the master key from the flag, the process environment and
/// the layout's default key file.
pub fn resolve_master_key(flag: Option<&str>, layout: &Layout) -> Result<MasterKey> {
    resolve_master_key_with(flag, |name| std::env::var(name).ok(), &layout.master_key_path)
        .map(|(key, _)| key)
}

/// Resolve the master key with an explicit environment lookup.
///
/// Returns the key together with the source that produced it.
pub fn resolve_master_key_with<F>(
    flag: Option<&str>,
    lookup: F,
    default_path: &Path,
) -> Result<(MasterKey, KeySource)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(flag) = flag.filter(|f| !f.is_empty()) {
        let path = Path::new(flag);
        if path.is_file() {
            debug!(path = %path.display(), "master key from --master file");
            let key = read_key_file(path)?;
            return Ok((key, KeySource::FlagFile(path.to_path_buf())));
        }
        debug!("master key from --master value");
        return Ok((MasterKey::parse(flag)?, KeySource::Flag));
    }

    if let Some(inline) = lookup(MASTER_KEY_ENV).filter(|v| !v.is_empty()) {
        debug!("master key from {MASTER_KEY_ENV}");
        return Ok((MasterKey::parse(&inline)?, KeySource::Env));
    }

    if let Some(file) = lookup(MASTER_KEY_FILE_ENV) {
        if file.trim().is_empty() {
            return Err(SecretsError::InvalidKey(format!(
                "{MASTER_KEY_FILE_ENV} is set but empty"
            )));
        }
        let path = PathBuf::from(file);
        if !path.is_file() {
            return Err(SecretsError::InvalidKey(format!(
                "{MASTER_KEY_FILE_ENV} points to {}, which does not exist",
                path.display()
            )));
        }
        debug!(path = %path.display(), "master key from {MASTER_KEY_FILE_ENV}");
        let key = read_key_file(&path)?;
        return Ok((key, KeySource::EnvFile(path)));
    }

    if default_path.is_file() {
        debug!(path = %default_path.display(), "master key from default key file");
        let key = read_key_file(default_path)?;
        return Ok((key, KeySource::DefaultFile(default_path.to_path_buf())));
    }

    Err(SecretsError::KeyNotFound(default_path.to_path_buf()))
}

/// Read and parse a key file, warning when it is readable by others.
pub fn read_key_file(path: &Path) -> Result<MasterKey> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            if meta.permissions().mode() & 0o077 != 0 {
                warn!(path = %path.display(), "master key file is accessible by group or others");
            }
        }
    }

    let contents = fs::read(path).map_err(|e| SecretsError::io(path, e))?;
    MasterKey::from_file_contents(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const FLAG_KEY: &str = "flag-key-material-0123456789";
    const ENV_KEY: &str = "env-key-material-0123456789";
    const FILE_KEY: &str = "file-key-material-0123456789";
    const DEFAULT_KEY: &str = "default-key-material-0123456789";

    struct Fixture {
        _dir: TempDir,
        env_file: PathBuf,
        default_file: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let env_file = dir.path().join("env.key");
        let default_file = dir.path().join("master.key");
        fs::write(&env_file, FILE_KEY).unwrap();
        fs::write(&default_file, DEFAULT_KEY).unwrap();
        Fixture {
            _dir: dir,
            env_file,
            default_file,
        }
    }

    fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn flag_wins_over_everything() {
        let fx = fixture();
        let vars = HashMap::from([
            (MASTER_KEY_ENV, ENV_KEY.to_string()),
            (MASTER_KEY_FILE_ENV, fx.env_file.display().to_string()),
        ]);

        let (key, source) =
            resolve_master_key_with(Some(FLAG_KEY), lookup(vars), &fx.default_file).unwrap();
        assert_eq!(key.as_bytes(), FLAG_KEY.as_bytes());
        assert_eq!(source, KeySource::Flag);
    }

    #[test]
    fn flag_naming_a_file_reads_the_file() {
        let fx = fixture();
        let flag = fx.env_file.display().to_string();

        let (key, source) =
            resolve_master_key_with(Some(&flag), lookup(HashMap::new()), &fx.default_file)
                .unwrap();
        assert_eq!(key.as_bytes(), FILE_KEY.as_bytes());
        assert_eq!(source, KeySource::FlagFile(fx.env_file.clone()));
    }

    #[test]
    fn env_wins_over_env_file_and_default() {
        let fx = fixture();
        let vars = HashMap::from([
            (MASTER_KEY_ENV, ENV_KEY.to_string()),
            (MASTER_KEY_FILE_ENV, "/nonexistent/should-not-be-read".to_string()),
        ]);

        let (key, source) = resolve_master_key_with(None, lookup(vars), &fx.default_file).unwrap();
        assert_eq!(key.as_bytes(), ENV_KEY.as_bytes());
        assert_eq!(source, KeySource::Env);
    }

    #[test]
    fn empty_flag_and_env_are_skipped() {
        let fx = fixture();
        let vars = HashMap::from([
            (MASTER_KEY_ENV, String::new()),
            (MASTER_KEY_FILE_ENV, fx.env_file.display().to_string()),
        ]);

        let (key, source) =
            resolve_master_key_with(Some(""), lookup(vars), &fx.default_file).unwrap();
        assert_eq!(key.as_bytes(), FILE_KEY.as_bytes());
        assert_eq!(source, KeySource::EnvFile(fx.env_file.clone()));
    }

    #[test]
    fn env_file_must_exist() {
        let fx = fixture();
        let vars = HashMap::from([(MASTER_KEY_FILE_ENV, "/nonexistent/master.key".to_string())]);

        let err = resolve_master_key_with(None, lookup(vars), &fx.default_file).unwrap_err();
        assert!(matches!(err, SecretsError::InvalidKey(_)));
    }

    #[test]
    fn empty_env_file_var_is_an_error() {
        let fx = fixture();
        for value in ["", "  "] {
            let vars = HashMap::from([(MASTER_KEY_FILE_ENV, value.to_string())]);
            let err = resolve_master_key_with(None, lookup(vars), &fx.default_file).unwrap_err();
            assert!(matches!(err, SecretsError::InvalidKey(m) if m.contains(MASTER_KEY_FILE_ENV)));
        }
    }

    #[test]
    fn default_file_is_last_resort() {
        let fx = fixture();
        let (key, source) =
            resolve_master_key_with(None, lookup(HashMap::new()), &fx.default_file).unwrap();
        assert_eq!(key.as_bytes(), DEFAULT_KEY.as_bytes());
        assert_eq!(source, KeySource::DefaultFile(fx.default_file.clone()));
    }

    #[test]
    fn nothing_found_is_key_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("master.key");

        let err = resolve_master_key_with(None, lookup(HashMap::new()), &missing).unwrap_err();
        assert!(matches!(err, SecretsError::KeyNotFound(p) if p == missing));
        let msg = SecretsError::KeyNotFound(missing).to_string();
        assert!(msg.contains("--master"));
        assert!(msg.contains(MASTER_KEY_ENV));
        assert!(msg.contains(MASTER_KEY_FILE_ENV));
    }

    #[test]
    fn key_file_contents_are_trimmed_and_base64_aware() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("k");
        fs::write(&path, "MTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTI=\n").unwrap();

        let key = read_key_file(&path).unwrap();
        assert_eq!(key.as_bytes(), b"12345678901234567890123456789012");
    }
}
