use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::{expand_home, AllowList, Layout};
use crate::errors::{Result, SecretsError};

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "WS_SECRETS_CONFIG";

/// Settings file location relative to the home directory.
pub const CONFIG_RELATIVE_PATH: &str = ".config/ws/secrets.toml";

/// Secrets configuration, loaded from `secrets.toml`.
///
/// Every field has a default so the CLI works without any config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Extra allow-list prefixes, appended to the built-in ones.
    #[serde(default)]
    pub allowed_prefixes: Vec<String>,

    /// Env-secret file, relative to the home directory.
    #[serde(default = "default_env_file")]
    pub env_file: String,

    /// Last-resort master key file.
    #[serde(default = "default_master_key_path")]
    pub master_key_path: String,

    /// Home directory used when `HOME` is unset.
    #[serde(default = "default_fallback_home")]
    pub fallback_home: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_env_file() -> String {
    ".zshenv".to_string()
}

fn default_master_key_path() -> String {
    "/etc/workspace/master.key".to_string()
}

fn default_fallback_home() -> String {
    "/home/kloud".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            allowed_prefixes: Vec::new(),
            env_file: default_env_file(),
            master_key_path: default_master_key_path(),
            fallback_home: default_fallback_home(),
        }
    }
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// If the file does not exist, defaults are returned.  If it exists
    /// but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| SecretsError::io(path, e))?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SecretsError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load settings from `WS_SECRETS_CONFIG`, or the file under the
    /// home directory.
    pub fn discover() -> Result<Self> {
        let path = match std::env::var(CONFIG_ENV) {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => {
                let home = Self::home_from_env(&default_fallback_home());
                home.join(CONFIG_RELATIVE_PATH)
            }
        };
        Self::load(&path)
    }

    /// `HOME`, or `fallback` when it is unset or empty.
    pub fn home_from_env(fallback: &str) -> PathBuf {
        match std::env::var("HOME") {
            Ok(h) if !h.is_empty() => PathBuf::from(h),
            _ => PathBuf::from(fallback),
        }
    }

    /// Build the filesystem layout for the current process environment.
    pub fn layout(&self) -> Layout {
        let home = Self::home_from_env(&self.fallback_home);
        self.layout_for_home(home)
    }

    /// Build the filesystem layout rooted at an explicit home directory.
    pub fn layout_for_home(&self, home: PathBuf) -> Layout {
        let mut allow_list = AllowList::defaults(&home);
        for prefix in &self.allowed_prefixes {
            allow_list.push(expand_home(prefix, &home));
        }

        Layout {
            env_file: home.join(&self.env_file),
            master_key_path: PathBuf::from(&self.master_key_path),
            home,
            allow_list,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert!(s.allowed_prefixes.is_empty());
        assert_eq!(s.env_file, ".zshenv");
        assert_eq!(s.master_key_path, "/etc/workspace/master.key");
        assert_eq!(s.fallback_home, "/home/kloud");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join("secrets.toml")).unwrap();
        assert_eq!(settings.env_file, ".zshenv");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
allowed_prefixes = ["~/.config/app/", "/srv/creds/"]
env_file = ".bashrc"
master_key_path = "/run/keys/master"
"#;
        let path = tmp.path().join("secrets.toml");
        fs::write(&path, config).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.allowed_prefixes.len(), 2);
        assert_eq!(settings.env_file, ".bashrc");
        assert_eq!(settings.master_key_path, "/run/keys/master");
        // Missing fields fall back to defaults.
        assert_eq!(settings.fallback_home, "/home/kloud");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("secrets.toml");
        fs::write(&path, "not valid {{toml").unwrap();

        assert!(matches!(
            Settings::load(&path).unwrap_err(),
            SecretsError::Config(_)
        ));
    }

    #[test]
    fn layout_for_home_applies_settings() {
        let settings = Settings {
            allowed_prefixes: vec!["~/.config/app/".into()],
            ..Settings::default()
        };
        let layout = settings.layout_for_home(PathBuf::from("/home/dev"));

        assert_eq!(layout.env_file, PathBuf::from("/home/dev/.zshenv"));
        assert_eq!(
            layout.master_key_path,
            PathBuf::from("/etc/workspace/master.key")
        );
        assert!(layout
            .allow_list
            .permits(Path::new("/home/dev/.config/app/token")));
        assert!(layout.allow_list.permits(Path::new("/home/dev/.kube/config")));
        assert!(!layout.allow_list.permits(Path::new("/home/dev/notes.txt")));
    }
}
