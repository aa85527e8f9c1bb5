//! Materialization of decrypted secrets.
//!
//! File secrets are written to their resolved path with the secret's
//! mode; env secrets are upserted as `export NAME="value"` lines in the
//! layout's env file.  Both honor `force` (overwrite / replace) and
//! `dry_run` (describe, touch nothing).

pub mod shell;

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Layout;
use crate::errors::{Result, SecretsError};
use crate::vault::mode::{format_mode, parse_mode, parse_mode_opt};
use crate::vault::validate::{resolve_destination, Destination};
use crate::vault::Secret;

/// Mode for directories created on the way to a secret.
pub const DIR_MODE: u32 = 0o755;

/// Mode of the env file after an upsert.
pub const ENV_FILE_MODE: u32 = 0o644;

/// Default mode for `write_secure_file`.
pub const SECURE_FILE_MODE: u32 = 0o600;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Overwrite existing files / replace existing exports.
    pub force: bool,
    /// Describe the write without touching the filesystem.
    pub dry_run: bool,
}

/// What a write did (or would have done).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    File { path: PathBuf, mode: u32 },
    Exported { name: String, file: PathBuf, replaced: bool },
    WouldWriteFile { path: PathBuf, mode: u32 },
    WouldExport { name: String, file: PathBuf },
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::File { path, mode } => {
                write!(f, "wrote {} (mode {})", path.display(), format_mode(*mode))
            }
            WriteOutcome::Exported {
                name,
                file,
                replaced: true,
            } => write!(f, "replaced {name} in {}", file.display()),
            WriteOutcome::Exported { name, file, .. } => {
                write!(f, "exported {name} to {}", file.display())
            }
            WriteOutcome::WouldWriteFile { path, mode } => write!(
                f,
                "[dry-run] would write {} (mode {})",
                path.display(),
                format_mode(*mode)
            ),
            WriteOutcome::WouldExport { name, file } => {
                write!(f, "[dry-run] would export {name} to {}", file.display())
            }
        }
    }
}

/// Writes decrypted secrets into a `Layout`.
pub struct SecretWriter<'a> {
    layout: &'a Layout,
}

impl<'a> SecretWriter<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Materialize one secret.
    ///
    /// `secret.force` set in the vault counts the same as `opts.force`.
    pub fn write(&self, secret: &Secret, plaintext: &[u8], opts: WriteOptions) -> Result<WriteOutcome> {
        let kind = secret.secret_type()?;
        let opts = WriteOptions {
            force: opts.force || secret.force.unwrap_or(false),
            ..opts
        };

        match resolve_destination(secret, self.layout)? {
            Destination::File(path) => {
                let mode = parse_mode_opt(secret.mode.as_deref(), kind.default_mode())?;
                self.write_file(&path, mode, plaintext, opts)
            }
            Destination::Env(name) => self.export_env(&name, plaintext, opts),
        }
    }

    fn write_file(&self, path: &Path, mode: u32, plaintext: &[u8], opts: WriteOptions) -> Result<WriteOutcome> {
        if !self.layout.allow_list.permits(path) {
            return Err(SecretsError::NotAllowed(path.to_path_buf()));
        }

        if opts.dry_run {
            info!(path = %path.display(), mode = %format_mode(mode), "dry-run: would write secret file");
            return Ok(WriteOutcome::WouldWriteFile {
                path: path.to_path_buf(),
                mode,
            });
        }

        if !opts.force && occupied(path) {
            return Err(SecretsError::Exists(path.display().to_string()));
        }

        write_with_mode(path, plaintext, mode)?;
        info!(path = %path.display(), mode = %format_mode(mode), "wrote secret file");
        Ok(WriteOutcome::File {
            path: path.to_path_buf(),
            mode,
        })
    }

    fn export_env(&self, name: &str, plaintext: &[u8], opts: WriteOptions) -> Result<WriteOutcome> {
        let file = self.layout.env_file.clone();

        if opts.dry_run {
            info!(var = name, file = %file.display(), "dry-run: would export env secret");
            return Ok(WriteOutcome::WouldExport {
                name: name.to_string(),
                file,
            });
        }

        let value = std::str::from_utf8(plaintext).map_err(|_| {
            SecretsError::Serialization(format!("env secret {name} is not valid UTF-8"))
        })?;

        let existing = match fs::read_to_string(&file) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(SecretsError::io(&file, e)),
        };
        let mut lines: Vec<String> = existing.lines().map(String::from).collect();

        let line = shell::export_line(name, value);
        let replaced = match shell::find_assignment(&lines, name) {
            Some(_) if !opts.force => return Err(SecretsError::EnvExists(name.to_string())),
            Some(range) => {
                lines.splice(range, std::iter::once(line));
                true
            }
            None => {
                lines.push(line);
                false
            }
        };

        let content = zeroize::Zeroizing::new(shell::render(&lines));
        write_atomic(&file, content.as_bytes(), ENV_FILE_MODE)?;
        info!(var = name, file = %file.display(), replaced, "exported env secret");

        Ok(WriteOutcome::Exported {
            name: name.to_string(),
            file,
            replaced,
        })
    }
}

/// Write `bytes` to `path` with a mode string (`0o600`, `0O644`, `384`;
/// empty means `0o600`), refusing to overwrite unless `force`.
///
/// Used for generated keys and single decrypted values.
pub fn write_secure_file(path: &Path, bytes: &[u8], mode: &str, force: bool) -> Result<()> {
    let mode = parse_mode(mode, SECURE_FILE_MODE)?;

    if !force && occupied(path) {
        return Err(SecretsError::Exists(path.display().to_string()));
    }

    write_with_mode(path, bytes, mode)?;
    info!(path = %path.display(), mode = %format_mode(mode), "wrote file");
    Ok(())
}

/// Whether anything, a dangling symlink included, sits at `path`.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Create missing parent directories with `DIR_MODE`.
fn create_parents(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.exists() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(parent).map_err(|e| SecretsError::io(parent, e))
}

fn set_file_mode(file: &fs::File, path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| SecretsError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = (file, path, mode);
    Ok(())
}

/// Write `bytes` to `path` in place, then force `mode` (the file may
/// have existed with other permissions).
/// A symlink at `path` is never followed.
fn write_with_mode(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    create_parents(path)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode).custom_flags(libc::O_NOFOLLOW);
    }
    #[cfg(not(unix))]
    {
        if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
            return Err(SecretsError::InvalidPath(path.display().to_string()));
        }
    }

    let mut file = options.open(path).map_err(|e| SecretsError::io(path, e))?;
    file.write_all(bytes).map_err(|e| SecretsError::io(path, e))?;
    file.sync_all().map_err(|e| SecretsError::io(path, e))?;
    set_file_mode(&file, path, mode)
}

/// Atomic write: write a sibling temp file with `mode`, then rename it
/// over `path`, so readers never see a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    create_parents(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ws".to_string());
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = write_with_mode(&tmp_path, bytes, mode)
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| SecretsError::io(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
