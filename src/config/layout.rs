//! Filesystem layout the secrets layer operates in.
//!
//! A `Layout` is passed explicitly to every operation that touches the
//! filesystem: it names the home directory, the env-secret file, the
//! last-resort key file and the allow-list of materialization prefixes.

use std::path::{Component, Path, PathBuf};

/// Built-in allow-list prefixes, relative to the home directory.
const HOME_PREFIXES: &[&str] = &[".kube/", ".ssh/", ".docker/"];

/// Built-in absolute allow-list prefixes.
const SYSTEM_PREFIXES: &[&str] = &["/etc/secrets/"];

/// Path prefixes file secrets may be written under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    prefixes: Vec<String>,
}

impl AllowList {
    /// An allow-list with exactly `prefixes`.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// `~/.kube/`, `~/.ssh/`, `~/.docker/` and `/etc/secrets/`.
    pub fn defaults(home: &Path) -> Self {
        let mut list = Self::default();
        for rel in HOME_PREFIXES {
            list.push(home.join(rel));
        }
        for abs in SYSTEM_PREFIXES {
            list.push(PathBuf::from(abs));
        }
        list
    }

    /// Add a prefix.  Directory prefixes are stored with a trailing `/`
    /// so `~/.ssh` does not admit `~/.sshevil`.
    pub fn push(&mut self, prefix: impl AsRef<Path>) {
        let mut s = prefix.as_ref().to_string_lossy().into_owned();
        if !s.ends_with('/') {
            s.push('/');
        }
        if !self.prefixes.contains(&s) {
            self.prefixes.push(s);
        }
    }

    /// Whether `path` (already absolute and cleaned) lies under a prefix.
    pub fn permits(&self, path: &Path) -> bool {
        let candidate = path.to_string_lossy();
        self.prefixes.iter().any(|p| candidate.starts_with(p.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Where secrets go on this machine.
#[derive(Debug, Clone)]
pub struct Layout {
    pub home: PathBuf,
    /// File that env secrets are exported into.
    pub env_file: PathBuf,
    /// Last-resort master key file.
    pub master_key_path: PathBuf,
    pub allow_list: AllowList,
}

impl Layout {
    /// Default layout rooted at `home`, with the built-in allow-list.
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        crate::config::Settings::default().layout_for_home(home.into())
    }

    /// Replace the allow-list.
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Expand `$VAR` / `${VAR}`, then a leading `~`.  `HOME` resolves to
    /// this layout's home; other names come from the process environment.
    pub fn expand_path(&self, input: &str) -> PathBuf {
        expand_home(&expand_vars_with(input, |name| self.lookup(name)), &self.home)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if name == "HOME" {
            Some(self.home.to_string_lossy().into_owned())
        } else {
            std::env::var(name).ok()
        }
    }
}

/// Replace a leading `~` or `~/` with `home`.  `~user` forms are kept.
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    let home = home.to_string_lossy().into_owned();
    PathBuf::from(shellexpand::tilde_with_context(path, || Some(home)).into_owned())
}

/// Expand `$VAR` / `${VAR}` references using `lookup`.  Names `lookup`
/// does not know expand to nothing; a `$` that starts no name is kept.
pub fn expand_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    shellexpand::env_with_context_no_errors(input, |name| Some(lookup(name).unwrap_or_default()))
        .into_owned()
}

/// Lexically clean a path: drop `.` segments, resolve `..`, collapse
/// repeated separators.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !path.is_absolute() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
