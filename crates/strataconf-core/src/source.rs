//! Property sources
//!
//! Each source writes a batch of raw key/value pairs into a
//! [`PropertyStore`]. Sources run in a fixed order and later sources
//! override earlier ones for identical keys:
//!
//! 1. boot files (installed as the separate boot layer)
//! 2. global files
//! 3. profile files, one base name per listed profile
//! 4. OS environment
//! 5. command-line `-key=value` arguments

use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
use crate::format::{self, Format};
use crate::store::PropertyStore;

/// A supplier of raw properties
pub trait Source {
    /// Human-readable name for logging
    fn name(&self) -> String;

    /// Write this source's properties into the store
    fn load(&self, store: &mut PropertyStore) -> Result<()>;
}

/// Load every format present for one base name, `.yaml` then `.json` then `.properties`
///
/// Missing files are skipped. Each key is tagged with the file name it came from.
pub fn load_base(store: &mut PropertyStore, base: &Path) -> Result<()> {
    for format in Format::LOAD_ORDER {
        let path = format.file_for(base);
        let Some(pairs) = format::read_file(&path, format)? else {
            log::trace!("No {} file at {}", format.name(), path.display());
            continue;
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        log::debug!("Loading {} properties from {}", pairs.len(), path.display());

        for (key, value) in pairs {
            store.put_from(&file_name, &key, &value)?;
        }
    }
    Ok(())
}

/// Boot files, loaded into the store's boot layer
#[derive(Debug, Clone)]
pub struct BootFiles {
    path: PathBuf,
}

impl BootFiles {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source for BootFiles {
    fn name(&self) -> String {
        format!("boot:{}", self.path.display())
    }

    fn load(&self, store: &mut PropertyStore) -> Result<()> {
        let mut boot = PropertyStore::new();
        load_base(&mut boot, &self.path)?;
        store.install_boot(boot);
        Ok(())
    }
}

/// Global (profile-independent) files
#[derive(Debug, Clone)]
pub struct GlobalFiles {
    path: PathBuf,
}

impl GlobalFiles {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source for GlobalFiles {
    fn name(&self) -> String {
        format!("global:{}", self.path.display())
    }

    fn load(&self, store: &mut PropertyStore) -> Result<()> {
        load_base(store, &self.path)
    }
}

/// Per-profile files `<path>_<profile>`, for each name in the profile key
///
/// The profile key is read from the already resolved properties (with
/// boot fallback) and split on `,`. Profiles load in listed order, so the
/// last-listed profile wins.
#[derive(Debug, Clone)]
pub struct ProfileFiles {
    path: PathBuf,
    profile_key: String,
}

impl ProfileFiles {
    pub fn new(path: impl Into<PathBuf>, profile_key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            profile_key: profile_key.into(),
        }
    }

    /// Profile names listed in the store, in order
    pub fn profiles(&self, store: &PropertyStore) -> Vec<String> {
        store
            .get_resolved(&self.profile_key)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn profile_path(&self, profile: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push("_");
        name.push(profile);
        PathBuf::from(name)
    }
}

impl Source for ProfileFiles {
    fn name(&self) -> String {
        format!("profiles:{}", self.path.display())
    }

    fn load(&self, store: &mut PropertyStore) -> Result<()> {
        if store.is_pending(&self.profile_key) {
            log::debug!(
                "Profile key '{}' is not resolved yet; no profile files loaded",
                self.profile_key
            );
        }
        for profile in self.profiles(store) {
            log::debug!("Loading profile '{}'", profile);
            load_base(store, &self.profile_path(&profile))?;
        }
        Ok(())
    }
}

/// OS environment variables
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    /// Use an explicit set of variables
    pub fn new<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Snapshot the current process environment
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (Ok(k), Err(_)) => {
                    log::debug!("Skipping environment variable {} with non-Unicode value", k);
                    None
                }
                _ => None,
            })
            .collect();
        Self { vars }
    }

    /// Parse raw `NAME=VALUE` entries, splitting on the first `=`
    ///
    /// Entries without `=` are skipped.
    pub fn from_entries<S: AsRef<str>>(entries: impl IntoIterator<Item = S>) -> Self {
        let vars = entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref();
                match entry.split_once('=') {
                    Some((k, v)) => Some((k.to_string(), v.to_string())),
                    None => {
                        log::warn!("Ignoring environment entry without '=': {}", entry);
                        None
                    }
                }
            })
            .collect();
        Self { vars }
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }
}

impl Source for Environment {
    fn name(&self) -> String {
        "env".to_string()
    }

    /// Variables whose value holds a malformed placeholder are skipped
    fn load(&self, store: &mut PropertyStore) -> Result<()> {
        for (key, value) in &self.vars {
            match store.put_from("env", key, value) {
                Ok(()) => {}
                Err(e) => match e.kind {
                    ErrorKind::MalformedPlaceholder { token } => {
                        log::warn!(
                            "Ignoring environment variable {} with malformed placeholder {}",
                            key,
                            token
                        );
                    }
                    _ => return Err(e),
                },
            }
        }
        Ok(())
    }
}

/// Command-line `-key=value` arguments
///
/// Tokens shorter than three characters, without a leading `-`, without
/// `=` or with an empty key are ignored. Empty values are allowed.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    args: Vec<String>,
}

impl CliArgs {
    pub fn new<S: Into<String>>(args: impl IntoIterator<Item = S>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Process arguments, excluding the program name
    pub fn from_process() -> Self {
        Self::new(std::env::args().skip(1))
    }

    /// Parse one token into a key/value pair
    pub fn parse_token(token: &str) -> Option<(&str, &str)> {
        if token.chars().count() < 3 {
            return None;
        }
        let (key, value) = token.strip_prefix('-')?.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some((key, value))
    }
}

impl Source for CliArgs {
    fn name(&self) -> String {
        "cli".to_string()
    }

    fn load(&self, store: &mut PropertyStore) -> Result<()> {
        for token in &self.args {
            match Self::parse_token(token) {
                Some((key, value)) => store.put_from("cli", key, value)?,
                None => log::warn!("Ignoring malformed argument '{}', expected -key=value", token),
            }
        }
        Ok(())
    }
}
