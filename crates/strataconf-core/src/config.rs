//! Main Config type for strataconf
//!
//! A [`Config`] is built once from [`ConfigOptions`]: every source is loaded
//! into a fresh [`PropertyStore`] in precedence order, then the pending
//! layer is resolved. The result is an owned value callers pass around;
//! there is no process-wide configuration state.

use std::path::PathBuf;

use crate::engine::{self, Resolution};
use crate::error::Result;
use crate::interpolation::Placeholder;
use crate::source::{BootFiles, CliArgs, Environment, GlobalFiles, ProfileFiles, Source};
use crate::store::{Layer, PropertyStore};

/// Default base name of the global property files
pub const DEFAULT_BASE_PATH: &str = "resources/application";
/// Default base name of the boot property files
pub const DEFAULT_BOOT_PATH: &str = "resources/bootstrap";
/// Default key listing the active profiles
pub const DEFAULT_PROFILE_KEY: &str = "profile";

/// Options controlling which sources a load reads
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Base name of the global files; profile files are `<base_path>_<profile>`
    pub base_path: PathBuf,
    /// Base name of the boot files
    pub boot_path: PathBuf,
    /// Key holding the comma-separated profile list
    pub profile_key: String,
    /// Whether to read the OS environment
    pub load_environment: bool,
    /// Explicit environment to use instead of the process environment
    pub env_vars: Option<Vec<(String, String)>>,
    /// Command-line tokens in `-key=value` form
    pub args: Vec<String>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            boot_path: PathBuf::from(DEFAULT_BOOT_PATH),
            profile_key: DEFAULT_PROFILE_KEY.to_string(),
            load_environment: true,
            env_vars: None,
            args: Vec::new(),
        }
    }
}

impl ConfigOptions {
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = path.into();
        self
    }

    pub fn with_boot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.boot_path = path.into();
        self
    }

    pub fn with_profile_key(mut self, key: impl Into<String>) -> Self {
        self.profile_key = key.into();
        self
    }

    pub fn with_environment(mut self, enabled: bool) -> Self {
        self.load_environment = enabled;
        self
    }

    /// Use these variables instead of the process environment
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The sources these options describe, in load order
    pub fn sources(&self) -> Vec<Box<dyn Source>> {
        let mut sources: Vec<Box<dyn Source>> = vec![
            Box::new(BootFiles::new(&self.boot_path)),
            Box::new(GlobalFiles::new(&self.base_path)),
            Box::new(ProfileFiles::new(&self.base_path, &self.profile_key)),
        ];
        if self.load_environment {
            let env = match &self.env_vars {
                Some(vars) => Environment::new(vars.iter().cloned()),
                None => Environment::from_process(),
            };
            sources.push(Box::new(env));
        }
        sources.push(Box::new(CliArgs::new(self.args.iter().cloned())));
        sources
    }
}

/// A loaded and resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    store: PropertyStore,
    resolution: Resolution,
}

impl Config {
    /// Load all sources and resolve; fails if any key stays unresolved
    pub fn load(options: &ConfigOptions) -> Result<Self> {
        Self::load_lenient(options)?.into_complete()
    }

    /// Load all sources and resolve as far as possible
    ///
    /// Unresolved keys stay in the pending layer and are listed in
    /// [`Config::resolution`]. Source errors still fail the load.
    pub fn load_lenient(options: &ConfigOptions) -> Result<Self> {
        Self::load_sources_lenient(&options.sources())
    }

    /// Load an explicit list of sources, in order, and resolve
    pub fn load_sources(sources: &[Box<dyn Source>]) -> Result<Self> {
        Self::load_sources_lenient(sources)?.into_complete()
    }

    fn load_sources_lenient(sources: &[Box<dyn Source>]) -> Result<Self> {
        let mut store = PropertyStore::new();
        for source in sources {
            log::debug!("Loading source {}", source.name());
            source.load(&mut store)?;
        }
        Ok(Self::resolve_store(store))
    }

    /// Resolve an already populated store
    pub fn from_store(store: PropertyStore) -> Result<Self> {
        Self::resolve_store(store).into_complete()
    }

    fn resolve_store(mut store: PropertyStore) -> Self {
        let resolution = engine::resolve(&mut store);
        log::debug!(
            "Resolved {} key(s) in {} round(s), {} default(s) applied",
            store.len(Layer::Resolved),
            resolution.rounds,
            resolution.defaults_applied
        );
        Self { store, resolution }
    }

    fn into_complete(self) -> Result<Self> {
        let Config { store, resolution } = self;
        let resolution = resolution.into_result()?;
        Ok(Config { store, resolution })
    }

    /// Resolved value with boot fallback; `None` when absent or empty
    pub fn get(&self, key: &str) -> Option<&str> {
        non_empty(self.store.get_resolved(key))
    }

    /// Resolved value with boot fallback, or `default`
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Boot layer value only
    pub fn get_boot(&self, key: &str) -> Option<&str> {
        non_empty(self.store.get_boot(key))
    }

    /// Raw value of a key that is still pending
    pub fn get_pending(&self, key: &str) -> Option<&str> {
        non_empty(self.store.get_pending(key))
    }

    /// Outstanding placeholders of a pending key
    pub fn placeholders(&self, key: &str) -> &[Placeholder] {
        self.store.placeholders(key)
    }

    /// Keys present in a layer, sorted
    pub fn keys(&self, layer: Layer) -> Vec<&str> {
        let mut keys = self.store.keys(layer);
        keys.sort_unstable();
        keys
    }

    /// `(key, value)` pairs of a layer, sorted by key
    ///
    /// Pending entries report their current raw value.
    pub fn entries(&self, layer: Layer) -> Vec<(&str, &str)> {
        self.keys(layer)
            .into_iter()
            .map(|key| {
                let value = match layer {
                    Layer::Boot => self.store.get_boot(key),
                    Layer::Resolved => self.store.get_resolved(key),
                    Layer::Pending => self.store.get_pending(key),
                };
                (key, value)
            })
            .collect()
    }

    /// Name of the source that supplied a key
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.store.source_of(key)
    }

    /// Summary of the resolution run
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// The underlying layered store
    pub fn store(&self) -> &PropertyStore {
        &self.store
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
