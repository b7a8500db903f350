//! strataconf-core: Layered property loading with placeholder resolution
//!
//! Properties are collected from boot files, global files, profile files,
//! the environment and command-line arguments into a layered store. Values
//! may reference other keys with `${key}` or `${key:default}`; the engine
//! resolves them in rounds until nothing more can change.
//!
//! # Example
//!
//! ```rust
//! use strataconf_core::{Config, PropertyStore};
//!
//! let mut store = PropertyStore::new();
//! store.put("greeting", "hello ${name:world} from ${host}").unwrap();
//! store.put("host", "box1").unwrap();
//!
//! let config = Config::from_store(store).unwrap();
//! assert_eq!(config.get("greeting"), Some("hello world from box1"));
//! ```

pub mod engine;
pub mod error;
pub mod format;
pub mod interpolation;
pub mod source;
pub mod store;
pub mod value;

pub mod config;

pub use config::{Config, ConfigOptions};
pub use engine::Resolution;
pub use error::{Error, ErrorKind, Result};
pub use format::Format;
pub use interpolation::Placeholder;
pub use source::Source;
pub use store::{Layer, PropertyStore};
pub use value::Value;
