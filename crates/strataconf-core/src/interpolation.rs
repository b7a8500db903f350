//! Placeholder parsing
//!
//! Extracts placeholder expressions from raw property values:
//! - `${name}` - reference to another key
//! - `${name:default}` - reference with a literal fallback
//!
//! Names and defaults are runs of non-whitespace characters. The default is
//! everything after the first `:`, so it may itself contain `:`. A run of
//! `$` in front of the opening brace is not an escape: in `$${name}` the
//! token is `${name}` and the extra `$` stays literal text.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([^\s{}]*)\}").expect("placeholder pattern is valid")
    })
}

/// A placeholder found in a raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The exact text matched, e.g. `${abc:xyz}`
    pub token: String,
    /// The referenced key, e.g. `abc`
    pub key: String,
    /// The fallback literal, e.g. `xyz` (`None` when absent or empty)
    pub default: Option<String>,
}

impl Placeholder {
    /// Parse a single `${...}` token
    pub fn parse(token: &str) -> Result<Self> {
        let body = token
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| Error::malformed_placeholder(token))?;

        let (key, default) = match body.split_once(':') {
            Some((key, default)) => (key, Some(default)),
            None => (body, None),
        };

        if key.is_empty() {
            return Err(Error::malformed_placeholder(token));
        }

        Ok(Self {
            token: token.to_string(),
            key: key.to_string(),
            default: default.filter(|d| !d.is_empty()).map(str::to_string),
        })
    }

    /// Whether this placeholder carries a fallback value
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Extract every placeholder in `raw`, left to right
///
/// Repeated tokens produce one entry per occurrence.
pub fn extract(raw: &str) -> Result<Vec<Placeholder>> {
    placeholder_regex()
        .find_iter(raw)
        .map(|m| Placeholder::parse(m.as_str()))
        .collect()
}

/// Extract the placeholders of text produced by substitution
///
/// A malformed token assembled by a substitution (e.g. `${}`) is not a
/// reference and stays literal text instead of failing resolution.
pub(crate) fn rescan(raw: &str) -> Vec<Placeholder> {
    placeholder_regex()
        .find_iter(raw)
        .filter_map(|m| Placeholder::parse(m.as_str()).ok())
        .collect()
}

/// Check if a string contains at least one placeholder
pub fn contains_placeholder(raw: &str) -> bool {
    placeholder_regex().is_match(raw)
}
