//! Property file formats
//!
//! Parses `.yaml`, `.json` and `.properties` content into flat
//! `(key, raw value)` pairs in document order.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// A supported property file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Properties,
}

impl Format {
    /// Formats in the order they are read for one base name
    ///
    /// Later formats override earlier ones key by key.
    pub const LOAD_ORDER: [Format; 3] = [Format::Yaml, Format::Json, Format::Properties];

    /// File extension for this format (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Properties => "properties",
        }
    }

    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(Format::Yaml),
            Some("json") => Some(Format::Json),
            Some("properties") => Some(Format::Properties),
            _ => None,
        }
    }

    /// Append this format's extension to a base name (`resources/application` -> `resources/application.yaml`)
    pub fn file_for(&self, base: &Path) -> PathBuf {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }

    /// Display name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Format::Yaml => "YAML",
            Format::Json => "JSON",
            Format::Properties => "properties",
        }
    }
}

/// Parse content in the given format; `file` is used for error locations
pub fn parse(format: Format, content: &str, file: &str) -> Result<Vec<(String, String)>> {
    match format {
        Format::Yaml => parse_yaml(content, file),
        Format::Json => parse_json(content, file),
        Format::Properties => parse_properties(content, file),
    }
}

/// Read and parse a file, returning `None` when it does not exist
pub fn read_file(path: &Path, format: Format) -> Result<Option<Vec<(String, String)>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path.display().to_string(), e.to_string())),
    };
    parse(format, &content, &path.display().to_string()).map(Some)
}

/// Parse a YAML document whose top level is a mapping
pub fn parse_yaml(content: &str, file: &str) -> Result<Vec<(String, String)>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_yaml::from_str(content).map_err(|e| {
        Error::parse(format!("Invalid YAML: {}", e)).with_source_location(SourceLocation {
            file: file.to_string(),
            line: e.location().map(|l| l.line()),
        })
    })?;
    flatten_document(value, file)
}

/// Parse a JSON document whose top level is an object
pub fn parse_json(content: &str, file: &str) -> Result<Vec<(String, String)>> {
    let value: Value = serde_json::from_str(content).map_err(|e| {
        Error::parse(format!("Invalid JSON: {}", e)).with_source_location(SourceLocation {
            file: file.to_string(),
            line: Some(e.line()),
        })
    })?;
    flatten_document(value, file)
}

fn flatten_document(value: Value, file: &str) -> Result<Vec<(String, String)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(_) => Ok(value.flatten("")),
        other => Err(Error::parse(format!(
            "Top level must be a mapping, found {}",
            other.type_name()
        ))
        .with_source_location(SourceLocation {
            file: file.to_string(),
            line: None,
        })),
    }
}

/// Parse `key = value` lines
///
/// Blank lines and lines starting with `#` or `!` are skipped. Each line is
/// split on its first `=`; lines with a blank key are skipped and lines
/// without `=` are rejected.
pub fn parse_properties(content: &str, file: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(
                Error::parse(format!("Invalid property line: {}", line))
                    .with_source_location(SourceLocation {
                        file: file.to_string(),
                        line: Some(idx + 1),
                    })
                    .with_help("Property lines must have the form key=value"),
            );
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.push((key.to_string(), value.trim().to_string()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_yaml_nested() {
        let yaml = r#"
level1:
  level2: my value
  port: 8080
profile: dev, debug
"#;
        assert_eq!(
            parse_yaml(yaml, "application.yaml").unwrap(),
            pairs(&[
                ("level1.level2", "my value"),
                ("level1.port", "8080"),
                ("profile", "dev, debug"),
            ])
        );
    }

    #[test]
    fn test_parse_yaml_non_string_keys() {
        let yaml = "ports:\n  8080: http\n  8443: https\nflags:\n  true: on\n";
        assert_eq!(
            parse_yaml(yaml, "application.yaml").unwrap(),
            pairs(&[
                ("ports.8080", "http"),
                ("ports.8443", "https"),
                ("flags.true", "on"),
            ])
        );
    }

    #[test]
    fn test_parse_yaml_empty_document() {
        assert!(parse_yaml("", "empty.yaml").unwrap().is_empty());
        assert!(parse_yaml("  \n", "empty.yaml").unwrap().is_empty());
    }

    #[test]
    fn test_parse_yaml_invalid() {
        let err = parse_yaml("key: [unclosed", "broken.yaml").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.source_location.unwrap().file, "broken.yaml");
    }

    #[test]
    fn test_parse_yaml_top_level_must_be_mapping() {
        let err = parse_yaml("- a\n- b\n", "list.yaml").unwrap_err();
        assert!(err.to_string().contains("Top level must be a mapping, found sequence"));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"json1": "application.json", "nested": {"flag": false, "ratio": 0.5}}"#;
        assert_eq!(
            parse_json(json, "application.json").unwrap(),
            pairs(&[
                ("json1", "application.json"),
                ("nested.flag", "false"),
                ("nested.ratio", "0.5"),
            ])
        );
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = parse_json("{\n\"a\": }", "bad.json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.source_location.unwrap().line, Some(2));
    }

    #[test]
    fn test_parse_properties() {
        let content = "\
# comment
! also a comment

properties1 = application.properties
url=jdbc:h2:mem:test;MODE=PostgreSQL
empty=
 = no key
";
        assert_eq!(
            parse_properties(content, "application.properties").unwrap(),
            pairs(&[
                ("properties1", "application.properties"),
                ("url", "jdbc:h2:mem:test;MODE=PostgreSQL"),
                ("empty", ""),
            ])
        );
    }

    #[test]
    fn test_parse_properties_missing_separator() {
        let err = parse_properties("a=1\njust text\n", "app.properties").unwrap_err();
        let loc = err.source_location.clone().unwrap();

        assert_eq!(loc.file, "app.properties");
        assert_eq!(loc.line, Some(2));
        assert!(err.to_string().contains("Invalid property line: just text"));
    }

    #[test]
    fn test_format_detection_and_paths() {
        assert_eq!(Format::from_path(Path::new("a.yml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a.properties")), Some(Format::Properties));
        assert_eq!(Format::from_path(Path::new("a.toml")), None);
        assert_eq!(
            Format::Json.file_for(Path::new("resources/application_dev")),
            PathBuf::from("resources/application_dev.json")
        );
    }

    #[test]
    fn test_read_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(read_file(&path, Format::Yaml).unwrap().is_none());
    }

    #[test]
    fn test_read_file_parses_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.properties");
        std::fs::write(&path, "a=1\n").unwrap();

        assert_eq!(
            read_file(&path, Format::Properties).unwrap(),
            Some(pairs(&[("a", "1")]))
        );
    }
}
