//! Raw configuration documents
//!
//! A `RawDocument` is the parsed but unvalidated form of a configuration
//! file. It keeps entries in document order and keeps repeated entry names,
//! so the resolver can apply last-write-wins or report duplicates in strict
//! mode. TOML rejects duplicate keys while parsing; JSON does not.

use std::fmt;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Section holding compiler entries
pub const COMPILERS: &str = "compilers";
/// Section holding network entries
pub const NETWORKS: &str = "networks";

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contents of a top-level section
#[derive(Debug, Clone, PartialEq)]
pub enum RawSection {
    /// Named entries in document order, duplicates included
    Entries(Vec<(String, Value)>),
    /// Anything that is not a table/object
    Invalid(Value),
}

impl RawSection {
    pub fn empty() -> Self {
        RawSection::Entries(Vec::new())
    }
}

impl<'de> Deserialize<'de> for RawSection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Entries(Entries),
            Other(Value),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Entries(Entries(entries)) => RawSection::Entries(entries),
            Repr::Other(value) => RawSection::Invalid(value),
        })
    }
}

/// Map contents collected as a list so repeated keys survive
struct Entries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of named entries")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Entries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    entries.push((name, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parsed, unvalidated configuration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    pub compilers: Option<RawSection>,
    pub networks: Option<RawSection>,
    /// Top-level sections other than `compilers` and `networks`
    pub extensions: Vec<(String, Value)>,
}

impl RawDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text without validating it
    pub fn parse(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Toml => Ok(toml::from_str(text)?),
            Format::Json => Ok(serde_json::from_str(text)?),
        }
    }

    /// Append a compiler entry
    pub fn compiler(mut self, name: impl Into<String>, value: Value) -> Self {
        push_entry(&mut self.compilers, name.into(), value);
        self
    }

    /// Append a network entry; repeated names are kept
    pub fn network(mut self, name: impl Into<String>, value: Value) -> Self {
        push_entry(&mut self.networks, name.into(), value);
        self
    }

    pub fn with_section(mut self, name: &str, section: RawSection) -> Self {
        match name {
            COMPILERS => self.compilers = Some(section),
            NETWORKS => self.networks = Some(section),
            _ => {
                let value = match section {
                    RawSection::Entries(entries) => Value::Object(entries.into_iter().collect()),
                    RawSection::Invalid(value) => value,
                };
                self.extensions.push((name.to_string(), value));
            }
        }
        self
    }
}

fn push_entry(section: &mut Option<RawSection>, name: String, value: Value) {
    match section {
        Some(RawSection::Entries(entries)) => entries.push((name, value)),
        _ => *section = Some(RawSection::Entries(vec![(name, value)])),
    }
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RawDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of configuration sections")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RawDocument, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut doc = RawDocument::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        COMPILERS => doc.compilers = Some(map.next_value()?),
                        NETWORKS => doc.networks = Some(map.next_value()?),
                        _ => {
                            let value: Value = map.next_value()?;
                            doc.extensions.push((key, value));
                        }
                    }
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("tool.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::from_path(Path::new("dir/tool.JSON")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("tool-config.js")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(Format::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_parse_toml_sections() {
        let doc = RawDocument::parse(
            r#"
            [compilers.solc]
            version = "^0.8.0"

            [networks.development]
            host = "127.0.0.1"
            port = 8545
            network_id = "*"

            [plugins]
            verify = true
            "#,
            Format::Toml,
        )
        .unwrap();

        match doc.networks {
            Some(RawSection::Entries(ref entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, "development");
                assert_eq!(entries[0].1["port"], json!(8545));
            }
            ref other => panic!("unexpected networks section: {:?}", other),
        }
        assert!(matches!(doc.compilers, Some(RawSection::Entries(ref e)) if e.len() == 1));
        assert_eq!(doc.extensions.len(), 1);
        assert_eq!(doc.extensions[0].0, "plugins");
    }

    #[test]
    fn test_json_keeps_duplicate_entries() {
        let doc = RawDocument::parse(
            r#"{
                "networks": {
                    "development": { "host": "127.0.0.1", "port": 8545, "network_id": "*" },
                    "development": { "host": "10.0.0.5", "port": 7545, "network_id": 5777 }
                }
            }"#,
            Format::Json,
        )
        .unwrap();

        match doc.networks {
            Some(RawSection::Entries(entries)) => {
                let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["development", "development"]);
                assert_eq!(entries[1].1["port"], json!(7545));
            }
            other => panic!("unexpected networks section: {:?}", other),
        }
    }

    #[test]
    fn test_toml_rejects_duplicate_tables() {
        let result = RawDocument::parse(
            "[networks.dev]\nport = 1\n[networks.dev]\nport = 2\n",
            Format::Toml,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_non_table_section_is_kept_as_invalid() {
        let doc = RawDocument::parse(r#"{ "networks": [1, 2] }"#, Format::Json).unwrap();
        assert_eq!(doc.networks, Some(RawSection::Invalid(json!([1, 2]))));
        assert!(doc.compilers.is_none());
    }

    #[test]
    fn test_non_table_document_fails_to_parse() {
        let err = RawDocument::parse("[1, 2, 3]", Format::Json).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_builder_appends_entries() {
        let doc = RawDocument::new()
            .network("development", json!({ "port": 1 }))
            .network("development", json!({ "port": 2 }))
            .compiler("solc", json!({}));

        assert!(matches!(doc.networks, Some(RawSection::Entries(ref e)) if e.len() == 2));
        assert!(matches!(doc.compilers, Some(RawSection::Entries(ref e)) if e.len() == 1));
    }
}
