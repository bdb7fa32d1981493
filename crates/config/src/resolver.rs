//! Document validation and loading
//!
//! `ConfigResolver` turns a `RawDocument` into a `ToolConfig` in one pass.
//! Every problem in the document is collected before anything is returned,
//! so a caller sees all of them at once. Either a complete `ToolConfig` is
//! produced or an error is; there is no partially loaded state.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::compiler::{parse_requirement, CompilerSpec};
use crate::config::{LoadOptions, ToolConfig};
use crate::document::{type_name, Format, RawDocument, RawSection, COMPILERS, NETWORKS};
use crate::error::{IssueKind, Result, ValidationErrors};
use crate::network::{NetworkId, NetworkProfile, WILDCARD};

const MAX_PORT: u64 = u16::MAX as u64;

/// Loads and validates configuration documents
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    options: LoadOptions,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Toggle strict duplicate handling
    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read, parse and validate a configuration file
    ///
    /// The format is taken from the file extension (`.toml` or `.json`).
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<ToolConfig> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = %format, "Read configuration file");
        self.load_str(&content, format)
    }

    /// Parse and validate document text
    pub fn load_str(&self, text: &str, format: Format) -> Result<ToolConfig> {
        let document = RawDocument::parse(text, format)?;
        self.load(&document)
    }

    /// Validate a parsed document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` carrying every issue found:
    /// - `MalformedConfig` for missing sections or fields and wrong value types
    /// - `InvalidCompilerSpec` for version constraints that are not semver ranges
    /// - `InvalidNetworkProfile` for out-of-range ports, empty hosts and
    ///   unusable network ids
    /// - `DuplicateNetwork` / `DuplicateCompiler` for repeated names in strict mode
    pub fn load(&self, document: &RawDocument) -> Result<ToolConfig> {
        let mut errors = ValidationErrors::new();

        let compilers = match &document.compilers {
            Some(section) => self.compilers(section, &mut errors),
            None => BTreeMap::new(),
        };

        let networks = match &document.networks {
            Some(section) => self.networks(section, &mut errors),
            None => {
                errors.push(
                    IssueKind::MalformedConfig,
                    NETWORKS,
                    "missing required section",
                );
                BTreeMap::new()
            }
        };

        if !errors.is_empty() {
            warn!(
                issue_count = errors.len(),
                strict = self.options.strict,
                "Configuration validation failed"
            );
            errors.into_result()?;
        }

        let extensions: BTreeMap<String, Value> = document.extensions.iter().cloned().collect();

        info!(
            compilers = compilers.len(),
            networks = networks.len(),
            "Configuration loaded"
        );
        Ok(ToolConfig::new(compilers, networks, extensions))
    }

    fn compilers(
        &self,
        section: &RawSection,
        errors: &mut ValidationErrors,
    ) -> BTreeMap<String, CompilerSpec> {
        let mut resolved = BTreeMap::new();
        let Some(entries) = entries_of(section, COMPILERS, errors) else {
            return resolved;
        };

        let mut seen = HashSet::new();
        for (name, value) in entries {
            let path = format!("{}.{}", COMPILERS, name);
            if !seen.insert(name.as_str()) {
                if self.options.strict {
                    errors.push(IssueKind::DuplicateCompiler, &path, "declared more than once");
                } else {
                    debug!(compiler = %name, "Later compiler declaration replaces earlier one");
                }
            }
            if let Some(spec) = compiler_entry(name, value, &path, errors) {
                resolved.insert(name.clone(), spec);
            }
        }
        resolved
    }

    fn networks(
        &self,
        section: &RawSection,
        errors: &mut ValidationErrors,
    ) -> BTreeMap<String, NetworkProfile> {
        let mut resolved = BTreeMap::new();
        let Some(entries) = entries_of(section, NETWORKS, errors) else {
            return resolved;
        };

        let mut seen = HashSet::new();
        for (name, value) in entries {
            let path = format!("{}.{}", NETWORKS, name);
            if !seen.insert(name.as_str()) {
                if self.options.strict {
                    errors.push(IssueKind::DuplicateNetwork, &path, "declared more than once");
                } else {
                    debug!(network = %name, "Later network declaration replaces earlier one");
                }
            }
            if let Some(profile) = network_entry(name, value, &path, errors) {
                resolved.insert(name.clone(), profile);
            }
        }
        resolved
    }
}

fn entries_of<'a>(
    section: &'a RawSection,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a [(String, Value)]> {
    match section {
        RawSection::Entries(entries) => Some(entries),
        RawSection::Invalid(value) => {
            errors.push(
                IssueKind::MalformedConfig,
                path,
                format!("expected a table, found {}", type_name(value)),
            );
            None
        }
    }
}

fn table<'a>(value: &'a Value, path: &str, errors: &mut ValidationErrors) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        other => {
            errors.push(
                IssueKind::MalformedConfig,
                path,
                format!("expected a table, found {}", type_name(other)),
            );
            None
        }
    }
}

fn compiler_entry(
    name: &str,
    value: &Value,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<CompilerSpec> {
    let fields = table(value, path, errors)?;
    let before = errors.len();
    let mut spec = CompilerSpec::new(name, None);

    for (key, field) in fields {
        let field_path = format!("{}.{}", path, key);
        match key.as_str() {
            "version" => match field {
                Value::Null => {}
                Value::String(range) => match parse_requirement(range) {
                    Ok(req) => spec.version_range = Some(req),
                    Err(e) => errors.push(
                        IssueKind::InvalidCompilerSpec,
                        field_path,
                        format!("'{}' is not a valid version range: {}", range, e),
                    ),
                },
                other => errors.push(
                    IssueKind::MalformedConfig,
                    field_path,
                    format!("expected a string, found {}", type_name(other)),
                ),
            },
            "settings" => match field {
                Value::Object(_) => spec.settings = Some(field.clone()),
                other => errors.push(
                    IssueKind::MalformedConfig,
                    field_path,
                    format!("expected a table, found {}", type_name(other)),
                ),
            },
            _ => {
                spec.extensions.insert(key.clone(), field.clone());
            }
        }
    }

    (errors.len() == before).then_some(spec)
}

fn network_entry(
    name: &str,
    value: &Value,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<NetworkProfile> {
    let fields = table(value, path, errors)?;
    let before = errors.len();

    let host = host_field(fields.get("host"), &format!("{}.host", path), errors);
    let port = port_field(fields.get("port"), &format!("{}.port", path), errors);
    let network_id = network_id_field(fields.get("network_id"), &format!("{}.network_id", path), errors);

    let mut websockets = false;
    let mut extensions = BTreeMap::new();
    for (key, field) in fields {
        match key.as_str() {
            "host" | "port" | "network_id" => {}
            "websockets" => match field {
                Value::Bool(flag) => websockets = *flag,
                other => errors.push(
                    IssueKind::MalformedConfig,
                    format!("{}.{}", path, key),
                    format!("expected a boolean, found {}", type_name(other)),
                ),
            },
            _ => {
                extensions.insert(key.clone(), field.clone());
            }
        }
    }

    if errors.len() != before {
        return None;
    }
    let (Some(host), Some(port), Some(network_id)) = (host, port, network_id) else {
        return None;
    };

    let mut profile = NetworkProfile::new(name, host, port, network_id);
    profile.websockets = websockets;
    profile.extensions = extensions;
    Some(profile)
}

/// The host is kept exactly as written; a blank host is rejected.
fn host_field(value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> Option<String> {
    match value {
        None => {
            errors.push(IssueKind::MalformedConfig, path, "missing required field");
            None
        }
        Some(Value::String(host)) if host.trim().is_empty() => {
            errors.push(IssueKind::InvalidNetworkProfile, path, "host must not be empty");
            None
        }
        Some(Value::String(host)) => Some(host.clone()),
        Some(other) => {
            errors.push(
                IssueKind::MalformedConfig,
                path,
                format!("expected a string, found {}", type_name(other)),
            );
            None
        }
    }
}

fn port_field(value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> Option<u16> {
    match value {
        None => {
            errors.push(IssueKind::MalformedConfig, path, "missing required field");
            None
        }
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => match n.as_u64() {
            Some(port) if port <= MAX_PORT => u16::try_from(port).ok(),
            _ => {
                errors.push(
                    IssueKind::InvalidNetworkProfile,
                    path,
                    format!("port {} is outside 0..={}", n, MAX_PORT),
                );
                None
            }
        },
        // Integers beyond i64/u64 arrive as floats with no fractional part
        Some(Value::Number(n)) if is_wide_integer_out_of_range(n) => {
            errors.push(
                IssueKind::InvalidNetworkProfile,
                path,
                format!("port {} is outside 0..={}", n, MAX_PORT),
            );
            None
        }
        Some(other) => {
            errors.push(
                IssueKind::MalformedConfig,
                path,
                format!("expected an integer, found {}", describe(other)),
            );
            None
        }
    }
}

fn network_id_field(value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> Option<NetworkId> {
    let invalid = |errors: &mut ValidationErrors, shown: String| {
        errors.push(
            IssueKind::InvalidNetworkProfile,
            path,
            format!("network_id {} is neither a positive integer nor \"{}\"", shown, WILDCARD),
        );
        None
    };

    match value {
        None => {
            errors.push(IssueKind::MalformedConfig, path, "missing required field");
            None
        }
        Some(Value::Number(n)) => match n.as_u64() {
            Some(id) if id > 0 => Some(NetworkId::Concrete(id)),
            _ => invalid(errors, n.to_string()),
        },
        Some(Value::String(s)) => match NetworkId::parse(s) {
            Some(id) => Some(id),
            None => invalid(errors, format!("'{}'", s)),
        },
        Some(other) => {
            errors.push(
                IssueKind::MalformedConfig,
                path,
                format!("expected an integer or string, found {}", type_name(other)),
            );
            None
        }
    }
}

fn is_wide_integer_out_of_range(n: &serde_json::Number) -> bool {
    n.as_f64()
        .map_or(false, |f| f.fract() == 0.0 && !(0.0..=MAX_PORT as f64).contains(&f))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "a non-integer number",
        other => type_name(other),
    }
}
