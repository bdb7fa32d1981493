//! Compiler entries and their version constraints.
//!
//! Constraints are written in the npm range syntax the originating
//! toolchains use: `^0.8.0`, `>=0.5.0 <0.9.0`, `0.5.0 - 0.8.0`,
//! `0.8.x || 0.7.x`. Each `||` alternative is translated into a `semver`
//! requirement; a release matches the range when any alternative matches.
//! A bare full version (`0.8.19`) is an exact match, a bare partial one
//! (`0.8`) accepts every release with that prefix.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A parsed semantic version.
pub type Version = semver::Version;

/// A version requirement (range expression).
pub type VersionReq = semver::VersionReq;

/// Errors produced while parsing a version range.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("empty version range")]
    Empty,

    #[error("malformed hyphen range '{0}'")]
    Hyphen(String),

    #[error("'{part}': {source}")]
    Semver {
        part: String,
        #[source]
        source: semver::Error,
    },
}

/// A version range made of one or more `||` alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Check if a version satisfies any alternative of the range.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as written in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn alternatives(&self) -> &[VersionReq] {
        &self.alternatives
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for VersionRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

/// Parse a version range string like "^0.8.0" or ">=0.5.0 <0.9.0".
pub fn parse_requirement(s: &str) -> Result<VersionRange, RangeError> {
    let raw = s.trim();
    if raw.is_empty() {
        return Err(RangeError::Empty);
    }

    let alternatives = raw
        .split("||")
        .map(|alt| {
            let part = cargo_form(alt)?;
            VersionReq::parse(&part).map_err(|source| RangeError::Semver {
                part: alt.trim().to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VersionRange {
        raw: raw.to_string(),
        alternatives,
    })
}

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// Rewrite one npm alternative as a comma-separated `semver` requirement.
fn cargo_form(alt: &str) -> Result<String, RangeError> {
    // ">= 0.5.0" is one comparator in npm syntax; commas are accepted as separators
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    let raw_tokens = alt
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());
    for token in raw_tokens {
        if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_op.push_str(token);
        } else {
            tokens.push(format!("{}{}", std::mem::take(&mut pending_op), token));
        }
    }
    if !pending_op.is_empty() {
        tokens.push(pending_op);
    }

    match tokens.as_slice() {
        [] => Err(RangeError::Empty),
        [low, dash, high] if dash == "-" => Ok(format!(">={}, <={}", strip_v(low), strip_v(high))),
        _ if tokens.iter().any(|t| t == "-") => Err(RangeError::Hyphen(alt.trim().to_string())),
        _ => Ok(tokens
            .iter()
            .map(|t| comparator(t))
            .collect::<Vec<_>>()
            .join(", ")),
    }
}

fn comparator(token: &str) -> String {
    let split = token
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = strip_v(version);
    if op.is_empty() {
        bare(version)
    } else {
        format!("{}{}", op, version)
    }
}

/// Bare versions: full ones are exact, partial or wildcard ones match a prefix.
fn bare(version: &str) -> String {
    let core = version.split(&['-', '+'][..]).next().unwrap_or(version);
    let parts: Vec<&str> = core.split('.').collect();
    let is_wild = |p: &str| matches!(p, "x" | "X" | "*");

    if parts.len() >= 3 && !parts.iter().any(|p| is_wild(*p)) {
        return format!("={}", version);
    }

    let mut out: Vec<&str> = Vec::new();
    for part in parts {
        if is_wild(part) {
            break;
        }
        out.push(part);
    }
    if out.is_empty() {
        "*".to_string()
    } else if out.len() >= 3 {
        out.join(".")
    } else {
        format!("{}.*", out.join("."))
    }
}

fn strip_v(version: &str) -> &str {
    match version.strip_prefix(&['v', 'V'][..]) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

/// A validated compiler entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompilerSpec {
    /// Compiler name as declared in the document (e.g. `solc`).
    pub name: String,
    /// Accepted releases; `None` means the consuming tool picks its default.
    #[serde(rename = "version", skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionRange>,
    /// Compiler settings passed through to the compiler untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    /// Entry keys this crate does not interpret.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl CompilerSpec {
    pub fn new(name: impl Into<String>, version_range: Option<VersionRange>) -> Self {
        Self {
            name: name.into(),
            version_range,
            settings: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Check whether a concrete compiler release satisfies the constraint.
    ///
    /// An unconstrained spec accepts every release.
    pub fn accepts(&self, version: &Version) -> bool {
        self.version_range
            .as_ref()
            .map_or(true, |range| range.matches(version))
    }

    /// Highest release in `available` that satisfies the constraint.
    pub fn select<'a>(&self, available: &'a [Version]) -> Option<&'a Version> {
        available.iter().filter(|v| self.accepts(v)).max()
    }
}
