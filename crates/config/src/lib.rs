//! Toolchain configuration resolver
//!
//! Loads the build settings of a smart contract toolchain (compiler version
//! constraints and named network profiles), validates them against a fixed
//! schema and resolves named entries into typed values for a downstream
//! compiler or deployer.

pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod network;
pub mod resolver;

pub use compiler::{parse_requirement, CompilerSpec, RangeError, Version, VersionRange, VersionReq};
pub use config::{LoadOptions, ToolConfig};
pub use document::{Format, RawDocument, RawSection};
pub use error::{ConfigError, IssueKind, Result, ValidationErrors, ValidationIssue};
pub use network::{Endpoint, NetworkId, NetworkProfile, Scheme};
pub use resolver::ConfigResolver;
