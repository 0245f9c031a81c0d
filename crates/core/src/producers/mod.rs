//! Producers: the external tools that turn Solidity source into contract
//! records.
//!
//! Two adapters implement [`ContractSource`]: the compiler (`solc`) and a
//! best-effort fallback tool whose JSON contract objects are reconciled into
//! the same model. Callers select a producer by name from a
//! [`ProducerRegistry`]; choosing when to fall back is left to them.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ContractRecord;
use crate::source::SourceTexts;

pub mod fallback;
pub mod solc;

pub use fallback::{parse_fallback_document, FallbackProducer};
pub use solc::{build_standard_json_input, parse_standard_json_output, SolcOutput, SolcProducer};

/// Everything a producer needs for one run.
#[derive(Debug, Clone, Default)]
pub struct IndexRequest {
    /// In-scope files, as the display strings used to key `sources`.
    pub files: Vec<String>,
    pub sources: SourceTexts,
    /// Project root handed to the fallback tool (a directory or single file).
    pub entry: PathBuf,
    /// Compiler executable.
    pub solc: String,
    /// Fallback tool argv; the entry path is appended.
    pub fallback_command: Option<Vec<String>>,
    /// Pre-generated fallback JSON, used instead of running the tool.
    pub fallback_json: Option<PathBuf>,
}

impl IndexRequest {
    /// Whether the fallback producer has something to read or run.
    pub fn has_fallback(&self) -> bool {
        self.fallback_json.is_some()
            || self.fallback_command.as_ref().is_some_and(|argv| !argv.is_empty())
    }
}

/// The producers this crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    /// The compiler's syntax tree; exact, required for sinks.
    Solc,
    /// Best-effort contract objects from an external analysis tool.
    Fallback,
}

impl ProducerKind {
    pub const ALL: [ProducerKind; 2] = [ProducerKind::Solc, ProducerKind::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerKind::Solc => "solc",
            ProducerKind::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProducerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a producer diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// `error` and `fatal` (any case) are errors; unknown severities are warnings.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "error" | "fatal" => Severity::Error,
            "info" => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// A message reported by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Exited { tool: String, status: String, stderr: String },
    #[error("{tool} produced unreadable output: {detail}")]
    InvalidOutput { tool: String, detail: String },
    #[error("compilation failed:\n{}", diagnostics.join("\n"))]
    Compilation { diagnostics: Vec<String> },
    #[error("fallback producer not configured (set fallback_command or pass --fallback-json)")]
    NotConfigured,
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Implemented by every producer adapter.
pub trait ContractSource: Send + Sync {
    fn kind(&self) -> ProducerKind;
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
    fn description(&self) -> &'static str;
    /// Extract contract records for the request's files, ordered by `(file, name)`.
    fn extract(&self, request: &IndexRequest) -> Result<Vec<ContractRecord>, ProducerError>;
}

/// Registry for producers; callers select by name.
#[derive(Default)]
pub struct ProducerRegistry {
    producers: HashMap<String, Box<dyn ContractSource>>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self { producers: HashMap::new() }
    }

    pub fn register<P: ContractSource + 'static>(&mut self, producer: P) -> &mut Self {
        self.producers.insert(producer.name().to_string(), Box::new(producer));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn ContractSource> {
        self.producers.get(name).map(|p| &**p)
    }

    pub fn get_kind(&self, kind: ProducerKind) -> Option<&dyn ContractSource> {
        self.get(kind.as_str())
    }

    /// Sorted producer names for help and error messages.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.producers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry holding the compiler and the fallback producer.
pub fn default_producer_registry() -> ProducerRegistry {
    let mut registry = ProducerRegistry::new();
    registry.register(SolcProducer).register(FallbackProducer);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_both_producers() {
        let registry = default_producer_registry();
        assert_eq!(registry.names(), vec!["fallback".to_string(), "solc".to_string()]);
        assert!(registry.get("solc").is_some());
        assert!(registry.get("slither").is_none());
        for kind in ProducerKind::ALL {
            assert_eq!(registry.get_kind(kind).map(|p| p.kind()), Some(kind));
        }
    }

    #[test]
    fn severity_parsing_is_case_insensitive() {
        assert_eq!(Severity::parse("Error"), Severity::Error);
        assert_eq!(Severity::parse("FATAL"), Severity::Error);
        assert_eq!(Severity::parse("warning"), Severity::Warning);
        assert_eq!(Severity::parse(""), Severity::Warning);
        assert_eq!(Severity::parse("info"), Severity::Info);
    }

    #[test]
    fn compilation_error_lists_diagnostics() {
        let err = ProducerError::Compilation { diagnostics: vec!["a".into(), "b".into()] };
        assert_eq!(err.to_string(), "compilation failed:\na\nb");
    }
}
