use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzers::TaggingOptions;

/// Config files looked up in the scope root, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["triage.yaml", "triage.yml", "triage.json"];

/// Environment variable overriding the configured compiler.
pub const SOLC_ENV: &str = "TRIAGE_SOLC";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse config YAML {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Run settings; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Compiler executable.
    pub solc: String,
    /// Argv of a tool printing the fallback producer's JSON document. The
    /// entry path is appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_command: Option<Vec<String>>,
    pub include_libraries: bool,
    pub include_interfaces: bool,
    pub drop_cross_file_inherited: bool,
    pub drop_unsliceable: bool,
    /// Exclude `lib/`, `script/` and `test/` of a Foundry project when no
    /// out-of-scope list is given.
    pub foundry_default_excludes: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            solc: "solc".to_string(),
            fallback_command: None,
            include_libraries: false,
            include_interfaces: false,
            drop_cross_file_inherited: true,
            drop_unsliceable: true,
            foundry_default_excludes: true,
        }
    }
}

impl TriageConfig {
    /// Read a config file; JSON for `.json`, YAML otherwise.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let owned = || path.to_path_buf();
        let bytes = fs::read(path).map_err(|source| ConfigError::Read { path: owned(), source })?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_slice(&bytes)
                .map_err(|source| ConfigError::Json { path: owned(), source })
        } else if bytes.iter().all(u8::is_ascii_whitespace) {
            // serde_yaml reads an empty document as null.
            Ok(Self::default())
        } else {
            serde_yaml::from_slice(&bytes)
                .map_err(|source| ConfigError::Yaml { path: owned(), source })
        }
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(solc) = lookup(SOLC_ENV).filter(|s| !s.trim().is_empty()) {
            self.solc = solc;
        }
        self
    }

    pub fn tagging_options(&self) -> TaggingOptions {
        TaggingOptions {
            drop_cross_file_inherited: self.drop_cross_file_inherited,
            drop_unsliceable: self.drop_unsliceable,
        }
    }
}

/// First config file found in `scope_root`, if any.
pub fn find_config_file(scope_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| scope_root.join(name)).find(|p| p.is_file())
}

/// Load settings from `explicit`, or from a config file in `scope_root`,
/// then apply environment overrides. No file means defaults.
///
/// Returns the config and the file it came from.
pub fn load_config(
    explicit: Option<&Path>,
    scope_root: &Path,
) -> Result<(TriageConfig, Option<PathBuf>), ConfigError> {
    let source = explicit.map(Path::to_path_buf).or_else(|| find_config_file(scope_root));
    let config = match &source {
        Some(path) => {
            debug!("loading config from {}", path.display());
            TriageConfig::from_path(path)?
        }
        None => TriageConfig::default(),
    };
    Ok((config.with_env_overrides(|key| std::env::var(key).ok()), source))
}
