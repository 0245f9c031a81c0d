//! Report assembly and rendering.
//!
//! One [`IndexReport`] is built per run and projected onto the requested
//! mode: the contract index, the entrypoint map, or the sink map. JSON and
//! Markdown are both renderings of that same value.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyzers::{collect_entrypoints, collect_sinks, PolicyDrop, TaggingOptions};
use crate::model::{ContractKind, ContractRecord, EntrypointTag, SinkTag};
use crate::producers::ProducerKind;
use crate::source::SourceTexts;

pub mod markdown;

pub use markdown::render_markdown;

/// What a run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    #[default]
    Index,
    Entrypoints,
    Sinks,
}

/// Presentation filters and tagging policy for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportOptions {
    pub mode: ReportMode,
    /// List libraries in the index.
    pub include_libraries: bool,
    /// List interfaces in the index.
    pub include_interfaces: bool,
    /// Keep internal/private functions in the index listing.
    pub full: bool,
    pub tagging: TaggingOptions,
}

/// An indexed file and the digest of the text that was indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedFile {
    pub path: String,
    pub sha256: String,
}

/// Everything one run produced, already projected onto its mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub directory: String,
    pub producer: ProducerKind,
    pub files: Vec<ScopedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<Vec<ContractRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoints: Option<Vec<EntrypointTag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sinks: Option<Vec<SinkTag>>,
    /// Entrypoint candidates removed by policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<PolicyDrop>,
}

impl IndexReport {
    pub fn mode(&self) -> ReportMode {
        if self.entrypoints.is_some() {
            ReportMode::Entrypoints
        } else if self.sinks.is_some() {
            ReportMode::Sinks
        } else {
            ReportMode::Index
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Assemble the report for `options.mode`.
///
/// Index mode lists contracts of the kinds allowed by the options, with only
/// public/external functions unless `full` is set; contracts left with no
/// functions are omitted. Entrypoint and sink modes tag every contract but
/// report only those of kind `contract`.
pub fn build_report(
    directory: &str,
    files: &[String],
    sources: &SourceTexts,
    contracts: &[ContractRecord],
    producer: ProducerKind,
    options: &ReportOptions,
) -> IndexReport {
    let files = files
        .iter()
        .map(|path| ScopedFile {
            path: path.clone(),
            sha256: sha256_hex(sources.get(path).map(String::as_bytes).unwrap_or_default()),
        })
        .collect();

    let mut report = IndexReport {
        directory: directory.to_string(),
        producer,
        files,
        contracts: None,
        entrypoints: None,
        sinks: None,
        dropped: Vec::new(),
    };

    match options.mode {
        ReportMode::Index => {
            report.contracts = Some(index_listing(contracts, options));
        }
        ReportMode::Entrypoints => {
            let scan = collect_entrypoints(contracts, sources, &options.tagging);
            report.entrypoints = Some(
                scan.entrypoints
                    .into_iter()
                    .filter(|ep| ep.function.contract_kind == ContractKind::Contract)
                    .collect(),
            );
            report.dropped = scan.dropped;
        }
        ReportMode::Sinks => {
            report.sinks = Some(
                collect_sinks(contracts, sources)
                    .into_iter()
                    .filter(|s| s.function.contract_kind == ContractKind::Contract)
                    .collect(),
            );
        }
    }
    report
}

fn index_listing(contracts: &[ContractRecord], options: &ReportOptions) -> Vec<ContractRecord> {
    contracts
        .iter()
        .filter(|c| match c.kind {
            ContractKind::Contract => true,
            ContractKind::Library => options.include_libraries,
            ContractKind::Interface => options.include_interfaces,
        })
        .map(|c| if options.full { c.clone() } else { c.retain_functions(|f| f.is_entrypoint()) })
        .filter(|c| options.full || !c.functions.is_empty())
        .collect()
}

/// Pretty-printed JSON.
pub fn render_json(report: &IndexReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
