use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;
use serde::Deserialize;

use super::{ContractSource, IndexRequest, ProducerError, ProducerKind};
use crate::model::ContractRecord;
use crate::normalize::{reconcile_contracts, FallbackContract};

/// Best-effort producer: an external analysis tool prints contract objects
/// as JSON, or a previously captured document is read from disk.
///
/// Contracts outside the requested files are discarded; the tool typically
/// pulls in dependencies the scope excluded.
pub struct FallbackProducer;

impl ContractSource for FallbackProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Fallback
    }

    fn description(&self) -> &'static str {
        "external analysis tool JSON (best-effort lines; no sinks)"
    }

    fn extract(&self, request: &IndexRequest) -> Result<Vec<ContractRecord>, ProducerError> {
        let body = if let Some(path) = &request.fallback_json {
            fs::read_to_string(path)
                .map_err(|source| ProducerError::Io { path: path.clone(), source })?
        } else if let Some(argv) = request.fallback_command.as_ref().filter(|a| !a.is_empty()) {
            run_fallback_command(argv, &request.entry)?
        } else {
            return Err(ProducerError::NotConfigured);
        };

        let contracts = parse_fallback_document(&body)?;
        let base_dir = if request.entry.is_dir() {
            request.entry.as_path()
        } else {
            request.entry.parent().unwrap_or_else(|| Path::new(""))
        };
        let records = reconcile_contracts(&contracts, base_dir, &request.sources);
        Ok(retain_in_scope(records, &request.files))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FallbackDocument {
    List(Vec<FallbackContract>),
    Wrapped { contracts: Vec<FallbackContract> },
}

/// Parse the fallback document: a JSON array of contract objects, or an
/// object carrying that array under `contracts`.
pub fn parse_fallback_document(body: &str) -> Result<Vec<FallbackContract>, ProducerError> {
    let doc: FallbackDocument =
        serde_json::from_str(body).map_err(|e| ProducerError::InvalidOutput {
            tool: ProducerKind::Fallback.to_string(),
            detail: format!("expected a JSON array of contracts ({e})"),
        })?;
    Ok(match doc {
        FallbackDocument::List(contracts) => contracts,
        FallbackDocument::Wrapped { contracts } => contracts,
    })
}

fn run_fallback_command(argv: &[String], entry: &Path) -> Result<String, ProducerError> {
    let tool = argv[0].clone();
    debug!("running fallback producer: {} {}", argv.join(" "), entry.display());
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .arg(entry)
        .output()
        .map_err(|source| ProducerError::Spawn { tool: tool.clone(), source })?;
    if !output.status.success() {
        return Err(ProducerError::Exited {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep contracts whose (canonical) file is one of `files`.
fn retain_in_scope(records: Vec<ContractRecord>, files: &[String]) -> Vec<ContractRecord> {
    let allowed: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    records
        .into_iter()
        .filter(|c| {
            let keep = !c.file.is_empty() && allowed.contains(c.file.as_str());
            if !keep {
                debug!("fallback: {} ({}) is outside the scope", c.name, c.file);
            }
            keep
        })
        .collect()
}
