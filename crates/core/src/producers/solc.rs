use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{ContractSource, Diagnostic, IndexRequest, ProducerError, ProducerKind, Severity};
use crate::model::ContractRecord;
use crate::normalize::normalize_files;

/// Points at a captured `--standard-json` response to use instead of running
/// the compiler.
pub const FAKE_OUTPUT_ENV: &str = "TRIAGE_SOLC_FAKE_OUTPUT";

const TOOL: &str = "solc";

/// Compiler-backed producer: one `--standard-json` invocation over every
/// in-scope file, requesting syntax trees only.
pub struct SolcProducer;

impl ContractSource for SolcProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Solc
    }

    fn description(&self) -> &'static str {
        "solc --standard-json syntax trees (exact offsets; required for sinks)"
    }

    fn extract(&self, request: &IndexRequest) -> Result<Vec<ContractRecord>, ProducerError> {
        if request.files.is_empty() {
            return Ok(Vec::new());
        }

        let (stdout, stderr) = if let Some(fake) = env::var_os(FAKE_OUTPUT_ENV) {
            let path = PathBuf::from(fake);
            let body = fs::read_to_string(&path)
                .map_err(|source| ProducerError::Io { path, source })?;
            (body, String::new())
        } else {
            let input = build_standard_json_input(request);
            run_standard_json(&request.solc, &input)?
        };

        let output = parse_standard_json_output(&stdout, &stderr)?;
        for diagnostic in output.diagnostics.iter().filter(|d| d.severity != Severity::Error) {
            info!("solc: {}", diagnostic.message);
        }
        let fatal = output.fatal_messages();
        if !fatal.is_empty() {
            return Err(ProducerError::Compilation { diagnostics: fatal });
        }

        debug!(
            "solc returned {} syntax tree(s) for {} file(s)",
            output.asts.len(),
            request.files.len()
        );
        Ok(normalize_files(&request.files, &output.asts, &request.sources))
    }
}

/// Parsed compiler response: trees keyed by source key, plus every
/// diagnostic the compiler reported.
#[derive(Debug, Clone, Default)]
pub struct SolcOutput {
    pub asts: BTreeMap<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SolcOutput {
    pub fn fatal_messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.clone())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct StandardJsonOutput {
    #[serde(default)]
    errors: Option<Vec<Value>>,
    #[serde(default)]
    sources: Option<BTreeMap<String, SourceOutput>>,
}

#[derive(Debug, Deserialize)]
struct SourceOutput {
    #[serde(default)]
    ast: Option<Value>,
}

/// Standard-JSON input keyed by each file's absolute path, with inline
/// content and only the `ast` output selected.
pub fn build_standard_json_input(request: &IndexRequest) -> Value {
    let mut sources = Map::new();
    for file in &request.files {
        let content = request.sources.get(file).cloned().unwrap_or_default();
        sources.insert(file.clone(), json!({ "content": content }));
    }
    json!({
        "language": "Solidity",
        "sources": sources,
        "settings": {
            "outputSelection": {
                "*": { "": ["ast"] }
            }
        }
    })
}

/// Parse a `--standard-json` response.
///
/// `error`/`fatal` entries become error diagnostics, everything else is kept
/// as a warning, and non-empty stderr is recorded as a warning. Output that is
/// not a JSON object is an error: no tree can be recovered from it.
pub fn parse_standard_json_output(stdout: &str, stderr: &str) -> Result<SolcOutput, ProducerError> {
    let stdout = stdout.trim();
    let stderr = stderr.trim();

    let invalid = |detail: String| {
        let mut detail = detail;
        if !stdout.is_empty() {
            detail.push_str(&format!("\nstdout:\n{stdout}"));
        }
        if !stderr.is_empty() {
            detail.push_str(&format!("\nstderr:\n{stderr}"));
        }
        ProducerError::InvalidOutput { tool: TOOL.to_string(), detail }
    };

    if stdout.is_empty() {
        return Err(invalid("no output".to_string()));
    }
    let raw: StandardJsonOutput =
        serde_json::from_str(stdout)
            .map_err(|e| invalid(format!("not a standard-json response ({e})")))?;

    let mut output = SolcOutput::default();
    if !stderr.is_empty() {
        output
            .diagnostics
            .push(Diagnostic { severity: Severity::Warning, message: stderr.to_string() });
    }
    for entry in raw.errors.unwrap_or_default() {
        let severity =
            Severity::parse(entry.get("severity").and_then(Value::as_str).unwrap_or_default());
        let message = ["formattedMessage", "message"]
            .into_iter()
            .find_map(|key| entry.get(key).and_then(Value::as_str).filter(|m| !m.is_empty()))
            .map(|m| m.trim_end().to_string())
            .unwrap_or_else(|| entry.to_string());
        output.diagnostics.push(Diagnostic { severity, message });
    }
    for (key, source) in raw.sources.unwrap_or_default() {
        match source.ast {
            Some(ast) if !ast.is_null() => {
                output.asts.insert(key, ast);
            }
            _ => debug!("solc returned no tree for {key}"),
        }
    }
    Ok(output)
}

/// Run `<solc> --standard-json`, feeding `input` on stdin. The exit status is
/// not checked: the compiler reports failures inside its JSON response.
fn run_standard_json(solc: &str, input: &Value) -> Result<(String, String), ProducerError> {
    let spawn_err = |source: io::Error| ProducerError::Spawn { tool: solc.to_string(), source };

    let mut child = Command::new(solc)
        .arg("--standard-json")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(input.to_string().as_bytes()) {
            // The compiler may exit before reading everything; its output still says why.
            warn!("failed to write standard-json input to {solc}: {e}");
        }
    }

    let output = child.wait_with_output().map_err(spawn_err)?;
    Ok((
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}
