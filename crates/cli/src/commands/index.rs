use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use triage_core::config::{load_config, TriageConfig};
use triage_core::producers::{default_producer_registry, IndexRequest, ProducerKind};
use triage_core::report::{build_report, render_json, render_markdown, ReportMode, ReportOptions};
use triage_core::scope::{fallback_entry, file_key, load_sources, resolve_files, scope_root};

use super::output::{write_output, OutputFormat};

/// Exit code when sinks are requested but only the fallback producer could run.
pub const EXIT_SINKS_NEED_SOLC: u8 = 2;

pub const EMPTY_SCOPE_MESSAGE: &str = "No .sol files in scope (after out-of-scope filtering).";

#[derive(Args, Debug, Clone, Default)]
pub struct IndexArgs {
    /// Scope: a .sol file, a directory, or a .txt list of paths.
    #[arg(long)]
    pub scope: PathBuf,

    /// Exclude: a .sol file, a directory, or a .txt list. Disables the Foundry
    /// lib/, script/, test/ defaults.
    #[arg(long, visible_alias = "oos")]
    pub out_of_scope: Option<PathBuf>,

    /// Report entrypoints (public/external + receive/fallback) with tags.
    #[arg(long, conflicts_with = "sinks")]
    pub entrypoints: bool,

    /// Report sinks (calls-out, delegatecall, balanceOf). Requires solc.
    #[arg(long)]
    pub sinks: bool,

    /// Write the report to a .md or .json file instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Compiler binary name or path (default: config, then TRIAGE_SOLC, then `solc`).
    #[arg(long)]
    pub solc: Option<String>,

    /// Pre-generated fallback producer JSON, used when solc fails.
    #[arg(long)]
    pub fallback_json: Option<PathBuf>,

    /// Config file (default: triage.yaml/.yml/.json in the scope root).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Include internal/private functions in the index.
    #[arg(long)]
    pub full: bool,

    /// Include libraries in the index.
    #[arg(long)]
    pub include_libraries: bool,

    /// Include interfaces in the index.
    #[arg(long)]
    pub include_interfaces: bool,

    /// Keep entrypoints declared in a file other than their contract's.
    #[arg(long)]
    pub keep_inherited: bool,

    /// Keep entrypoints whose source range cannot be sliced.
    #[arg(long)]
    pub keep_unsliceable: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    pub no_progress: bool,
}

impl IndexArgs {
    pub fn mode(&self) -> ReportMode {
        if self.entrypoints {
            ReportMode::Entrypoints
        } else if self.sinks {
            ReportMode::Sinks
        } else {
            ReportMode::Index
        }
    }

    /// Flags win over the config file.
    pub fn apply_to(&self, config: &mut TriageConfig) {
        if let Some(solc) = &self.solc {
            config.solc = solc.clone();
        }
        config.include_libraries |= self.include_libraries;
        config.include_interfaces |= self.include_interfaces;
        if self.keep_inherited {
            config.drop_cross_file_inherited = false;
        }
        if self.keep_unsliceable {
            config.drop_unsliceable = false;
        }
    }
}

fn spinner(enabled: bool, message: String) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Index the scope and write the requested report.
///
/// Tries solc first; when it fails and a fallback source is configured, the
/// fallback producer is used instead, except for sinks, which need solc.
pub fn index_command(args: &IndexArgs) -> Result<ExitCode> {
    let format = OutputFormat::for_destination(args.out.as_deref())?;

    let root = scope_root(&args.scope)
        .with_context(|| format!("Failed to resolve scope {}", args.scope.display()))?;
    let (mut config, config_path) = load_config(args.config.as_deref(), &root)?;
    if let Some(path) = &config_path {
        info!("using config {}", path.display());
    }
    args.apply_to(&mut config);

    let excludes = config.foundry_default_excludes;
    let scoped = resolve_files(&args.scope, args.out_of_scope.as_deref(), excludes)
        .with_context(|| format!("Failed to resolve scope {}", args.scope.display()))?;
    if scoped.files.is_empty() {
        write_output(EMPTY_SCOPE_MESSAGE, args.out.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let sources = load_sources(&scoped.files).context("Failed to read scoped sources")?;
    let request = IndexRequest {
        files: scoped.files.iter().map(|f| file_key(f)).collect(),
        sources,
        entry: fallback_entry(&args.scope, &scoped.files),
        solc: config.solc.clone(),
        fallback_command: config.fallback_command.clone(),
        fallback_json: args.fallback_json.clone(),
    };

    let registry = default_producer_registry();
    let solc = registry
        .get_kind(ProducerKind::Solc)
        .ok_or_else(|| {
            anyhow!("solc producer not registered (available: {:?})", registry.names())
        })?;

    let message = format!("Parsing {} file(s) with solc...", request.files.len());
    let progress = spinner(!args.no_progress, message);
    let primary = solc.extract(&request);
    progress.finish_and_clear();

    let (producer, contracts) = match primary {
        Ok(contracts) => (ProducerKind::Solc, contracts),
        Err(err) => {
            warn!("{err}");
            if args.mode() == ReportMode::Sinks {
                eprintln!(
                    "error: --sinks requires solc syntax trees and solc failed; \
                     the fallback producer cannot report sinks.\n\
                     Tip: point --solc or TRIAGE_SOLC at a working compiler."
                );
                return Ok(ExitCode::from(EXIT_SINKS_NEED_SOLC));
            }
            if !request.has_fallback() {
                return Err(
                    anyhow!(err).context("solc failed and no fallback producer is configured")
                );
            }
            warn!("solc ({}) failed; falling back to the fallback producer", config.solc);

            let fallback = registry
                .get_kind(ProducerKind::Fallback)
                .ok_or_else(|| anyhow!("fallback producer not registered"))?;
            let progress =
                spinner(!args.no_progress, "Indexing via fallback producer...".to_string());
            let secondary = fallback.extract(&request);
            progress.finish_and_clear();
            (ProducerKind::Fallback, secondary.context("Fallback producer failed")?)
        }
    };

    let options = ReportOptions {
        mode: args.mode(),
        include_libraries: config.include_libraries,
        include_interfaces: config.include_interfaces,
        full: args.full,
        tagging: config.tagging_options(),
    };
    let report = build_report(
        &file_key(&root),
        &request.files,
        &request.sources,
        &contracts,
        producer,
        &options,
    );
    if !report.dropped.is_empty() {
        info!("{} entrypoint candidate(s) dropped by policy", report.dropped.len());
    }

    let text = match format {
        OutputFormat::Json => render_json(&report).context("Failed to serialize report")?,
        OutputFormat::Markdown => render_markdown(&report),
    };
    write_output(&text, args.out.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = IndexArgs {
            solc: Some("/opt/solc".into()),
            include_interfaces: true,
            keep_inherited: true,
            ..Default::default()
        };
        let mut config = TriageConfig { include_libraries: true, ..Default::default() };
        args.apply_to(&mut config);
        assert_eq!(config.solc, "/opt/solc");
        assert!(config.include_libraries);
        assert!(config.include_interfaces);
        assert!(!config.drop_cross_file_inherited);
        assert!(config.drop_unsliceable);

        let args = IndexArgs { keep_unsliceable: true, ..Default::default() };
        let mut config = TriageConfig::default();
        args.apply_to(&mut config);
        assert!(!config.drop_unsliceable);
        assert!(config.drop_cross_file_inherited);
    }

    #[test]
    fn mode_follows_flags() {
        assert_eq!(IndexArgs::default().mode(), ReportMode::Index);
        assert_eq!(IndexArgs { sinks: true, ..Default::default() }.mode(), ReportMode::Sinks);
    }
}
