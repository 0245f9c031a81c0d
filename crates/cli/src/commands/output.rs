use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Report format, chosen by the `--out` extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    /// Markdown for stdout; otherwise `.md` or `.json` (any case).
    pub fn for_destination(out: Option<&Path>) -> Result<Self> {
        let Some(out) = out else {
            return Ok(OutputFormat::Markdown);
        };
        match out.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("md") => Ok(OutputFormat::Markdown),
            Some("json") => Ok(OutputFormat::Json),
            _ => bail!(
                "out file must end with .md or .json (e.g. report.md or report.json), got {}",
                out.display()
            ),
        }
    }
}

/// Write `content` to stdout (newline-terminated) or to `out`, creating its
/// parent directories.
pub fn write_output(content: &str, out: Option<&Path>) -> Result<()> {
    match out {
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes()).context("Failed to write report to stdout")?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n").context("Failed to write report to stdout")?;
            }
            Ok(())
        }
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))
        }
    }
}
