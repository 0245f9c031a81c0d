use super::{IndexReport, ReportMode};
use crate::analyzers::DropReason;
use crate::model::{ContractRecord, FunctionRef, Mutability, Tag, Visibility};

/// Render the report's section as Markdown.
pub fn render_markdown(report: &IndexReport) -> String {
    match report.mode() {
        ReportMode::Index => render_index(report),
        ReportMode::Entrypoints => render_entrypoints(report),
        ReportMode::Sinks => render_sinks(report),
    }
}

fn header(out: &mut String, title: &str, report: &IndexReport) {
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!("## Directory\n`{}`\n\n", report.directory));
    out.push_str("## Files\n");
    for file in &report.files {
        out.push_str(&format!("- `{}`\n", file.path));
    }
    out.push('\n');
}

/// `[vis mut]`, leaving out an unknown mutability.
fn access_suffix(visibility: Visibility, mutability: Mutability) -> String {
    match mutability {
        Mutability::Unknown => format!("[{}]", visibility.as_str()),
        m => format!("[{} {}]", visibility.as_str(), m.as_str()),
    }
}

fn check(flag: bool) -> &'static str {
    if flag {
        "✅"
    } else {
        "❌"
    }
}

fn render_index(report: &IndexReport) -> String {
    let mut out = String::new();
    header(&mut out, "Contract Triage Index Report", report);
    out.push_str("## Contracts\n");

    let contracts: &[ContractRecord] = report.contracts.as_deref().unwrap_or_default();
    if contracts.is_empty() {
        out.push_str("_No contracts found._\n");
        return out;
    }

    for contract in contracts {
        out.push_str(&format!("### {} ({})\n", contract.name, contract.kind.as_str()));
        out.push_str(&format!("- file: `{}`\n", contract.file));
        out.push_str(&format!("- receive(): {}\n", check(contract.has_receive)));
        out.push_str(&format!("- fallback(): {}\n\n", check(contract.has_fallback)));
        out.push_str("**Functions**\n");
        for f in &contract.functions {
            out.push_str(&format!(
                "- `{}` {} — line {}\n",
                f.signature,
                access_suffix(f.visibility, f.mutability),
                f.line
            ));
        }
        out.push('\n');
    }
    out
}

/// Grouped `### file` / `#### contract` listing of tagged functions.
fn render_tagged<'a>(
    out: &mut String,
    items: impl Iterator<Item = (&'a FunctionRef, &'a [Tag])>,
    empty: &str,
) {
    let mut current: Option<(&str, &str)> = None;
    let mut any = false;
    for (function, tags) in items {
        any = true;
        if current.map(|(file, _)| file) != Some(function.file.as_str()) {
            out.push_str(&format!("### `{}`\n\n", function.file));
            current = None;
        }
        if current.map(|(_, contract)| contract) != Some(function.contract.as_str()) {
            let kind = function.contract_kind.as_str();
            out.push_str(&format!("#### {} ({})\n", function.contract, kind));
            current = Some((function.file.as_str(), function.contract.as_str()));
        }
        let tags: Vec<String> = tags.iter().map(|t| format!("`{t}`")).collect();
        out.push_str(&format!(
            "- `{}` {} — line {} — {}\n",
            function.signature,
            access_suffix(function.visibility, function.mutability),
            function.line,
            tags.join(", ")
        ));
    }
    if !any {
        out.push_str(&format!("_{empty}_\n"));
    }
}

fn render_entrypoints(report: &IndexReport) -> String {
    let mut out = String::new();
    header(&mut out, "Contract Triage Entrypoints Report", report);
    out.push_str("## Entrypoints\n");
    let entrypoints = report.entrypoints.as_deref().unwrap_or_default();
    render_tagged(
        &mut out,
        entrypoints.iter().map(|ep| (&ep.function, ep.tags.as_slice())),
        "No entrypoints found.",
    );

    if !report.dropped.is_empty() {
        out.push_str("\n## Dropped by policy\n");
        for drop in &report.dropped {
            let reason = match drop.reason {
                DropReason::CrossFileInherited => "inherited from another file",
                DropReason::Unsliceable => "source range not sliceable",
            };
            out.push_str(&format!(
                "- {}: `{}` (declared in `{}`): {}\n",
                drop.contract, drop.signature, drop.declaring_file, reason
            ));
        }
    }
    out
}

fn render_sinks(report: &IndexReport) -> String {
    let mut out = String::new();
    header(&mut out, "Contract Triage Sinks Report", report);
    out.push_str("## Sinks\n");
    let sinks = report.sinks.as_deref().unwrap_or_default();
    let rows = sinks.iter().map(|s| (&s.function, s.tags.as_slice()));
    render_tagged(&mut out, rows, "No sinks found.");
    out
}
