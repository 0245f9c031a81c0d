//! Reconciler for the fallback producer's contract objects.
//!
//! The fallback producer emits a JSON array of contract objects with their
//! (possibly inherited) functions. Its line/offset model is best-effort:
//! a missing line list is recomputed from the start offset when the file
//! text is at hand, otherwise it defaults to `1`; missing locations become
//! `(0, 0, "")`. Filenames are canonicalized so they match the scope's keys.
//!
//! Inherited members are kept here with their real declaring file; the
//! entrypoint tagger decides whether to drop them.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::render_signature;
use crate::model::{
    ContractKind, ContractRecord, FunctionRecord, Mutability, SourceLocation, Visibility,
};
use crate::ordering::sort_contracts;
use crate::source::{offset_to_line, SourceTexts};

/// One contract object as emitted by the fallback producer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackContract {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_library: bool,
    #[serde(default)]
    pub source_mapping: Option<FallbackSourceMapping>,
    #[serde(default)]
    pub functions: Option<Vec<FallbackFunction>>,
}

/// One function object of a fallback contract.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackFunction {
    #[serde(default)]
    pub name: String,
    /// Canonical `name(type,...)` form.
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub state_mutability: Option<String>,
    #[serde(default)]
    pub modifiers: Option<Vec<ModifierRef>>,
    #[serde(default)]
    pub return_type: Option<Vec<String>>,
    #[serde(default)]
    pub source_mapping: Option<FallbackSourceMapping>,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub is_receive: bool,
    #[serde(default)]
    pub is_fallback: bool,
}

/// A modifier reference: either a bare name or an object carrying one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModifierRef {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

impl ModifierRef {
    fn name(&self) -> Option<&str> {
        let name = match self {
            ModifierRef::Name(n) => Some(n.as_str()),
            ModifierRef::Object { name } => name.as_deref(),
        };
        name.filter(|n| !n.is_empty())
    }
}

/// Location object with several candidate filename fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackSourceMapping {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default)]
    pub filename_absolute: Option<FileName>,
    #[serde(default)]
    pub filename: Option<FileName>,
    #[serde(default)]
    pub filename_relative: Option<FileName>,
    #[serde(default)]
    pub filename_short: Option<FileName>,
    #[serde(default)]
    pub lines: Option<Vec<i64>>,
}

/// A filename given either as a plain string or as a structured object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileName {
    Plain(String),
    Detailed {
        #[serde(default)]
        absolute: Option<String>,
        #[serde(default)]
        used: Option<String>,
        #[serde(default)]
        relative: Option<String>,
        #[serde(default)]
        short: Option<String>,
    },
}

impl FileName {
    fn best(&self) -> Option<&str> {
        match self {
            FileName::Plain(p) => Some(p.as_str()).filter(|p| !p.is_empty()),
            FileName::Detailed { absolute, used, relative, short } => {
                [absolute, used, relative, short]
                    .into_iter()
                    .find_map(|p| p.as_deref().filter(|s| !s.is_empty()))
            }
        }
    }
}

impl FallbackSourceMapping {
    /// First usable filename: absolute, plain, relative, short.
    fn file_name(&self) -> Option<&str> {
        [&self.filename_absolute, &self.filename, &self.filename_relative, &self.filename_short]
            .into_iter()
            .find_map(|f| f.as_ref().and_then(FileName::best))
    }

    fn range(&self) -> (usize, usize) {
        let clamp = |v: Option<i64>| v.filter(|v| *v > 0).map(|v| v as usize).unwrap_or(0);
        (clamp(self.start), clamp(self.length))
    }

    fn first_line(&self) -> Option<usize> {
        self.lines.as_ref().and_then(|l| l.first()).filter(|l| **l > 0).map(|l| *l as usize)
    }
}

/// Convert fallback contract objects into canonical records.
///
/// Relative filenames are resolved against `base_dir`. `sources` supplies
/// line numbers for functions the tool reported without any. Contracts come
/// back ordered by `(file, name)`, their functions in the canonical order.
pub fn reconcile_contracts(
    contracts: &[FallbackContract],
    base_dir: &Path,
    sources: &SourceTexts,
) -> Vec<ContractRecord> {
    let mut out: Vec<ContractRecord> = contracts
        .iter()
        .map(|c| {
            let kind = if c.is_interface {
                ContractKind::Interface
            } else if c.is_library {
                ContractKind::Library
            } else {
                ContractKind::Contract
            };
            let file = c
                .source_mapping
                .as_ref()
                .and_then(FallbackSourceMapping::file_name)
                .map(|f| resolve_file(f, base_dir))
                .unwrap_or_default();
            let functions = c
                .functions
                .iter()
                .flatten()
                .map(|f| reconcile_function(f, base_dir, sources))
                .collect();
            let name = if c.name.is_empty() { "<unnamed>" } else { c.name.as_str() };
            ContractRecord::new(name, kind, file, functions)
        })
        .collect();
    sort_contracts(&mut out);
    out
}

fn reconcile_function(
    f: &FallbackFunction,
    base_dir: &Path,
    sources: &SourceTexts,
) -> FunctionRecord {
    let name = if f.is_receive {
        "receive"
    } else if f.is_fallback {
        "fallback"
    } else if f.is_constructor {
        "constructor"
    } else if !f.name.is_empty() {
        f.name.as_str()
    } else {
        f.full_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("<anonymous>")
    };

    let modifiers: Vec<String> =
        f.modifiers.iter().flatten().filter_map(ModifierRef::name).map(str::to_string).collect();

    let head = f
        .full_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{name}()"));
    let returns = f.return_type.as_ref().map(|r| r.join(", ")).unwrap_or_default();

    let mapping = f.source_mapping.clone().unwrap_or_default();
    let (start, length) = mapping.range();
    let declaring_file =
        mapping.file_name().map(|p| resolve_file(p, base_dir)).unwrap_or_default();
    let line = mapping
        .first_line()
        .or_else(|| {
            let text = sources.get(&declaring_file).filter(|_| start > 0)?;
            Some(offset_to_line(text, start))
        })
        .unwrap_or(1);

    FunctionRecord {
        name: name.to_string(),
        signature: render_signature(&head, &modifiers, &returns),
        visibility: Visibility::parse(f.visibility.as_deref().unwrap_or_default()),
        mutability: Mutability::parse(f.state_mutability.as_deref().unwrap_or_default()),
        modifiers,
        line,
        location: SourceLocation::new(start, length, declaring_file.clone()),
        declaring_file,
    }
}

/// Absolute, canonical spelling of `raw`; the joined path when the file
/// cannot be resolved on disk.
fn resolve_file(raw: &str, base_dir: &Path) -> String {
    let joined = base_dir.join(raw);
    fs::canonicalize(&joined).unwrap_or(joined).display().to_string()
}
