//! Canonical entity model shared by both producers.
//!
//! Everything downstream (taggers, renderers, tests) reads these types only;
//! neither producer's native object model leaks past `normalize`.
//!
//! Records are built once and never mutated afterwards. `ContractRecord::new`
//! is the only constructor that orders functions, so every contract carries
//! its functions in presentation order no matter which producer built it.

use serde::{Deserialize, Serialize};

use crate::ordering::compare_functions;

/// Declared visibility of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    External,
    Public,
    Internal,
    Private,
    Unknown,
}

impl Visibility {
    /// Parse a producer's visibility string; anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "external" => Visibility::External,
            "public" => Visibility::Public,
            "internal" => Visibility::Internal,
            "private" => Visibility::Private,
            _ => Visibility::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::External => "external",
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
            Visibility::Unknown => "unknown",
        }
    }

    /// Presentation rank: attack surface first.
    pub fn rank(&self) -> u8 {
        match self {
            Visibility::External => 0,
            Visibility::Public => 1,
            Visibility::Internal => 2,
            Visibility::Private => 3,
            Visibility::Unknown => 99,
        }
    }

    /// True for `public` and `external`.
    pub fn is_externally_callable(&self) -> bool {
        matches!(self, Visibility::External | Visibility::Public)
    }
}

/// Declared state mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    Payable,
    Nonpayable,
    View,
    Pure,
    Unknown,
}

impl Mutability {
    /// Parse a producer's mutability string; anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "payable" => Mutability::Payable,
            "nonpayable" => Mutability::Nonpayable,
            "view" => Mutability::View,
            "pure" => Mutability::Pure,
            _ => Mutability::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mutability::Payable => "payable",
            Mutability::Nonpayable => "nonpayable",
            Mutability::View => "view",
            Mutability::Pure => "pure",
            Mutability::Unknown => "unknown",
        }
    }

    /// Rank used by the function comparator: payable, view, pure, then the rest.
    pub fn rank(&self) -> u8 {
        match self {
            Mutability::Payable => 0,
            Mutability::View => 1,
            Mutability::Pure => 2,
            Mutability::Nonpayable | Mutability::Unknown => 3,
        }
    }
}

/// Kind of a contract-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

impl ContractKind {
    /// Parse solc's `contractKind`; absent or unknown values read as `Contract`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "interface" => ContractKind::Interface,
            "library" => ContractKind::Library,
            _ => ContractKind::Contract,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Contract => "contract",
            ContractKind::Interface => "interface",
            ContractKind::Library => "library",
        }
    }
}

/// Byte range of a declaration within a file.
///
/// `start == 0 && length == 0` means "unknown", not "file start".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: usize,
    pub length: usize,
    pub file: String,
}

impl SourceLocation {
    pub fn new(start: usize, length: usize, file: impl Into<String>) -> Self {
        Self { start, length, file: file.into() }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// Whether the producer reported a usable (non-zero) range.
    pub fn is_known(&self) -> bool {
        self.start > 0 && self.length > 0
    }
}

/// One declared function, constructor, receive or fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Display name; `constructor`, `receive` and `fallback` for the special kinds.
    pub name: String,
    /// Human-readable `name(type name, ...) [modifier ...] [returns (...)]`.
    pub signature: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
    /// Modifier names in declaration order, arguments discarded.
    pub modifiers: Vec<String>,
    /// 1-based; `1` when the offset is unknown.
    pub line: usize,
    pub location: SourceLocation,
    /// File the function is textually declared in. Empty when the producer
    /// could not tell.
    pub declaring_file: String,
}

impl FunctionRecord {
    pub fn is_receive_or_fallback(&self) -> bool {
        self.name == "receive" || self.name == "fallback"
    }

    /// `public`/`external`, or one of the implicit value-receiving functions.
    pub fn is_entrypoint(&self) -> bool {
        self.visibility.is_externally_callable() || self.is_receive_or_fallback()
    }
}

/// One contract, interface or library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub name: String,
    pub kind: ContractKind,
    pub file: String,
    pub functions: Vec<FunctionRecord>,
    pub has_receive: bool,
    pub has_fallback: bool,
}

impl ContractRecord {
    /// Build a contract record, ordering its functions and deriving the
    /// receive/fallback flags from them.
    pub fn new(
        name: impl Into<String>,
        kind: ContractKind,
        file: impl Into<String>,
        mut functions: Vec<FunctionRecord>,
    ) -> Self {
        functions.sort_by(compare_functions);
        let has_receive = functions.iter().any(|f| f.name == "receive");
        let has_fallback = functions.iter().any(|f| f.name == "fallback");
        Self { name: name.into(), kind, file: file.into(), functions, has_receive, has_fallback }
    }

    /// Same record restricted to functions matching `keep`, with flags preserved.
    pub fn retain_functions(&self, keep: impl Fn(&FunctionRecord) -> bool) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            file: self.file.clone(),
            functions: self.functions.iter().filter(|f| keep(f)).cloned().collect(),
            has_receive: self.has_receive,
            has_fallback: self.has_fallback,
        }
    }
}

/// Triage tag vocabulary shared by entrypoint and sink tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "for-all")]
    ForAll,
    #[serde(rename = "guarded")]
    Guarded,
    #[serde(rename = "guarded-inline")]
    GuardedInline,
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "admin-ish")]
    AdminIsh,
    #[serde(rename = "admin-ish (no-guard)")]
    AdminIshNoGuard,
    #[serde(rename = "calls-out")]
    CallsOut,
    #[serde(rename = "delegatecall")]
    Delegatecall,
    #[serde(rename = "balanceOf")]
    BalanceOf,
    #[serde(rename = "balanceOf:self")]
    BalanceOfSelf,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::ForAll => "for-all",
            Tag::Guarded => "guarded",
            Tag::GuardedInline => "guarded-inline",
            Tag::Value => "value",
            Tag::AdminIsh => "admin-ish",
            Tag::AdminIshNoGuard => "admin-ish (no-guard)",
            Tag::CallsOut => "calls-out",
            Tag::Delegatecall => "delegatecall",
            Tag::BalanceOf => "balanceOf",
            Tag::BalanceOfSelf => "balanceOf:self",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The function coordinates every tag record carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub contract: String,
    pub contract_kind: ContractKind,
    pub file: String,
    pub signature: String,
    pub name: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub modifiers: Vec<String>,
    pub line: usize,
}

impl FunctionRef {
    pub fn new(contract: &ContractRecord, function: &FunctionRecord, file: &str) -> Self {
        Self {
            contract: contract.name.clone(),
            contract_kind: contract.kind,
            file: file.to_string(),
            signature: function.signature.clone(),
            name: function.name.clone(),
            visibility: function.visibility,
            mutability: function.mutability,
            modifiers: function.modifiers.clone(),
            line: function.line,
        }
    }
}

/// An externally reachable function and its access-control/value/call tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointTag {
    #[serde(flatten)]
    pub function: FunctionRef,
    pub tags: Vec<Tag>,
}

/// A function with at least one external-dependency signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkTag {
    #[serde(flatten)]
    pub function: FunctionRef,
    pub tags: Vec<Tag>,
}
