//! Vocabulary tables and the pure text predicates built on them.
//!
//! Each predicate is a plain function over a fixed table so new signals can
//! be added without touching the taggers' control flow. All matching is
//! substring-based; these are recall-oriented triage signals, not proofs.

/// Substrings of modifier names that suggest access control.
pub const GUARD_TOKENS: &[&str] = &[
    "only",
    "auth",
    "role",
    "owner",
    "admin",
    "govern",
    "paus",
    "whitelist",
    "allowlist",
    "restricted",
    "operator",
    "keeper",
    "guardian",
];

/// Name prefixes of functions that look privileged.
pub const ADMIN_PREFIXES: &[&str] = &[
    "set",
    "update",
    "upgrade",
    "initialize",
    "init",
    "configure",
    "config",
    "grant",
    "revoke",
    "authorize",
    "pause",
    "unpause",
    "rescue",
    "sweep",
];

/// Low-level external call constructs, lower-cased.
pub const CALL_MARKERS: &[&str] = &[".call(", ".call{", ".delegatecall(", ".staticcall("];

/// The delegated-execution marker. Also a member of `CALL_MARKERS`.
pub const DELEGATECALL_MARKER: &str = ".delegatecall(";

/// Caller identity, as it appears in whitespace-stripped, lower-cased text.
const SENDER: &str = "msg.sender";

/// Constructs that make a sender comparison act as a check.
const CHECK_GATES: &[&str] = &["require(", "assert(", "revert", "if("];

const COMPARISON_OPERATORS: &[&str] = &["==", "!=", "<", ">"];

const BALANCE_QUERY: &str = "balanceof(";

const SELF_BALANCE_QUERY: &str = "balanceof(address(this))";

/// Outbound call surface of an excerpt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSurface {
    pub calls_out: bool,
    pub delegatecall: bool,
}

/// Balance reads found in an excerpt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceReads {
    pub any: bool,
    pub own_address: bool,
}

/// Case-insensitive match of a single modifier name against `GUARD_TOKENS`.
pub fn is_guard_modifier(modifier: &str) -> bool {
    let low = modifier.to_lowercase();
    GUARD_TOKENS.iter().any(|tok| low.contains(tok))
}

/// True when any modifier looks like an access-control guard.
pub fn has_guard_modifier<S: AsRef<str>>(modifiers: &[S]) -> bool {
    modifiers.iter().any(|m| is_guard_modifier(m.as_ref()))
}

/// True when the function name starts with a privileged-operation prefix.
pub fn is_admin_name(name: &str) -> bool {
    let low = name.to_lowercase();
    ADMIN_PREFIXES.iter().any(|p| low.starts_with(p))
}

/// Look for low-level call constructs in an excerpt.
pub fn detect_call_surface(excerpt: &str) -> CallSurface {
    if excerpt.is_empty() {
        return CallSurface::default();
    }
    let low = excerpt.to_lowercase();
    CallSurface {
        calls_out: CALL_MARKERS.iter().any(|m| low.contains(m)),
        delegatecall: low.contains(DELEGATECALL_MARKER),
    }
}

/// Detect an inline `msg.sender` check (require/assert/if/revert with a direct
/// comparison against the caller), as used by contracts without ACL modifiers.
pub fn has_inline_sender_guard(excerpt: &str) -> bool {
    if excerpt.is_empty() {
        return false;
    }
    let compact = compact_lower(excerpt);
    if !compact.contains(SENDER) {
        return false;
    }
    if !CHECK_GATES.iter().any(|g| compact.contains(g)) {
        return false;
    }
    COMPARISON_OPERATORS.iter().any(|op| {
        compact.contains(&format!("{SENDER}{op}")) || compact.contains(&format!("{op}{SENDER}"))
    })
}

/// Look for token/account balance queries in an excerpt.
pub fn detect_balance_reads(excerpt: &str) -> BalanceReads {
    if excerpt.is_empty() {
        return BalanceReads::default();
    }
    let low = excerpt.to_lowercase();
    BalanceReads {
        any: low.contains(BALANCE_QUERY),
        own_address: compact_lower(excerpt).contains(SELF_BALANCE_QUERY),
    }
}

/// Lower-case with all whitespace removed.
fn compact_lower(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}
