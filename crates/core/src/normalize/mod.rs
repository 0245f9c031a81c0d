//! Conversion of producer output into the canonical model.
//!
//! - `solc`: walks the compiler's JSON syntax tree.
//! - `fallback`: reconciles the best-effort fallback producer's contract
//!   objects.
//!
//! Missing or malformed fields never abort normalization; they take the
//! defaults documented on each helper (empty string, `0`, `"unknown"`).

pub mod fallback;
pub mod solc;

pub use fallback::{reconcile_contracts, FallbackContract};
pub use solc::{normalize_files, normalize_source_unit};

/// Render `head [modifier ...] [returns (...)]`.
pub(crate) fn render_signature(head: &str, modifiers: &[String], returns: &str) -> String {
    let mut signature = head.to_string();
    if !modifiers.is_empty() {
        signature.push(' ');
        signature.push_str(&modifiers.join(" "));
    }
    if !returns.is_empty() {
        signature.push_str(&format!(" returns ({returns})"));
    }
    signature
}
