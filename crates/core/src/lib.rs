//! triage-core
//!
//! Core library for first-pass triage of Solidity smart-contract source.
//!
//! This crate turns a compiler-produced syntax tree (or the best-effort
//! fallback producer's object model) into one canonical contract/function
//! model, then derives entrypoint and sink tags from that model plus the raw
//! source text. Everything here is synchronous and deterministic: identical
//! input yields byte-identical ordered output.
//!
//! Frontends (the CLI) own argument parsing, progress display and where output
//! goes. All substantive logic lives here so it is testable without `solc`.

pub mod analyzers;
pub mod config;
pub mod model;
pub mod normalize;
pub mod ordering;
pub mod producers;
pub mod report;
pub mod scope;
pub mod source;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
