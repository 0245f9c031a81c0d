//! Sink tagging: outbound calls and external balance reads, for every
//! function regardless of visibility.

use super::entrypoints::declaring_file;
use super::heuristics::{detect_balance_reads, detect_call_surface};
use crate::model::{ContractRecord, FunctionRef, SinkTag, Tag};
use crate::ordering::sort_sinks;
use crate::source::{slice, SourceTexts};

/// Tag every function of `contracts` that shows at least one sink signal.
///
/// Functions with no signal are omitted. Each sink is attributed to the file
/// its text was sliced from.
pub fn collect_sinks(contracts: &[ContractRecord], sources: &SourceTexts) -> Vec<SinkTag> {
    let mut sinks = Vec::new();

    for contract in contracts {
        for function in &contract.functions {
            let decl_file = declaring_file(contract, function);
            let text = sources.get(decl_file).map(String::as_str).unwrap_or_default();
            let excerpt = slice(text, function.location.start, function.location.length);

            let tags = sink_tags(&excerpt);
            if tags.is_empty() {
                continue;
            }
            sinks.push(SinkTag { function: FunctionRef::new(contract, function, decl_file), tags });
        }
    }

    sort_sinks(&mut sinks);
    sinks
}

/// Derive sink tags from a source excerpt.
pub fn sink_tags(excerpt: &str) -> Vec<Tag> {
    let mut tags = Vec::new();

    let calls = detect_call_surface(excerpt);
    if calls.calls_out {
        tags.push(Tag::CallsOut);
    }
    if calls.delegatecall {
        tags.push(Tag::Delegatecall);
    }

    let balances = detect_balance_reads(excerpt);
    if balances.any {
        tags.push(Tag::BalanceOf);
    }
    if balances.own_address {
        tags.push(Tag::BalanceOfSelf);
    }

    tags
}
