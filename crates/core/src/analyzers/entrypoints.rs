//! Entrypoint tagging.
//!
//! An entrypoint is a `public`/`external` function or `receive`/`fallback`.
//! Internal and private functions never qualify, even when reachable through
//! low-level dispatch; this is the explicit first-pass surface.

use log::debug;
use serde::{Deserialize, Serialize};

use super::heuristics::{
    detect_call_surface, has_guard_modifier, has_inline_sender_guard, is_admin_name,
};
use super::{DropReason, PolicyDrop, TaggingOptions};
use crate::model::{ContractRecord, EntrypointTag, FunctionRecord, FunctionRef, Mutability, Tag};
use crate::ordering::sort_entrypoints;
use crate::source::{slice, SourceTexts};

/// Tagged entrypoints in final order, plus the candidates dropped by policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrypointScan {
    pub entrypoints: Vec<EntrypointTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<PolicyDrop>,
}

/// Tag every entrypoint of `contracts`.
pub fn collect_entrypoints(
    contracts: &[ContractRecord],
    sources: &SourceTexts,
    options: &TaggingOptions,
) -> EntrypointScan {
    let mut scan = EntrypointScan::default();

    for contract in contracts {
        for function in contract.functions.iter().filter(|f| f.is_entrypoint()) {
            let decl_file = declaring_file(contract, function);

            if options.drop_cross_file_inherited
                && !contract.file.is_empty()
                && decl_file != contract.file
            {
                debug!(
                    "dropping inherited {}.{} (declared in {})",
                    contract.name, function.signature, decl_file
                );
                scan.dropped.push(policy_drop(contract, function, DropReason::CrossFileInherited));
                continue;
            }

            let text = sources.get(decl_file).map(String::as_str).unwrap_or_default();
            let excerpt = slice(text, function.location.start, function.location.length);

            if options.drop_unsliceable && function.location.is_known() && excerpt.is_empty() {
                debug!(
                    "dropping {}.{}: range {}+{} not sliceable from {}",
                    contract.name,
                    function.signature,
                    function.location.start,
                    function.location.length,
                    decl_file
                );
                scan.dropped.push(policy_drop(contract, function, DropReason::Unsliceable));
                continue;
            }

            scan.entrypoints.push(EntrypointTag {
                function: FunctionRef::new(contract, function, &contract.file),
                tags: entrypoint_tags(function, &excerpt),
            });
        }
    }

    sort_entrypoints(&mut scan.entrypoints);
    scan
}

/// Derive the tag list for one entrypoint from its record and source excerpt.
///
/// Order: access-control tag, `value`, admin-naming tag, `calls-out`,
/// `delegatecall`.
pub fn entrypoint_tags(function: &FunctionRecord, excerpt: &str) -> Vec<Tag> {
    let guarded = has_guard_modifier(&function.modifiers);
    let inline_guard = has_inline_sender_guard(excerpt);

    let mut tags = Vec::new();
    tags.push(if guarded {
        Tag::Guarded
    } else if inline_guard {
        Tag::GuardedInline
    } else {
        Tag::ForAll
    });

    if function.mutability == Mutability::Payable {
        tags.push(Tag::Value);
    }

    if is_admin_name(&function.name) {
        // Either guard mechanism counts here.
        tags.push(if guarded || inline_guard { Tag::AdminIsh } else { Tag::AdminIshNoGuard });
    }

    let calls = detect_call_surface(excerpt);
    if calls.calls_out {
        tags.push(Tag::CallsOut);
    }
    if calls.delegatecall {
        tags.push(Tag::Delegatecall);
    }

    tags
}

/// The file a function's text lives in: its declaring file when known,
/// otherwise the contract's file.
pub(crate) fn declaring_file<'a>(
    contract: &'a ContractRecord,
    function: &'a FunctionRecord,
) -> &'a str {
    if function.declaring_file.is_empty() {
        &contract.file
    } else {
        &function.declaring_file
    }
}

fn policy_drop(
    contract: &ContractRecord,
    function: &FunctionRecord,
    reason: DropReason,
) -> PolicyDrop {
    PolicyDrop {
        contract: contract.name.clone(),
        file: contract.file.clone(),
        signature: function.signature.clone(),
        declaring_file: declaring_file(contract, function).to_string(),
        reason,
    }
}
