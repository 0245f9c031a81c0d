//! Normalizer for solc's JSON syntax tree.
//!
//! The tree is walked generically: only `ContractDefinition` and
//! `FunctionDefinition` nodes are recognized, every other shape is opaque.
//! Field layout varies across compiler versions, hence the fallback chains
//! below.

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use super::render_signature;
use crate::model::{
    ContractKind, ContractRecord, FunctionRecord, Mutability, SourceLocation, Visibility,
};
use crate::ordering::sort_contracts;
use crate::source::{offset_to_line, parse_src_triplet, SourceTexts};

const CONTRACT_NODE: &str = "ContractDefinition";
const FUNCTION_NODE: &str = "FunctionDefinition";

/// Placeholder for a parameter type none of the tree's representations resolve.
const UNKNOWN_TYPE: &str = "unknown";

/// Normalize every file in `files` that has a syntax tree.
///
/// Files without a tree (or whose tree is not a JSON object) are skipped, so
/// one broken file does not cost the rest of the run. Contracts come back
/// ordered by `(file, name)`.
pub fn normalize_files(
    files: &[String],
    asts: &BTreeMap<String, Value>,
    sources: &SourceTexts,
) -> Vec<ContractRecord> {
    let mut contracts = Vec::new();
    for file in files {
        let Some(ast) = asts.get(file).filter(|ast| ast.is_object()) else {
            debug!("no syntax tree for {file}; skipping");
            continue;
        };
        let text = sources.get(file).map(String::as_str).unwrap_or_default();
        contracts.extend(normalize_source_unit(file, ast, text));
    }
    sort_contracts(&mut contracts);
    contracts
}

/// Normalize the contracts of a single file's tree.
pub fn normalize_source_unit(file: &str, ast: &Value, text: &str) -> Vec<ContractRecord> {
    let mut contract_nodes = Vec::new();
    collect_nodes(ast, CONTRACT_NODE, &mut contract_nodes);

    contract_nodes
        .into_iter()
        .map(|node| {
            let mut function_nodes = Vec::new();
            collect_nodes(node, FUNCTION_NODE, &mut function_nodes);
            let functions =
                function_nodes.into_iter().map(|f| normalize_function(file, text, f)).collect();

            let name = non_empty(str_field(node, "name")).unwrap_or("<unnamed>");
            let kind = ContractKind::parse(str_field(node, "contractKind"));
            ContractRecord::new(name, kind, file, functions)
        })
        .collect()
}

fn normalize_function(file: &str, text: &str, node: &Value) -> FunctionRecord {
    let kind = str_field(node, "kind");
    let name = match kind {
        "constructor" | "receive" | "fallback" => kind,
        _ => non_empty(str_field(node, "name")).unwrap_or("<anonymous>"),
    };

    let modifiers: Vec<String> = node
        .get("modifiers")
        .and_then(Value::as_array)
        .map(|mods| {
            mods.iter()
                .filter_map(|m| m.pointer("/modifierName/name").and_then(Value::as_str))
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let params = format_parameter_list(node.get("parameters"));
    let returns = format_parameter_list(node.get("returnParameters"));
    let signature = render_signature(&format!("{name}({params})"), &modifiers, &returns);

    let (start, length) = parse_src_triplet(non_empty(str_field(node, "src")).unwrap_or("0:0:0"));

    FunctionRecord {
        name: name.to_string(),
        signature,
        visibility: Visibility::parse(str_field(node, "visibility")),
        mutability: Mutability::parse(str_field(node, "stateMutability")),
        modifiers,
        line: offset_to_line(text, start),
        location: SourceLocation::new(start, length, file),
        declaring_file: file.to_string(),
    }
}

/// Render a `ParameterList` node as `type name, type name`.
fn format_parameter_list(list: Option<&Value>) -> String {
    list.and_then(|l| l.get("parameters"))
        .and_then(Value::as_array)
        .map(|params| params.iter().map(format_parameter).collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}

fn format_parameter(param: &Value) -> String {
    let name = str_field(param, "name");
    format!("{} {}", parameter_type(param), name).trim().to_string()
}

/// Explicit type name, then the type node's descriptor, then the parameter's
/// own descriptor, then `unknown`.
fn parameter_type(param: &Value) -> &str {
    let type_name = param.get("typeName");
    type_name
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .and_then(non_empty)
        .or_else(|| {
            type_name
                .and_then(|t| t.pointer("/typeDescriptions/typeString"))
                .and_then(Value::as_str)
                .and_then(non_empty)
        })
        .or_else(|| {
            let described = param.pointer("/typeDescriptions/typeString");
            described.and_then(Value::as_str).and_then(non_empty)
        })
        .unwrap_or(UNKNOWN_TYPE)
}

/// Depth-first collection of every object whose `nodeType` is `node_type`.
fn collect_nodes<'a>(node: &'a Value, node_type: &str, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            if map.get("nodeType").and_then(Value::as_str) == Some(node_type) {
                out.push(node);
            }
            for child in map.values() {
                collect_nodes(child, node_type, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_nodes(child, node_type, out);
            }
        }
        _ => {}
    }
}

fn str_field<'a>(node: &'a Value, key: &str) -> &'a str {
    node.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
