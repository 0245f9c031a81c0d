//! Deterministic ordering for contracts, functions and tag lists.
//!
//! Every comparator here is total: ties on the documented keys fall through
//! to the signature and source offset, so shuffled input still sorts to the
//! same sequence and reports diff cleanly between runs.

use std::cmp::Ordering;

use crate::model::{ContractRecord, EntrypointTag, FunctionRecord, FunctionRef, Mutability, SinkTag};

/// Order functions within a contract: visibility rank, payable first,
/// mutability rank, then name.
pub fn compare_functions(a: &FunctionRecord, b: &FunctionRecord) -> Ordering {
    a.visibility
        .rank()
        .cmp(&b.visibility.rank())
        .then_with(|| payable_first(a.mutability).cmp(&payable_first(b.mutability)))
        .then_with(|| a.mutability.rank().cmp(&b.mutability.rank()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.signature.cmp(&b.signature))
        .then_with(|| a.location.start.cmp(&b.location.start))
}

fn payable_first(m: Mutability) -> u8 {
    if m == Mutability::Payable {
        0
    } else {
        1
    }
}

/// Sort contracts by `(file, name)`.
pub fn sort_contracts(contracts: &mut [ContractRecord]) {
    contracts.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.name.cmp(&b.name)));
}

/// Presentation bucket for an entrypoint.
///
/// 0: receive/fallback, 1: payable, 2: nonpayable or unknown, 3: view/pure.
pub fn entrypoint_bucket(function: &FunctionRef) -> u8 {
    if function.name == "receive" || function.name == "fallback" {
        return 0;
    }
    match function.mutability {
        Mutability::Payable => 1,
        Mutability::Nonpayable | Mutability::Unknown => 2,
        Mutability::View | Mutability::Pure => 3,
    }
}

/// Sort entrypoints by `(file, contract, bucket, line, name)`.
pub fn sort_entrypoints(entrypoints: &mut [EntrypointTag]) {
    entrypoints.sort_by(|a, b| {
        let (a, b) = (&a.function, &b.function);
        a.file
            .cmp(&b.file)
            .then_with(|| a.contract.cmp(&b.contract))
            .then_with(|| entrypoint_bucket(a).cmp(&entrypoint_bucket(b)))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.signature.cmp(&b.signature))
    });
}

/// Sort sinks by `(file, contract, line, name)`.
pub fn sort_sinks(sinks: &mut [SinkTag]) {
    sinks.sort_by(|a, b| {
        let (a, b) = (&a.function, &b.function);
        a.file
            .cmp(&b.file)
            .then_with(|| a.contract.cmp(&b.contract))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.signature.cmp(&b.signature))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContractKind, SourceLocation, Visibility};

    fn func(name: &str, vis: Visibility, mutability: Mutability) -> FunctionRecord {
        FunctionRecord {
            name: name.to_string(),
            signature: format!("{name}()"),
            visibility: vis,
            mutability,
            modifiers: vec![],
            line: 1,
            location: SourceLocation::unknown(),
            declaring_file: String::new(),
        }
    }

    #[test]
    fn functions_order_attack_surface_first() {
        let mut fns = vec![
            func("z", Visibility::Private, Mutability::Nonpayable),
            func("b", Visibility::Public, Mutability::View),
            func("a", Visibility::Public, Mutability::Nonpayable),
            func("c", Visibility::Public, Mutability::Payable),
            func("x", Visibility::External, Mutability::Pure),
            func("q", Visibility::Unknown, Mutability::Payable),
            func("i", Visibility::Internal, Mutability::View),
        ];
        fns.sort_by(compare_functions);
        let names: Vec<&str> = fns.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["x", "c", "b", "a", "i", "z", "q"]);
    }

    #[test]
    fn shuffled_functions_sort_identically() {
        let base = vec![
            func("transfer", Visibility::External, Mutability::Nonpayable),
            func("approve", Visibility::External, Mutability::Nonpayable),
            func("deposit", Visibility::Public, Mutability::Payable),
            func("balance", Visibility::Public, Mutability::View),
        ];
        let mut forward = base.clone();
        let mut reversed: Vec<_> = base.into_iter().rev().collect();
        forward.sort_by(compare_functions);
        reversed.sort_by(compare_functions);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn contracts_sort_by_file_then_name() {
        let mut cs = vec![
            ContractRecord::new("B", ContractKind::Contract, "b.sol", vec![]),
            ContractRecord::new("Z", ContractKind::Contract, "a.sol", vec![]),
            ContractRecord::new("A", ContractKind::Contract, "b.sol", vec![]),
        ];
        sort_contracts(&mut cs);
        let keys: Vec<(&str, &str)> =
            cs.iter().map(|c| (c.file.as_str(), c.name.as_str())).collect();
        assert_eq!(keys, vec![("a.sol", "Z"), ("b.sol", "A"), ("b.sol", "B")]);
    }

    #[test]
    fn buckets_put_value_receivers_first() {
        let c = ContractRecord::new("C", ContractKind::Contract, "c.sol", vec![]);
        let bucket = |name: &str, m: Mutability| {
            entrypoint_bucket(&FunctionRef::new(&c, &func(name, Visibility::External, m), "c.sol"))
        };
        assert_eq!(bucket("receive", Mutability::Payable), 0);
        assert_eq!(bucket("fallback", Mutability::Nonpayable), 0);
        assert_eq!(bucket("deposit", Mutability::Payable), 1);
        assert_eq!(bucket("transfer", Mutability::Nonpayable), 2);
        assert_eq!(bucket("weird", Mutability::Unknown), 2);
        assert_eq!(bucket("total", Mutability::View), 3);
        assert_eq!(bucket("calc", Mutability::Pure), 3);
    }
}
