//! Heuristic taggers over the canonical model.
//!
//! - `entrypoints`: externally reachable functions, with access-control,
//!   value, admin-naming and call-out tags.
//! - `sinks`: any function showing an outbound call or external balance read.
//!
//! Both take the normalized contracts plus the raw text of each file and
//! return lists already in final order.

pub mod entrypoints;
pub mod heuristics;
pub mod sinks;

use serde::{Deserialize, Serialize};

pub use entrypoints::{collect_entrypoints, EntrypointScan};
pub use sinks::collect_sinks;

/// Policy switches for dropping entrypoint candidates.
///
/// Both default to on. They trade recall on inherited members for precision
/// on first-pass output, so they are exposed rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingOptions {
    /// Drop functions whose declaring file is known and differs from the
    /// contract's file.
    pub drop_cross_file_inherited: bool,
    /// Drop functions with a non-zero range that cannot be sliced from their
    /// declaring file's text.
    pub drop_unsliceable: bool,
}

impl Default for TaggingOptions {
    fn default() -> Self {
        Self { drop_cross_file_inherited: true, drop_unsliceable: true }
    }
}

/// Why a candidate entrypoint was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    CrossFileInherited,
    Unsliceable,
}

/// A deliberate policy drop, kept so reports can say what was hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDrop {
    pub contract: String,
    pub file: String,
    pub signature: String,
    pub declaring_file: String,
    pub reason: DropReason,
}
