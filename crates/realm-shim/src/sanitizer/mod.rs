//! Permission-driven taming of the primordial object graph.
//!
//! A run has two phases over fresh tables:
//!
//! 1. [`register`] binds every object reachable through a permitted subtree to
//!    its [`PermitTable`](crate::permits::PermitTable), failing if any object
//!    is reached twice.
//! 2. Cleaning drains a [`CleaningQueue`] seeded with the global object,
//!    vetting each object's prototype, then deleting, keeping or converting
//!    every own property according to [`get_permit`].
//!
//! Any error leaves the graph partially tamed; the realm must be discarded.
//!
//! # Modules
//!
//! - [`register`] - `WhiteTable`, registration pass
//! - [`resolve`] - `get_permit`
//! - [`clean`] - `CleaningQueue`, per-property decisions

pub mod clean;
pub mod register;
pub mod resolve;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use clean::{CleanState, CleaningQueue};
pub use register::{register, WhiteTable};
pub use resolve::get_permit;

use crate::error::RealmResult;
use crate::heap::{Heap, ObjectHandle, PropertyKey};
use crate::permits::PermissionTree;

/// Path label of the global object itself. Its children are labelled by
/// their bare names (`Array.prototype.map`).
pub const GLOBAL_PATH: &str = "globalThis";

/// Dotted path of `key` on the object labelled `parent`.
pub fn join_path(parent: &str, key: &PropertyKey) -> String {
    if parent == GLOBAL_PATH {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Outcome of one [`sanitize`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeReport {
    /// Objects bound to a permit table.
    pub registered: usize,
    /// Objects whose own properties were processed.
    pub cleaned: usize,
    /// Properties left in place.
    pub kept: usize,
    /// Paths of deleted properties, in visit order.
    pub deleted: Vec<String>,
    /// Paths of data properties converted to accessor pairs.
    pub converted: Vec<String>,
}

impl SanitizeReport {
    /// Did the run change anything?
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.converted.is_empty()
    }
}

/// Tame the graph rooted at `global` in place according to `tree`.
pub fn sanitize(
    heap: &mut Heap,
    global: ObjectHandle,
    tree: &PermissionTree,
) -> RealmResult<SanitizeReport> {
    let white = register(heap, global, tree)?;
    debug!(registered = white.len(), "registration complete");

    let mut report = clean::Cleaner::new(heap, &white, global)?.run(global, GLOBAL_PATH)?;
    report.registered = white.len();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::WellKnownSymbol;

    #[test]
    fn children_of_the_global_use_bare_names() {
        assert_eq!(join_path(GLOBAL_PATH, &"Array".into()), "Array");
        assert_eq!(
            join_path("Array.prototype", &WellKnownSymbol::Iterator.key()),
            "Array.prototype.@@iterator"
        );
    }

    #[test]
    fn empty_report_is_noop() {
        let report = SanitizeReport {
            kept: 3,
            ..Default::default()
        };
        assert!(report.is_noop());
    }
}
