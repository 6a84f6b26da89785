//! Realm Shim Core Library
//!
//! Tames a fresh set of primordials down to an object-capability-safe subset,
//! driven by a declarative permission tree, and packages the result as a
//! frozen unsafe record for compartment construction.

pub mod descriptors;
pub mod error;
pub mod heap;
pub mod host;
pub mod obs;
pub mod permits;
pub mod repair;
pub mod sanitizer;
pub mod stdlib;
pub mod telemetry;
pub mod unsafe_rec;

pub use error::{ErrorCategory, RealmError, RealmResult};

pub use heap::{
    FunctionBehavior, Heap, HeapError, ObjectHandle, PropertyDescriptor, PropertyKey, Value,
    WellKnownSymbol,
};

pub use permits::{Permit, PermissionTree, PermitNode, PermitTable};

pub use sanitizer::{get_permit, register, sanitize, SanitizeReport, WhiteTable};

pub use stdlib::{get_shared_global_descs, SharedGlobalDescs};

pub use repair::{AccessorRepair, FunctionRepair, RepairPass};

pub use host::{FunctionFlavor, Host, StandardHost};

pub use unsafe_rec::{Bootstrap, UnsafeRec};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
