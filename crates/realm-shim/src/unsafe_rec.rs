//! Realm bootstrap: from a raw host context to a frozen unsafe record.
//!
//! The record bundles a tamed global with the evaluators tied to it. The
//! evaluators and intrinsics of one context must always be used together;
//! mixing them across contexts would hand one realm's authority to another.

use std::time::{Duration, Instant};

use crate::descriptors::own_data_object;
use crate::error::{RealmError, RealmResult};
use crate::heap::{Heap, ObjectHandle};
use crate::host::Host;
use crate::obs::{
    emit_bootstrap_started, emit_extraction_finished, emit_repair_applied,
    emit_sanitize_finished, emit_unsafe_rec_created, RealmSpan,
};
use crate::permits::PermissionTree;
use crate::repair::{standard_repairs, RepairPass};
use crate::sanitizer::{sanitize, SanitizeReport};
use crate::stdlib::{get_shared_global_descs, SharedGlobalDescs};

/// One fresh, tamed execution context.
///
/// Fields are private and only readable; a record cannot be altered once
/// built.
///
/// ```compile_fail
/// # use realm_shim::{Bootstrap, StandardHost};
/// let mut bootstrap = Bootstrap::new(StandardHost::new()).unwrap();
/// let mut rec = bootstrap.create_current_unsafe_rec().unwrap();
/// rec.unsafe_eval = rec.unsafe_function;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UnsafeRec {
    unsafe_global: ObjectHandle,
    shared_global_descs: SharedGlobalDescs,
    unsafe_eval: ObjectHandle,
    unsafe_function: ObjectHandle,
    all_shims: Vec<String>,
}

impl UnsafeRec {
    pub fn unsafe_global(&self) -> ObjectHandle {
        self.unsafe_global
    }

    pub fn shared_global_descs(&self) -> &SharedGlobalDescs {
        &self.shared_global_descs
    }

    pub fn unsafe_eval(&self) -> ObjectHandle {
        self.unsafe_eval
    }

    pub fn unsafe_function(&self) -> ObjectHandle {
        self.unsafe_function
    }

    pub fn all_shims(&self) -> &[String] {
        &self.all_shims
    }
}

/// Produces unsafe records from a host.
pub struct Bootstrap<H: Host> {
    host: H,
    tree: PermissionTree,
    repairs: Vec<Box<dyn RepairPass>>,
    current: Option<UnsafeRec>,
    last_report: Option<SanitizeReport>,
}

impl<H: Host> Bootstrap<H> {
    /// Fails immediately when `host` has no fresh-context mechanism.
    pub fn new(host: H) -> RealmResult<Self> {
        if !host.supports_fresh_contexts() {
            return Err(RealmError::UnsupportedHost {
                host: host.name().to_string(),
            });
        }
        Ok(Self {
            host,
            tree: PermissionTree::standard(),
            repairs: standard_repairs(),
            current: None,
            last_report: None,
        })
    }

    pub fn with_permission_tree(mut self, tree: PermissionTree) -> Self {
        self.tree = tree;
        self
    }

    pub fn permission_tree(&self) -> &PermissionTree {
        &self.tree
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Report of the most recent taming run.
    pub fn last_report(&self) -> Option<&SanitizeReport> {
        self.last_report.as_ref()
    }

    /// Tame a brand-new context.
    pub fn create_new_unsafe_rec(&mut self, all_shims: Vec<String>) -> RealmResult<UnsafeRec> {
        let global = self.host.new_global()?;
        self.create_unsafe_rec(global, "new", all_shims)
    }

    /// Tame the context the caller runs in. The context is tamed once;
    /// later calls return the same record.
    pub fn create_current_unsafe_rec(&mut self) -> RealmResult<UnsafeRec> {
        if let Some(rec) = &self.current {
            return Ok(rec.clone());
        }
        let global = self.host.current_global()?;
        let rec = self.create_unsafe_rec(global, "current", Vec::new())?;
        self.current = Some(rec.clone());
        Ok(rec)
    }

    fn create_unsafe_rec(
        &mut self,
        global: ObjectHandle,
        context: &str,
        all_shims: Vec<String>,
    ) -> RealmResult<UnsafeRec> {
        let started = Instant::now();
        let span = RealmSpan::enter(self.host.name(), context);
        let realm_id = span.realm_id();
        emit_bootstrap_started(realm_id, self.host.name(), context, &self.tree.fingerprint()?);

        for pass in &self.repairs {
            let changed = pass.repair(&mut self.host, global)?;
            emit_repair_applied(realm_id, pass.name(), changed);
        }

        // Taming deletes `eval` from the global; capture both first.
        let unsafe_eval = evaluator(self.host.heap(), global, "eval")?;
        let unsafe_function = evaluator(self.host.heap(), global, "Function")?;

        let report = sanitize(self.host.heap_mut(), global, &self.tree)?;
        emit_sanitize_finished(realm_id, &report);

        let shared_global_descs = get_shared_global_descs(self.host.heap(), global, &self.tree)?;
        emit_extraction_finished(realm_id, shared_global_descs.len());

        let rec = UnsafeRec {
            unsafe_global: global,
            shared_global_descs,
            unsafe_eval,
            unsafe_function,
            all_shims,
        };
        emit_unsafe_rec_created(realm_id, rec.all_shims.len(), micros(started.elapsed()));
        self.last_report = Some(report);
        Ok(rec)
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// The callable held in the global's own data slot `name`.
fn evaluator(heap: &Heap, global: ObjectHandle, name: &str) -> RealmResult<ObjectHandle> {
    own_data_object(heap, global, &name.into())?
        .filter(|function| heap.is_callable(*function))
        .ok_or_else(|| RealmError::MissingEvaluator {
            name: name.to_string(),
        })
}
