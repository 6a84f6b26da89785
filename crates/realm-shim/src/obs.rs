//! Structured observability hooks for realm construction.
//!
//! This module provides:
//! - Realm-scoped tracing spans via the `RealmSpan` RAII guard
//! - Emission functions for bootstrap milestones: start, repair, registration,
//!   taming, extraction, record creation
//!
//! Events are emitted at `info!` level. Errors are never logged here; they are
//! returned to the caller.

use tracing::info;

use crate::sanitizer::SanitizeReport;

/// RAII guard that enters a realm-scoped span for the duration of one
/// bootstrap.
///
/// # Example
///
/// ```ignore
/// let span = RealmSpan::enter("standard", "new");
/// // every event below carries realm_id = span.realm_id()
/// ```
pub struct RealmSpan {
    realm_id: String,
    _span: tracing::span::EnteredSpan,
}

impl RealmSpan {
    /// Create and enter a span tagged with a fresh `realm_id`.
    pub fn enter(host: &str, context: &str) -> Self {
        let realm_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("realm", realm_id = %realm_id, host = %host, context = %context);
        Self {
            realm_id,
            _span: span.entered(),
        }
    }

    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }
}

/// Emit event: bootstrap started.
pub fn emit_bootstrap_started(realm_id: &str, host: &str, context: &str, fingerprint: &str) {
    info!(
        event = "realm.bootstrap.started",
        realm_id = %realm_id,
        host = %host,
        context = %context,
        permits = %fingerprint,
    );
}

/// Emit event: a repair pass ran.
pub fn emit_repair_applied(realm_id: &str, pass: &str, changed: bool) {
    info!(event = "realm.repair.applied", realm_id = %realm_id, pass = %pass, changed = changed);
}

/// Emit event: taming finished.
pub fn emit_sanitize_finished(realm_id: &str, report: &SanitizeReport) {
    info!(
        event = "realm.sanitize.finished",
        realm_id = %realm_id,
        registered = report.registered,
        cleaned = report.cleaned,
        kept = report.kept,
        deleted = report.deleted.len(),
        converted = report.converted.len(),
    );
}

/// Emit event: shared globals extracted.
pub fn emit_extraction_finished(realm_id: &str, shared: usize) {
    info!(event = "realm.extraction.finished", realm_id = %realm_id, shared = shared);
}

/// Emit event: the frozen unsafe record was produced.
pub fn emit_unsafe_rec_created(realm_id: &str, shims: usize, duration_us: u64) {
    info!(
        event = "realm.unsafe_rec.created",
        realm_id = %realm_id,
        shims = shims,
        duration_us = duration_us,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_span_ids_are_unique() {
        let a = RealmSpan::enter("standard", "new");
        let a_id = a.realm_id().to_string();
        drop(a);
        let b = RealmSpan::enter("standard", "new");
        assert_ne!(a_id, b.realm_id());
        assert_eq!(a_id.len(), 36);
    }
}
