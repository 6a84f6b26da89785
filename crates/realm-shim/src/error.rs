//! Error taxonomy for realm construction.
//!
//! Every variant means "do not use this realm". Nothing here is retried or
//! downgraded to a warning.

use serde::{Deserialize, Serialize};

use crate::heap::HeapError;

/// Errors produced while taming or bootstrapping a realm.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("primordial reachable through multiple paths: {path} (first reached as {first})")]
    MultiplePaths { path: String, first: String },

    #[error("unexpected intrinsic {object}.__proto__")]
    UnvettedIntrinsic { object: String },

    #[error("unexpected accessor on global property: {name}")]
    UnexpectedAccessor { name: String },

    #[error("cannot tame non-configurable property {path}")]
    NonConfigurable { path: String },

    #[error("global object has no usable {name} evaluator")]
    MissingEvaluator { name: String },

    #[error("unexpected platform, unable to create Realm: {host}")]
    UnsupportedHost { host: String },

    #[error("invalid permission tree: {0}")]
    InvalidPermissionTree(String),

    #[error("heap error: {0}")]
    Heap(#[from] HeapError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad failure classes, for callers that report rather than match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// An object is governed by more than one permission path.
    ConfigurationSoundness,
    /// An object's prototype was never vetted.
    UnvettedIntrinsic,
    /// A slot has the wrong shape (accessor vs data, non-configurable, missing).
    DescriptorShape,
    /// No mechanism to obtain a fresh context.
    UnsupportedHost,
    /// Permission tree could not be loaded.
    Configuration,
    /// Heap or I/O failure underneath.
    Host,
}

impl RealmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MultiplePaths { .. } => ErrorCategory::ConfigurationSoundness,
            Self::UnvettedIntrinsic { .. } => ErrorCategory::UnvettedIntrinsic,
            Self::UnexpectedAccessor { .. }
            | Self::NonConfigurable { .. }
            | Self::MissingEvaluator { .. } => ErrorCategory::DescriptorShape,
            Self::UnsupportedHost { .. } => ErrorCategory::UnsupportedHost,
            Self::InvalidPermissionTree(_) | Self::Serialization(_) => {
                ErrorCategory::Configuration
            }
            Self::Heap(_) | Self::Io(_) => ErrorCategory::Host,
        }
    }
}

/// Result type for realm operations.
pub type RealmResult<T> = std::result::Result<T, RealmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_paths_names_both_paths() {
        let err = RealmError::MultiplePaths {
            path: "Number.parseInt".into(),
            first: "parseInt".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("multiple paths"));
        assert!(msg.contains("Number.parseInt"));
        assert!(msg.contains("parseInt"));
        assert_eq!(err.category(), ErrorCategory::ConfigurationSoundness);
    }

    #[test]
    fn unvetted_intrinsic_display() {
        let err = RealmError::UnvettedIntrinsic {
            object: "Int8Array".into(),
        };
        assert_eq!(err.to_string(), "unexpected intrinsic Int8Array.__proto__");
        assert_eq!(err.category(), ErrorCategory::UnvettedIntrinsic);
    }

    #[test]
    fn shape_errors_share_a_category() {
        let accessor = RealmError::UnexpectedAccessor {
            name: "Array".into(),
        };
        let pinned = RealmError::NonConfigurable {
            path: "Symbol.matchAll".into(),
        };
        assert_eq!(accessor.category(), ErrorCategory::DescriptorShape);
        assert_eq!(pinned.category(), ErrorCategory::DescriptorShape);
    }

    #[test]
    fn heap_errors_convert() {
        let err: RealmError = HeapError::TypeError("boom".into()).into();
        assert_eq!(err.category(), ErrorCategory::Host);
        assert!(err.to_string().contains("boom"));
    }
}
