//! Host context providers.
//!
//! A [`Host`] owns the engine heap and hands out global objects: a brand-new
//! one per [`Host::new_global`] call, or the context the bootstrap itself runs
//! in via [`Host::current_global`]. The sanitizer only needs a conventional
//! global shape; it never asks how the global was produced.
//!
//! # Modules
//!
//! - [`standard`] - `StandardHost`, an in-memory ECMAScript engine model
//! - [`intrinsics`] - builder for one context's primordials

pub mod intrinsics;
pub mod standard;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use standard::StandardHost;

use crate::error::RealmResult;
use crate::heap::{Heap, ObjectHandle};

/// The four kinds of function a host can evaluate, each with its own
/// hidden prototype and constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionFlavor {
    Function,
    GeneratorFunction,
    AsyncFunction,
    AsyncGeneratorFunction,
}

impl FunctionFlavor {
    pub const ALL: [FunctionFlavor; 4] = [
        Self::Function,
        Self::GeneratorFunction,
        Self::AsyncFunction,
        Self::AsyncGeneratorFunction,
    ];

    /// Constructor name, e.g. `GeneratorFunction`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::GeneratorFunction => "GeneratorFunction",
            Self::AsyncFunction => "AsyncFunction",
            Self::AsyncGeneratorFunction => "AsyncGeneratorFunction",
        }
    }
}

impl fmt::Display for FunctionFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime able to produce global objects with working evaluators.
pub trait Host {
    /// Short platform label, used in logs and errors.
    fn name(&self) -> &str;

    /// Can this host create a brand-new, share-nothing context?
    fn supports_fresh_contexts(&self) -> bool;

    fn heap(&self) -> &Heap;

    fn heap_mut(&mut self) -> &mut Heap;

    /// Create a fresh context and return its global object.
    fn new_global(&mut self) -> RealmResult<ObjectHandle>;

    /// The context the caller itself runs in. Repeated calls return the same
    /// global.
    fn current_global(&mut self) -> RealmResult<ObjectHandle>;

    /// Prototype shared by every function of `flavor` evaluated in the
    /// context of `global`, or `None` when the host cannot produce that
    /// flavour.
    fn function_prototype(
        &self,
        global: ObjectHandle,
        flavor: FunctionFlavor,
    ) -> RealmResult<Option<ObjectHandle>>;
}
