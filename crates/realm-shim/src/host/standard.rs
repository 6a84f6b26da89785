//! In-memory ECMAScript host.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::intrinsics::{self, IntrinsicsOptions};
use super::{FunctionFlavor, Host};
use crate::descriptors::own_data_object;
use crate::error::{RealmError, RealmResult};
use crate::heap::{Heap, ObjectHandle};

/// A host whose contexts all live on one [`Heap`].
#[derive(Debug, Clone)]
pub struct StandardHost {
    name: String,
    fresh_contexts: bool,
    options: IntrinsicsOptions,
    heap: Heap,
    current: Option<ObjectHandle>,
    flavor_prototypes: HashMap<ObjectHandle, BTreeMap<FunctionFlavor, ObjectHandle>>,
}

impl Default for StandardHost {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardHost {
    pub fn new() -> Self {
        Self {
            name: "standard".to_string(),
            fresh_contexts: true,
            options: IntrinsicsOptions::default(),
            heap: Heap::new(),
            current: None,
            flavor_prototypes: HashMap::new(),
        }
    }

    /// A host with no way to create a fresh context.
    pub fn unsupported() -> Self {
        Self {
            name: "unsupported".to_string(),
            fresh_contexts: false,
            ..Self::new()
        }
    }

    /// Ship the legacy `Object.prototype` accessor helpers in broken shapes.
    pub fn with_broken_legacy_accessors(mut self) -> Self {
        self.options.broken_legacy_accessors = true;
        self
    }

    /// Model an engine that cannot evaluate `flavor` functions.
    pub fn without_flavor(mut self, flavor: FunctionFlavor) -> Self {
        self.options.flavors.remove(&flavor);
        self
    }

    fn build_context(&mut self) -> RealmResult<ObjectHandle> {
        let built = intrinsics::build(&mut self.heap, &self.options)?;
        debug!(
            host = %self.name,
            global = %built.global,
            objects = self.heap.len(),
            "context created"
        );
        self.flavor_prototypes
            .insert(built.global, built.flavor_prototypes);
        Ok(built.global)
    }
}

impl Host for StandardHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_fresh_contexts(&self) -> bool {
        self.fresh_contexts
    }

    fn heap(&self) -> &Heap {
        &self.heap
    }

    fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    fn new_global(&mut self) -> RealmResult<ObjectHandle> {
        if !self.fresh_contexts {
            return Err(RealmError::UnsupportedHost {
                host: self.name.clone(),
            });
        }
        self.build_context()
    }

    fn current_global(&mut self) -> RealmResult<ObjectHandle> {
        match self.current {
            Some(global) => Ok(global),
            None => {
                let global = self.build_context()?;
                self.current = Some(global);
                Ok(global)
            }
        }
    }

    fn function_prototype(
        &self,
        global: ObjectHandle,
        flavor: FunctionFlavor,
    ) -> RealmResult<Option<ObjectHandle>> {
        if !self.options.flavors.contains(&flavor) {
            return Ok(None);
        }
        if flavor == FunctionFlavor::Function {
            return match own_data_object(&self.heap, global, &"Function".into())? {
                Some(function) => Ok(own_data_object(&self.heap, function, &"prototype".into())?),
                None => Ok(None),
            };
        }
        Ok(self
            .flavor_prototypes
            .get(&global)
            .and_then(|prototypes| prototypes.get(&flavor))
            .copied())
    }
}
