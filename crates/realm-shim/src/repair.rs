//! Repairs applied to a raw global before taming.
//!
//! Both passes are idempotent: running one twice leaves the graph as the first
//! run did and reports no change.

use tracing::debug;

use crate::descriptors::{own_data_object, own_descriptor};
use crate::error::RealmResult;
use crate::heap::{FunctionBehavior, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::host::{FunctionFlavor, Host};

/// A normalization step run against one global object.
pub trait RepairPass {
    fn name(&self) -> &'static str;

    /// Repair the context rooted at `global`. Returns `true` when anything
    /// changed.
    fn repair(&self, host: &mut dyn Host, global: ObjectHandle) -> RealmResult<bool>;
}

/// The passes the bootstrap runs, in order.
pub fn standard_repairs() -> Vec<Box<dyn RepairPass>> {
    vec![Box::new(AccessorRepair), Box::new(FunctionRepair)]
}

fn function_prototype_of(host: &dyn Host, global: ObjectHandle) -> RealmResult<Option<ObjectHandle>> {
    match own_data_object(host.heap(), global, &"Function".into())? {
        Some(function) => Ok(own_data_object(host.heap(), function, &"prototype".into())?),
        None => Ok(None),
    }
}

/// Ensures `Object.prototype` carries the four legacy accessor helpers as
/// ordinary methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessorRepair;

impl AccessorRepair {
    pub const HELPERS: [&'static str; 4] = [
        "__defineGetter__",
        "__defineSetter__",
        "__lookupGetter__",
        "__lookupSetter__",
    ];
}

impl RepairPass for AccessorRepair {
    fn name(&self) -> &'static str {
        "accessors"
    }

    fn repair(&self, host: &mut dyn Host, global: ObjectHandle) -> RealmResult<bool> {
        let Some(object) = own_data_object(host.heap(), global, &"Object".into())? else {
            return Ok(false);
        };
        let Some(object_proto) = own_data_object(host.heap(), object, &"prototype".into())? else {
            return Ok(false);
        };
        let function_proto = function_prototype_of(host, global)?;

        let mut changed = false;
        for name in Self::HELPERS {
            let key = PropertyKey::from(name);
            let healthy = own_descriptor(host.heap(), object_proto, &key)?
                .as_ref()
                .and_then(PropertyDescriptor::value)
                .and_then(|value| value.as_object())
                .is_some_and(|helper| host.heap().is_callable(helper));
            if healthy {
                continue;
            }

            let heap = host.heap_mut();
            let helper = heap.alloc_function(function_proto, FunctionBehavior::native(name));
            heap.define_property(helper, "length", PropertyDescriptor::readonly(2.0))?;
            heap.define_property(helper, "name", PropertyDescriptor::readonly(name))?;
            heap.define_property(object_proto, key, PropertyDescriptor::builtin(helper))?;
            debug!(helper = name, "legacy accessor helper replaced");
            changed = true;
        }
        Ok(changed)
    }
}

/// Replaces each function flavour's `constructor` with one that throws, so
/// that reaching a function's constructor never yields an evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionRepair;

impl FunctionRepair {
    fn repair_flavor(
        host: &mut dyn Host,
        global: ObjectHandle,
        flavor: FunctionFlavor,
    ) -> RealmResult<bool> {
        let Some(prototype) = host.function_prototype(global, flavor)? else {
            debug!(flavor = %flavor, "flavor not supported by host, skipped");
            return Ok(false);
        };
        let constructor_key = PropertyKey::from("constructor");
        let original = own_data_object(host.heap(), prototype, &constructor_key)?;
        if let Some(original) = original {
            let behavior = host.heap().object(original)?.behavior();
            if matches!(behavior, Some(FunctionBehavior::Throwing { .. })) {
                return Ok(false);
            }
        }
        let parent = match original {
            Some(original) => host.heap().get_prototype_of(original)?,
            None => host.heap().get_prototype_of(prototype)?,
        };

        let heap = host.heap_mut();
        let tamed = heap.alloc_function(
            parent,
            FunctionBehavior::Throwing {
                message: "Not available".to_string(),
            },
        );
        heap.define_property(tamed, "length", PropertyDescriptor::readonly(0.0))?;
        heap.define_property(tamed, "name", PropertyDescriptor::readonly(flavor.name()))?;
        heap.define_property(tamed, "prototype", PropertyDescriptor::frozen(prototype))?;
        heap.define_property(prototype, constructor_key, PropertyDescriptor::builtin(tamed))?;
        Ok(true)
    }
}

impl RepairPass for FunctionRepair {
    fn name(&self) -> &'static str {
        "functions"
    }

    fn repair(&self, host: &mut dyn Host, global: ObjectHandle) -> RealmResult<bool> {
        let mut changed = false;
        for flavor in FunctionFlavor::ALL {
            changed |= Self::repair_flavor(host, global, flavor)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{Heap, Value};
    use crate::host::StandardHost;

    fn read(heap: &Heap, object: ObjectHandle, name: &str) -> Option<ObjectHandle> {
        own_data_object(heap, object, &name.into()).unwrap()
    }

    #[test]
    fn accessor_repair_restores_broken_helpers() {
        let mut host = StandardHost::new().with_broken_legacy_accessors();
        let global = host.new_global().unwrap();

        assert!(AccessorRepair.repair(&mut host, global).unwrap());

        let heap = host.heap();
        let object_proto = read(heap, read(heap, global, "Object").unwrap(), "prototype").unwrap();
        for name in AccessorRepair::HELPERS {
            let helper = read(heap, object_proto, name).expect(name);
            assert!(heap.is_callable(helper), "{name}");
        }
    }

    #[test]
    fn accessor_repair_is_idempotent() {
        let mut host = StandardHost::new().with_broken_legacy_accessors();
        let global = host.new_global().unwrap();
        assert!(AccessorRepair.repair(&mut host, global).unwrap());
        assert!(!AccessorRepair.repair(&mut host, global).unwrap());
    }

    #[test]
    fn healthy_helpers_are_left_alone() {
        let mut host = StandardHost::new();
        let global = host.new_global().unwrap();
        assert!(!AccessorRepair.repair(&mut host, global).unwrap());
    }

    #[test]
    fn function_repair_tames_every_supported_flavor() {
        let mut host = StandardHost::new().without_flavor(FunctionFlavor::AsyncGeneratorFunction);
        let global = host.new_global().unwrap();
        let function = read(host.heap(), global, "Function").unwrap();

        assert!(FunctionRepair.repair(&mut host, global).unwrap());

        for flavor in [
            FunctionFlavor::Function,
            FunctionFlavor::GeneratorFunction,
            FunctionFlavor::AsyncFunction,
        ] {
            let prototype = host.function_prototype(global, flavor).unwrap().unwrap();
            let tamed = read(host.heap(), prototype, "constructor").unwrap();
            assert_ne!(tamed, function);
            assert_eq!(read(host.heap(), tamed, "prototype"), Some(prototype));

            let err = host
                .heap_mut()
                .call(tamed, Value::Undefined, &[])
                .unwrap_err();
            assert!(err.to_string().contains("Not available"), "{flavor}");
        }

        // The global binding is untouched: it is the realm's unsafe evaluator.
        assert_eq!(read(host.heap(), global, "Function"), Some(function));
    }

    #[test]
    fn function_repair_is_idempotent() {
        let mut host = StandardHost::new();
        let global = host.new_global().unwrap();
        assert!(FunctionRepair.repair(&mut host, global).unwrap());
        assert!(!FunctionRepair.repair(&mut host, global).unwrap());
    }

    #[test]
    fn standard_repairs_run_in_order() {
        let names: Vec<_> = standard_repairs().iter().map(|pass| pass.name()).collect();
        assert_eq!(names, ["accessors", "functions"]);
    }
}
