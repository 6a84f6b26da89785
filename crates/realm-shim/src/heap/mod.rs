//! Engine object heap: an arena of objects linked by `[[Prototype]]` and
//! property slots.
//!
//! The heap is the "live object graph" a host hands to the sanitizer. It
//! owns every primordial; the sanitizer borrows it exclusively for the
//! duration of a run and mutates it in place. Handles are identities, so
//! membership in the sanitizer's tables is always by identity, never by
//! structure.
//!
//! # Modules
//!
//! - [`value`] - `ObjectHandle`, `PropertyKey`, `WellKnownSymbol`, `Value`
//! - [`descriptor`] - `PropertyDescriptor`
//! - [`object`] - `JsObject`, `ObjectKind`, `FunctionBehavior`

pub mod descriptor;
pub mod object;
pub mod value;

use std::collections::HashSet;

pub use descriptor::PropertyDescriptor;
pub use object::{FunctionBehavior, JsObject, ObjectKind};
pub use value::{ObjectHandle, PropertyKey, SymbolId, Value, WellKnownSymbol};

/// Errors produced by heap operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeapError {
    #[error("{0} not found")]
    ObjectNotFound(ObjectHandle),

    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("TypeError: prototype chain cycle through {0}")]
    PrototypeCycle(ObjectHandle),

    #[error("unknown well-known symbol: {0}")]
    UnknownSymbol(String),
}

/// Result type for heap operations.
pub type HeapResult<T> = std::result::Result<T, HeapError>;

/// First id handed out by [`Heap::alloc_symbol`]; well-known symbols use `1..=13`.
const FIRST_USER_SYMBOL: u32 = 14;

/// The object arena.
#[derive(Debug, Clone)]
pub struct Heap {
    objects: Vec<JsObject>,
    next_symbol: u32,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            next_symbol: FIRST_USER_SYMBOL,
        }
    }

    /// Allocate an ordinary object.
    pub fn alloc(&mut self, prototype: Option<ObjectHandle>) -> ObjectHandle {
        self.push(JsObject::new(prototype, ObjectKind::Ordinary))
    }

    /// Allocate a function object.
    pub fn alloc_function(
        &mut self,
        prototype: Option<ObjectHandle>,
        behavior: FunctionBehavior,
    ) -> ObjectHandle {
        self.push(JsObject::new(prototype, ObjectKind::Function(behavior)))
    }

    /// Allocate a fresh, non-registered symbol.
    pub fn alloc_symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        id
    }

    fn push(&mut self, object: JsObject) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(object);
        handle
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn object(&self, handle: ObjectHandle) -> HeapResult<&JsObject> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(HeapError::ObjectNotFound(handle))
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> HeapResult<&mut JsObject> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(HeapError::ObjectNotFound(handle))
    }

    pub fn is_callable(&self, handle: ObjectHandle) -> bool {
        self.object(handle).map(JsObject::is_callable).unwrap_or(false)
    }

    pub fn get_prototype_of(&self, handle: ObjectHandle) -> HeapResult<Option<ObjectHandle>> {
        Ok(self.object(handle)?.prototype)
    }

    /// `[[SetPrototypeOf]]`. Rejects cycles; `false` when the target is
    /// non-extensible and the prototype would change.
    pub fn set_prototype_of(
        &mut self,
        handle: ObjectHandle,
        prototype: Option<ObjectHandle>,
    ) -> HeapResult<bool> {
        let mut current = prototype;
        while let Some(ancestor) = current {
            if ancestor == handle {
                return Err(HeapError::PrototypeCycle(handle));
            }
            current = self.object(ancestor)?.prototype;
        }

        let object = self.object_mut(handle)?;
        if !object.extensible {
            return Ok(object.prototype == prototype);
        }
        object.prototype = prototype;
        Ok(true)
    }

    pub fn prevent_extensions(&mut self, handle: ObjectHandle) -> HeapResult<()> {
        self.object_mut(handle)?.extensible = false;
        Ok(())
    }

    /// `[[DefineOwnProperty]]` with a complete descriptor.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> HeapResult<bool> {
        Ok(self.object_mut(handle)?.define_own_property(key.into(), desc))
    }

    /// `[[Delete]]`. `false` when the slot is non-configurable.
    pub fn delete_property(&mut self, handle: ObjectHandle, key: &PropertyKey) -> HeapResult<bool> {
        Ok(self.object_mut(handle)?.delete(key))
    }

    /// Walk the chain from `handle` to the object owning `key`.
    fn lookup(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> HeapResult<Option<(ObjectHandle, PropertyDescriptor)>> {
        let mut seen = HashSet::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            if !seen.insert(h) {
                return Err(HeapError::PrototypeCycle(h));
            }
            let object = self.object(h)?;
            if let Some(desc) = object.own_property(key) {
                return Ok(Some((h, desc.clone())));
            }
            current = object.prototype;
        }
        Ok(None)
    }

    /// `[[Get]]` with `handle` as receiver. Runs getters.
    pub fn get(&mut self, handle: ObjectHandle, key: &PropertyKey) -> HeapResult<Value> {
        match self.lookup(handle, key)? {
            None => Ok(Value::Undefined),
            Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
            Some((_, PropertyDescriptor::Accessor { get: None, .. })) => Ok(Value::Undefined),
            Some((_, PropertyDescriptor::Accessor { get: Some(getter), .. })) => {
                self.call(getter, Value::Object(handle), &[])
            }
        }
    }

    /// Ordinary `[[Set]]` with `handle` as receiver. Runs setters.
    ///
    /// Returns `false` when the assignment is refused (non-writable slot on
    /// the chain, accessor without setter, non-extensible receiver).
    pub fn set(
        &mut self,
        handle: ObjectHandle,
        key: impl Into<PropertyKey>,
        value: impl Into<Value>,
    ) -> HeapResult<bool> {
        let key = key.into();
        let value = value.into();
        match self.lookup(handle, &key)? {
            Some((_, PropertyDescriptor::Accessor { set: None, .. })) => Ok(false),
            Some((_, PropertyDescriptor::Accessor { set: Some(setter), .. })) => {
                self.call(setter, Value::Object(handle), &[value])?;
                Ok(true)
            }
            Some((_, desc)) if !desc.is_writable() => Ok(false),
            Some((
                owner,
                PropertyDescriptor::Data {
                    enumerable,
                    configurable,
                    ..
                },
            )) if owner == handle => self.define_property(
                handle,
                key,
                PropertyDescriptor::Data {
                    value,
                    writable: true,
                    enumerable,
                    configurable,
                },
            ),
            _ => self.define_property(handle, key, PropertyDescriptor::data(value)),
        }
    }

    /// `[[Call]]`.
    pub fn call(&mut self, function: ObjectHandle, this: Value, args: &[Value]) -> HeapResult<Value> {
        let behavior = self
            .object(function)?
            .behavior()
            .cloned()
            .ok_or_else(|| HeapError::TypeError(format!("{function} is not a function")))?;

        match behavior {
            FunctionBehavior::Native { .. } => Ok(Value::Undefined),
            FunctionBehavior::Throwing { message } => Err(HeapError::TypeError(message)),
            FunctionBehavior::ConstantGetter { value } => Ok(value),
            FunctionBehavior::UnlockingSetter { key, enumerable } => {
                let receiver = this.as_object().ok_or_else(|| {
                    HeapError::TypeError(format!("cannot set {key} on {}", this.type_name()))
                })?;
                let value = args.first().cloned().unwrap_or(Value::Undefined);
                let desc = PropertyDescriptor::Data {
                    value,
                    writable: true,
                    enumerable,
                    configurable: true,
                };
                if !self.define_property(receiver, key.clone(), desc)? {
                    return Err(HeapError::TypeError(format!("cannot set {key}")));
                }
                Ok(Value::Undefined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    #[test]
    fn get_walks_the_prototype_chain() {
        let mut heap = Heap::new();
        let proto = heap.alloc(None);
        let child = heap.alloc(Some(proto));
        heap.define_property(proto, "x", PropertyDescriptor::data(7.0))
            .unwrap();

        assert_eq!(heap.get(child, &key("x")).unwrap(), Value::Number(7.0));
        assert_eq!(heap.get(child, &key("missing")).unwrap(), Value::Undefined);
    }

    #[test]
    fn non_configurable_slots_survive_delete() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        heap.define_property(obj, "pinned", PropertyDescriptor::frozen(1.0))
            .unwrap();
        heap.define_property(obj, "loose", PropertyDescriptor::data(1.0))
            .unwrap();

        assert!(!heap.delete_property(obj, &key("pinned")).unwrap());
        assert!(heap.delete_property(obj, &key("loose")).unwrap());
        assert!(heap.delete_property(obj, &key("never-there")).unwrap());
        assert!(heap.object(obj).unwrap().own_property(&key("pinned")).is_some());
    }

    #[test]
    fn non_configurable_data_cannot_flip_to_accessor() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        heap.define_property(obj, "x", PropertyDescriptor::frozen(1.0))
            .unwrap();
        let flipped = heap
            .define_property(obj, "x", PropertyDescriptor::accessor(None, None))
            .unwrap();
        assert!(!flipped);
    }

    #[test]
    fn frozen_nan_accepts_an_identical_redefinition() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        heap.define_property(obj, "NaN", PropertyDescriptor::frozen(f64::NAN))
            .unwrap();
        assert!(heap
            .define_property(obj, "NaN", PropertyDescriptor::frozen(f64::NAN))
            .unwrap());

        heap.define_property(obj, "zero", PropertyDescriptor::frozen(0.0))
            .unwrap();
        assert!(!heap
            .define_property(obj, "zero", PropertyDescriptor::frozen(-0.0))
            .unwrap());
    }

    #[test]
    fn assignment_through_inherited_readonly_slot_is_refused() {
        let mut heap = Heap::new();
        let proto = heap.alloc(None);
        let child = heap.alloc(Some(proto));
        heap.define_property(proto, "x", PropertyDescriptor::frozen(1.0))
            .unwrap();

        assert!(!heap.set(child, "x", 2.0).unwrap());
        assert!(heap.object(child).unwrap().own_property(&key("x")).is_none());
    }

    #[test]
    fn assignment_through_inherited_writable_slot_shadows() {
        let mut heap = Heap::new();
        let proto = heap.alloc(None);
        let child = heap.alloc(Some(proto));
        heap.define_property(proto, "x", PropertyDescriptor::builtin(1.0))
            .unwrap();

        assert!(heap.set(child, "x", 2.0).unwrap());
        assert_eq!(heap.get(child, &key("x")).unwrap(), Value::Number(2.0));
        assert_eq!(heap.get(proto, &key("x")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn getters_run_with_the_receiver() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        let getter = heap.alloc_function(
            None,
            FunctionBehavior::ConstantGetter {
                value: Value::from("hi"),
            },
        );
        heap.define_property(obj, "g", PropertyDescriptor::accessor(Some(getter), None))
            .unwrap();

        assert_eq!(heap.get(obj, &key("g")).unwrap(), Value::from("hi"));
        assert!(!heap.set(obj, "g", 1.0).unwrap());
    }

    #[test]
    fn throwing_functions_raise_type_errors() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        let pill = heap.alloc_function(
            None,
            FunctionBehavior::Throwing {
                message: "poison".into(),
            },
        );
        heap.define_property(obj, "caller", PropertyDescriptor::accessor(Some(pill), None))
            .unwrap();

        let err = heap.get(obj, &key("caller")).unwrap_err();
        assert_eq!(err, HeapError::TypeError("poison".into()));
    }

    #[test]
    fn calling_a_plain_object_fails() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        assert!(matches!(
            heap.call(obj, Value::Undefined, &[]),
            Err(HeapError::TypeError(_))
        ));
    }

    #[test]
    fn prototype_cycles_are_rejected() {
        let mut heap = Heap::new();
        let a = heap.alloc(None);
        let b = heap.alloc(Some(a));
        assert_eq!(
            heap.set_prototype_of(a, Some(b)),
            Err(HeapError::PrototypeCycle(a))
        );
    }

    #[test]
    fn non_extensible_objects_reject_new_slots() {
        let mut heap = Heap::new();
        let obj = heap.alloc(None);
        heap.prevent_extensions(obj).unwrap();
        assert!(!heap.set(obj, "x", 1.0).unwrap());

        let other = heap.alloc(None);
        assert!(!heap.set_prototype_of(obj, Some(other)).unwrap());
        assert!(heap.set_prototype_of(obj, None).unwrap());
    }

    #[test]
    fn user_symbols_do_not_collide_with_well_known_ones() {
        let mut heap = Heap::new();
        let sym = heap.alloc_symbol();
        assert!(WellKnownSymbol::from_id(sym).is_none());
    }
}
