//! Side-effect-free introspection.
//!
//! Everything here reads raw slots straight out of the heap. Nothing goes
//! through [`Heap::get`] or [`Heap::set`], so no getter or setter can run
//! while the sanitizer inspects a primordial, and nothing depends on helper
//! methods that live on the (possibly tampered) object graph itself.
//! Descriptors are returned as snapshots, so callers may mutate the object
//! while iterating.

use crate::heap::{Heap, HeapResult, ObjectHandle, PropertyDescriptor, PropertyKey};

/// Own keys of `object`, string keys first.
pub fn own_keys(heap: &Heap, object: ObjectHandle) -> HeapResult<Vec<PropertyKey>> {
    Ok(heap.object(object)?.own_keys().cloned().collect())
}

pub fn own_descriptor(
    heap: &Heap,
    object: ObjectHandle,
    key: &PropertyKey,
) -> HeapResult<Option<PropertyDescriptor>> {
    Ok(heap.object(object)?.own_property(key).cloned())
}

/// Snapshot of every own `(key, descriptor)` pair.
pub fn own_descriptors(
    heap: &Heap,
    object: ObjectHandle,
) -> HeapResult<Vec<(PropertyKey, PropertyDescriptor)>> {
    let object = heap.object(object)?;
    Ok(object
        .own_keys()
        .filter_map(|key| {
            object
                .own_property(key)
                .map(|desc| (key.clone(), desc.clone()))
        })
        .collect())
}

pub fn has_own(heap: &Heap, object: ObjectHandle, key: &PropertyKey) -> HeapResult<bool> {
    Ok(heap.object(object)?.own_property(key).is_some())
}

pub fn prototype_of(heap: &Heap, object: ObjectHandle) -> HeapResult<Option<ObjectHandle>> {
    heap.get_prototype_of(object)
}

/// The object held in an own *data* slot, if any. Accessors yield `None`.
pub fn own_data_object(
    heap: &Heap,
    object: ObjectHandle,
    key: &PropertyKey,
) -> HeapResult<Option<ObjectHandle>> {
    Ok(heap
        .object(object)?
        .own_property(key)
        .and_then(PropertyDescriptor::value)
        .and_then(|value| value.as_object()))
}

/// Is `desc` an accessor pair the sanitizer itself installed?
pub fn is_sanitizer_accessor(heap: &Heap, desc: &PropertyDescriptor) -> bool {
    desc.getter()
        .and_then(|getter| heap.object(getter).ok())
        .and_then(|getter| getter.behavior())
        .is_some_and(|behavior| behavior.is_sanitizer_installed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{FunctionBehavior, Value};

    fn booby_trapped(heap: &mut Heap) -> ObjectHandle {
        let obj = heap.alloc(None);
        let trap = heap.alloc_function(
            None,
            FunctionBehavior::Throwing {
                message: "getter ran".into(),
            },
        );
        heap.define_property(obj, "trap", PropertyDescriptor::accessor(Some(trap), Some(trap)))
            .unwrap();
        heap.define_property(obj, "plain", PropertyDescriptor::data(1.0))
            .unwrap();
        obj
    }

    #[test]
    fn reading_descriptors_never_runs_getters() {
        let mut heap = Heap::new();
        let obj = booby_trapped(&mut heap);

        let desc = own_descriptor(&heap, obj, &PropertyKey::from("trap"))
            .unwrap()
            .unwrap();
        assert!(desc.is_accessor());
        assert_eq!(own_descriptors(&heap, obj).unwrap().len(), 2);

        // The ordinary read path does run it.
        assert!(heap.get(obj, &PropertyKey::from("trap")).is_err());
    }

    #[test]
    fn own_data_object_ignores_accessors_and_primitives() {
        let mut heap = Heap::new();
        let obj = booby_trapped(&mut heap);
        let child = heap.alloc(None);
        heap.define_property(obj, "child", PropertyDescriptor::data(child))
            .unwrap();

        assert_eq!(own_data_object(&heap, obj, &"trap".into()).unwrap(), None);
        assert_eq!(own_data_object(&heap, obj, &"plain".into()).unwrap(), None);
        assert_eq!(
            own_data_object(&heap, obj, &"child".into()).unwrap(),
            Some(child)
        );
    }

    #[test]
    fn has_own_does_not_consult_the_chain() {
        let mut heap = Heap::new();
        let proto = heap.alloc(None);
        let obj = heap.alloc(Some(proto));
        heap.define_property(proto, "inherited", PropertyDescriptor::data(Value::Null))
            .unwrap();

        assert!(!has_own(&heap, obj, &"inherited".into()).unwrap());
        assert!(has_own(&heap, proto, &"inherited".into()).unwrap());
        assert_eq!(prototype_of(&heap, obj).unwrap(), Some(proto));
        assert_eq!(own_keys(&heap, proto).unwrap(), vec![PropertyKey::from("inherited")]);
    }

    #[test]
    fn detects_sanitizer_installed_pairs() {
        let mut heap = Heap::new();
        let getter = heap.alloc_function(
            None,
            FunctionBehavior::ConstantGetter { value: Value::Null },
        );
        let native = heap.alloc_function(None, FunctionBehavior::native("get size"));

        assert!(is_sanitizer_accessor(
            &heap,
            &PropertyDescriptor::accessor(Some(getter), None)
        ));
        assert!(!is_sanitizer_accessor(
            &heap,
            &PropertyDescriptor::accessor(Some(native), None)
        ));
        assert!(!is_sanitizer_accessor(&heap, &PropertyDescriptor::data(1.0)));
    }
}
