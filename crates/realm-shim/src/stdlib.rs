//! Shared-globals extraction.

use std::collections::BTreeMap;

use crate::descriptors::own_descriptor;
use crate::error::{RealmError, RealmResult};
use crate::heap::{Heap, ObjectHandle, PropertyDescriptor, PropertyKey};
use crate::permits::PermissionTree;

/// Descriptors to install on a new safe global, keyed by top-level name.
pub type SharedGlobalDescs = BTreeMap<PropertyKey, PropertyDescriptor>;

/// Copy every top-level permitted name present on `global` into a
/// writable, configurable, non-enumerable data descriptor.
///
/// Names absent from `global` are skipped. An accessor under a permitted name
/// is a host deviation and fails the extraction.
pub fn get_shared_global_descs(
    heap: &Heap,
    global: ObjectHandle,
    tree: &PermissionTree,
) -> RealmResult<SharedGlobalDescs> {
    let mut descs = SharedGlobalDescs::new();
    for name in tree.top_level_names() {
        let Some(desc) = own_descriptor(heap, global, &name)? else {
            continue;
        };
        let Some(value) = desc.value() else {
            return Err(RealmError::UnexpectedAccessor {
                name: name.to_string(),
            });
        };
        descs.insert(
            name,
            PropertyDescriptor::Data {
                value: value.clone(),
                writable: true,
                enumerable: false,
                configurable: true,
            },
        );
    }
    Ok(descs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Value;
    use crate::permits::{Permit, PermitTable};

    fn tree() -> PermissionTree {
        PermissionTree::new(
            PermitTable::new()
                .with("NaN", Permit::KeepData)
                .with("Thing", PermitTable::new())
                .with("Missing", Permit::KeepData),
        )
    }

    #[test]
    fn copies_present_names_with_shared_attributes() {
        let mut heap = Heap::new();
        let global = heap.alloc(None);
        let thing = heap.alloc(None);
        heap.define_property(global, "NaN", PropertyDescriptor::frozen(f64::NAN))
            .unwrap();
        heap.define_property(global, "Thing", PropertyDescriptor::builtin(thing))
            .unwrap();
        heap.define_property(global, "extra", PropertyDescriptor::data(1.0))
            .unwrap();

        let descs = get_shared_global_descs(&heap, global, &tree()).unwrap();
        let names: Vec<String> = descs.keys().map(ToString::to_string).collect();
        assert_eq!(names, vec!["NaN", "Thing"]);

        let thing_desc = &descs[&PropertyKey::from("Thing")];
        assert_eq!(
            thing_desc,
            &PropertyDescriptor::Data {
                value: Value::Object(thing),
                writable: true,
                enumerable: false,
                configurable: true,
            }
        );
        assert!(descs[&PropertyKey::from("NaN")].is_writable());
    }

    #[test]
    fn accessor_on_the_global_is_fatal() {
        let mut heap = Heap::new();
        let global = heap.alloc(None);
        heap.define_property(global, "Thing", PropertyDescriptor::accessor(None, None))
            .unwrap();

        let err = get_shared_global_descs(&heap, global, &tree()).unwrap_err();
        assert!(matches!(err, RealmError::UnexpectedAccessor { ref name } if name == "Thing"));
    }
}
