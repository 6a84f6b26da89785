//! Permission resolution.

use super::WhiteTable;
use crate::descriptors::prototype_of;
use crate::error::RealmResult;
use crate::heap::{Heap, ObjectHandle, PropertyKey};
use crate::permits::{Permit, PermitNode};

/// Is `key` permitted on `base`, and under which mode?
///
/// An explicit entry in `base`'s own table wins. Otherwise the prototype
/// chain is walked: the first ancestor whose table names `key` decides,
/// granting [`Permit::KeepData`] for an inherited permit and nothing for any
/// other entry. Falling off the chain means "not permitted".
///
/// Pure in `(white, heap graph, base, key)`: no getter runs and nothing is
/// mutated.
pub fn get_permit(
    heap: &Heap,
    white: &WhiteTable<'_>,
    base: ObjectHandle,
    key: &PropertyKey,
) -> RealmResult<Option<Permit>> {
    if let Some(node) = white.get(base).and_then(|table| table.get(key)) {
        return Ok(Some(node.own_permit()));
    }

    let mut current = prototype_of(heap, base)?;
    while let Some(ancestor) = current {
        if let Some(node) = white.get(ancestor).and_then(|table| table.get(key)) {
            return Ok(match node {
                PermitNode::Leaf(permit) => permit.inherited(),
                PermitNode::Subtree(_) => None,
            });
        }
        current = prototype_of(heap, ancestor)?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::PropertyDescriptor;
    use crate::permits::{PermissionTree, PermitTable};
    use crate::sanitizer::register;

    /// global.Base.prototype is a registered prototype; `child` inherits from
    /// it without being registered itself.
    struct Fixture {
        heap: Heap,
        global: ObjectHandle,
        base_proto: ObjectHandle,
        child: ObjectHandle,
        grandchild: ObjectHandle,
    }

    fn fixture() -> Fixture {
        let mut heap = Heap::new();
        let global = heap.alloc(None);
        let base = heap.alloc(None);
        let base_proto = heap.alloc(None);
        let child = heap.alloc(Some(base_proto));
        let grandchild = heap.alloc(Some(child));
        heap.define_property(global, "Base", PropertyDescriptor::builtin(base))
            .unwrap();
        heap.define_property(base, "prototype", PropertyDescriptor::frozen(base_proto))
            .unwrap();
        Fixture {
            heap,
            global,
            base_proto,
            child,
            grandchild,
        }
    }

    fn tree() -> PermissionTree {
        PermissionTree::new(PermitTable::new().with(
            "Base",
            PermitTable::new().with(
                "prototype",
                PermitTable::new()
                    .with("shared", Permit::MakeAccessorInherited)
                    .with("kept", Permit::KeepDataInherited)
                    .with("local", Permit::MakeAccessor)
                    .with("getter", Permit::KeepAccessor)
                    .with("nested", PermitTable::new()),
            ),
        ))
    }

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    #[test]
    fn own_entry_is_authoritative() {
        let f = fixture();
        let tree = tree();
        let white = register(&f.heap, f.global, &tree).unwrap();

        let permit = get_permit(&f.heap, &white, f.base_proto, &key("shared")).unwrap();
        assert_eq!(permit, Some(Permit::MakeAccessorInherited));
        let permit = get_permit(&f.heap, &white, f.base_proto, &key("nested")).unwrap();
        assert_eq!(permit, Some(Permit::KeepData));
    }

    #[test]
    fn inherited_permits_degrade_on_every_descendant() {
        let f = fixture();
        let tree = tree();
        let white = register(&f.heap, f.global, &tree).unwrap();

        for descendant in [f.child, f.grandchild] {
            for name in ["shared", "kept"] {
                let permit = get_permit(&f.heap, &white, descendant, &key(name)).unwrap();
                assert_eq!(permit, Some(Permit::KeepData), "{name} on {descendant}");
            }
        }
    }

    #[test]
    fn non_inherited_entries_block_the_walk() {
        let f = fixture();
        let tree = tree();
        let white = register(&f.heap, f.global, &tree).unwrap();

        for name in ["local", "getter", "nested", "unknown"] {
            assert_eq!(
                get_permit(&f.heap, &white, f.grandchild, &key(name)).unwrap(),
                None,
                "{name}"
            );
        }
    }

    #[test]
    fn resolution_is_repeatable() {
        let f = fixture();
        let tree = tree();
        let white = register(&f.heap, f.global, &tree).unwrap();

        let first = get_permit(&f.heap, &white, f.child, &key("shared")).unwrap();
        let second = get_permit(&f.heap, &white, f.child, &key("shared")).unwrap();
        assert_eq!(first, second);
    }
}
