//! Registration pass: bind live primordials to the permit tables governing them.

use std::collections::HashMap;

use tracing::trace;

use super::{join_path, GLOBAL_PATH};
use crate::descriptors::own_data_object;
use crate::error::{RealmError, RealmResult};
use crate::heap::{Heap, ObjectHandle};
use crate::permits::{PermissionTree, PermitNode, PermitTable};

/// Registration table: live object identity → the table that governs it.
///
/// Borrowed from the [`PermissionTree`] for the duration of one run.
#[derive(Debug, Default)]
pub struct WhiteTable<'t> {
    entries: HashMap<ObjectHandle, (&'t PermitTable, String)>,
}

impl<'t> WhiteTable<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `object` to `table`. Binding an object twice is the
    /// multiple-paths error.
    pub fn insert(
        &mut self,
        object: ObjectHandle,
        table: &'t PermitTable,
        path: String,
    ) -> RealmResult<()> {
        if let Some((_, first)) = self.entries.get(&object) {
            return Err(RealmError::MultiplePaths {
                path,
                first: first.clone(),
            });
        }
        self.entries.insert(object, (table, path));
        Ok(())
    }

    pub fn get(&self, object: ObjectHandle) -> Option<&'t PermitTable> {
        self.entries.get(&object).map(|(table, _)| *table)
    }

    pub fn contains(&self, object: ObjectHandle) -> bool {
        self.entries.contains_key(&object)
    }

    /// Dotted path the object was registered under.
    pub fn path_of(&self, object: ObjectHandle) -> Option<&str> {
        self.entries.get(&object).map(|(_, path)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk `tree` alongside the live graph rooted at `global`.
///
/// Only subtree nodes are followed, and only through own data slots that
/// currently hold an object. Accessors are never invoked; their functions are
/// vetted later, during cleaning.
pub fn register<'t>(
    heap: &Heap,
    global: ObjectHandle,
    tree: &'t PermissionTree,
) -> RealmResult<WhiteTable<'t>> {
    let mut white = WhiteTable::new();
    white.insert(global, tree.root(), GLOBAL_PATH.to_string())?;

    let mut pending = vec![(global, tree.root(), GLOBAL_PATH.to_string())];
    while let Some((object, table, path)) = pending.pop() {
        for (key, node) in table.iter() {
            let PermitNode::Subtree(child_table) = node else {
                continue;
            };
            let Some(child) = own_data_object(heap, object, key)? else {
                continue;
            };
            let child_path = join_path(&path, key);
            trace!(path = %child_path, object = %child, "registered");
            white.insert(child, child_table, child_path.clone())?;
            pending.push((child, child_table, child_path));
        }
    }
    Ok(white)
}
