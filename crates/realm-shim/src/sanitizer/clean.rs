//! Cleaning pass: delete, keep or convert every own property of every
//! reachable primordial.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{get_permit, join_path, SanitizeReport, WhiteTable};
use crate::descriptors::{is_sanitizer_accessor, own_data_object, own_descriptors, prototype_of};
use crate::error::{RealmError, RealmResult};
use crate::heap::{FunctionBehavior, Heap, ObjectHandle, PropertyDescriptor, PropertyKey, Value};
use crate::permits::Permit;

/// Per-object progress through the cleaning pass. Objects never seen are
/// simply absent from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanState {
    Queued,
    Cleaned,
}

/// Work queue that may grow while it is drained. No identity is accepted
/// twice.
#[derive(Debug, Default)]
pub struct CleaningQueue {
    states: HashMap<ObjectHandle, (CleanState, String)>,
    pending: VecDeque<ObjectHandle>,
}

impl CleaningQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `unseen → queued`. Any other transition is the multiple-paths error.
    pub fn enqueue(&mut self, object: ObjectHandle, path: String) -> RealmResult<()> {
        if let Some((_, first)) = self.states.get(&object) {
            return Err(RealmError::MultiplePaths {
                path,
                first: first.clone(),
            });
        }
        self.states.insert(object, (CleanState::Queued, path));
        self.pending.push_back(object);
        Ok(())
    }

    /// Enqueue `value` if it is an object; primitives are ignored.
    pub fn enqueue_value(&mut self, value: &Value, path: String) -> RealmResult<()> {
        match value.as_object() {
            Some(object) => self.enqueue(object, path),
            None => Ok(()),
        }
    }

    /// Next queued object with the path it was reached through.
    pub fn next(&mut self) -> Option<(ObjectHandle, String)> {
        let object = self.pending.pop_front()?;
        let path = self
            .states
            .get(&object)
            .map(|(_, path)| path.clone())
            .unwrap_or_default();
        Some((object, path))
    }

    /// `queued → cleaned`.
    pub fn mark_cleaned(&mut self, object: ObjectHandle) {
        if let Some((state, _)) = self.states.get_mut(&object) {
            *state = CleanState::Cleaned;
        }
    }

    pub fn state(&self, object: ObjectHandle) -> Option<CleanState> {
        self.states.get(&object).map(|(state, _)| *state)
    }

    pub fn cleaned_count(&self) -> usize {
        self.states
            .values()
            .filter(|(state, _)| *state == CleanState::Cleaned)
            .count()
    }
}

/// What to do with one own property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Delete,
    /// Keep the data slot and queue its value.
    KeepData,
    /// Keep the accessor pair and queue its functions.
    KeepAccessor,
    /// Keep a pair this pass installed on an earlier run and queue the value
    /// its getter returns.
    KeepConverted,
    /// Convert to a getter/setter pair and queue the captured value.
    Convert,
}

fn decide(heap: &Heap, desc: &PropertyDescriptor, permit: Option<Permit>) -> Action {
    let Some(permit) = permit else {
        return Action::Delete;
    };
    match desc {
        PropertyDescriptor::Data { .. } if !permit.accepts_data() => Action::Delete,
        PropertyDescriptor::Data { .. } if permit.makes_accessor() => Action::Convert,
        PropertyDescriptor::Data { .. } => Action::KeepData,
        PropertyDescriptor::Accessor { .. } if permit == Permit::KeepAccessor => {
            Action::KeepAccessor
        }
        PropertyDescriptor::Accessor { .. }
            if permit.makes_accessor() && is_sanitizer_accessor(heap, desc) =>
        {
            Action::KeepConverted
        }
        PropertyDescriptor::Accessor { .. } => Action::Delete,
    }
}

/// State for one cleaning run.
pub(crate) struct Cleaner<'a, 't> {
    heap: &'a mut Heap,
    white: &'a WhiteTable<'t>,
    queue: CleaningQueue,
    /// `[[Prototype]]` for installed accessor functions.
    function_prototype: Option<ObjectHandle>,
    /// Unregistered objects first reached through an accessor slot.
    behind_accessor: HashSet<ObjectHandle>,
    report: SanitizeReport,
}

impl<'a, 't> Cleaner<'a, 't> {
    pub(crate) fn new(
        heap: &'a mut Heap,
        white: &'a WhiteTable<'t>,
        global: ObjectHandle,
    ) -> RealmResult<Self> {
        let function_prototype = match own_data_object(heap, global, &"Function".into())? {
            Some(function) => own_data_object(heap, function, &"prototype".into())?,
            None => None,
        };
        Ok(Self {
            heap,
            white,
            queue: CleaningQueue::new(),
            function_prototype,
            behind_accessor: HashSet::new(),
            report: SanitizeReport::default(),
        })
    }

    /// Drain the queue starting from `global`.
    pub(crate) fn run(mut self, global: ObjectHandle, path: &str) -> RealmResult<SanitizeReport> {
        self.queue.enqueue(global, path.to_string())?;
        while let Some((object, path)) = self.queue.next() {
            self.clean_object(object, &path)?;
            self.queue.mark_cleaned(object);
        }
        self.report.cleaned = self.queue.cleaned_count();
        Ok(self.report)
    }

    fn clean_object(&mut self, object: ObjectHandle, path: &str) -> RealmResult<()> {
        if let Some(proto) = prototype_of(self.heap, object)? {
            if !self.white.contains(proto) {
                return Err(RealmError::UnvettedIntrinsic {
                    object: path.to_string(),
                });
            }
        }

        let hidden = self.behind_accessor.contains(&object);
        for (key, desc) in own_descriptors(self.heap, object)? {
            let permit = get_permit(self.heap, self.white, object, &key)?;
            let prop_path = join_path(path, &key);
            let action = decide(self.heap, &desc, permit);
            trace!(path = %prop_path, action = ?action, permit = ?permit, "property");

            match action {
                Action::Delete => {
                    if !self.heap.delete_property(object, &key)? {
                        return Err(RealmError::NonConfigurable { path: prop_path });
                    }
                    self.report.deleted.push(prop_path);
                }
                Action::KeepData => {
                    if let Some(value) = desc.value() {
                        self.retain(value, prop_path, hidden)?;
                    }
                    self.report.kept += 1;
                }
                Action::KeepAccessor => {
                    let (get, set) = (desc.getter(), desc.setter());
                    if let Some(getter) = get {
                        self.retain(&Value::Object(getter), prop_path.clone(), hidden)?;
                    }
                    if let Some(setter) = set.filter(|setter| Some(*setter) != get) {
                        self.retain(&Value::Object(setter), prop_path, hidden)?;
                    }
                    self.report.kept += 1;
                }
                Action::KeepConverted => {
                    if let Some(value) = self.converted_value(&desc)? {
                        self.retain(&value, prop_path, true)?;
                    }
                    self.report.kept += 1;
                }
                Action::Convert => {
                    let value = desc.value().cloned().unwrap_or(Value::Undefined);
                    self.make_accessor(object, key, desc, &prop_path)?;
                    self.retain(&value, prop_path.clone(), true)?;
                    self.report.converted.push(prop_path);
                }
            }
        }
        Ok(())
    }

    /// Queue an object value for cleaning. Behind an accessor, registered
    /// objects are skipped: their registered path already queues them.
    fn retain(&mut self, value: &Value, path: String, behind_accessor: bool) -> RealmResult<()> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        if behind_accessor && self.white.contains(object) {
            return Ok(());
        }
        self.queue.enqueue(object, path)?;
        if behind_accessor {
            self.behind_accessor.insert(object);
        }
        Ok(())
    }

    /// The value an installed getter hands out.
    fn converted_value(&self, desc: &PropertyDescriptor) -> RealmResult<Option<Value>> {
        let Some(getter) = desc.getter() else {
            return Ok(None);
        };
        Ok(match self.heap.object(getter)?.behavior() {
            Some(FunctionBehavior::ConstantGetter { value }) => Some(value.clone()),
            _ => None,
        })
    }

    /// Replace a data slot with a getter returning its value and a setter
    /// that turns the slot back into ordinary data on the receiver.
    fn make_accessor(
        &mut self,
        object: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
        path: &str,
    ) -> RealmResult<()> {
        let PropertyDescriptor::Data {
            value,
            enumerable,
            configurable,
            ..
        } = desc
        else {
            return Ok(());
        };
        if !configurable {
            return Err(RealmError::NonConfigurable {
                path: path.to_string(),
            });
        }

        let getter = self
            .heap
            .alloc_function(self.function_prototype, FunctionBehavior::ConstantGetter { value });
        let setter = self.heap.alloc_function(
            self.function_prototype,
            FunctionBehavior::UnlockingSetter {
                key: key.clone(),
                enumerable,
            },
        );
        let pair = PropertyDescriptor::Accessor {
            get: Some(getter),
            set: Some(setter),
            enumerable,
            configurable,
        };
        if !self.heap.define_property(object, key, pair)? {
            return Err(RealmError::NonConfigurable {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}
