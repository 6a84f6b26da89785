//! Heap-resident objects.

use std::collections::BTreeMap;

use super::descriptor::PropertyDescriptor;
use super::value::{PropertyKey, Value};

/// What happens when a function object is called.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBehavior {
    /// Host-provided built-in. Calls return `undefined`; the sanitizer only
    /// cares about identity and shape.
    Native { name: String },
    /// Always throws a `TypeError` (repaired constructors, poison pills).
    Throwing { message: String },
    /// Getter installed by the sanitizer: returns the captured value.
    ConstantGetter { value: Value },
    /// Setter installed by the sanitizer: redefines `key` on the receiver as
    /// an ordinary writable, configurable data slot.
    UnlockingSetter { key: PropertyKey, enumerable: bool },
}

impl FunctionBehavior {
    pub fn native(name: impl Into<String>) -> Self {
        Self::Native { name: name.into() }
    }

    /// Is this one half of an accessor pair installed by the sanitizer?
    pub fn is_sanitizer_installed(&self) -> bool {
        matches!(self, Self::ConstantGetter { .. } | Self::UnlockingSetter { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Ordinary,
    Function(FunctionBehavior),
}

/// An object with `[[Prototype]]`, `[[Extensible]]` and own properties.
#[derive(Debug, Clone)]
pub struct JsObject {
    pub(crate) prototype: Option<super::ObjectHandle>,
    pub(crate) extensible: bool,
    pub(crate) properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    pub(crate) kind: ObjectKind,
}

impl JsObject {
    pub(crate) fn new(prototype: Option<super::ObjectHandle>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            extensible: true,
            properties: BTreeMap::new(),
            kind,
        }
    }

    pub fn prototype(&self) -> Option<super::ObjectHandle> {
        self.prototype
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn behavior(&self) -> Option<&FunctionBehavior> {
        match &self.kind {
            ObjectKind::Function(b) => Some(b),
            ObjectKind::Ordinary => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    /// Own keys: string keys, then symbol keys.
    pub fn own_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.keys()
    }

    /// `ValidateAndApplyPropertyDescriptor` for complete descriptors.
    ///
    /// Returns `false` when the change is rejected.
    pub(crate) fn define_own_property(
        &mut self,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> bool {
        let Some(current) = self.properties.get(&key) else {
            if !self.extensible {
                return false;
            }
            self.properties.insert(key, desc);
            return true;
        };

        if !current.is_configurable() {
            if desc.is_configurable() || desc.is_enumerable() != current.is_enumerable() {
                return false;
            }
            match (current, &desc) {
                (
                    PropertyDescriptor::Data {
                        value: cur_value,
                        writable: cur_writable,
                        ..
                    },
                    PropertyDescriptor::Data {
                        value: new_value,
                        writable: new_writable,
                        ..
                    },
                ) => {
                    if !cur_writable && (*new_writable || cur_value != new_value) {
                        return false;
                    }
                }
                (
                    PropertyDescriptor::Accessor {
                        get: cur_get,
                        set: cur_set,
                        ..
                    },
                    PropertyDescriptor::Accessor {
                        get: new_get,
                        set: new_set,
                        ..
                    },
                ) => {
                    if cur_get != new_get || cur_set != new_set {
                        return false;
                    }
                }
                // data <-> accessor flip on a non-configurable slot
                _ => return false,
            }
        }

        self.properties.insert(key, desc);
        true
    }

    /// `[[Delete]]`: `false` for non-configurable slots, vacuously `true` when absent.
    pub(crate) fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(desc) if !desc.is_configurable() => false,
            Some(_) => {
                self.properties.remove(key);
                true
            }
            None => true,
        }
    }
}
