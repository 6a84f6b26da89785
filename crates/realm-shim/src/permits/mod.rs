//! Permission tree: which properties of which primordials survive taming.
//!
//! Each [`PermitTable`] describes one primordial, the root table describing
//! the global object. For every property name a table holds exactly one
//! [`PermitNode`]:
//!
//! - (absent): the property is removed, unless an ancestor grants it through
//!   an inherited permit.
//! - a nested table: the property is kept and the table governs the object
//!   it currently holds.
//! - a [`Permit`] leaf: the property is kept (or converted) according to the
//!   mode; the value it holds is tamed only according to what it inherits.
//!
//! # Modules
//!
//! - [`standard`] - the authored ECMAScript whitelist

pub mod standard;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RealmError, RealmResult};
use crate::heap::PropertyKey;

/// Leaf disposition for a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permit {
    /// Keep if it is a data property.
    KeepData,
    /// Keep if it is an accessor property.
    KeepAccessor,
    /// Convert a data property into an accessor pair that unlocks on first write.
    MakeAccessor,
    /// `KeepData` here, and `KeepData` on every descendant without its own rule.
    KeepDataInherited,
    /// `MakeAccessor` here, and `KeepData` on every descendant without its own rule.
    MakeAccessorInherited,
}

impl Permit {
    /// Does this permit extend to objects inheriting from the declaring one?
    pub fn is_inherited(self) -> bool {
        matches!(self, Self::KeepDataInherited | Self::MakeAccessorInherited)
    }

    /// The mode this permit grants on a descendant. Inheritance always
    /// degrades to plain retention.
    pub fn inherited(self) -> Option<Permit> {
        self.is_inherited().then_some(Self::KeepData)
    }

    /// Does this permit accept a data property?
    pub fn accepts_data(self) -> bool {
        !matches!(self, Self::KeepAccessor)
    }

    /// Does this permit convert data properties into accessors?
    pub fn makes_accessor(self) -> bool {
        matches!(self, Self::MakeAccessor | Self::MakeAccessorInherited)
    }
}

impl fmt::Display for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permit::KeepData => write!(f, "keep_data"),
            Permit::KeepAccessor => write!(f, "keep_accessor"),
            Permit::MakeAccessor => write!(f, "make_accessor"),
            Permit::KeepDataInherited => write!(f, "keep_data_inherited"),
            Permit::MakeAccessorInherited => write!(f, "make_accessor_inherited"),
        }
    }
}

/// One property's disposition: a leaf mode or a nested table, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermitNode {
    Leaf(Permit),
    Subtree(PermitTable),
}

impl PermitNode {
    /// The permit this node grants on the object declaring it. A subtree keeps
    /// the data slot; the value is governed by the subtree itself.
    pub fn own_permit(&self) -> Permit {
        match self {
            PermitNode::Leaf(permit) => *permit,
            PermitNode::Subtree(_) => Permit::KeepData,
        }
    }

    pub fn as_subtree(&self) -> Option<&PermitTable> {
        match self {
            PermitNode::Subtree(table) => Some(table),
            PermitNode::Leaf(_) => None,
        }
    }
}

impl From<Permit> for PermitNode {
    fn from(permit: Permit) -> Self {
        PermitNode::Leaf(permit)
    }
}

impl From<PermitTable> for PermitNode {
    fn from(table: PermitTable) -> Self {
        PermitNode::Subtree(table)
    }
}

/// The permitted shape of one primordial.
///
/// Serialized as a JSON object whose keys are property names; well-known
/// symbol keys are written `@@iterator`, `@@toStringTag` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, PermitNode>",
    into = "BTreeMap<String, PermitNode>"
)]
pub struct PermitTable {
    entries: BTreeMap<PropertyKey, PermitNode>,
}

impl PermitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the disposition of `key` and return `self` (builder pattern).
    pub fn with(mut self, key: impl Into<PropertyKey>, node: impl Into<PermitNode>) -> Self {
        self.entries.insert(key.into(), node.into());
        self
    }

    /// Give every key in `keys` the same leaf permit.
    pub fn with_all<K: Into<PropertyKey>>(
        mut self,
        keys: impl IntoIterator<Item = K>,
        permit: Permit,
    ) -> Self {
        for key in keys {
            self.entries.insert(key.into(), PermitNode::Leaf(permit));
        }
        self
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PermitNode> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PermitNode)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tables in this subtree, including this one.
    pub fn table_count(&self) -> usize {
        1 + self
            .entries
            .values()
            .filter_map(PermitNode::as_subtree)
            .map(PermitTable::table_count)
            .sum::<usize>()
    }
}

impl TryFrom<BTreeMap<String, PermitNode>> for PermitTable {
    type Error = RealmError;

    fn try_from(raw: BTreeMap<String, PermitNode>) -> Result<Self, Self::Error> {
        let mut entries = BTreeMap::new();
        for (name, node) in raw {
            let key: PropertyKey = name
                .parse()
                .map_err(|e| RealmError::InvalidPermissionTree(format!("{e}")))?;
            entries.insert(key, node);
        }
        Ok(Self { entries })
    }
}

impl From<PermitTable> for BTreeMap<String, PermitNode> {
    fn from(table: PermitTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(key, node)| (key.to_string(), node))
            .collect()
    }
}

/// The whole permission tree, rooted at the global object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTree {
    root: PermitTable,
}

impl Default for PermissionTree {
    fn default() -> Self {
        Self::standard()
    }
}

impl PermissionTree {
    pub fn new(root: PermitTable) -> Self {
        Self { root }
    }

    /// The authored ECMAScript whitelist. See [`standard`].
    pub fn standard() -> Self {
        Self::new(standard::global_permits())
    }

    /// Table governing the global object.
    pub fn root(&self) -> &PermitTable {
        &self.root
    }

    /// Names the global object may expose.
    pub fn top_level_names(&self) -> Vec<PropertyKey> {
        self.root.keys().cloned().collect()
    }

    pub fn from_json_str(json: &str) -> RealmResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RealmResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> RealmResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 (hex) of the canonical JSON form. Identifies which version of
    /// the tree tamed a realm.
    pub fn fingerprint(&self) -> RealmResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}
