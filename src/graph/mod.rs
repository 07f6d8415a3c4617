//! Containment graph inferred from field metadata.
//!
//! A field whose base type names another object is a containment edge from
//! the owning object to that object. The builder assumes every object has a
//! single containing parent, which turns the edges into a tree rooted at the
//! canonical root object. The root may be known under several names (for
//! example the legacy `Location` alias of `Site`); [`RootAliases`] folds them
//! into one.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::model::{Schema, SchemaField};

/// Canonical root object plus the legacy names folded into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootAliases {
    pub canonical: String,
    pub aliases: Vec<String>,
    /// Path token returned for the root and its aliases.
    pub path_token: String,
    /// JSON key holding the root collection.
    pub root_field: String,
}

impl Default for RootAliases {
    fn default() -> Self {
        Self {
            canonical: "Site".to_string(),
            aliases: vec!["Location".to_string()],
            path_token: "sites[]".to_string(),
            root_field: "sites".to_string(),
        }
    }
}

impl RootAliases {
    /// Returns `true` for the canonical root and all of its aliases.
    pub fn is_root(&self, name: &str) -> bool {
        self.canonical == name || self.is_alias(name)
    }

    /// Returns `true` for alias names only.
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|alias| alias == name)
    }

    /// Maps aliases onto the canonical root and leaves other names untouched.
    pub fn canonicalize<'a>(&'a self, name: &'a str) -> &'a str {
        if self.is_alias(name) {
            &self.canonical
        } else {
            name
        }
    }
}

/// Incoming containment edge of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentEdge {
    pub parent: String,
    pub field: String,
    pub is_array: bool,
}

/// Outgoing containment edge of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEdge {
    pub field: String,
    pub child_type: String,
    pub is_array: bool,
}

/// Object → containing parent, last write wins.
///
/// Edges replaced by a later field are kept in [`ParentIndex::overwritten`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentIndex {
    edges: BTreeMap<String, ParentEdge>,
    overwritten: BTreeMap<String, Vec<ParentEdge>>,
}

impl ParentIndex {
    pub fn get(&self, object: &str) -> Option<&ParentEdge> {
        self.edges.get(object)
    }

    /// Edges that were replaced for `object`, oldest first.
    pub fn overwritten(&self, object: &str) -> &[ParentEdge] {
        self.overwritten
            .get(object)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Objects that were claimed by more than one field.
    pub fn contested(&self) -> impl Iterator<Item = &str> {
        self.overwritten.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn insert(&mut self, child: &str, edge: ParentEdge) {
        if let Some(previous) = self.edges.insert(child.to_string(), edge) {
            let current = &self.edges[child];
            warn!(
                object = child,
                previous_parent = %previous.parent,
                previous_field = %previous.field,
                parent = %current.parent,
                field = %current.field,
                "object has more than one containing field, keeping the latest"
            );
            self.overwritten
                .entry(child.to_string())
                .or_default()
                .push(previous);
        }
    }
}

/// Object → ordered outgoing edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildIndex {
    edges: BTreeMap<String, Vec<ChildEdge>>,
}

impl ChildIndex {
    /// Children of `object` in field declaration order; empty for leaves.
    pub fn children(&self, object: &str) -> &[ChildEdge] {
        self.edges
            .get(object)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Builds the parent index from the JSON-visible containment fields.
pub fn build_parent_index(fields: &[SchemaField]) -> ParentIndex {
    let mut index = ParentIndex::default();
    for field in fields {
        let (Some(name), Some(child)) = (field.json_name(), field.field_type.object_ref()) else {
            continue;
        };
        index.insert(
            child,
            ParentEdge {
                parent: field.object.clone(),
                field: name.to_string(),
                is_array: field.field_type.repeated,
            },
        );
    }
    index
}

/// Builds the child index, keeping first-appearance order and folding root
/// aliases into the canonical root.
pub fn build_child_index(fields: &[SchemaField], roots: &RootAliases) -> ChildIndex {
    let mut index = ChildIndex::default();
    for field in fields {
        let (Some(name), Some(child)) = (field.json_name(), field.field_type.object_ref()) else {
            continue;
        };
        index
            .edges
            .entry(roots.canonicalize(&field.object).to_string())
            .or_default()
            .push(ChildEdge {
                field: name.to_string(),
                child_type: child.to_string(),
                is_array: field.field_type.repeated,
            });
    }
    index
}

/// Computes the dotted JSON path of `object`.
///
/// The root and its aliases map to the root token, an object without a parent
/// maps to the empty string, and every other object extends its parent's path
/// with `.field` (plus `[]` when repeated).
pub fn compute_json_path(
    object: &str,
    parents: &ParentIndex,
    roots: &RootAliases,
) -> Result<String, GraphError> {
    let mut segments: Vec<&ParentEdge> = Vec::new();
    let mut visited: Vec<&str> = Vec::new();
    let mut current = object;

    let base = loop {
        if roots.is_root(current) {
            break roots.path_token.clone();
        }
        if visited.contains(&current) {
            visited.push(current);
            return Err(GraphError::Cyclic {
                path: visited.iter().rev().map(|name| name.to_string()).collect(),
            });
        }
        visited.push(current);
        match parents.get(current) {
            Some(edge) => {
                segments.push(edge);
                current = &edge.parent;
            }
            None => break String::new(),
        }
    };

    let mut path = base;
    for edge in segments.iter().rev() {
        path.push('.');
        path.push_str(&edge.field);
        if edge.is_array {
            path.push_str(crate::model::REPEATED_MARKER);
        }
    }
    Ok(path)
}

/// Parent and child indices of one schema plus memoized JSON paths.
#[derive(Debug)]
pub struct ContainmentGraph {
    pub roots: RootAliases,
    pub parents: ParentIndex,
    pub children: ChildIndex,
    object_names: BTreeSet<String>,
    paths: RefCell<BTreeMap<String, String>>,
}

impl ContainmentGraph {
    pub fn build(schema: &Schema, roots: RootAliases) -> Self {
        let parents = build_parent_index(&schema.fields);
        let children = build_child_index(&schema.fields, &roots);
        debug!(
            edges = parents.len(),
            contested = parents.contested().count(),
            "containment graph built"
        );
        Self {
            roots,
            parents,
            children,
            object_names: schema.objects.iter().map(|obj| obj.name.clone()).collect(),
            paths: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.object_names.contains(name)
    }

    /// Memoized [`compute_json_path`].
    pub fn json_path(&self, object: &str) -> Result<String, GraphError> {
        if let Some(path) = self.paths.borrow().get(object) {
            return Ok(path.clone());
        }
        let path = compute_json_path(object, &self.parents, &self.roots)?;
        self.paths
            .borrow_mut()
            .insert(object.to_string(), path.clone());
        Ok(path)
    }
}

/// Tracks the objects on the current root-to-node descent and reports a
/// cycle as soon as an object reappears on it.
#[derive(Debug, Default)]
pub(crate) struct DescentGuard {
    stack: Vec<String>,
}

impl DescentGuard {
    pub(crate) fn enter(&mut self, object: &str) -> Result<(), GraphError> {
        if self.stack.iter().any(|seen| seen == object) {
            let mut path = self.stack.clone();
            path.push(object.to_string());
            return Err(GraphError::Cyclic { path });
        }
        self.stack.push(object.to_string());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.stack.pop();
    }
}
