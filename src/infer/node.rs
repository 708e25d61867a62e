//! The mutable type tree built during inference.
//!
//! Nodes are addressed by identifier paths. Setting a path descends through
//! (creating if absent) the intermediate object nodes; setting at the
//! terminal segment either installs the first node for that key or merges
//! into the existing node. The tree lives for a single inference call only.

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::BTreeSet;

use super::errors::TypeError;
use crate::ast::split_array_marker;

/// The shape recorded for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Unconstrained - renders as `string | boolean | number`.
    Default,
    /// A set of admissible primitive type names.
    Union(Vec<String>),
    /// Nested fields, in insertion order.
    Object(IndexMap<String, TypeNode>),
}

impl TypeKind {
    /// A short name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Default => "default",
            TypeKind::Union(_) => "union",
            TypeKind::Object(_) => "object",
        }
    }

    /// A description for error messages; unions include their names so a
    /// set-inequality conflict is diagnosable.
    pub fn describe(&self) -> String {
        match self {
            TypeKind::Union(names) => format!("union({})", names.join(" | ")),
            other => other.name().to_string(),
        }
    }
}

/// One node of the inferred type tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub kind: TypeKind,
    /// Whether the field renders with a `?` marker.
    pub optional: bool,
    /// Whether the field renders with a `[]` suffix. Set from the `[]` array
    /// marker on the path segment, stripped at storage time.
    pub array: bool,
}

impl TypeNode {
    /// An empty object node.
    pub fn object() -> Self {
        Self {
            kind: TypeKind::Object(IndexMap::new()),
            optional: false,
            array: false,
        }
    }

    /// An unconstrained node.
    pub fn unconstrained(optional: bool) -> Self {
        Self {
            kind: TypeKind::Default,
            optional,
            array: false,
        }
    }

    /// A union node over the given type names.
    pub fn union(names: Vec<String>, optional: bool) -> Self {
        Self {
            kind: TypeKind::Union(names),
            optional,
            array: false,
        }
    }
}

fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.join(".")
    }
}

/// Records `node` at `path` below `root`, merging with any previous record.
///
/// An empty path is a no-op.
pub fn set_path(root: &mut TypeNode, path: &[String], node: TypeNode) -> Result<(), TypeError> {
    set_at(root, path, 0, node)
}

fn set_at(
    current: &mut TypeNode,
    path: &[String],
    depth: usize,
    node: TypeNode,
) -> Result<(), TypeError> {
    let Some(segment) = path.get(depth) else {
        return Ok(());
    };
    let (key, is_array) = split_array_marker(segment);

    let kind_name = current.kind.name();
    let TypeKind::Object(fields) = &mut current.kind else {
        return Err(TypeError::InvalidPath {
            path: join_path(&path[..depth]),
            segment: key.to_string(),
            kind: kind_name.to_string(),
        });
    };

    if depth + 1 == path.len() {
        match fields.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.array |= is_array;
                merge(existing, node, &path[..=depth])
            }
            Entry::Vacant(entry) => {
                let mut node = node;
                node.array |= is_array;
                entry.insert(node);
                Ok(())
            }
        }
    } else {
        let entry = fields.entry(key.to_string()).or_insert_with(TypeNode::object);
        entry.array |= is_array;
        set_at(entry, path, depth + 1, node)
    }
}

/// Merges `incoming` into `existing`.
///
/// A default node never overrides a concrete type, and a concrete type is
/// never downgraded to default. Unions must be set-equal. Objects union
/// their field maps, merging recursively on shared keys. Anything else is a
/// conflict.
fn merge(existing: &mut TypeNode, incoming: TypeNode, path: &[String]) -> Result<(), TypeError> {
    existing.array |= incoming.array;
    match (&mut existing.kind, incoming.kind) {
        (_, TypeKind::Default) => Ok(()),
        (TypeKind::Default, kind) => {
            existing.kind = kind;
            existing.optional = incoming.optional;
            Ok(())
        }
        (TypeKind::Object(fields), TypeKind::Object(incoming_fields)) => {
            for (key, value) in incoming_fields {
                match fields.entry(key) {
                    Entry::Occupied(mut entry) => merge(entry.get_mut(), value, path)?,
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                }
            }
            Ok(())
        }
        (TypeKind::Union(names), TypeKind::Union(incoming_names)) => {
            if set_equal(names, &incoming_names) {
                Ok(())
            } else {
                Err(TypeError::Conflict {
                    path: join_path(path),
                    existing: TypeKind::Union(names.clone()).describe(),
                    incoming: TypeKind::Union(incoming_names).describe(),
                })
            }
        }
        (existing_kind, incoming_kind) => Err(TypeError::Conflict {
            path: join_path(path),
            existing: existing_kind.describe(),
            incoming: incoming_kind.describe(),
        }),
    }
}

fn set_equal(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

/// Renders a node to type-declaration text, depth-first in field-insertion
/// order. `level` is the indentation depth of the node's fields.
pub fn render(node: &TypeNode, level: usize) -> String {
    match &node.kind {
        TypeKind::Object(fields) => {
            let mut out = String::from("{\n");
            for (key, child) in fields {
                let optional = if child.optional { "?" } else { "" };
                let array = if child.array { "[]" } else { "" };
                out.push_str(&format!(
                    "{}{}{}: {}{};\n",
                    "  ".repeat(level),
                    key,
                    optional,
                    render(child, level + 1),
                    array,
                ));
            }
            out.push_str(&"  ".repeat(level - 1));
            out.push('}');
            out
        }
        TypeKind::Union(names) => render_union(names),
        TypeKind::Default => "string | boolean | number".to_string(),
    }
}

fn render_union(names: &[String]) -> String {
    let mut seen = BTreeSet::new();
    let unique: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect();
    unique.join(" | ")
}
