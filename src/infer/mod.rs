//! Type inference engine.
//!
//! Walks a tag tree in document order and derives the minimal structural type
//! describing the data the template requires to render. The walk accumulates
//! a scope-name prefix: local paths are recorded below the accumulated
//! prefix, global paths always resolve against the document root namespace.
//!
//! A section's own declared type depends on its content: if any immediate
//! child is scoped local, the section's nested fields are distinguishable and
//! it is typed as an object; otherwise it is just a presence check and is
//! typed as a union (`boolean` unless a hint says otherwise).

mod errors;
mod node;

pub use errors::TypeError;

use tracing::debug;

use crate::ast::{Scope, Tag};
use node::TypeNode;

/// Derives the structural type for a parsed template.
///
/// Returns the rendered type declaration text. The root always renders as an
/// object block, even when empty. A conflict aborts the whole call; no
/// partial type text is produced.
pub fn gen_type(tags: &[Tag]) -> Result<String, TypeError> {
    let mut root = TypeNode::object();
    walk(&mut root, tags, &[])?;
    Ok(node::render(&root, 1))
}

/// The path a tag is recorded at: local paths nest below the accumulated
/// scope prefix, global paths resolve from the root.
fn effective_path(scope_names: &[String], scope: Scope, path: &[String]) -> Vec<String> {
    match scope {
        Scope::Local => scope_names.iter().chain(path).cloned().collect(),
        Scope::Global => path.to_vec(),
    }
}

fn walk(root: &mut TypeNode, tags: &[Tag], scope_names: &[String]) -> Result<(), TypeError> {
    for tag in tags {
        match tag {
            Tag::Variable {
                path, scope, hint, ..
            } => {
                let full = effective_path(scope_names, *scope, path);
                let value = if hint.has_names() {
                    TypeNode::union(hint.names.clone().unwrap_or_default(), hint.optional)
                } else {
                    TypeNode::unconstrained(hint.optional)
                };
                debug!(path = %full.join("."), "variable");
                node::set_path(root, &full, value)?;
            }
            Tag::Section {
                path,
                scope,
                hint,
                children,
            } => {
                let full = effective_path(scope_names, *scope, path);
                // Local children are addressed relative to the section
                // itself, so their presence makes the section an object.
                let has_local_children = children
                    .iter()
                    .any(|child| child.scope() == Some(Scope::Local));
                let value = if has_local_children {
                    TypeNode {
                        optional: hint.optional,
                        ..TypeNode::object()
                    }
                } else {
                    let names = if hint.has_names() {
                        hint.names.clone().unwrap_or_default()
                    } else {
                        vec!["boolean".to_string()]
                    };
                    TypeNode::union(names, hint.optional)
                };
                debug!(
                    path = %full.join("."),
                    object = has_local_children,
                    "section"
                );
                node::set_path(root, &full, value)?;

                // A local section nests under the outer prefix; a global
                // section's free variables default into its own namespace,
                // not the document root.
                let child_scope = match scope {
                    Scope::Local => {
                        let mut extended = scope_names.to_vec();
                        extended.extend(path.iter().cloned());
                        extended
                    }
                    Scope::Global => path.clone(),
                };
                walk(root, children, &child_scope)?;
            }
            Tag::Inverted {
                path,
                scope,
                children,
            } => {
                // Inverted sections are always boolean presence checks, and
                // their content renders against the outer context, so the
                // scope prefix is unchanged for descendants.
                let full = effective_path(scope_names, *scope, path);
                debug!(path = %full.join("."), "inverted");
                node::set_path(root, &full, TypeNode::union(vec!["boolean".to_string()], false))?;
                walk(root, children, scope_names)?;
            }
            Tag::Text { .. } | Tag::Comment { .. } | Tag::Partial { .. }
            | Tag::ImplicitVariable { .. } => {}
        }
    }
    Ok(())
}
