//! Tag tree for the template language.
//!
//! The parser produces a flat sequence of [`Tag`] values; sections and
//! inverted sections carry their body as a nested sequence, so the result is
//! an ordered tree. Both the type-inference engine and the renderer walk this
//! tree independently.

/// Whether a tag's path resolves against the innermost context ("local") or
/// the original top-level context ("global").
///
/// Derived once at parse time from the path's leading pseudo-segment:
/// `this.` marks a path local, `global.` marks it global, and a bare path
/// defaults to global. The pseudo-segment is stripped from the stored path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
}

/// Inline type annotation on a variable or section tag.
///
/// `{{name?:string|number}}` parses to `optional = true` and
/// `names = Some(["string", "number"])`. A tag with no annotation carries the
/// default hint, which constrains nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHint {
    /// Admissible primitive type names, if the hint supplied any.
    pub names: Option<Vec<String>>,
    /// Whether the field is optional (`?` marker).
    pub optional: bool,
}

impl TypeHint {
    /// Returns true if the hint names at least one concrete type.
    pub fn has_names(&self) -> bool {
        self.names.as_ref().is_some_and(|names| !names.is_empty())
    }
}

/// One parsed unit of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// A literal text run, emitted verbatim.
    Text { content: String },
    /// `{{path}}`, `{{{path}}}`, or `{{&path}}`. `triple` is true for the
    /// unescaped forms.
    Variable {
        path: Vec<String>,
        triple: bool,
        scope: Scope,
        hint: TypeHint,
    },
    /// `{{#path}}...{{/path}}`. The final path segment may carry a trailing
    /// `[]` marking the section as array-shaped.
    Section {
        path: Vec<String>,
        scope: Scope,
        hint: TypeHint,
        children: Vec<Tag>,
    },
    /// `{{^path}}...{{/path}}`. Rendered when the path resolves falsy.
    Inverted {
        path: Vec<String>,
        scope: Scope,
        children: Vec<Tag>,
    },
    /// `{{!comment}}`. Never rendered.
    Comment { content: String },
    /// `{{>path}}`. Recognized but never expanded; renders verbatim.
    Partial { path: Vec<String> },
    /// `{{.}}` - the current context itself.
    ImplicitVariable { triple: bool },
}

impl Tag {
    /// Returns the tag's scope, for the tag kinds that have one.
    pub fn scope(&self) -> Option<Scope> {
        match self {
            Tag::Variable { scope, .. }
            | Tag::Section { scope, .. }
            | Tag::Inverted { scope, .. } => Some(*scope),
            _ => None,
        }
    }
}

/// Splits a trailing `[]` array marker off a path segment.
///
/// Returns the bare segment and whether the marker was present.
pub fn split_array_marker(segment: &str) -> (&str, bool) {
    match segment.strip_suffix("[]") {
        Some(bare) => (bare, true),
        None => (segment, false),
    }
}
