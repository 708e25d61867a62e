//! Renderer for the template language.
//!
//! Applies a runtime context value to a parsed template, using the same
//! scope-resolution rules as the type-inference engine: local paths resolve
//! against the innermost context, global paths against the original
//! top-level context. Rendering never raises; an unresolved lookup at render
//! time silently becomes the empty string.

use serde_json::Value;

use crate::ast::{split_array_marker, Scope, Tag};
use crate::parser::parse;

/// Renders a template against a context value.
///
/// A template that fails to parse renders as the empty string.
pub fn apply(template: &str, context: &Value) -> String {
    match parse(template) {
        Ok(tags) => apply_tags(&tags, context, context, &[]),
        Err(_) => String::new(),
    }
}

/// Renders an already-parsed tag tree.
///
/// `current` is the innermost context, `global` the original top-level one.
pub fn apply_tags(tags: &[Tag], current: &Value, global: &Value, scope_names: &[String]) -> String {
    let mut out = String::new();
    for tag in tags {
        match tag {
            Tag::Text { content } => out.push_str(content),
            Tag::Variable {
                path,
                triple,
                scope,
                ..
            } => {
                let value = resolve(current, global, *scope, scope_names, path);
                out.push_str(&render_scalar(value, !triple));
            }
            Tag::ImplicitVariable { triple } => {
                out.push_str(&render_scalar(Some(current), !triple));
            }
            Tag::Section {
                path,
                scope,
                children,
                ..
            } => {
                match resolve_block(current, *scope, scope_names, path) {
                    Some(value) if is_truthy(value) => match value {
                        Value::Array(items) => {
                            // one pass per element, concatenated with no
                            // separator, each element as the new context
                            for item in items {
                                out.push_str(&apply_tags(children, item, global, &[]));
                            }
                        }
                        other => out.push_str(&apply_tags(children, other, global, &[])),
                    },
                    _ => {}
                }
            }
            Tag::Inverted {
                path,
                scope,
                children,
            } => {
                let value = resolve_block(current, *scope, scope_names, path);
                if !value.is_some_and(is_truthy) {
                    // the content renders against the outer context
                    out.push_str(&apply_tags(children, current, global, scope_names));
                }
            }
            Tag::Comment { .. } => {}
            Tag::Partial { path } => {
                // recognized but intentionally never expanded
                out.push_str(&format!("{{{{>{}}}}}", path.join(".")));
            }
        }
    }
    out
}

/// Resolves a variable path per its scope: global paths against the
/// top-level context, local paths against the current context below the
/// scope prefix.
fn resolve<'a>(
    current: &'a Value,
    global: &'a Value,
    scope: Scope,
    scope_names: &[String],
    path: &[String],
) -> Option<&'a Value> {
    match scope {
        Scope::Global => deep_lookup(global, path),
        Scope::Local => {
            let full: Vec<&String> = scope_names.iter().chain(path).collect();
            deep_lookup_refs(current, &full)
        }
    }
}

/// Resolves a section or inverted-section path. Blocks always resolve
/// against the current context; their scope only controls whether the
/// accumulated prefix applies, so nested sections chain naturally.
fn resolve_block<'a>(
    current: &'a Value,
    scope: Scope,
    scope_names: &[String],
    path: &[String],
) -> Option<&'a Value> {
    match scope {
        Scope::Global => deep_lookup(current, path),
        Scope::Local => {
            let full: Vec<&String> = scope_names.iter().chain(path).collect();
            deep_lookup_refs(current, &full)
        }
    }
}

/// Walks `path` into `value`. A scalar resolves only for the empty path;
/// any missing mapping key resolves to nothing.
fn deep_lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let refs: Vec<&String> = path.iter().collect();
    deep_lookup_refs(value, &refs)
}

fn deep_lookup_refs<'a>(value: &'a Value, path: &[&String]) -> Option<&'a Value> {
    let mut cursor = value;
    for segment in path {
        let (key, _) = split_array_marker(segment);
        match cursor {
            Value::Object(map) => cursor = map.get(key)?,
            _ => return None,
        }
    }
    Some(cursor)
}

/// Section truthiness: absent, null, `false`, the empty string, and zero all
/// suppress a section.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64() != Some(0.0)
            }
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Renders a resolved value in scalar position. Mappings and sequences have
/// no scalar rendering and become the empty string.
fn render_scalar(value: Option<&Value>, escape: bool) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => String::new(),
    };
    if escape {
        escape_html(&text)
    } else {
        text
    }
}

/// Replaces the five HTML-significant characters with named entities.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        assert_eq!(
            apply("This is just plain text.", &json!({})),
            "This is just plain text."
        );
    }

    #[test]
    fn test_variable_substitution() {
        assert_eq!(
            apply("Hello {{name}}!", &json!({"name": "World"})),
            "Hello World!"
        );
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        assert_eq!(apply("Hello {{name}}!", &json!({})), "Hello !");
    }

    #[test]
    fn test_dotted_path_lookup() {
        assert_eq!(
            apply("{{user.name}}", &json!({"user": {"name": "Adit"}})),
            "Adit"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(apply("{{v}}", &json!({"v": "<b>"})), "&lt;b&gt;");
        assert_eq!(apply("{{{v}}}", &json!({"v": "<b>"})), "<b>");
        assert_eq!(apply("{{&v}}", &json!({"v": "<b>"})), "<b>");
        assert_eq!(
            apply("{{v}}", &json!({"v": r#"Tom & "Jerry's""#})),
            "Tom &amp; &quot;Jerry&apos;s&quot;"
        );
    }

    #[test]
    fn test_number_and_bool_stringification() {
        assert_eq!(
            apply("{{n}} {{f}} {{b}}", &json!({"n": 10000, "f": 2.5, "b": true})),
            "10000 2.5 true"
        );
    }

    #[test]
    fn test_comment_renders_empty() {
        assert_eq!(
            apply("This is a {{! comment }} and not parsed.", &json!({})),
            "This is a  and not parsed."
        );
    }

    #[test]
    fn test_section_true() {
        assert_eq!(
            apply("{{#condition}}Section content{{/condition}}", &json!({"condition": true})),
            "Section content"
        );
    }

    #[test]
    fn test_section_falsy_values_suppress() {
        for context in [
            json!({"condition": false}),
            json!({"condition": 0}),
            json!({"condition": ""}),
            json!({"condition": null}),
            json!({}),
        ] {
            assert_eq!(apply("{{#condition}}X{{/condition}}", &context), "");
        }
    }

    #[test]
    fn test_inverted_section() {
        assert_eq!(
            apply("{{^condition}}Inverted content{{/condition}}", &json!({"condition": false})),
            "Inverted content"
        );
        assert_eq!(
            apply("{{^condition}}Inverted content{{/condition}}", &json!({"condition": true})),
            ""
        );
    }

    #[test]
    fn test_section_substitutes_context() {
        let context = json!({"person": {"name": "Adit"}, "name": "Not Adit"});
        assert_eq!(
            apply("{{#person}}{{this.name}}{{/person}}", &context),
            "Adit"
        );
        assert_eq!(
            apply("{{#person}}{{global.name}}{{/person}}", &context),
            "Not Adit"
        );
    }

    #[test]
    fn test_nested_sections_chain_contexts() {
        let context = json!({"outer": {"inner": {"value": "v"}}});
        assert_eq!(
            apply(
                "{{#outer}}{{#inner}}{{this.value}}{{/inner}}{{/outer}}",
                &context
            ),
            "v"
        );
    }

    #[test]
    fn test_array_section_iterates() {
        let context = json!({"people": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(
            apply("{{#people}}{{this.name}} {{/people}}", &context),
            "a b "
        );
    }

    #[test]
    fn test_array_marker_is_ignored_at_render_time() {
        let context = json!({"people": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(
            apply("{{#people[]}}{{this.name}}{{/people[]}}", &context),
            "ab"
        );
    }

    #[test]
    fn test_implicit_variable_renders_element() {
        assert_eq!(
            apply("{{#items}}{{.}}{{/items}}", &json!({"items": ["x", "y"]})),
            "xy"
        );
    }

    #[test]
    fn test_implicit_variable_escapes_unless_triple() {
        assert_eq!(
            apply("{{#items}}{{.}}{{/items}}", &json!({"items": ["<b>"]})),
            "&lt;b&gt;"
        );
        assert_eq!(
            apply("{{#items}}{{{.}}}{{/items}}", &json!({"items": ["<b>"]})),
            "<b>"
        );
    }

    #[test]
    fn test_inverted_keeps_outer_context() {
        let context = json!({"name": "World"});
        assert_eq!(
            apply("{{^missing}}Hello {{name}}{{/missing}}", &context),
            "Hello World"
        );
    }

    #[test]
    fn test_partial_renders_verbatim() {
        assert_eq!(
            apply("Main content {{>partialName}}", &json!({})),
            "Main content {{>partialName}}"
        );
        assert_eq!(apply("{{>shared.header}}", &json!({})), "{{>shared.header}}");
    }

    #[test]
    fn test_parse_failure_renders_empty() {
        assert_eq!(apply("{{#unmatchedTag}}Content", &json!({})), "");
    }

    #[test]
    fn test_scalar_blocks_deeper_lookup() {
        assert_eq!(apply("{{user.name}}", &json!({"user": "flat"})), "");
    }

    #[test]
    fn test_mapping_in_scalar_position_renders_empty() {
        assert_eq!(apply("{{user}}", &json!({"user": {"name": "x"}})), "");
    }

    #[test]
    fn test_hints_do_not_affect_rendering() {
        assert_eq!(
            apply("{{value:number}} {{name?:string}}", &json!({"value": 3, "name": "x"})),
            "3 x"
        );
    }
}
