//! Generated-module wrapper.
//!
//! Combines a template's source text with its inferred type into a
//! TypeScript module: the template as an exported string constant, the
//! inferred shape as `TemplateType`, and a typed `render` entry point.

use crate::ast::Tag;
use crate::infer::{gen_type, TypeError};

/// Builds the generated TypeScript module text for a parsed template.
///
/// `source` names the template file in the auto-generation banner.
pub fn generate_module(source: &str, contents: &str, tags: &[Tag]) -> Result<String, TypeError> {
    let type_text = gen_type(tags)?;
    let template = contents.replace('`', "\\`");
    Ok(format!(
        r#"// THIS FILE WAS AUTO-GENERATED
// Source: {source}
// Any manual changes will be lost.
import {{ apply }} from "typestache";

export const template = `{template}`;

export type TemplateType = {type_text};

const render = (args: TemplateType) => {{
  return apply(template, args);
}}

export default render;
"#
    ))
}
