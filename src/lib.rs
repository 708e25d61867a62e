//! Typed mustache templates.
//!
//! `typestache` parses a mustache-flavored template language, optionally
//! annotated with inline type hints, and offers two independent consumers of
//! the resulting tag tree:
//!
//! - [`gen_type`] - derives the minimal structural type describing the data
//!   a template requires to render, as TypeScript declaration text.
//! - [`apply`] - applies a runtime context value to produce output text.
//!
//! Both consumers share the same scoping model: a path prefixed with `this.`
//! resolves against the innermost section context, a path prefixed with
//! `global.` (or nothing) resolves against the document root.
//!
//! ```
//! use serde_json::json;
//!
//! let template = "Hello {{name}}!{{#this.person}}{{this.age:number}}{{/this.person}}";
//!
//! let tags = typestache::parse(template).unwrap();
//! let ty = typestache::gen_type(&tags).unwrap();
//! assert_eq!(ty, "{\n  name: string | boolean | number;\n  person: {\n    age: number;\n  };\n}");
//!
//! let out = typestache::apply(template, &json!({"name": "World"}));
//! assert_eq!(out, "Hello World!");
//! ```
//!
//! All three entry points are pure functions over their inputs; file
//! traversal and code generation live in [`files`] and [`codegen`] and are
//! driven by the `typestache` binary.

pub mod ast;
pub mod codegen;
pub mod files;
pub mod infer;
pub mod parser;
pub mod render;


pub use ast::{Scope, Tag, TypeHint};
pub use infer::{gen_type, TypeError};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use render::apply;

pub use serde_json::Value;
