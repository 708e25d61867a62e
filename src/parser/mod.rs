//! Parser for the template language.
//!
//! A recursive-descent parser over a byte-position cursor. Tags are
//! dispatched on their opening prefix, with the longer prefixes tried first:
//! a greedy `{{` match would otherwise misparse the leading braces of a
//! `{{{name}}}` triple tag.
//!
//! Sections recurse into the top-level grammar until the matching `{{/...}}`
//! closer is consumed, so their content is itself a full tag sequence. The
//! closing tag's name must match the opening tag's name (after the same
//! scope-prefix stripping applied to the opener).

mod errors;

pub use errors::{ParseError, ParseErrorKind, ParseResult};

use crate::ast::{Scope, Tag, TypeHint};

/// Parses a template into its tag tree.
///
/// On failure the template must be treated as entirely unparsed; there is no
/// partial output.
pub fn parse(template: &str) -> ParseResult<Vec<Tag>> {
    let mut parser = Parser::new(template);
    let tags = parser.parse_tags()?;
    if !parser.at_eof() {
        // parse_tags only stops early on a section closer
        return Err(
            ParseError::new(ParseErrorKind::UnexpectedSectionClose, parser.pos)
                .with_found(&parser.peek_snippet()),
        );
    }
    Ok(tags)
}

/// Returns true for characters allowed in a path segment.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '[' || c == ']'
}

/// Strips a leading `this` / `global` pseudo-segment from a path, deriving
/// the tag's scope. A bare path defaults to global.
fn split_scope(mut path: Vec<String>) -> (Scope, Vec<String>) {
    match path.first().map(String::as_str) {
        Some("this") => {
            path.remove(0);
            (Scope::Local, path)
        }
        Some("global") => {
            path.remove(0);
            (Scope::Global, path)
        }
        _ => (Scope::Global, path),
    }
}

/// The variable tag form being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarForm {
    /// `{{name}}` - escaped output.
    Double,
    /// `{{{name}}}` - unescaped output.
    Triple,
}

/// The parser cursor.
struct Parser<'a> {
    /// The input text.
    input: &'a str,
    /// Current byte position in the input.
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    // =========================================================================
    // Cursor primitives
    // =========================================================================

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consumes the literal if it is next, returning whether it was.
    fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.advance(s.len());
            true
        } else {
            false
        }
    }

    /// Consumes characters while the predicate is true.
    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn skip_spaces(&mut self) {
        self.consume_while(|c| c == ' ' || c == '\t');
    }

    /// A short description of what is at the cursor, for error messages.
    fn peek_snippet(&self) -> String {
        match self.peek() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        }
    }

    /// Consumes the closing braces of a tag, or fails with the tag's opening
    /// position attached.
    fn expect_close(&mut self, close: &str, open_pos: usize, what: &str) -> ParseResult<()> {
        if self.eat(close) {
            return Ok(());
        }
        let kind = if self.at_eof() {
            ParseErrorKind::UnterminatedTag
        } else {
            ParseErrorKind::UnexpectedCharacter
        };
        Err(ParseError::new(kind, self.pos)
            .with_context(what)
            .with_expected(&[close])
            .with_found(&self.peek_snippet())
            .opened_at(open_pos))
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    /// Parses tags until EOF or a section closer.
    fn parse_tags(&mut self) -> ParseResult<Vec<Tag>> {
        let mut tags = Vec::new();
        while !self.at_eof() && !self.starts_with("{{/") {
            tags.push(self.parse_tag()?);
        }
        Ok(tags)
    }

    /// Parses a single tag. Prefix order matters: `{{{` before `{{`.
    fn parse_tag(&mut self) -> ParseResult<Tag> {
        if self.starts_with("{{!") {
            return self.parse_comment();
        }
        if self.starts_with("{{>") {
            return self.parse_partial();
        }
        if self.starts_with("{{#") {
            return self.parse_section();
        }
        if self.starts_with("{{^") {
            return self.parse_inverted();
        }
        if self.starts_with("{{{") {
            return self.parse_variable(VarForm::Triple);
        }
        if self.starts_with("{{") {
            return self.parse_variable(VarForm::Double);
        }
        Ok(self.parse_text())
    }

    /// Parses a literal text run up to the next `{{` or EOF.
    fn parse_text(&mut self) -> Tag {
        let start = self.pos;
        while !self.at_eof() && !self.starts_with("{{") {
            if let Some(c) = self.peek() {
                self.advance(c.len_utf8());
            }
        }
        Tag::Text {
            content: self.input[start..self.pos].to_string(),
        }
    }

    /// Parses `{{!comment}}`.
    fn parse_comment(&mut self) -> ParseResult<Tag> {
        let open_pos = self.pos;
        self.advance(3);
        match self.remaining().find("}}") {
            Some(end) => {
                let content = self.remaining()[..end].to_string();
                self.advance(end + 2);
                Ok(Tag::Comment { content })
            }
            None => Err(
                ParseError::new(ParseErrorKind::UnterminatedComment, self.input.len())
                    .with_expected(&["}}"])
                    .with_found("end of input")
                    .opened_at(open_pos),
            ),
        }
    }

    /// Parses `{{>path}}`. Partials are recognized but never expanded.
    fn parse_partial(&mut self) -> ParseResult<Tag> {
        let open_pos = self.pos;
        self.advance(3);
        self.skip_spaces();
        let path = self.parse_path()?;
        self.skip_spaces();
        self.expect_close("}}", open_pos, "partial tag")?;
        Ok(Tag::Partial { path })
    }

    /// Parses a variable tag: `{{path}}`, `{{{path}}}`, `{{&path}}`, or the
    /// implicit forms `{{.}}` / `{{{.}}}` / `{{&.}}`.
    fn parse_variable(&mut self, form: VarForm) -> ParseResult<Tag> {
        let open_pos = self.pos;
        let (close, mut triple) = match form {
            VarForm::Triple => {
                self.advance(3);
                ("}}}", true)
            }
            VarForm::Double => {
                self.advance(2);
                ("}}", false)
            }
        };
        self.skip_spaces();
        if form == VarForm::Double && self.eat("&") {
            // ampersand form is unescaped, like the triple form
            self.skip_spaces();
            triple = true;
        }

        if self.eat(".") {
            // a path segment can never start with `.`, so this is the
            // implicit variable form
            self.skip_spaces();
            self.expect_close(close, open_pos, "implicit variable tag")?;
            return Ok(Tag::ImplicitVariable { triple });
        }

        let path = self.parse_path()?;
        let hint = self.parse_hint()?;
        self.skip_spaces();
        self.expect_close(close, open_pos, "variable tag")?;
        let (scope, path) = split_scope(path);
        Ok(Tag::Variable {
            path,
            triple,
            scope,
            hint,
        })
    }

    /// Parses `{{#path}}...{{/path}}`.
    fn parse_section(&mut self) -> ParseResult<Tag> {
        let open_pos = self.pos;
        self.advance(3);
        self.skip_spaces();
        let path = self.parse_path()?;
        let hint = self.parse_hint()?;
        self.skip_spaces();
        self.expect_close("}}", open_pos, "section tag")?;
        let (scope, path) = split_scope(path);

        let children = self.parse_tags()?;
        self.parse_section_close(open_pos, &path)?;
        Ok(Tag::Section {
            path,
            scope,
            hint,
            children,
        })
    }

    /// Parses `{{^path}}...{{/path}}`.
    fn parse_inverted(&mut self) -> ParseResult<Tag> {
        let open_pos = self.pos;
        self.advance(3);
        self.skip_spaces();
        let path = self.parse_path()?;
        self.skip_spaces();
        self.expect_close("}}", open_pos, "inverted section tag")?;
        let (scope, path) = split_scope(path);

        let children = self.parse_tags()?;
        self.parse_section_close(open_pos, &path)?;
        Ok(Tag::Inverted {
            path,
            scope,
            children,
        })
    }

    /// Consumes a `{{/path}}` closer and checks it names the opening tag.
    ///
    /// The closer's path goes through the same scope stripping as the opener,
    /// so `{{#this.inner}}` may be closed by `{{/this.inner}}`.
    fn parse_section_close(&mut self, open_pos: usize, open_path: &[String]) -> ParseResult<()> {
        let open_name = open_path.join(".");
        if self.at_eof() {
            return Err(ParseError::unterminated_section(
                self.pos, open_pos, &open_name,
            ));
        }
        let close_pos = self.pos;
        // parse_tags only stops at `{{/` or EOF
        self.advance(3);
        self.skip_spaces();
        let close_path = self.parse_path()?;
        self.skip_spaces();
        self.expect_close("}}", close_pos, "section closing tag")?;

        let (_, close_path) = split_scope(close_path);
        if close_path != open_path {
            return Err(ParseError::mismatched_close(
                close_pos,
                open_pos,
                &open_name,
                &close_path.join("."),
            ));
        }
        Ok(())
    }

    /// Parses a dot-separated identifier path. At least one segment is
    /// required.
    fn parse_path(&mut self) -> ParseResult<Vec<String>> {
        let mut segments = Vec::new();
        loop {
            let start = self.pos;
            let segment = self.consume_while(is_ident_char);
            if segment.is_empty() {
                return Err(ParseError::new(ParseErrorKind::EmptyTagName, start)
                    .with_found(&self.peek_snippet()));
            }
            segments.push(segment.to_string());
            if !self.eat(".") {
                break;
            }
        }
        Ok(segments)
    }

    /// Parses a trailing type hint: optional `?`, then optional `:` followed
    /// by `|`-separated type names. Spaces around `|` are tolerated.
    fn parse_hint(&mut self) -> ParseResult<TypeHint> {
        self.skip_spaces();
        let optional = self.eat("?");
        self.skip_spaces();
        if !self.eat(":") {
            return Ok(TypeHint {
                names: None,
                optional,
            });
        }

        let mut names = Vec::new();
        loop {
            self.skip_spaces();
            let start = self.pos;
            let name = self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
            if name.is_empty() {
                return Err(ParseError::new(ParseErrorKind::InvalidTypeHint, start)
                    .with_expected(&["type name"])
                    .with_found(&self.peek_snippet()));
            }
            names.push(name.to_string());
            self.skip_spaces();
            if !self.eat("|") {
                break;
            }
        }
        Ok(TypeHint {
            names: Some(names),
            optional,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(path: &[&str], scope: Scope) -> Tag {
        Tag::Variable {
            path: path.iter().map(|s| s.to_string()).collect(),
            triple: false,
            scope,
            hint: TypeHint::default(),
        }
    }

    fn text(content: &str) -> Tag {
        Tag::Text {
            content: content.to_string(),
        }
    }

    #[test]
    fn test_simple_variable() {
        let tags = parse("Hello {{name}}!").unwrap();
        assert_eq!(
            tags,
            vec![text("Hello "), var(&["name"], Scope::Global), text("!")]
        );
    }

    #[test]
    fn test_variable_with_type_hint() {
        let tags = parse("Hello {{name:string}}!").unwrap();
        assert_eq!(
            tags[1],
            Tag::Variable {
                path: vec!["name".into()],
                triple: false,
                scope: Scope::Global,
                hint: TypeHint {
                    names: Some(vec!["string".into()]),
                    optional: false,
                },
            }
        );
    }

    #[test]
    fn test_variable_with_union_hint() {
        let tags = parse("Hello {{name:string | number}}!").unwrap();
        let Tag::Variable { hint, .. } = &tags[1] else {
            panic!("expected variable, got {:?}", tags[1]);
        };
        assert_eq!(
            hint.names,
            Some(vec!["string".to_string(), "number".to_string()])
        );
    }

    #[test]
    fn test_variable_with_union_hint_no_spaces() {
        let tags = parse("Hello {{name:string|number}}!").unwrap();
        let Tag::Variable { hint, .. } = &tags[1] else {
            panic!("expected variable, got {:?}", tags[1]);
        };
        assert_eq!(
            hint.names,
            Some(vec!["string".to_string(), "number".to_string()])
        );
    }

    #[test]
    fn test_optional_hint() {
        let tags = parse("Hello {{name?:string}}!").unwrap();
        let Tag::Variable { hint, .. } = &tags[1] else {
            panic!("expected variable, got {:?}", tags[1]);
        };
        assert!(hint.optional);
        assert_eq!(hint.names, Some(vec!["string".to_string()]));
    }

    #[test]
    fn test_optional_without_type() {
        let tags = parse("Hello {{name?}}!").unwrap();
        let Tag::Variable { hint, .. } = &tags[1] else {
            panic!("expected variable, got {:?}", tags[1]);
        };
        assert!(hint.optional);
        assert_eq!(hint.names, None);
    }

    #[test]
    fn test_dotted_path() {
        let tags = parse("{{user.name}}").unwrap();
        assert_eq!(tags, vec![var(&["user", "name"], Scope::Global)]);
    }

    #[test]
    fn test_this_prefix_marks_local_scope() {
        let tags = parse("{{this.name}}").unwrap();
        assert_eq!(tags, vec![var(&["name"], Scope::Local)]);
    }

    #[test]
    fn test_global_prefix_is_stripped() {
        let tags = parse("{{global.name}}").unwrap();
        assert_eq!(tags, vec![var(&["name"], Scope::Global)]);
    }

    #[test]
    fn test_triple_variable() {
        let tags = parse("{{{name}}}").unwrap();
        assert_eq!(
            tags,
            vec![Tag::Variable {
                path: vec!["name".into()],
                triple: true,
                scope: Scope::Global,
                hint: TypeHint::default(),
            }]
        );
    }

    #[test]
    fn test_ampersand_variable() {
        let tags = parse("{{& name}}").unwrap();
        assert_eq!(
            tags,
            vec![Tag::Variable {
                path: vec!["name".into()],
                triple: true,
                scope: Scope::Global,
                hint: TypeHint::default(),
            }]
        );
    }

    #[test]
    fn test_implicit_variable() {
        let tags = parse("{{.}}").unwrap();
        assert_eq!(tags, vec![Tag::ImplicitVariable { triple: false }]);

        let tags = parse("{{{.}}}").unwrap();
        assert_eq!(tags, vec![Tag::ImplicitVariable { triple: true }]);
    }

    #[test]
    fn test_comment() {
        let tags = parse("a {{! note }} b").unwrap();
        assert_eq!(
            tags,
            vec![
                text("a "),
                Tag::Comment {
                    content: " note ".into()
                },
                text(" b"),
            ]
        );
    }

    #[test]
    fn test_partial() {
        let tags = parse("{{>header}}").unwrap();
        assert_eq!(
            tags,
            vec![Tag::Partial {
                path: vec!["header".into()]
            }]
        );
    }

    #[test]
    fn test_section_with_hint() {
        let tags = parse("{{#person?:string|number}}{{name}}{{/person}}").unwrap();
        let Tag::Section {
            path,
            scope,
            hint,
            children,
        } = &tags[0]
        else {
            panic!("expected section, got {:?}", tags[0]);
        };
        assert_eq!(path, &["person".to_string()]);
        assert_eq!(*scope, Scope::Global);
        assert!(hint.optional);
        assert_eq!(
            hint.names,
            Some(vec!["string".to_string(), "number".to_string()])
        );
        assert_eq!(children, &[var(&["name"], Scope::Global)]);
    }

    #[test]
    fn test_nested_sections() {
        let tags = parse("{{#outer}}{{#inner}}{{value}}{{/inner}}{{/outer}}").unwrap();
        assert_eq!(
            tags,
            vec![Tag::Section {
                path: vec!["outer".into()],
                scope: Scope::Global,
                hint: TypeHint::default(),
                children: vec![Tag::Section {
                    path: vec!["inner".into()],
                    scope: Scope::Global,
                    hint: TypeHint::default(),
                    children: vec![var(&["value"], Scope::Global)],
                }],
            }]
        );
    }

    #[test]
    fn test_nested_local_section() {
        let tags = parse("{{#outer}}{{#this.inner}}{{this.value}}{{/this.inner}}{{/outer}}")
            .unwrap();
        assert_eq!(
            tags,
            vec![Tag::Section {
                path: vec!["outer".into()],
                scope: Scope::Global,
                hint: TypeHint::default(),
                children: vec![Tag::Section {
                    path: vec!["inner".into()],
                    scope: Scope::Local,
                    hint: TypeHint::default(),
                    children: vec![var(&["value"], Scope::Local)],
                }],
            }]
        );
    }

    #[test]
    fn test_nested_section_with_text() {
        let tags = parse("{{#outer}}Before {{#inner}}{{value}}{{/inner}} After{{/outer}}").unwrap();
        let Tag::Section { children, .. } = &tags[0] else {
            panic!("expected section, got {:?}", tags[0]);
        };
        assert_eq!(children[0], text("Before "));
        assert_eq!(children[2], text(" After"));
    }

    #[test]
    fn test_inverted_section() {
        let tags = parse("{{^ok}}fallback{{/ok}}").unwrap();
        assert_eq!(
            tags,
            vec![Tag::Inverted {
                path: vec!["ok".into()],
                scope: Scope::Global,
                children: vec![text("fallback")],
            }]
        );
    }

    #[test]
    fn test_local_inverted_section() {
        let tags = parse("{{#section}}{{^this.inverted}}{{value}}{{/this.inverted}}{{/section}}")
            .unwrap();
        let Tag::Section { children, .. } = &tags[0] else {
            panic!("expected section, got {:?}", tags[0]);
        };
        let Tag::Inverted { path, scope, .. } = &children[0] else {
            panic!("expected inverted section, got {:?}", children[0]);
        };
        assert_eq!(path, &["inverted".to_string()]);
        assert_eq!(*scope, Scope::Local);
    }

    #[test]
    fn test_array_marker_kept_in_path() {
        let tags = parse("{{#people[]}}{{this.name}}{{/people[]}}").unwrap();
        let Tag::Section { path, .. } = &tags[0] else {
            panic!("expected section, got {:?}", tags[0]);
        };
        assert_eq!(path, &["people[]".to_string()]);
    }

    #[test]
    fn test_unterminated_section_fails() {
        let err = parse("{{#unmatchedTag}}Content").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedSection);
        assert_eq!(err.opened_at, Some(0));
    }

    #[test]
    fn test_mismatched_close_fails() {
        let err = parse("{{#outer}}content{{/other}}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedSectionClose);
    }

    #[test]
    fn test_unterminated_variable_fails() {
        let err = parse("hello {{name").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedTag);
        assert_eq!(err.opened_at, Some(6));
    }

    #[test]
    fn test_stray_section_close_fails() {
        let err = parse("text {{/nothing}}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedSectionClose);
    }

    #[test]
    fn test_empty_tag_fails() {
        let err = parse("{{}}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyTagName);
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(parse("").unwrap(), vec![]);
    }

    #[test]
    fn test_plain_text_with_single_braces() {
        let tags = parse("a { b } c").unwrap();
        assert_eq!(tags, vec![text("a { b } c")]);
    }
}
