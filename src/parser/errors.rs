//! Error types for the template parser.
//!
//! A parse failure is reported as a single structured value with a byte
//! position; there is no partial or recovered output.

use std::fmt;

/// The kind of parse error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A tag was opened but the input ended before its closing braces.
    UnterminatedTag,
    /// A section was opened but its `{{/...}}` closer never appeared.
    UnterminatedSection,
    /// A comment was opened but never closed with `}}`.
    UnterminatedComment,
    /// A section's closing tag names a different path than its opening tag.
    MismatchedSectionClose,
    /// A `{{/...}}` closer appeared with no section open.
    UnexpectedSectionClose,
    /// A tag path had no identifier segments.
    EmptyTagName,
    /// A `:` type hint was not followed by a type name.
    InvalidTypeHint,
    /// An unexpected character inside a tag.
    UnexpectedCharacter,
}

impl ParseErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnterminatedTag => "unterminated tag",
            Self::UnterminatedSection => "unterminated section",
            Self::UnterminatedComment => "unterminated comment",
            Self::MismatchedSectionClose => "mismatched section closing tag",
            Self::UnexpectedSectionClose => "unexpected section closing tag",
            Self::EmptyTagName => "tag must have at least one name segment",
            Self::InvalidTypeHint => "invalid type hint",
            Self::UnexpectedCharacter => "unexpected character in tag",
        }
    }

    /// Returns a suggested fix for this error kind.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnterminatedTag => Some("add }} (or }}} for a triple tag) to close the tag"),
            Self::UnterminatedSection => Some("add a {{/name}} closing tag"),
            Self::UnterminatedComment => Some("add }} to close the comment"),
            Self::MismatchedSectionClose => {
                Some("the closing tag name must match the opening tag name")
            }
            Self::InvalidTypeHint => Some("write a hint as {{name?:string|number}}"),
            _ => None,
        }
    }
}

/// A parse error with position and context information.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Byte position in the input where the error occurred.
    pub position: usize,
    /// Context describing what was being parsed.
    pub context: String,
    /// What was expected at this position.
    pub expected: Vec<String>,
    /// What was actually found.
    pub found: Option<String>,
    /// Position where the offending construct was opened.
    pub opened_at: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            context: String::new(),
            expected: Vec::new(),
            found: None,
            opened_at: None,
        }
    }

    /// Creates an "unterminated section" error.
    pub fn unterminated_section(position: usize, opened_at: usize, name: &str) -> Self {
        let closer = format!("{{{{/{}}}}}", name);
        Self::new(ParseErrorKind::UnterminatedSection, position)
            .with_context(&format!("section `{}`", name))
            .with_expected(&[closer.as_str()])
            .with_found("end of input")
            .opened_at(opened_at)
    }

    /// Creates a "mismatched section close" error.
    pub fn mismatched_close(
        position: usize,
        opened_at: usize,
        open_name: &str,
        close_name: &str,
    ) -> Self {
        let expected = format!("{{{{/{}}}}}", open_name);
        Self::new(ParseErrorKind::MismatchedSectionClose, position)
            .with_context(&format!("section `{}`", open_name))
            .with_expected(&[expected.as_str()])
            .with_found(&format!("{{{{/{}}}}}", close_name))
            .opened_at(opened_at)
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: &str) -> Self {
        self.context = context.to_string();
        self
    }

    /// Adds expected tokens to the error.
    pub fn with_expected(mut self, expected: &[&str]) -> Self {
        self.expected = expected.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Adds the found token to the error.
    pub fn with_found(mut self, found: &str) -> Self {
        self.found = Some(found.to_string());
        self
    }

    /// Sets the position where the construct was opened.
    pub fn opened_at(mut self, pos: usize) -> Self {
        self.opened_at = Some(pos);
        self
    }

    /// Converts the error to a user-friendly message.
    pub fn to_message(&self) -> String {
        let mut msg = format!("Parse error at position {}: ", self.position);
        msg.push_str(self.kind.description());

        if let Some(ref found) = self.found {
            msg.push_str(&format!(", found {}", found));
        }

        if !self.expected.is_empty() {
            if self.expected.len() == 1 {
                msg.push_str(&format!(", expected {}", self.expected[0]));
            } else {
                msg.push_str(&format!(", expected one of: {}", self.expected.join(", ")));
            }
        }

        if !self.context.is_empty() {
            msg.push_str(&format!(" while parsing {}", self.context));
        }

        if let Some(opened) = self.opened_at {
            msg.push_str(&format!(" (opened at position {})", opened));
        }

        if let Some(suggestion) = self.kind.suggestion() {
            msg.push_str(&format!("\n  help: {}", suggestion));
        }

        msg
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_message())
    }
}

impl std::error::Error for ParseError {}

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;
