//! Parse error types

use crate::span::Span;
use thiserror::Error;

/// Lex/parse error. The type checker and downstream stages carry their own
/// stage-tagged error type and wrap these when a parse is requested.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A leading space was used for indentation instead of a tab.
    #[error("indentation error at line {line}: use tabs, not spaces")]
    LeadingSpaceIndentation { line: usize },

    /// An indentation jump skipped a level (e.g. depth 0 straight to depth 2).
    #[error("indentation error at line {line}: unexpected indent")]
    UnexpectedIndent { line: usize },

    /// A character the lexer does not recognize.
    #[error("illegal character '{found}' at {span:?}")]
    IllegalCharacter { found: String, span: Span },

    /// A string literal was never closed on its line.
    #[error("unterminated string literal at {span:?}")]
    UnterminatedString { span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number literal '{literal}' at {span:?}")]
    InvalidNumber { literal: String, span: Span },

    /// Parser saw a token it did not expect.
    #[error("unexpected token '{found}' at {span:?}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    /// Parser ran out of tokens on a line that needed more.
    #[error("unexpected end of line at {span:?}, expected {expected}")]
    UnexpectedEol { expected: String, span: Span },

    /// A construct that requires an indented body (if/while/for/def) was not
    /// followed by one.
    #[error("expected an indented block after line {line}")]
    ExpectedBlock { line: usize },

    /// `elif`/`else` did not immediately follow an `if`/`elif` at the same
    /// indentation level.
    #[error("'{keyword}' at line {line} does not follow an if/elif at the same indentation")]
    DanglingBranch { keyword: &'static str, line: usize },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::IllegalCharacter { span, .. }
            | ParseError::UnterminatedString { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEol { span, .. } => Some(*span),
            ParseError::LeadingSpaceIndentation { line }
            | ParseError::UnexpectedIndent { line }
            | ParseError::ExpectedBlock { line }
            | ParseError::DanglingBranch { line, .. } => Some(Span::whole_line(*line)),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_space_message() {
        let err = ParseError::LeadingSpaceIndentation { line: 3 };
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("tabs"));
    }

    #[test]
    fn unexpected_token_carries_span() {
        let span = Span::new(2, 4, 5);
        let err = ParseError::UnexpectedToken {
            found: ")".into(),
            expected: "expression".into(),
            span,
        };
        assert_eq!(err.span(), Some(span));
    }
}
