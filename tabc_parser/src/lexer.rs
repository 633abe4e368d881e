//! Splits source into logical lines and tokenizes each one.
//!
//! Indentation is tab characters only; it is measured per physical line and
//! handed to the parser as a plain depth rather than synthetic INDENT/DEDENT
//! tokens, since the grammar never spans multiple lines.

use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::token::Token;
use logos::Logos;

/// One non-blank source line: its indentation depth and the tokens on it.
#[derive(Debug, Clone)]
pub struct Line {
    pub depth: usize,
    pub tokens: Vec<(Token, Span)>,
    pub line_no: usize,
}

fn leading_depth(line_no: usize, raw: &str) -> ParseResult<(usize, &str)> {
    let mut depth = 0;
    let mut chars = raw.char_indices();
    loop {
        match chars.clone().next() {
            Some((_, '\t')) => {
                depth += 1;
                chars.next();
            }
            Some((_, ' ')) => {
                // A space anywhere in the leading run is an indentation error,
                // whether it precedes or follows tabs.
                return Err(ParseError::LeadingSpaceIndentation { line: line_no });
            }
            _ => break,
        }
    }
    let rest_start = chars.next().map(|(i, _)| i).unwrap_or(raw.len());
    Ok((depth, &raw[rest_start..]))
}

/// Tokenize the unindented remainder of a line.
fn tokenize_rest(line_no: usize, rest: &str) -> ParseResult<Vec<(Token, Span)>> {
    let mut out = Vec::new();
    let mut lex = Token::lexer(rest);
    while let Some(result) = lex.next() {
        let span = lex.span();
        match result {
            Ok(tok) => out.push((tok, Span::new(line_no, span.start + 1, span.end + 1))),
            Err(()) => {
                return Err(ParseError::IllegalCharacter {
                    found: lex.slice().to_string(),
                    span: Span::new(line_no, span.start + 1, span.end + 1),
                });
            }
        }
    }
    Ok(out)
}

/// Lex an entire source file into a flat list of non-blank, non-comment-only
/// lines, each carrying its tab-count depth.
pub fn lex(source: &str) -> ParseResult<Vec<Line>> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim_start_matches(['\t', ' ']);
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (depth, rest) = leading_depth(line_no, raw)?;
        let tokens = tokenize_rest(line_no, rest)?;
        if tokens.is_empty() {
            continue;
        }
        lines.push(Line {
            depth,
            tokens,
            line_no,
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_tab_depth() {
        let src = "if True:\n\tx: int = 1\n\ty: int = 2\n";
        let lines = lex(src).unwrap();
        assert_eq!(lines[0].depth, 0);
        assert_eq!(lines[1].depth, 1);
        assert_eq!(lines[2].depth, 1);
    }

    #[test]
    fn rejects_space_indentation() {
        let src = "if True:\n    x: int = 1\n";
        let err = lex(src).unwrap_err();
        assert!(matches!(
            err,
            ParseError::LeadingSpaceIndentation { line: 2 }
        ));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let src = "x: int = 1\n\n# a comment\ny: int = 2\n";
        let lines = lex(src).unwrap();
        assert_eq!(lines.len(), 2);
    }
}
