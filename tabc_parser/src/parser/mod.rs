//! Recursive-descent parser.
//!
//! The grammar is line-oriented: a statement never spans more than one
//! physical line, and nesting is driven entirely by the tab-count `depth`
//! [`crate::lexer::lex`] already computed. `Parser` walks the flat `Vec<Line>`
//! it produced, consuming one whole line per leaf statement and recursing
//! into [`Parser::parse_block`] for anything with a body.

mod expr;
mod stmt;

use crate::ast::{Block, Stmt};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{self, Line};
use crate::span::Span;
use crate::token::Token;

/// Parse an entire source file into a top-level block.
pub fn parse(source: &str) -> ParseResult<Block> {
    let lines = lexer::lex(source)?;
    let mut parser = Parser::new(&lines);
    let block = parser.parse_block(0)?;
    Ok(block)
}

pub(crate) struct Parser<'a> {
    lines: &'a [Line],
    pos: usize,
}

/// Cursor over one line's tokens, used while parsing a single statement.
pub(crate) struct LineCursor<'a> {
    tokens: &'a [(Token, Span)],
    pos: usize,
    line_no: usize,
}

impl<'a> LineCursor<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .or_else(|| self.tokens.last().map(|(_, s)| *s))
            .unwrap_or_else(|| Span::whole_line(self.line_no))
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expect(&mut self, expected: &Token, what: &str) -> ParseResult<()> {
        let span = self.current_span();
        match self.advance() {
            Some(ref tok) if tok == expected => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.to_string(),
                expected: what.to_string(),
                span,
            }),
            None => Err(ParseError::UnexpectedEol {
                expected: what.to_string(),
                span,
            }),
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        let span = self.current_span();
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.to_string(),
                expected: what.to_string(),
                span,
            }),
            None => Err(ParseError::UnexpectedEol {
                expected: what.to_string(),
                span,
            }),
        }
    }

    fn expect_end_of_line(&self) -> ParseResult<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                found: self.peek().unwrap().to_string(),
                expected: "end of line".to_string(),
                span: self.current_span(),
            })
        }
    }
}

impl<'a> Parser<'a> {
    fn new(lines: &'a [Line]) -> Self {
        Self { lines, pos: 0 }
    }

    fn current_line(&self) -> Option<&'a Line> {
        self.lines.get(self.pos)
    }

    fn cursor(&self) -> LineCursor<'a> {
        let line = &self.lines[self.pos];
        LineCursor {
            tokens: &line.tokens,
            pos: 0,
            line_no: line.line_no,
        }
    }

    /// Parse every statement at exactly `depth`, stopping at the first line
    /// with a shallower depth (or end of input).
    pub(crate) fn parse_block(&mut self, depth: usize) -> ParseResult<Block> {
        let mut block = Block::new();
        // Tracks whether the statement just pushed at this depth admits a
        // following `elif`/`else`: only true right after an `If`/`Elif`.
        let mut branch_open = false;
        while let Some(line) = self.current_line() {
            if line.depth < depth {
                break;
            }
            if line.depth > depth {
                return Err(ParseError::UnexpectedIndent {
                    line: line.line_no,
                });
            }
            let keyword = match self
                .current_line()
                .and_then(|l| l.tokens.first())
                .map(|(t, _)| t)
            {
                Some(Token::Elif) => Some("elif"),
                Some(Token::Else) => Some("else"),
                _ => None,
            };
            if let Some(keyword) = keyword {
                if !branch_open {
                    return Err(ParseError::DanglingBranch {
                        keyword,
                        line: line.line_no,
                    });
                }
            }
            let stmt = self.parse_stmt()?;
            branch_open = matches!(stmt, Stmt::If { .. } | Stmt::Elif { .. });
            block.push(stmt);
        }
        Ok(block)
    }

    /// Parse the indented body that must follow a header ending in `:`.
    fn parse_body(&mut self, header_depth: usize) -> ParseResult<Block> {
        let header_line = self.lines[self.pos - 1].line_no;
        match self.current_line() {
            Some(line) if line.depth == header_depth + 1 => self.parse_block(header_depth + 1),
            _ => Err(ParseError::ExpectedBlock { line: header_line }),
        }
    }
}
