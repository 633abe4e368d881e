use super::{LineCursor, Parser};
use crate::ast::{Param, RangeValues, Stmt, Type};
use crate::error::{ParseError, ParseResult};
use crate::token::Token;

impl<'a> Parser<'a> {
    /// Parse one statement. Consumes exactly one line as the header; if the
    /// statement owns a body, recurses into [`Parser::parse_body`] for the
    /// indented lines that follow.
    pub(crate) fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let depth = self.current_line().unwrap().depth;
        let mut cur = self.cursor();
        let line_no = cur.line_no;

        let stmt = match cur.peek() {
            Some(Token::If) => {
                cur.advance();
                let cond = cur.parse_expr()?;
                cur.expect(&Token::Colon, "':'")?;
                cur.expect_end_of_line()?;
                self.pos += 1;
                let body = self.parse_body(depth)?;
                return Ok(Stmt::If { cond, body });
            }
            Some(Token::Elif) => {
                cur.advance();
                let cond = cur.parse_expr()?;
                cur.expect(&Token::Colon, "':'")?;
                cur.expect_end_of_line()?;
                self.pos += 1;
                let body = self.parse_body(depth)?;
                return Ok(Stmt::Elif { cond, body });
            }
            Some(Token::Else) => {
                cur.advance();
                cur.expect(&Token::Colon, "':'")?;
                cur.expect_end_of_line()?;
                self.pos += 1;
                let body = self.parse_body(depth)?;
                return Ok(Stmt::Else { body });
            }
            Some(Token::While) => {
                cur.advance();
                let cond = cur.parse_expr()?;
                cur.expect(&Token::Colon, "':'")?;
                cur.expect_end_of_line()?;
                self.pos += 1;
                let body = self.parse_body(depth)?;
                return Ok(Stmt::While { cond, body });
            }
            Some(Token::For) => {
                cur.advance();
                let var = crate::ast::Id(cur.expect_ident("loop variable")?);
                cur.expect(&Token::In, "'in'")?;
                if matches!(cur.peek(), Some(Token::Range)) {
                    cur.advance();
                    cur.expect(&Token::LParen, "'('")?;
                    let range = cur.parse_range_args()?;
                    cur.expect(&Token::RParen, "')'")?;
                    cur.expect(&Token::Colon, "':'")?;
                    cur.expect_end_of_line()?;
                    self.pos += 1;
                    let body = self.parse_body(depth)?;
                    return Ok(Stmt::ForLoopRange { var, range, body });
                } else {
                    let list = cur.parse_expr()?;
                    cur.expect(&Token::Colon, "':'")?;
                    cur.expect_end_of_line()?;
                    self.pos += 1;
                    let body = self.parse_body(depth)?;
                    return Ok(Stmt::ForLoopList { var, list, body });
                }
            }
            Some(Token::Def) => {
                cur.advance();
                let name = crate::ast::Id(cur.expect_ident("function name")?);
                cur.expect(&Token::LParen, "'('")?;
                let mut params = Vec::new();
                if !matches!(cur.peek(), Some(Token::RParen)) {
                    loop {
                        let pname = crate::ast::Id(cur.expect_ident("parameter name")?);
                        cur.expect(&Token::Colon, "':'")?;
                        let ty = cur.parse_type()?;
                        params.push(Param { name: pname, ty });
                        if matches!(cur.peek(), Some(Token::Comma)) {
                            cur.advance();
                            continue;
                        }
                        break;
                    }
                }
                cur.expect(&Token::RParen, "')'")?;
                let return_type = if matches!(cur.peek(), Some(Token::Arrow)) {
                    cur.advance();
                    Some(cur.parse_type()?)
                } else {
                    None
                };
                cur.expect(&Token::Colon, "':'")?;
                cur.expect_end_of_line()?;
                self.pos += 1;
                let body = self.parse_body(depth)?;
                return Ok(Stmt::FunctionDef {
                    name,
                    params,
                    return_type,
                    body,
                });
            }
            Some(Token::Return) => {
                cur.advance();
                let expr = if cur.at_end() {
                    None
                } else {
                    Some(cur.parse_expr()?)
                };
                cur.expect_end_of_line()?;
                Stmt::Return(expr)
            }
            Some(Token::Ident(_)) if matches!(cur.peek_at(1), Some(Token::Colon)) => {
                let name = cur.expect_ident("variable name").unwrap();
                cur.advance(); // ':'
                let declared_type = Some(cur.parse_type()?);
                cur.expect(&Token::Eq, "'='")?;
                let value = cur.parse_expr()?;
                cur.expect_end_of_line()?;
                Stmt::Assignment {
                    target: crate::ast::Id(name),
                    declared_type,
                    value,
                }
            }
            Some(Token::Ident(_)) if matches!(cur.peek_at(1), Some(Token::Eq)) => {
                let name = cur.expect_ident("variable name").unwrap();
                cur.advance(); // '='
                let value = cur.parse_expr()?;
                cur.expect_end_of_line()?;
                Stmt::Assignment {
                    target: crate::ast::Id(name),
                    declared_type: None,
                    value,
                }
            }
            Some(_) => {
                let expr = cur.parse_expr()?;
                if matches!(cur.peek(), Some(Token::Dot)) {
                    cur.advance();
                    cur.expect(&Token::Append, "'append'")?;
                    cur.expect(&Token::LParen, "'('")?;
                    let val = cur.parse_expr()?;
                    cur.expect(&Token::RParen, "')'")?;
                    cur.expect_end_of_line()?;
                    Stmt::LstAppend { obj: expr, val }
                } else {
                    cur.expect_end_of_line()?;
                    Stmt::Expr(expr)
                }
            }
            None => {
                return Err(ParseError::UnexpectedEol {
                    expected: "statement".to_string(),
                    span: cur.current_span(),
                });
            }
        };

        self.pos += 1;
        Ok(stmt)
    }
}

impl<'a> LineCursor<'a> {
    pub(super) fn parse_type(&mut self) -> ParseResult<Type> {
        use crate::ast::{CollectionKind, PrimitiveKind};
        let span = self.current_span();
        match self.advance() {
            Some(Token::KwInt) => Ok(Type::Primitive(PrimitiveKind::Int)),
            Some(Token::KwFloat) => Ok(Type::Primitive(PrimitiveKind::Float)),
            Some(Token::KwBool) => Ok(Type::Primitive(PrimitiveKind::Bool)),
            Some(Token::KwStr) => Ok(Type::Primitive(PrimitiveKind::Str)),
            Some(Token::KwNone) => Ok(Type::Primitive(PrimitiveKind::None)),
            Some(Token::LBracket) => {
                let inner = self.parse_type()?;
                self.expect(&Token::RBracket, "']'")?;
                Ok(Type::NonPrimitive(CollectionKind::List, Some(Box::new(inner))))
            }
            Some(Token::LParen) => {
                let inner = self.parse_type()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(Type::NonPrimitive(CollectionKind::Tuple, Some(Box::new(inner))))
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.to_string(),
                expected: "type".to_string(),
                span,
            }),
            None => Err(ParseError::UnexpectedEol {
                expected: "type".to_string(),
                span,
            }),
        }
    }

    /// `range(...)` accepts 1-3 comma-separated args: `(stop)`,
    /// `(start, stop)`, or `(start, stop, step)`.
    pub(super) fn parse_range_args(&mut self) -> ParseResult<RangeValues> {
        let first = self.parse_expr()?;
        if !matches!(self.peek(), Some(Token::Comma)) {
            return Ok(RangeValues {
                start: None,
                stop: first,
                step: None,
            });
        }
        self.advance();
        let second = self.parse_expr()?;
        if !matches!(self.peek(), Some(Token::Comma)) {
            return Ok(RangeValues {
                start: Some(first),
                stop: second,
                step: None,
            });
        }
        self.advance();
        let third = self.parse_expr()?;
        Ok(RangeValues {
            start: Some(first),
            stop: second,
            step: Some(third),
        })
    }
}
