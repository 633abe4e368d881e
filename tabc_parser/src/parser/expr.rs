use super::LineCursor;
use crate::ast::{BinOp, CollectionKind, Expr, Id, Literal, UnOp};
use crate::error::{ParseError, ParseResult};
use crate::token::Token;

impl<'a> LineCursor<'a> {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinaryOp(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_not()?;
            left = Expr::BinaryOp(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp(UnOp::Not, Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_xor()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::NotEq,
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::LtEq) => BinOp::LtEq,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::GtEq) => BinOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_xor()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Binds tighter than comparisons and looser than `+`/`-`, per the
    /// precedence chain documented in SPEC_FULL.md.
    fn parse_xor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        while matches!(self.peek(), Some(Token::Xor)) {
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::BinaryOp(BinOp::Xor, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp(UnOp::Neg, Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if !matches!(self.peek(), Some(Token::LBracket)) {
                break;
            }
            self.advance();
            expr = self.parse_index_or_slice(expr)?;
        }
        Ok(expr)
    }

    fn parse_index_or_slice(&mut self, obj: Expr) -> ParseResult<Expr> {
        // `[idx]`, `[start:end]`, `[:end]`, `[start:]`
        if matches!(self.peek(), Some(Token::Colon)) {
            self.advance();
            let end = if matches!(self.peek(), Some(Token::RBracket)) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            self.expect(&Token::RBracket, "']'")?;
            return Ok(Expr::NonPrimitiveSlicing(Box::new(obj), None, end));
        }
        let first = self.parse_expr()?;
        if matches!(self.peek(), Some(Token::Colon)) {
            self.advance();
            let end = if matches!(self.peek(), Some(Token::RBracket)) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            self.expect(&Token::RBracket, "']'")?;
            return Ok(Expr::NonPrimitiveSlicing(
                Box::new(obj),
                Some(Box::new(first)),
                end,
            ));
        }
        self.expect(&Token::RBracket, "']'")?;
        Ok(Expr::NonPrimitiveIndex(Box::new(obj), Box::new(first)))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        match self.advance() {
            Some(Token::Int(v)) => Ok(Expr::PrimitiveLiteral(Literal::Int(v))),
            Some(Token::Float(v)) => Ok(Expr::PrimitiveLiteral(Literal::Float(v))),
            Some(Token::True) => Ok(Expr::PrimitiveLiteral(Literal::Bool(true))),
            Some(Token::False) => Ok(Expr::PrimitiveLiteral(Literal::Bool(false))),
            Some(Token::KwNone) => Ok(Expr::PrimitiveLiteral(Literal::None)),
            Some(Token::Str(v)) => Ok(Expr::PrimitiveLiteral(Literal::Str(v))),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let args = self.parse_args()?;
                    self.expect(&Token::RParen, "')'")?;
                    Ok(Expr::FunctionCall(Id(name), args))
                } else {
                    Ok(Expr::Id(Id(name)))
                }
            }
            Some(Token::LBracket) => {
                let children = self.parse_list_items(&Token::RBracket)?;
                self.expect(&Token::RBracket, "']'")?;
                Ok(Expr::NonPrimitiveLiteral(CollectionKind::List, children))
            }
            Some(Token::LParen) => {
                if matches!(self.peek(), Some(Token::RParen)) {
                    self.advance();
                    return Ok(Expr::NonPrimitiveLiteral(CollectionKind::Tuple, Vec::new()));
                }
                let first = self.parse_expr()?;
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    let mut children = vec![first];
                    if !matches!(self.peek(), Some(Token::RParen)) {
                        children.extend(self.parse_list_items(&Token::RParen)?);
                    }
                    self.expect(&Token::RParen, "')'")?;
                    Ok(Expr::NonPrimitiveLiteral(CollectionKind::Tuple, children))
                } else {
                    self.expect(&Token::RParen, "')'")?;
                    Ok(first)
                }
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: tok.to_string(),
                expected: "expression".to_string(),
                span,
            }),
            None => Err(ParseError::UnexpectedEol {
                expected: "expression".to_string(),
                span,
            }),
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        if matches!(self.peek(), Some(Token::RParen)) {
            return Ok(Vec::new());
        }
        self.parse_list_items(&Token::RParen)
    }

    /// Comma-separated expressions up to (but not consuming) `terminator`.
    fn parse_list_items(&mut self, terminator: &Token) -> ParseResult<Vec<Expr>> {
        let mut items = vec![self.parse_expr()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            if self.peek() == Some(terminator) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(items)
    }
}
