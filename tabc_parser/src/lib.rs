//! tabc_parser
//!
//! Lexer and recursive-descent parser for the compiler's source language: a
//! statically-typed, tab-indented subset of a dynamic scripting language.
//! Produces the typed source AST consumed by the type checker and IR
//! generator in `tabc`.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::Block;
pub use error::{ParseError, ParseResult};
pub use lexer::Line;
pub use span::Span;
pub use token::Token;

/// Parse source text into a top-level block.
pub fn parse(source: &str) -> ParseResult<Block> {
    parser::parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Expr, Literal, Stmt, Type};

    #[test]
    fn parses_assignment_and_print() {
        let block = parse("x: int = 1 + 2\nprint(x)\n").unwrap();
        assert_eq!(block.len(), 2);
        match &block[0] {
            Stmt::Assignment {
                target,
                declared_type,
                value,
            } => {
                assert_eq!(target.0, "x");
                assert_eq!(*declared_type, Some(Type::int()));
                assert_eq!(
                    *value,
                    Expr::BinaryOp(
                        BinOp::Add,
                        Box::new(Expr::PrimitiveLiteral(Literal::Int(1))),
                        Box::new(Expr::PrimitiveLiteral(Literal::Int(2))),
                    )
                );
            }
            other => panic!("expected assignment, got {other:?}"),
        }
        assert!(matches!(&block[1], Stmt::Expr(Expr::FunctionCall(..))));
    }

    #[test]
    fn parses_for_range_loop() {
        let block = parse("s: int = 0\nfor i in range(1, 4):\n\ts = s + i\nprint(s)\n").unwrap();
        assert_eq!(block.len(), 3);
        assert!(matches!(&block[1], Stmt::ForLoopRange { .. }));
    }

    #[test]
    fn parses_if_elif_else_as_siblings() {
        let block = parse("if x:\n\ty: int = 1\nelif z:\n\ty: int = 2\nelse:\n\ty: int = 3\n").unwrap();
        assert_eq!(block.len(), 3);
        assert!(matches!(block[0], Stmt::If { .. }));
        assert!(matches!(block[1], Stmt::Elif { .. }));
        assert!(matches!(block[2], Stmt::Else { .. }));
    }

    #[test]
    fn rejects_elif_not_immediately_following_an_if() {
        let err = parse("if x:\n\ty: int = 1\nz: int = 2\nelif w:\n\ty: int = 3\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::DanglingBranch { keyword: "elif", .. }
        ));
    }

    #[test]
    fn rejects_else_with_no_preceding_if() {
        let err = parse("y: int = 1\nelse:\n\ty: int = 2\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::DanglingBranch { keyword: "else", .. }
        ));
    }

    #[test]
    fn xor_binds_tighter_than_comparison() {
        // `a == b ^ c` must parse as `a == (b ^ c)`, not `(a == b) ^ c`.
        let block = parse("x: bool = a == b ^ c\n").unwrap();
        match &block[0] {
            Stmt::Assignment { value, .. } => match value {
                Expr::BinaryOp(BinOp::Eq, _, rhs) => {
                    assert!(matches!(**rhs, Expr::BinaryOp(BinOp::Xor, ..)));
                }
                other => panic!("expected a top-level ==, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_def_with_overload_candidates() {
        let block = parse("def f(x: int) -> int:\n\treturn x\n").unwrap();
        assert_eq!(block.len(), 1);
        match &block[0] {
            Stmt::FunctionDef {
                name,
                params,
                return_type,
                ..
            } => {
                assert_eq!(name.0, "f");
                assert_eq!(params.len(), 1);
                assert_eq!(*return_type, Some(Type::int()));
            }
            other => panic!("expected function def, got {other:?}"),
        }
    }

    #[test]
    fn parses_list_append_and_index() {
        let block = parse(
            "xs: [int] = []\nxs.append(1)\nxs.append(2)\nprint(xs[0] + xs[1])\n",
        )
        .unwrap();
        assert_eq!(block.len(), 4);
        assert!(matches!(&block[1], Stmt::LstAppend { .. }));
    }

    #[test]
    fn rejects_space_indentation() {
        let err = parse("if True:\n    print(1)\n").unwrap_err();
        assert!(matches!(err, ParseError::LeadingSpaceIndentation { .. }));
    }
}
