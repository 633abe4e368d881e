//! Lexical tokens.
//!
//! One `Token` is produced per lexeme on a single source line; indentation
//! (leading tabs) is handled separately by [`crate::lexer`] before a line's
//! remainder ever reaches this `logos` lexer.

use logos::Logos;

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn double_quoted(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn single_quoted(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn parse_int(lex: &mut logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("range")]
    Range,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("int")]
    KwInt,
    #[token("str")]
    KwStr,
    #[token("float")]
    KwFloat,
    #[token("bool")]
    KwBool,
    #[token("None")]
    KwNone,
    #[token("def")]
    Def,
    #[token("append")]
    Append,
    #[token("True")]
    True,
    #[token("False")]
    False,

    #[token("and")]
    #[token("&")]
    And,
    #[token("or")]
    #[token("|")]
    Or,
    #[token("not")]
    #[token("!")]
    Not,
    #[token("xor")]
    #[token("^")]
    Xor,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,

    #[regex(r#""([^"\\]|\\.)*""#, double_quoted)]
    #[regex(r"'([^'\\]|\\.)*'", single_quoted)]
    Str(String),

    #[regex(r"[0-9]+\.[0-9]+", parse_float)]
    Float(f64),
    #[regex(r"[0-9]+", parse_int)]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Int(v) => write!(f, "{v}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Str(v) => write!(f, "\"{v}\""),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Token::lexer(src).filter_map(Result::ok).collect()
    }

    #[test]
    fn keywords_and_symbol_aliases() {
        assert_eq!(tokens("and & or | not ! xor ^"), {
            use Token::*;
            vec![And, And, Or, Or, Not, Not, Xor, Xor]
        });
    }

    #[test]
    fn numbers() {
        assert_eq!(tokens("1 2.5"), vec![Token::Int(1), Token::Float(2.5)]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            tokens(r#""a\nb""#),
            vec![Token::Str("a\nb".to_string())]
        );
    }

    #[test]
    fn comment_is_skipped() {
        assert_eq!(tokens("1 # trailing comment"), vec![Token::Int(1)]);
    }
}
