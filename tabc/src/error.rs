//! Compiler error type.
//!
//! Every stage raises the same error shape: a stage tag and a message. The
//! pipeline is abandoned at the first error (see `pipeline.rs`); there is no
//! local recovery.

use thiserror::Error;

/// Which pipeline stage raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Parse,
    Type,
    IrCast,
    Emission,
    Toolchain,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Lex => "Lexer",
            Stage::Parse => "Parser",
            Stage::Type => "Type Checker",
            Stage::IrCast => "IR Translation",
            Stage::Emission => "Code Generation",
            Stage::Toolchain => "Toolchain",
        };
        write!(f, "{s}")
    }
}

/// A single stage-tagged compile error.
#[derive(Error, Debug, Clone)]
#[error("{stage} Error: {message}")]
pub struct CompileError {
    pub stage: Stage,
    pub message: String,
}

impl CompileError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(Stage::Lex, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(Stage::Parse, message)
    }

    pub fn type_check(message: impl Into<String>) -> Self {
        Self::new(Stage::Type, message)
    }

    pub fn ir_cast(message: impl Into<String>) -> Self {
        Self::new(Stage::IrCast, message)
    }

    pub fn emission(message: impl Into<String>) -> Self {
        Self::new(Stage::Emission, message)
    }

    pub fn toolchain(message: impl Into<String>) -> Self {
        Self::new(Stage::Toolchain, message)
    }
}

/// tabc_parser reports lex errors and parse errors with the same type; this
/// maps them onto a stage based on the variant.
impl From<tabc_parser::ParseError> for CompileError {
    fn from(err: tabc_parser::ParseError) -> Self {
        use tabc_parser::ParseError::*;
        let stage = match err {
            LeadingSpaceIndentation { .. } | IllegalCharacter { .. } | UnterminatedString { .. }
            | InvalidNumber { .. } => Stage::Lex,
            UnexpectedIndent { .. }
            | UnexpectedToken { .. }
            | UnexpectedEol { .. }
            | ExpectedBlock { .. }
            | DanglingBranch { .. } => Stage::Parse,
        };
        CompileError::new(stage, err.to_string())
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_stage_prefix() {
        let err = CompileError::type_check("Redeclaring variable 'x'");
        assert_eq!(
            err.to_string(),
            "Type Checker Error: Redeclaring variable 'x'"
        );
    }
}
