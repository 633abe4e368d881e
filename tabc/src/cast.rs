//! C-oriented AST: the structured tree the C-AST builder reassembles from
//! linear IR, and that the emitter formats to C text.

use tabc_parser::ast::BinOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Int,
    Float,
    Bool,
    Str,
    None,
    ListPtr,
}

impl std::fmt::Display for CType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CType::Int => "int_t",
            CType::Float => "float_t",
            CType::Bool => "bool_t",
            CType::Str => "str_t",
            CType::None => "none_t",
            CType::ListPtr => "list_t *",
        };
        write!(f, "{s}")
    }
}

impl CType {
    /// The runtime discriminator enum value (`int_v`, ...) used by the
    /// `list_*` helpers to tag a polymorphic element.
    pub fn discriminator(&self) -> &'static str {
        match self {
            CType::Int => "int_v",
            CType::Float => "float_v",
            CType::Bool => "bool_v",
            CType::Str => "str_v",
            CType::None => "none_v",
            CType::ListPtr => "list_v",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

impl std::fmt::Display for CValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CValue::Int(v) => write!(f, "{v}"),
            CValue::Float(v) => write!(f, "{v:?}"),
            CValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            CValue::Str(v) => write!(f, "{}", c_string_literal(v)),
            CValue::None => write!(f, "NONE_LITERAL"),
        }
    }
}

/// Escape a Rust string into a double-quoted C string literal.
pub fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum CExpr {
    Literal(CValue),
    Id(String),
    Binary(BinOp, Box<CExpr>, Box<CExpr>, CType),
    Unary(tabc_parser::ast::UnOp, Box<CExpr>, CType),
    Call(String, Vec<CExpr>),
    ListLiteral {
        elements: Vec<CExpr>,
        elem_ty: CType,
    },
    Index {
        obj: Box<CExpr>,
        idx: Box<CExpr>,
        elem_ty: CType,
    },
    /// `start`/`end` are always concrete: the builder resolves an absent
    /// bound to `0` or the object's statically known length before
    /// constructing this node, since the runtime's `list_slice` takes no
    /// open-ended sentinel.
    Slice {
        obj: Box<CExpr>,
        start: Box<CExpr>,
        end: Box<CExpr>,
    },
}

impl CExpr {
    pub fn id(name: impl Into<String>) -> Self {
        CExpr::Id(name.into())
    }

    pub fn as_literal(&self) -> Option<&CValue> {
        match self {
            CExpr::Literal(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CStmt {
    Decl {
        name: String,
        ty: CType,
    },
    Assign {
        name: String,
        value: CExpr,
    },
    /// A declaration and its initializing assignment, kept distinct (as
    /// the source does) so temp inlining can drop the assignment while
    /// the builder still knows it must not re-declare later.
    DeclAssign {
        name: String,
        ty: CType,
        value: CExpr,
    },
    ExprStmt(CExpr),
    Return(Option<CExpr>),
    LstAdd {
        obj: String,
        value: CExpr,
        elem_ty: CType,
    },
    /// Each branch carries its own `prelude`: statements that compute its
    /// condition and must re-run even when falling through from a previous
    /// branch's `else`. Empty for the common case of a bare comparison, so
    /// the emitter renders those as a plain `else if`.
    If {
        branches: Vec<(Vec<CStmt>, CExpr, Vec<CStmt>)>,
        else_body: Option<Vec<CStmt>>,
    },
    /// `prelude` re-runs every iteration, immediately before `cond` is
    /// tested, the same reasoning as `If`'s per-branch prelude.
    While {
        prelude: Vec<CStmt>,
        cond: CExpr,
        body: Vec<CStmt>,
    },
    ForRange {
        var: String,
        start: CExpr,
        stop: CExpr,
        step: CExpr,
        body: Vec<CStmt>,
    },
    ForList {
        var: String,
        elem_ty: CType,
        index_var: String,
        length: CExpr,
        list: CExpr,
        body: Vec<CStmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CFunctionDef {
    pub mangled_name: String,
    pub params: Vec<(String, CType)>,
    pub return_type: CType,
    pub body: Vec<CStmt>,
}

#[derive(Debug, Clone, Default)]
pub struct CProgram {
    pub functions: Vec<CFunctionDef>,
    pub main_body: Vec<CStmt>,
}
