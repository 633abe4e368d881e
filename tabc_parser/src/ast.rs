//! Typed source AST.
//!
//! Mirrors the node kinds a hand-written recursive-descent parser builds
//! directly from tokens: no separate concrete syntax tree, no spans (the
//! language is line-oriented, so a parse error's line/column comes from the
//! token stream, not from the tree).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int,
    Float,
    Bool,
    Str,
    None,
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Str => "str",
            PrimitiveKind::None => "none",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Tuple,
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollectionKind::List => "list",
            CollectionKind::Tuple => "tuple",
        };
        write!(f, "{s}")
    }
}

/// A type. `NonPrimitive` element types are `None` only transiently (empty
/// list/tuple literals); the type checker backfills them via
/// `SymbolTable::update_variable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    NonPrimitive(CollectionKind, Option<Box<Type>>),
}

impl Type {
    pub fn int() -> Self {
        Type::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        Type::Primitive(PrimitiveKind::Float)
    }

    pub fn bool() -> Self {
        Type::Primitive(PrimitiveKind::Bool)
    }

    pub fn str() -> Self {
        Type::Primitive(PrimitiveKind::Str)
    }

    pub fn none() -> Self {
        Type::Primitive(PrimitiveKind::None)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Primitive(PrimitiveKind::Int) | Type::Primitive(PrimitiveKind::Float)
        )
    }

    /// `repr()`-style structural equality: same as `PartialEq`, kept as a
    /// named method because the symbol table and type checker both compare
    /// type trees by full structural equality rather than by identity.
    pub fn structurally_eq(&self, other: &Type) -> bool {
        self == other
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::NonPrimitive(kind, Some(elem)) => write!(f, "{kind}[{elem}]"),
            Type::NonPrimitive(kind, None) => write!(f, "{kind}[?]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Xor,
}

impl BinOp {
    /// Operators restricted to two numeric operands by the type checker.
    pub fn numbers_only(&self) -> bool {
        matches!(
            self,
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::NotEq
                | BinOp::Lt
                | BinOp::LtEq
                | BinOp::Gt
                | BinOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id(pub String);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    PrimitiveLiteral(Literal),
    NonPrimitiveLiteral(CollectionKind, Vec<Expr>),
    Id(Id),
    BinaryOp(BinOp, Box<Expr>, Box<Expr>),
    UnaryOp(UnOp, Box<Expr>),
    FunctionCall(Id, Vec<Expr>),
    NonPrimitiveIndex(Box<Expr>, Box<Expr>),
    NonPrimitiveSlicing(Box<Expr>, Option<Box<Expr>>, Option<Box<Expr>>),
}

/// `range(...)` bounds. Field order matches the call site convention
/// `range(start?, stop, step?)`; `stop` is the only bound always present.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeValues {
    pub start: Option<Expr>,
    pub stop: Expr,
    pub step: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Id,
    pub ty: Type,
}

/// A statement. `If`/`Elif`/`Else` are kept as separate sibling variants
/// (rather than one node with arms) because every downstream stage -- type
/// checker, IR generator, C-AST builder -- walks a block's statements one at
/// a time and recognizes a chain by scanning consecutive siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        target: Id,
        declared_type: Option<Type>,
        value: Expr,
    },
    If {
        cond: Expr,
        body: Block,
    },
    Elif {
        cond: Expr,
        body: Block,
    },
    Else {
        body: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    ForLoopRange {
        var: Id,
        range: RangeValues,
        body: Block,
    },
    ForLoopList {
        var: Id,
        list: Expr,
        body: Block,
    },
    FunctionDef {
        name: Id,
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Block,
    },
    Return(Option<Expr>),
    LstAppend {
        obj: Expr,
        val: Expr,
    },
    Expr(Expr),
}

pub type Block = Vec<Stmt>;
