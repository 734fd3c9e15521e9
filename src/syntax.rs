// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Syntax tree for the supported Go subset.
//!
//! Nodes are tagged-variant enums rather than a trait-object hierarchy, so
//! every consumer dispatches with `match` instead of downcasts. Trees are
//! mutable and exclusively owned by their compilation unit; the rewriter
//! edits them in place and the printer serializes them back to text.
//!
//! Type expressions carry a `NodeId` so the type table built by the loader
//! can map them to resolved static types.

/// A line/column source position (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Identity of a type-expression node, the key of the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    /// Comments before the package clause (license headers and the like).
    pub lead_comments: Vec<String>,
    /// Package name from the package clause.
    pub package: String,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    /// Comments after the last declaration.
    pub trailing_comments: Vec<String>,
}

/// A single import line, possibly aliased.
#[derive(Debug, Clone)]
pub struct Import {
    pub alias: Option<String>,
    /// Import path without quotes, e.g. `testing`.
    pub path: String,
}

impl Import {
    /// The name the imported package is referred to by in this file.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

impl Decl {
    pub fn lead_comments(&self) -> &[String] {
        match self {
            Decl::Func(f) => &f.lead,
            Decl::Gen(g) => &g.lead,
        }
    }
}

/// `var`, `const` or `type` declaration, top-level or as a statement.
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub lead: Vec<String>,
    pub keyword: GenKeyword,
    pub specs: Vec<GenSpec>,
    /// True when written with a parenthesized spec group.
    pub grouped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKeyword {
    Var,
    Const,
    Type,
}

impl GenKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            GenKeyword::Var => "var",
            GenKeyword::Const => "const",
            GenKeyword::Type => "type",
        }
    }
}

#[derive(Debug, Clone)]
pub enum GenSpec {
    /// `names [type] [= values]` for var/const.
    Value {
        names: Vec<String>,
        ty: Option<TypeExpr>,
        values: Vec<Expr>,
    },
    /// `name type` for type declarations.
    Type { name: String, ty: TypeExpr },
}

/// A function declaration, possibly a method.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub lead: Vec<String>,
    pub pos: Pos,
    pub receiver: Option<Param>,
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub body: Block,
}

impl FuncDecl {
    /// Name of the sole parameter, when there is exactly one and it is named.
    pub fn sole_param_name(&self) -> Option<&str> {
        match self.params.as_slice() {
            [p] => p.name.as_deref(),
            _ => None,
        }
    }
}

/// A parameter, receiver, or named result.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// A braced statement list.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Comments between the last statement and the closing brace.
    pub trailing_comments: Vec<String>,
}

/// A statement with its leading comments.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub lead: Vec<String>,
    pub pos: Pos,
    pub kind: StmtKind,
}

impl Stmt {
    /// A synthesized statement with no source position or comments.
    pub fn synthetic(kind: StmtKind) -> Self {
        Stmt { lead: Vec::new(), pos: Pos::default(), kind }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    Decl(GenDecl),
    Return(Vec<Expr>),
    If(IfStmt),
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        /// `:=` when true, `=` when false.
        define: bool,
        expr: Expr,
        body: Block,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        cases: Vec<CaseClause>,
    },
    Block(Block),
    Go(Expr),
    Defer(Expr),
    IncDec {
        expr: Expr,
        inc: bool,
    },
    Break(Option<String>),
    Continue(Option<String>),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub els: Option<ElseArm>,
}

#[derive(Debug, Clone)]
pub enum ElseArm {
    If(Box<IfStmt>),
    Block(Block),
}

/// One `case`/`default` clause of a switch.
#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Empty for `default`.
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident {
        name: String,
        pos: Pos,
    },
    Selector {
        x: Box<Expr>,
        sel: String,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        /// `f(xs...)` spread on the final argument.
        ellipsis: bool,
    },
    Lit {
        kind: LitKind,
        /// Raw literal text, quotes and escapes included.
        text: String,
    },
    FuncLit {
        params: Vec<Param>,
        results: Vec<Param>,
        body: Block,
    },
    Composite {
        /// None for nested untyped elements, e.g. inner `{…}` of a slice literal.
        ty: Option<TypeExpr>,
        elems: Vec<CompositeElem>,
    },
    Unary {
        op: UnOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Paren(Box<Expr>),
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
    /// A type used in expression position, e.g. the `[]byte` of `[]byte(s)`.
    TypeRef(TypeExpr),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident { name: name.into(), pos: Pos::default() }
    }

    /// The identifier name when this expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    Str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    Plus,
    Addr,
    Deref,
    BitNot,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Not => "!",
            UnOp::Neg => "-",
            UnOp::Plus => "+",
            UnOp::Addr => "&",
            UnOp::Deref => "*",
            UnOp::BitNot => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    OrOr,
    AndAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    BitOr,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    AndNot,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::OrOr => "||",
            BinOp::AndAnd => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::BitOr => "|",
            BinOp::Xor => "^",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::AndNot => "&^",
        }
    }

    /// Go binary precedence, 1 (lowest, `||`) to 5 (highest, `*`).
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::OrOr => 1,
            BinOp::AndAnd => 2,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::Add | BinOp::Sub | BinOp::BitOr | BinOp::Xor => 4,
            BinOp::Mul
            | BinOp::Div
            | BinOp::Rem
            | BinOp::Shl
            | BinOp::Shr
            | BinOp::BitAnd
            | BinOp::AndNot => 5,
        }
    }
}

/// One element of a composite literal, optionally keyed.
#[derive(Debug, Clone)]
pub struct CompositeElem {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// A type expression with its table key.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub pos: Pos,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A plain name: `int`, `string`, a local type.
    Name(String),
    /// A package-qualified name: `testing.T`.
    Qualified { pkg: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// `[N]T`; `len` is None for `[...]T`.
    Array {
        len: Option<Box<Expr>>,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Struct(Vec<StructField>),
    Func {
        params: Vec<Param>,
        results: Vec<Param>,
    },
    /// `interface{}` (only the empty interface is supported).
    InterfaceEmpty,
    /// Variadic parameter type `...T`.
    Ellipsis(Box<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Raw tag literal text, backquotes included.
    pub tag: Option<String>,
}
