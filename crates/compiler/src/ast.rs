//! Abstract syntax tree for Vela.
//!
//! Every expression node carries its source location and a type slot. The
//! slot starts out as `Unit` and is overwritten in place by the type checker,
//! so later stages can read a fully typed tree without a side table.

use crate::tokenizer::Location;
use crate::types::Type;

/// A literal value. The `Unit` variant is never written in source; the
/// parser appends it to a block body to mark a unit-valued trailing position
/// (a statement list ending in `;`).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Unit,
}

/// The surface spelling of a type annotation, e.g. the `Int` in
/// `var x: Int = 3`. Resolved by the type checker against the fixed set of
/// scalar type names, never against any scope.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub name: String,
    pub location: Location,
}

/// An expression node: kind-specific data plus location and resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
    /// Resolved type; `Unit` until the type checker has run.
    pub ty: Type,
}

impl Expr {
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Expr {
            kind,
            location,
            ty: Type::Unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier {
        name: String,
    },
    /// Binary operation like `a + b`; `op` is the operator's source spelling.
    BinaryOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    /// Unary operation like `not done` or `-x`.
    UnaryOp {
        op: String,
        operand: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },
    Break,
    Continue,
    /// `var name (: Type)? = value`
    Declaration {
        name: String,
        annotation: Option<TypeAnnotation>,
        value: Box<Expr>,
    },
    /// Brace-enclosed statement list; also the implicit top level.
    Block {
        body: Vec<Expr>,
    },
    /// Call of a built-in or user-defined function.
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Return {
        result: Option<Box<Expr>>,
    },
}

/// One function parameter: `name: Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncParam {
    pub name: String,
    pub annotation: TypeAnnotation,
    pub location: Location,
}

/// `fun name(params): ReturnType { body }`. A missing return annotation
/// means `Unit`. The body is always a `Block` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<FuncParam>,
    pub return_annotation: Option<TypeAnnotation>,
    pub body: Expr,
    pub location: Location,
    /// The function's resolved type; `Unit` until the type checker has run.
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    Func(FuncDef),
    Expr(Expr),
}

/// A source file containing function definitions. The parser collects all
/// non-function top-level statements into at most one trailing `Expr` item.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<ModuleItem>,
}

/// Root of a parse: a bare expression, or a module as soon as the source
/// contains at least one function definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Expression(Expr),
    Module(Module),
}
