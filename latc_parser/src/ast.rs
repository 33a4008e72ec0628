//! The Lat program tree and its type model.
//!
//! The parser builds this tree with every `ty` unset; the type checker
//! annotates and rewrites it in place before code generation reads it.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A Lat type.
///
/// `Null` is the internal type of the `null` literal and `Function` is
/// the callable type produced by name resolution; neither is ever
/// written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Type {
    Int,
    Bool,
    Str,
    Void,
    Null,
    Class(String),
    Array(Box<Type>),
    Function(Box<Type>, Vec<Type>),
}

impl Type {
    /// Map a surface type name to a type. Unknown names become class
    /// types; the type-info builder validates them.
    pub fn from_name(name: &str) -> Type {
        match name {
            "int" => Type::Int,
            "boolean" => Type::Bool,
            "string" => Type::Str,
            "void" => Type::Void,
            _ => Type::Class(name.to_string()),
        }
    }

    pub fn array_of(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// Element type of an array type
    pub fn elem(&self) -> Option<&Type> {
        match self {
            Type::Array(e) => Some(e),
            _ => None,
        }
    }

    /// True for `int`, `boolean`, `string` and `void`
    pub fn is_predefined(&self) -> bool {
        matches!(self, Type::Int | Type::Bool | Type::Str | Type::Void)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "boolean"),
            Type::Str => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array(elem) => write!(f, "{}[]", elem),
            Type::Function(ret, args) => {
                write!(f, "function<{}(", ret)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")>")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    /// Integer negation `-x`
    Neg,
    /// Boolean negation `!x`
    Not,
}

/// An expression node: span, the checker's type annotation, and shape.
#[derive(Debug, Serialize)]
pub struct Expr {
    pub span: Span,
    /// Set by the type checker; `None` after checking means an error was
    /// reported for this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(span: Span, kind: ExprKind) -> Self {
        Self {
            span,
            ty: None,
            kind,
        }
    }

    /// An already-typed node, used by the checker's rewrites.
    pub fn typed(span: Span, ty: Type, kind: ExprKind) -> Self {
        Self {
            span,
            ty: Some(ty),
            kind,
        }
    }

    pub fn as_int_literal(&self) -> Option<i64> {
        match self.kind {
            ExprKind::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool_literal(&self) -> Option<bool> {
        match self.kind {
            ExprKind::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str_literal(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Str(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
    Variable(String),
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// The ambiguous surface call `f(…)`; eliminated by the checker.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// A direct call to a free function or builtin; post-check only.
    StaticCall {
        name: String,
        args: Vec<Expr>,
    },
    /// A vtable-dispatched method call; post-check only.
    VirtualCall {
        object: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Subscript {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: String,
    },
    Cast {
        expr: Box<Expr>,
        target: Type,
    },
    NewObject {
        class: String,
    },
    NewArray {
        elem: Type,
        size: Box<Expr>,
    },
}

/// One `name` or `name = init` item of a definition
#[derive(Debug, Serialize)]
pub struct DefItem {
    pub name: String,
    pub init: Option<Expr>,
}

/// `T a, b = e, c;` — one declared type, one or more items.
#[derive(Debug, Serialize)]
pub struct Definition {
    pub span: Span,
    pub ty: Type,
    pub items: Vec<DefItem>,
}

#[derive(Debug, Serialize)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(span: Span, kind: StmtKind) -> Self {
        Self { span, kind }
    }

    pub fn empty(span: Span) -> Self {
        Self {
            span,
            kind: StmtKind::Empty,
        }
    }
}

#[derive(Debug, Serialize)]
pub enum StmtKind {
    Empty,
    Block(Vec<Stmt>),
    Definition(Definition),
    Assign {
        target: Expr,
        value: Expr,
    },
    Incr(Expr),
    Decr(Expr),
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        elem_ty: Type,
        var: String,
        array: Expr,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub ty: Type,
    pub name: String,
}

/// A free function or a class method.
#[derive(Debug, Serialize)]
pub struct Function {
    /// Span of the declaration head (return type through `)`)
    pub dec_span: Span,
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    /// The body block's statements; the checker may append an implicit
    /// `return` here.
    pub body: Vec<Stmt>,
    /// Span of the body block, `{` through `}`
    pub body_span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClassDecl {
    /// Span of the declaration head (`class` through `{`)
    pub dec_span: Span,
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<Definition>,
    pub methods: Vec<Function>,
}

#[derive(Debug, Serialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<Function>,
}

impl Program {
    /// JSON dump of the tree, for debugging and tooling.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
