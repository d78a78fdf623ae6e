//! Syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Two closed sum types, [`Expr`] and [`Stmt`], each consumed by one
//! exhaustive `match` in the printer, the resolver and the interpreter.
//! Nodes own their children; function bodies sit behind an `Rc` so closures
//! can share them without copying the tree.

use std::rc::Rc;

use crate::token::Token;

/// Identity of a name‑bearing expression (`Variable`, `Assign`, `This`).
///
/// The resolver records hop distances under this key, so two occurrences of
/// the same identifier in different places never collide even though they
/// are structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// `verdadeiro`
    True,

    /// `falso`
    False,

    /// `nulo` (and `indefinido`).
    Nil,
}

/// A named or anonymous function body shared by declarations, methods and
/// lambdas.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for lambdas.
    pub name: Option<Token>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("lambda", |t| t.lexeme.as_str())
    }
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix unary operator expression: `!pronto`, `-42`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix arithmetic, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Short‑circuiting `E` / `OU`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `(a, b) => expr` or `(a, b) => { ... }`
    Lambda(Rc<FunctionDecl>),

    /// `[e1, e2, ...]`
    Array {
        bracket: Token,
        elements: Vec<Expr>,
    },

    /// `array[index]`
    Index {
        bracket: Token,
        array: Box<Expr>,
        index: Box<Expr>,
    },

    /// `array[index] = value`
    IndexSet {
        bracket: Token,
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `meu` inside a method.
    This {
        id: ExprId,
        keyword: Token,
    },
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `escreva` statement.
    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `enquanto` loop; also the core of a desugared `repita`.
    While {
        condition: Expr,
        body: Box<Stmt>,
        /// Increment of a desugared `repita`, run after a `continue`.
        fallback_increment: Option<Box<Stmt>>,
    },

    Break(Token),

    Continue(Token),

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    Return {
        /// The `retorne` keyword (or `=>` of an expression lambda).
        keyword: Token,

        /// Absent ⇒ `nulo` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
