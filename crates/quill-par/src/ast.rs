//! AST node definitions.
//!
//! Nodes live in a [`Context`](crate::Context) arena and refer to each other
//! by [`NodeId`]. Optional references use the [`NodeId::NONE`] sentinel
//! rather than `Option`, matching the arena's "indices, never pointers"
//! discipline: a `Node` stays exactly three words of header plus its
//! payload, and absent children cost nothing.

use quill_lex::Token;
use quill_util::{define_idx, Span};
use static_assertions::assert_eq_size;

define_idx!(NodeId);

assert_eq_size!(NodeId, u32);

impl NodeId {
    /// The sentinel for an absent node reference.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Returns true if this is the [`NodeId::NONE`] sentinel.
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// An AST node: a source span plus a kind-specific payload.
#[derive(Clone, Debug)]
pub struct Node {
    /// The byte range the node covers in the source input.
    pub span: Span,
    /// The node's kind and payload.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node.
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }
}

/// The kind of an AST node, with its payload.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A placeholder produced while recovering from a parse error.
    Error,

    /// A synthesised declaration wrapping a contiguous run of
    /// non-declaration statements at file level.
    TopDecl {
        /// The wrapped statements, in source order.
        stmts: Vec<NodeId>,
    },

    /// A variable declaration: `var x` or `var x = expr`.
    VarDecl {
        /// The declared name.
        name: Token,
        /// The initializer expression, or [`NodeId::NONE`].
        initializer: NodeId,
    },

    /// A function declaration: `fun f(a, b) { ... }`.
    FunDecl {
        /// The declared name.
        name: Token,
        /// The parameter names, in order.
        params: Vec<Token>,
        /// The body brace statement.
        body: NodeId,
    },

    /// An object declaration: `obj O { ... }`. Parses, but is rejected by
    /// capture analysis and evaluation.
    ObjDecl {
        /// The declared name.
        name: Token,
        /// The body brace statement.
        body: NodeId,
    },

    /// A reference to a declared name.
    DeclRef(Token),

    /// A Boolean literal.
    Bool(bool),

    /// An integer literal.
    Integer(i64),

    /// A float literal.
    Float(f64),

    /// A prefix operator application.
    Unary {
        /// The operator token.
        op: Token,
        /// The operand expression.
        operand: NodeId,
    },

    /// An infix operator application. Assignment shares this shape with
    /// operator `=`; the evaluator handles its asymmetry.
    Binary {
        /// The operator token.
        op: Token,
        /// The left operand.
        lhs: NodeId,
        /// The right operand.
        rhs: NodeId,
    },

    /// A member access: `base.name`.
    Member {
        /// The base expression.
        base: NodeId,
        /// The member name.
        member: Token,
    },

    /// A function application: `callee(args...)`.
    Apply {
        /// The callee expression.
        callee: NodeId,
        /// The argument expressions, in order.
        args: Vec<NodeId>,
    },

    /// A parenthesised expression.
    Paren(NodeId),

    /// A brace statement. Braces are the lexical scopes: each one records
    /// its enclosing brace and the declarations it contains, which capture
    /// analysis scans in reverse insertion order.
    Brace {
        /// The statements, in source order.
        stmts: Vec<NodeId>,
        /// The enclosing brace, or [`NodeId::NONE`] at file level.
        parent: NodeId,
        /// Declarations parsed while this brace was the innermost scope,
        /// in insertion order.
        decls: Vec<NodeId>,
    },

    /// An expression in statement position.
    ExprStmt(NodeId),

    /// An `if` statement.
    If {
        /// The condition expression.
        cond: NodeId,
        /// The `then` brace.
        then_branch: NodeId,
        /// The `else` statement, or [`NodeId::NONE`].
        else_branch: NodeId,
    },

    /// A `while` statement.
    While {
        /// The condition expression.
        cond: NodeId,
        /// The body brace.
        body: NodeId,
    },

    /// A `brk` statement.
    Brk,

    /// A `nxt` statement.
    Nxt,

    /// A `ret` statement with its value expression.
    Ret(NodeId),
}

impl NodeKind {
    /// Returns true for declaration nodes (top/var/fun/obj).
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::TopDecl { .. }
                | NodeKind::VarDecl { .. }
                | NodeKind::FunDecl { .. }
                | NodeKind::ObjDecl { .. }
        )
    }
}
