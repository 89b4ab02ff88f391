//! The two-phase AST walker.
//!
//! [`walk`] visits a subtree in two phases: [`Visitor::enter`] runs
//! pre-order and decides whether to descend ([`Step::Into`]), skip the
//! subtree ([`Step::Over`]), or abort the whole walk ([`Step::Halt`]);
//! [`Visitor::exit`] runs post-order and aborts by returning `false`.
//!
//! An abort propagates out of every enclosing `walk` call, including walks
//! a visitor started itself from inside `enter` - that is how a `ret`
//! statement deep inside nested braces and `if` branches terminates the
//! whole function body in one step. Both the capture analyser and the
//! evaluator are visitors over this walker.

use crate::ast::{NodeId, NodeKind};
use crate::context::Context;

/// What to do after entering a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Descend into the node's children.
    Into,
    /// Skip the node's children; the walk continues with the next sibling.
    /// The node's `exit` is not called.
    Over,
    /// Abort the walk. Propagates through every enclosing `walk` call.
    Halt,
}

/// A two-phase visitor over the AST.
pub trait Visitor {
    /// Called when the walk enters a node (pre-order).
    fn enter(&mut self, context: &Context<'_>, id: NodeId) -> Step;

    /// Called when the walk exits a node (post-order). Returning `false`
    /// aborts the walk.
    fn exit(&mut self, context: &Context<'_>, id: NodeId) -> bool;
}

/// Walks the subtree rooted at `id`. Returns `false` if the walk was
/// aborted.
pub fn walk<V: Visitor>(context: &Context<'_>, id: NodeId, visitor: &mut V) -> bool {
    match visitor.enter(context, id) {
        Step::Over => return true,
        Step::Halt => return false,
        Step::Into => {}
    }

    let node = &context[id];
    match &node.kind {
        NodeKind::TopDecl { stmts } | NodeKind::Brace { stmts, .. } => {
            for &stmt in stmts {
                if !walk(context, stmt, visitor) {
                    return false;
                }
            }
        }

        NodeKind::VarDecl { initializer, .. } => {
            if !initializer.is_none() && !walk(context, *initializer, visitor) {
                return false;
            }
        }

        NodeKind::FunDecl { body, .. } | NodeKind::ObjDecl { body, .. } => {
            if !walk(context, *body, visitor) {
                return false;
            }
        }

        NodeKind::Unary { operand, .. } => {
            if !walk(context, *operand, visitor) {
                return false;
            }
        }

        NodeKind::Binary { lhs, rhs, .. } => {
            if !walk(context, *lhs, visitor) {
                return false;
            }
            if !walk(context, *rhs, visitor) {
                return false;
            }
        }

        NodeKind::Member { base, .. } => {
            if !walk(context, *base, visitor) {
                return false;
            }
        }

        NodeKind::Apply { callee, args } => {
            if !walk(context, *callee, visitor) {
                return false;
            }
            for &arg in args {
                if !walk(context, arg, visitor) {
                    return false;
                }
            }
        }

        NodeKind::Paren(subexpr) | NodeKind::ExprStmt(subexpr) | NodeKind::Ret(subexpr) => {
            if !walk(context, *subexpr, visitor) {
                return false;
            }
        }

        NodeKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if !walk(context, *cond, visitor) {
                return false;
            }
            if !walk(context, *then_branch, visitor) {
                return false;
            }
            if !else_branch.is_none() && !walk(context, *else_branch, visitor) {
                return false;
            }
        }

        NodeKind::While { cond, body } => {
            if !walk(context, *cond, visitor) {
                return false;
            }
            if !walk(context, *body, visitor) {
                return false;
            }
        }

        NodeKind::Error
        | NodeKind::DeclRef(_)
        | NodeKind::Bool(_)
        | NodeKind::Integer(_)
        | NodeKind::Float(_)
        | NodeKind::Brk
        | NodeKind::Nxt => {}
    }

    visitor.exit(context, id)
}
