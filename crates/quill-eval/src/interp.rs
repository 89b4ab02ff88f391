//! The tree-walking evaluator.
//!
//! The interpreter is a [`Visitor`] over the parsed arena. Expressions
//! communicate through a value stack: literal and reference exits push,
//! operator exits pop their operands and push the result, and statement
//! exits drain whatever is left above the innermost frame's entry mark.
//! Frames form a stack; `Function` frames stop name lookup before it falls
//! back to the globals, `Anonymous` frames (braces) do not.
//!
//! Evaluation runs in two passes. The global population pass installs every
//! top-level `var` as a lazy value and every top-level `fun` as a function
//! value. The execution pass then walks the top-level statement groups.
//! A global's initializer is only evaluated when a reference resolves to
//! it, inside a fresh function frame; the stored cell is not updated, so
//! each access re-evaluates the initializer.

use std::io::Write;

use quill_lex::{Token, TokenKind};
use quill_par::{walk, Context, NodeId, NodeKind, Step, Visitor};
use quill_sem::captures;
use quill_util::{Diagnostic, Handler, Span, SymTable};

use crate::frame::{Frame, FrameKind};
use crate::value::Value;

/// Capacity of the value stack. Overflow is a fatal invariant violation.
pub const VALUE_STACK_SIZE: usize = 1024;

/// The evaluator's exit status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Evaluation completed (or is still running).
    Ok,
    /// A `brk` statement is unwinding to the innermost `while`.
    Break,
    /// A runtime error was reported.
    Error,
}

/// The interpreter state.
pub struct Interp<'h> {
    handler: &'h Handler,
    out: Box<dyn Write + 'h>,
    status: Status,
    globals: SymTable<Value>,
    frames: Vec<Frame>,
    stack: Vec<Value>,
}

impl<'h> Interp<'h> {
    /// Creates an interpreter printing to standard output.
    pub fn new(handler: &'h Handler) -> Self {
        Self::with_output(handler, Box::new(std::io::stdout()))
    }

    /// Creates an interpreter printing to the given sink.
    pub fn with_output(handler: &'h Handler, out: Box<dyn Write + 'h>) -> Self {
        Self {
            handler,
            out,
            status: Status::Ok,
            globals: SymTable::new(),
            frames: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Evaluates a parsed program: first populates the globals from the
    /// top-level declarations, then executes the top-level statement
    /// groups in order.
    ///
    /// On return - through completion or error - the frame chain and the
    /// value stack are empty.
    pub fn eval_program(&mut self, context: &Context<'_>, decls: &[NodeId]) -> Status {
        let mut top_decls = Vec::new();

        for &decl in decls {
            match &context[decl].kind {
                NodeKind::TopDecl { .. } => top_decls.push(decl),

                NodeKind::VarDecl { name, initializer } => {
                    let value = if initializer.is_none() {
                        Value::Junk
                    } else {
                        Value::Lazy(*initializer)
                    };
                    // Failures are reported but do not abort the pass.
                    self.declare(context, *name, value, true);
                }

                NodeKind::FunDecl { name, .. } => {
                    let value = Value::Function { decl, env: None };
                    self.declare(context, *name, value, true);
                }

                _ => {
                    self.report(context[decl].span, "object declarations are not implemented");
                }
            }
        }

        for &decl in &top_decls {
            if !self.eval(context, decl) {
                break;
            }
        }

        self.frames.clear();
        self.stack.clear();
        self.status
    }

    /// Returns the current value-stack depth.
    pub fn value_stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the current frame-chain depth.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the value of a global, if declared.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    // =========================================================================
    // Runtime plumbing
    // =========================================================================

    /// Walks a subtree with this interpreter as the visitor.
    fn eval(&mut self, context: &Context<'_>, id: NodeId) -> bool {
        walk(context, id, &mut *self)
    }

    /// Reports a runtime error and puts the interpreter in the error state.
    fn report(&mut self, span: Span, message: impl Into<String>) {
        self.handler.emit(Diagnostic::error(message, span));
        self.status = Status::Error;
    }

    fn push_value(&mut self, value: Value) {
        assert!(self.stack.len() < VALUE_STACK_SIZE, "value stack overflow");
        self.stack.push(value);
    }

    /// Pops the top of the stack, or junk if nothing is there. The guarded
    /// cases only arise from expressions that legitimately produce no
    /// value (a `print` call), where junk is the defined result.
    fn pop_value(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    /// Pops the value a statement's expression left on the stack, if it
    /// left one.
    fn pop_statement_value(&mut self) -> Value {
        let mark = self.frames.last().map_or(0, |frame| frame.value_index);
        if self.stack.len() > mark {
            self.pop_value()
        } else {
            Value::Junk
        }
    }

    fn push_frame(&mut self, kind: FrameKind) {
        self.frames.push(Frame::new(kind, self.stack.len()));
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Looks a name up in the frame locals, innermost first. A function
    /// frame ends the lexical chain; the search then falls back to the
    /// globals.
    fn lookup(&self, name: &str) -> Option<&Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.locals.get(name) {
                return Some(value);
            }
            if frame.kind == FrameKind::Function {
                break;
            }
        }
        self.globals.get(name)
    }

    /// Mutable variant of [`lookup`](Self::lookup), used by assignment.
    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        let mut found = None;
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if frame.locals.get(name).is_some() {
                found = Some(index);
                break;
            }
            if frame.kind == FrameKind::Function {
                break;
            }
        }
        match found {
            Some(index) => self.frames[index].locals.get_mut(name),
            None => self.globals.get_mut(name),
        }
    }

    /// Declares a name in the chosen table. Declaring the reserved name
    /// `print` or an already-declared name reports an error and returns
    /// false; the caller decides whether that poisons the evaluation.
    fn declare(&mut self, context: &Context<'_>, name: Token, value: Value, global: bool) -> bool {
        let text = context.token_text(&name);

        if text == "print" {
            self.handler.emit(Diagnostic::error(
                "invalid declaration, 'print' is a reserved identifier",
                name.span,
            ));
            return false;
        }

        let table = if global {
            &mut self.globals
        } else {
            match self.frames.last_mut() {
                Some(frame) => &mut frame.locals,
                None => &mut self.globals,
            }
        };

        if table.insert(text, value).is_some() {
            self.handler.emit(Diagnostic::error(
                format!("duplicate declaration '{text}'"),
                name.span,
            ));
            return false;
        }

        true
    }

    // =========================================================================
    // Node semantics
    // =========================================================================

    /// Creates a function value, deep-copying every captured binding into
    /// its environment, and binds it in the current frame.
    fn declare_function(&mut self, context: &Context<'_>, id: NodeId, name: Token) -> bool {
        let text = context.token_text(&name);

        if text == "print" {
            self.report(
                name.span,
                "invalid declaration, 'print' is a reserved identifier",
            );
            return false;
        }
        let already_declared = match self.frames.last() {
            Some(frame) => frame.locals.get(text).is_some(),
            None => self.globals.get(text).is_some(),
        };
        if already_declared {
            self.report(name.span, format!("duplicate declaration '{text}'"));
            return false;
        }

        let capture_set = captures(context, self.handler, id);
        let mut env = None;
        if !capture_set.is_empty() {
            let mut table = SymTable::new();
            for token in capture_set.iter() {
                let captured = context.token_text(token);
                let Some(value) = self.lookup(captured) else {
                    self.report(token.span, format!("undefined identifier '{captured}'"));
                    return false;
                };
                let copy = value.clone();
                let _ = table.insert(captured, copy);
            }
            env = Some(Box::new(table));
        }

        let value = Value::Function { decl: id, env };
        self.declare(context, name, value, false)
    }

    /// Resolves a name reference and pushes its value. A lazy global is
    /// evaluated on the spot in a fresh function frame; the stored cell is
    /// left as-is, so the next access evaluates again.
    fn eval_declref(&mut self, context: &Context<'_>, token: Token) -> bool {
        let text = context.token_text(&token);

        if text == "print" {
            self.push_value(Value::Print);
            return true;
        }

        let Some(value) = self.lookup(text) else {
            self.report(token.span, format!("undefined identifier '{text}'"));
            return false;
        };

        if let Value::Lazy(initializer) = value {
            let initializer = *initializer;
            self.push_frame(FrameKind::Function);
            let completed = self.eval(context, initializer);
            self.pop_frame();
            completed
        } else {
            let copy = value.clone();
            self.push_value(copy);
            true
        }
    }

    /// Binds the value a `var` statement's initializer produced.
    fn eval_var_decl(&mut self, context: &Context<'_>, name: Token, has_initializer: bool) -> bool {
        let value = if has_initializer {
            self.pop_statement_value()
        } else {
            Value::Junk
        };

        if self.declare(context, name, value, false) {
            true
        } else {
            self.status = Status::Error;
            false
        }
    }

    /// Evaluates an assignment: the target must be a name reference and
    /// must already resolve; the right-hand side's value is moved into the
    /// resolved cell. Nothing is pushed.
    fn eval_assign(&mut self, context: &Context<'_>, lhs: NodeId, rhs: NodeId) -> bool {
        let NodeKind::DeclRef(target) = context[lhs].kind else {
            self.report(context[lhs].span, "expression is not assignable");
            return false;
        };

        let text = context.token_text(&target);
        if self.lookup(text).is_none() {
            self.report(target.span, format!("undefined identifier '{text}'"));
            return false;
        }

        let depth = self.stack.len();
        if !self.eval(context, rhs) {
            return false;
        }
        let value = if self.stack.len() > depth {
            self.pop_value()
        } else {
            Value::Junk
        };

        if let Some(cell) = self.lookup_mut(text) {
            *cell = value;
        }
        true
    }

    /// Evaluates an `if`: the condition must produce a Boolean; only the
    /// chosen branch is walked.
    fn eval_if(
        &mut self,
        context: &Context<'_>,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> bool {
        let depth = self.stack.len();
        if !self.eval(context, cond) {
            return false;
        }
        let value = if self.stack.len() > depth {
            self.pop_value()
        } else {
            Value::Junk
        };

        let Value::Bool(taken) = value else {
            self.report(
                context[cond].span,
                "'if' condition must evaluate to a Boolean value",
            );
            return false;
        };

        let branch = if taken { then_branch } else { else_branch };
        if branch.is_none() {
            return true;
        }
        self.eval(context, branch)
    }

    /// Evaluates a `while`: re-check the condition, run the body, drain
    /// any frames the body left behind, then sort exits by status - a
    /// break clears to Ok and leaves the loop, an error propagates, and
    /// anything else re-enters the condition.
    fn eval_while(&mut self, context: &Context<'_>, cond: NodeId, body: NodeId) -> bool {
        let frame_depth = self.frames.len();

        loop {
            let depth = self.stack.len();
            if !self.eval(context, cond) {
                return false;
            }
            let value = if self.stack.len() > depth {
                self.pop_value()
            } else {
                Value::Junk
            };

            let Value::Bool(enter) = value else {
                self.report(
                    context[cond].span,
                    "'while' condition must evaluate to a Boolean value",
                );
                return false;
            };
            if !enter {
                return true;
            }

            self.eval(context, body);
            self.frames.truncate(frame_depth);

            match self.status {
                Status::Break => {
                    self.status = Status::Ok;
                    return true;
                }
                Status::Error => return false,
                Status::Ok => {}
            }
        }
    }

    /// Applies a unary operator to the value on top of the stack.
    fn eval_unary(&mut self, context: &Context<'_>, id: NodeId, op: Token) -> bool {
        let value = self.pop_value();

        let result = match (op.kind, value) {
            (TokenKind::Plus, Value::Int(v)) => Some(Value::Int(v)),
            (TokenKind::Minus, Value::Int(v)) => Some(Value::Int(v.wrapping_neg())),
            (TokenKind::Tilde, Value::Int(v)) => Some(Value::Int(!v)),
            (TokenKind::Plus, Value::Float(v)) => Some(Value::Float(v)),
            (TokenKind::Minus, Value::Float(v)) => Some(Value::Float(-v)),
            (TokenKind::Not, Value::Bool(v)) => Some(Value::Bool(!v)),
            (_, other) => {
                self.report(
                    context[id].span,
                    format!(
                        "unary operator '{}' is not defined for value of type '{}'",
                        context.token_text(&op),
                        other.type_name(),
                    ),
                );
                None
            }
        };

        match result {
            Some(value) => {
                self.push_value(value);
                true
            }
            None => false,
        }
    }

    /// Pops both operands of a non-assignment binary expression and pushes
    /// the result. On a type error nothing is pushed.
    fn eval_binary(&mut self, context: &Context<'_>, id: NodeId, op: Token) -> bool {
        let rhs = self.pop_value();
        let lhs = self.pop_value();
        let span = context[id].span;

        // Every binary operator takes a pair of the same type.
        let result = match (op.kind, &lhs, &rhs) {
            (TokenKind::Shl, Value::Int(a), Value::Int(b)) => {
                Some(Value::Int(a.wrapping_shl(*b as u32)))
            }
            (TokenKind::Shr, Value::Int(a), Value::Int(b)) => {
                Some(Value::Int(a.wrapping_shr(*b as u32)))
            }
            (TokenKind::Star, Value::Int(a), Value::Int(b)) => {
                Some(Value::Int(a.wrapping_mul(*b)))
            }
            (TokenKind::Slash, Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    self.report(span, "division by zero");
                    return false;
                }
                Some(Value::Int(a.wrapping_div(*b)))
            }
            (TokenKind::Percent, Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    self.report(span, "division by zero");
                    return false;
                }
                Some(Value::Int(a.wrapping_rem(*b)))
            }
            (TokenKind::Plus, Value::Int(a), Value::Int(b)) => {
                Some(Value::Int(a.wrapping_add(*b)))
            }
            (TokenKind::Minus, Value::Int(a), Value::Int(b)) => {
                Some(Value::Int(a.wrapping_sub(*b)))
            }
            (TokenKind::Pipe, Value::Int(a), Value::Int(b)) => Some(Value::Int(a | b)),
            (TokenKind::Amp, Value::Int(a), Value::Int(b)) => Some(Value::Int(a & b)),
            (TokenKind::Caret, Value::Int(a), Value::Int(b)) => Some(Value::Int(a ^ b)),
            (TokenKind::Lt, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a < b)),
            (TokenKind::Le, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a <= b)),
            (TokenKind::Gt, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a > b)),
            (TokenKind::Ge, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a >= b)),
            (TokenKind::EqEq, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a == b)),
            (TokenKind::Ne, Value::Int(a), Value::Int(b)) => Some(Value::Bool(a != b)),

            (TokenKind::Star, Value::Float(a), Value::Float(b)) => Some(Value::Float(a * b)),
            (TokenKind::Slash, Value::Float(a), Value::Float(b)) => Some(Value::Float(a / b)),
            (TokenKind::Percent, Value::Float(a), Value::Float(b)) => Some(Value::Float(a % b)),
            (TokenKind::Plus, Value::Float(a), Value::Float(b)) => Some(Value::Float(a + b)),
            (TokenKind::Minus, Value::Float(a), Value::Float(b)) => Some(Value::Float(a - b)),
            (TokenKind::Lt, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a < b)),
            (TokenKind::Le, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a <= b)),
            (TokenKind::Gt, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a > b)),
            (TokenKind::Ge, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a >= b)),
            (TokenKind::EqEq, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a == b)),
            (TokenKind::Ne, Value::Float(a), Value::Float(b)) => Some(Value::Bool(a != b)),

            (TokenKind::And, Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(*a && *b)),
            (TokenKind::Or, Value::Bool(a), Value::Bool(b)) => Some(Value::Bool(*a || *b)),

            _ => None,
        };

        match result {
            Some(value) => {
                self.push_value(value);
                true
            }
            None => {
                self.report(
                    span,
                    format!(
                        "operator '{}' is not defined for values of type '{}' and '{}'",
                        context.token_text(&op),
                        lhs.type_name(),
                        rhs.type_name(),
                    ),
                );
                false
            }
        }
    }

    /// Applies the callee sitting under `argc` arguments on the stack.
    ///
    /// For the `print` intrinsic: print the argument, drop callee and
    /// arguments, push nothing. For a function value: bind parameters and
    /// the captured environment in a fresh function frame, walk the body,
    /// and replace the callee slot with the body's residual value.
    fn eval_apply(&mut self, context: &Context<'_>, id: NodeId, argc: usize) -> bool {
        let span = context[id].span;
        let Some(callee_pos) = self.stack.len().checked_sub(argc + 1) else {
            self.report(span, "bad callee");
            return false;
        };

        let callee = self.stack[callee_pos].clone();
        match callee {
            Value::Print => {
                if argc == 0 {
                    self.report(span, "'print' expects an argument");
                    return false;
                }
                let rendered = self.stack[callee_pos + 1].to_string();
                let _ = writeln!(self.out, "{rendered}");
                self.stack.truncate(callee_pos);
                true
            }

            Value::Function { decl, env } => {
                let NodeKind::FunDecl { params, body, .. } = &context[decl].kind else {
                    self.report(span, "bad callee");
                    return false;
                };
                let params = params.clone();
                let body = *body;

                let frame_depth = self.frames.len();
                self.push_frame(FrameKind::Function);

                // Parameters bind in reverse so parameter 0 gets argument 0.
                // Missing arguments bind junk; extra arguments are dropped.
                let mut args: Vec<Value> = self.stack.drain(callee_pos + 1..).collect();
                for (index, param) in params.iter().enumerate() {
                    let value = match args.get_mut(index) {
                        Some(slot) => std::mem::take(slot),
                        None => Value::Junk,
                    };
                    if !self.declare(context, *param, value, false) {
                        self.status = Status::Error;
                        return false;
                    }
                }

                // Copy the captured environment into the locals; parameters
                // shadow captures of the same name.
                if let Some(env) = env {
                    if let Some(frame) = self.frames.last_mut() {
                        for (key, value) in env.into_entries() {
                            let _ = frame.locals.insert(&key, value);
                        }
                    }
                }

                self.eval(context, body);
                self.frames.truncate(frame_depth);
                if self.status == Status::Error {
                    return false;
                }

                // A `ret` leaves exactly one residual value; a body that
                // falls off its end leaves none, and the call yields junk.
                let result = if self.stack.len() > callee_pos + 1 {
                    self.pop_value()
                } else {
                    Value::Junk
                };
                self.stack.truncate(callee_pos);
                self.push_value(result);
                true
            }

            _ => {
                self.report(span, "bad callee");
                false
            }
        }
    }
}

impl<'h> Visitor for Interp<'h> {
    fn enter(&mut self, context: &Context<'_>, id: NodeId) -> Step {
        if self.status == Status::Error {
            return Step::Halt;
        }

        match &context[id].kind {
            NodeKind::FunDecl { name, .. } => {
                let name = *name;
                if self.declare_function(context, id, name) {
                    Step::Over
                } else {
                    Step::Halt
                }
            }

            NodeKind::Binary { op, lhs, rhs } if op.kind == TokenKind::Assign => {
                let (lhs, rhs) = (*lhs, *rhs);
                if self.eval_assign(context, lhs, rhs) {
                    Step::Over
                } else {
                    Step::Halt
                }
            }

            NodeKind::Brace { .. } => {
                self.push_frame(FrameKind::Anonymous);
                Step::Into
            }

            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let (cond, then_branch, else_branch) = (*cond, *then_branch, *else_branch);
                if self.eval_if(context, cond, then_branch, else_branch) {
                    Step::Over
                } else {
                    Step::Halt
                }
            }

            NodeKind::While { cond, body } => {
                let (cond, body) = (*cond, *body);
                if self.eval_while(context, cond, body) {
                    Step::Over
                } else {
                    Step::Halt
                }
            }

            NodeKind::ObjDecl { .. } => {
                self.report(context[id].span, "object declarations are not implemented");
                Step::Halt
            }

            NodeKind::Error => {
                self.report(context[id].span, "cannot evaluate malformed syntax");
                Step::Halt
            }

            _ => Step::Into,
        }
    }

    fn exit(&mut self, context: &Context<'_>, id: NodeId) -> bool {
        match &context[id].kind {
            NodeKind::TopDecl { .. } => {
                debug_assert!(self.stack.is_empty());
                true
            }

            NodeKind::VarDecl { name, initializer } => {
                let (name, has_initializer) = (*name, !initializer.is_none());
                self.eval_var_decl(context, name, has_initializer)
            }

            NodeKind::DeclRef(token) => {
                let token = *token;
                self.eval_declref(context, token)
            }

            NodeKind::Bool(value) => {
                let value = *value;
                self.push_value(Value::Bool(value));
                true
            }

            NodeKind::Integer(value) => {
                let value = *value;
                self.push_value(Value::Int(value));
                true
            }

            NodeKind::Float(value) => {
                let value = *value;
                self.push_value(Value::Float(value));
                true
            }

            NodeKind::Unary { op, .. } => {
                let op = *op;
                self.eval_unary(context, id, op)
            }

            NodeKind::Binary { op, .. } => {
                if op.kind == TokenKind::Assign {
                    return true;
                }
                let op = *op;
                self.eval_binary(context, id, op)
            }

            NodeKind::Member { .. } => {
                self.report(context[id].span, "member access is not implemented");
                false
            }

            NodeKind::Apply { args, .. } => {
                let argc = args.len();
                self.eval_apply(context, id, argc)
            }

            NodeKind::ExprStmt(_) => {
                // Discard whatever the statement left above the innermost
                // frame's entry mark (the whole stack at top level).
                let mark = self.frames.last().map_or(0, |frame| frame.value_index);
                self.stack.truncate(mark);
                true
            }

            NodeKind::Brace { .. } => {
                self.pop_frame();
                true
            }

            NodeKind::Brk => {
                self.status = Status::Break;
                false
            }

            NodeKind::Nxt => false,

            // The value stays on the stack for the caller.
            NodeKind::Ret(_) => false,

            NodeKind::Paren(_)
            | NodeKind::FunDecl { .. }
            | NodeKind::If { .. }
            | NodeKind::While { .. }
            | NodeKind::ObjDecl { .. }
            | NodeKind::Error => true,
        }
    }
}
