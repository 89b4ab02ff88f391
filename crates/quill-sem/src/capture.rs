//! Free-variable analysis of function bodies.

use quill_lex::Token;
use quill_par::{walk, Context, NodeId, NodeKind, Step, Visitor};
use quill_util::{fnv1_hash, Diagnostic, Handler};

/// Maximum number of captured identifiers per function.
pub const MAX_CAPTURE_COUNT: usize = 64;

/// A fixed-size, open-addressed set of identifier tokens.
///
/// Slots are keyed by the FNV-1 hash of the identifier text with linear
/// probing; two tokens with the same text occupy one slot. The set never
/// grows: a function captures at most [`MAX_CAPTURE_COUNT`] names, and
/// exceeding that is a fatal invariant violation.
pub struct CaptureSet {
    slots: [Option<Token>; MAX_CAPTURE_COUNT],
    len: usize,
}

impl CaptureSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_CAPTURE_COUNT],
            len: 0,
        }
    }

    /// Inserts a token, keyed by its text within `context`.
    ///
    /// Returns true if the token was inserted, false if an equal name was
    /// already present.
    ///
    /// # Panics
    ///
    /// Panics if the set is full.
    pub fn insert(&mut self, context: &Context<'_>, token: Token) -> bool {
        assert!(self.len < MAX_CAPTURE_COUNT, "capture set overflow");

        let text = context.token_text(&token);
        let mut pos = (fnv1_hash(text.as_bytes()) % MAX_CAPTURE_COUNT as u64) as usize;

        while let Some(occupant) = &self.slots[pos] {
            if context.token_text(occupant) == text {
                return false;
            }
            pos = (pos + 1) % MAX_CAPTURE_COUNT;
        }

        self.slots[pos] = Some(token);
        self.len += 1;
        true
    }

    /// Returns the number of captured names.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the captured tokens in table order (hash positions
    /// preserved).
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Returns the captured tokens as a compacted vector.
    pub fn compact(&self) -> Vec<Token> {
        self.iter().copied().collect()
    }
}

impl Default for CaptureSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks one function body, classifying every name reference.
struct CaptureVisitor<'h> {
    handler: &'h Handler,
    /// The function declaration being analysed.
    fun: NodeId,
    /// The function's body brace; the scope scan never climbs above it.
    body: NodeId,
    /// The innermost brace the walk is currently inside.
    scope: NodeId,
    set: CaptureSet,
}

impl<'h> CaptureVisitor<'h> {
    /// Returns whether `name` is bound by the function: by a `var` or `fun`
    /// declaration in an enclosing brace inside the body, by a parameter,
    /// or by the function's own name.
    fn is_local(&self, context: &Context<'_>, name: &Token) -> bool {
        let mut scope = self.scope;
        while !scope.is_none() {
            let NodeKind::Brace { decls, parent, .. } = &context[scope].kind else {
                break;
            };

            // Declarations are scanned newest-first; position within the
            // brace does not matter, only membership.
            for &decl in decls.iter().rev() {
                match &context[decl].kind {
                    NodeKind::VarDecl { name: declared, .. }
                    | NodeKind::FunDecl { name: declared, .. } => {
                        if context.token_text_equal(name, declared) {
                            return true;
                        }
                    }
                    _ => {}
                }
            }

            if scope == self.body {
                break;
            }
            scope = *parent;
        }

        if let NodeKind::FunDecl {
            name: own, params, ..
        } = &context[self.fun].kind
        {
            for param in params {
                if context.token_text_equal(name, param) {
                    return true;
                }
            }
            // A reference to the function itself is recursion, not capture.
            if context.token_text_equal(name, own) {
                return true;
            }
        }

        false
    }
}

impl<'h> Visitor for CaptureVisitor<'h> {
    fn enter(&mut self, context: &Context<'_>, id: NodeId) -> Step {
        match &context[id].kind {
            NodeKind::FunDecl { .. } => {
                // Analyse the nested function once, then propagate outward
                // whatever it captures that the current function does not
                // bind either.
                let inner = captures(context, self.handler, id);
                for token in inner.iter() {
                    if !self.is_local(context, token) {
                        self.set.insert(context, *token);
                    }
                }
                Step::Over
            }

            NodeKind::ObjDecl { .. } => {
                self.handler.emit(Diagnostic::error(
                    "object declarations are not implemented",
                    context[id].span,
                ));
                Step::Over
            }

            NodeKind::DeclRef(token) => {
                if !self.is_local(context, token) {
                    self.set.insert(context, *token);
                }
                Step::Over
            }

            NodeKind::Brace { .. } => {
                self.scope = id;
                Step::Into
            }

            _ => Step::Into,
        }
    }

    fn exit(&mut self, context: &Context<'_>, id: NodeId) -> bool {
        if let NodeKind::Brace { parent, .. } = context[id].kind {
            self.scope = parent;
        }
        true
    }
}

/// Returns the set of identifiers occurring free in the body of the
/// function declared at `fun`.
pub fn captures(context: &Context<'_>, handler: &Handler, fun: NodeId) -> CaptureSet {
    let NodeKind::FunDecl { body, .. } = context[fun].kind else {
        return CaptureSet::new();
    };

    let mut visitor = CaptureVisitor {
        handler,
        fun,
        body,
        scope: body,
        set: CaptureSet::new(),
    };
    walk(context, body, &mut visitor);
    visitor.set
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_par::Parser;

    /// Parses `source` and returns the context plus every function
    /// declaration in allocation order.
    fn parse_funs(source: &'static str) -> (Context<'static>, Vec<NodeId>, Handler) {
        let handler = Handler::new();
        let mut context = Context::new(source);
        Parser::new(&mut context, &handler).parse();
        assert!(!handler.has_errors(), "parse failed: {source}");

        let funs: Vec<NodeId> = context
            .iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::FunDecl { .. }))
            .map(|(id, _)| id)
            .collect();
        (context, funs, handler)
    }

    /// Finds the function declaration with the given name.
    fn fun_named(context: &Context<'_>, funs: &[NodeId], wanted: &str) -> NodeId {
        *funs
            .iter()
            .find(|&&id| match &context[id].kind {
                NodeKind::FunDecl { name, .. } => context.token_text(name) == wanted,
                _ => false,
            })
            .unwrap()
    }

    fn capture_names(context: &Context<'_>, set: &CaptureSet) -> Vec<String> {
        let mut names: Vec<String> = set
            .iter()
            .map(|token| context.token_text(token).to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_no_free_variables() {
        let (context, funs, handler) = parse_funs("fun f(n) { var m = n ret m }");
        let set = captures(&context, &handler, funs[0]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_global_reference_is_free() {
        let (context, funs, handler) = parse_funs("fun f() { ret g + h }");
        let set = captures(&context, &handler, funs[0]);
        assert_eq!(capture_names(&context, &set), vec!["g", "h"]);
    }

    #[test]
    fn test_repeated_reference_captured_once() {
        let (context, funs, handler) = parse_funs("fun f() { ret a + a + a }");
        let set = captures(&context, &handler, funs[0]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_recursion_is_not_a_capture() {
        let (context, funs, handler) = parse_funs("fun f(n) { ret f(n - 1) }");
        let set = captures(&context, &handler, funs[0]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_parameter_shadows_outer_name() {
        let (context, funs, handler) = parse_funs("fun f(a) { ret a + b }");
        let set = captures(&context, &handler, funs[0]);
        assert_eq!(capture_names(&context, &set), vec!["b"]);
    }

    #[test]
    fn test_nested_brace_declaration_binds() {
        let (context, funs, handler) =
            parse_funs("fun f() { { var y = 1 ret y + z } }");
        let set = captures(&context, &handler, funs[0]);
        assert_eq!(capture_names(&context, &set), vec!["z"]);
    }

    #[test]
    fn test_declaration_later_in_brace_still_binds() {
        // Membership in the brace is what counts, not position.
        let (context, funs, handler) = parse_funs("fun f() { ret y var y = 1 }");
        let set = captures(&context, &handler, funs[0]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_closure_captures_enclosing_parameter() {
        let (context, funs, handler) =
            parse_funs("fun make(a) { fun g(b) { ret a + b } ret g }");

        let g = fun_named(&context, &funs, "g");
        let set = captures(&context, &handler, g);
        assert_eq!(capture_names(&context, &set), vec!["a"]);

        // `a` is make's parameter and `g` is declared in its body, so make
        // itself captures nothing.
        let make = fun_named(&context, &funs, "make");
        let set = captures(&context, &handler, make);
        assert!(set.is_empty());
    }

    #[test]
    fn test_sibling_function_reference_is_bound() {
        let (context, funs, handler) =
            parse_funs("fun f() { fun a() { ret 1 } fun b() { ret a() } ret b }");
        let f = fun_named(&context, &funs, "f");
        let set = captures(&context, &handler, f);
        assert!(set.is_empty());
    }

    #[test]
    fn test_transitive_capture_propagates() {
        // `x` is free in inner, not bound by mid, bound by outer's
        // parameter list: inner and mid both capture it, outer does not.
        let source = "fun outer(x) { fun mid() { fun inner() { ret x } ret inner } ret mid }";
        let (context, funs, handler) = parse_funs(source);

        let inner = fun_named(&context, &funs, "inner");
        let set = captures(&context, &handler, inner);
        assert_eq!(capture_names(&context, &set), vec!["x"]);

        let mid = fun_named(&context, &funs, "mid");
        let set = captures(&context, &handler, mid);
        assert_eq!(capture_names(&context, &set), vec!["x"]);

        let outer = fun_named(&context, &funs, "outer");
        let set = captures(&context, &handler, outer);
        assert!(set.is_empty());
    }

    #[test]
    fn test_obj_in_body_reports_not_implemented() {
        let handler = Handler::new();
        let mut context = Context::new("fun f() { obj o { } ret 1 }");
        Parser::new(&mut context, &handler).parse();
        assert!(!handler.has_errors());

        let fun = context
            .iter()
            .find(|(_, node)| matches!(node.kind, NodeKind::FunDecl { .. }))
            .map(|(id, _)| id)
            .unwrap();
        captures(&context, &handler, fun);
        assert!(handler.has_errors());
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "object declarations are not implemented"));
    }

    #[test]
    fn test_capture_set_probing() {
        let (context, funs, handler) = parse_funs(
            "fun f() { ret a0+a1+a2+a3+a4+a5+a6+a7+a8+a9+b0+b1+b2+b3+b4+b5+b6+b7+b8+b9 }",
        );
        let set = captures(&context, &handler, funs[0]);
        assert_eq!(set.len(), 20);
        assert_eq!(set.compact().len(), 20);
    }
}
