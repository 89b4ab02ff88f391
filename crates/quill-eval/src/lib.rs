//! quill-eval - Tree-Walking Evaluator
//!
//! The last phase of the pipeline: walks the parsed arena and executes it.
//! [`Interp`] owns the runtime state - the global symbol table, the frame
//! chain, and the value stack - and implements the two-phase AST visitor.
//! Closures are built with the capture sets computed by `quill-sem`;
//! captured bindings are deep-copied, never aliased.

pub mod frame;
pub mod interp;
pub mod value;

mod edge_cases;

pub use frame::{Frame, FrameKind};
pub use interp::{Interp, Status, VALUE_STACK_SIZE};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use quill_par::{Context, Parser};
    use quill_util::Handler;

    /// Parses and evaluates `source`, returning the printed output, the
    /// evaluator status, and the handler with any diagnostics.
    fn run(source: &'static str) -> (String, Status, Handler) {
        let handler = Handler::new();
        let mut context = Context::new(source);
        let decls = Parser::new(&mut context, &handler).parse();
        assert!(!handler.has_errors(), "parse failed: {source}");

        let mut out = Vec::new();
        let status = {
            let mut interp = Interp::with_output(&handler, Box::new(&mut out));
            let status = interp.eval_program(&context, &decls);
            assert_eq!(interp.value_stack_depth(), 0);
            assert_eq!(interp.frame_depth(), 0);
            status
        };

        (String::from_utf8(out).unwrap(), status, handler)
    }

    fn run_ok(source: &'static str) -> String {
        let (out, status, handler) = run(source);
        assert_eq!(status, Status::Ok, "unexpected status for: {source}");
        assert!(!handler.has_errors(), "unexpected errors for: {source}");
        out
    }

    fn run_err(source: &'static str) -> (String, Handler) {
        let (out, status, handler) = run(source);
        assert_eq!(status, Status::Error, "expected error for: {source}");
        assert!(handler.has_errors());
        (out, handler)
    }

    // =========================================================================
    // ARITHMETIC AND OPERATORS
    // =========================================================================

    #[test]
    fn test_print_arithmetic() {
        assert_eq!(run_ok("print(40 + 2)"), "42\n");
    }

    #[test]
    fn test_operator_precedence_in_eval() {
        assert_eq!(run_ok("print(2 + 3 * 4)"), "14\n");
        assert_eq!(run_ok("print((2 + 3) * 4)"), "20\n");
        assert_eq!(run_ok("print(10 - 2 - 3)"), "5\n");
    }

    #[test]
    fn test_integer_operators() {
        assert_eq!(run_ok("print(7 / 2)"), "3\n");
        assert_eq!(run_ok("print(7 % 2)"), "1\n");
        assert_eq!(run_ok("print(1 << 4)"), "16\n");
        assert_eq!(run_ok("print(16 >> 2)"), "4\n");
        assert_eq!(run_ok("print(6 & 3)"), "2\n");
        assert_eq!(run_ok("print(6 | 3)"), "7\n");
        assert_eq!(run_ok("print(6 ^ 3)"), "5\n");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run_ok("print(1 < 2)"), "true\n");
        assert_eq!(run_ok("print(2 <= 1)"), "false\n");
        assert_eq!(run_ok("print(2 == 2)"), "true\n");
        assert_eq!(run_ok("print(2 != 2)"), "false\n");
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(run_ok("print(true and false)"), "false\n");
        assert_eq!(run_ok("print(true or false)"), "true\n");
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(run_ok("print(1.5 + 2.25)"), "3.75\n");
        assert_eq!(run_ok("print(1.5 < 2.5)"), "true\n");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(run_ok("print(-(1 + 2))"), "-3\n");
        assert_eq!(run_ok("print(!true)"), "false\n");
        assert_eq!(run_ok("print(~0)"), "-1\n");
        assert_eq!(run_ok("print(+7)"), "7\n");
    }

    #[test]
    fn test_prefix_binds_loosely() {
        // -a + b evaluates as -(a + b).
        assert_eq!(run_ok("print(-1 + 2)"), "-3\n");
    }

    // =========================================================================
    // GLOBALS AND ASSIGNMENT
    // =========================================================================

    #[test]
    fn test_global_assignment() {
        assert_eq!(run_ok("var x = 1; x = x + 2; print(x)"), "3\n");
    }

    #[test]
    fn test_uninitialised_global_is_junk() {
        assert_eq!(run_ok("var u print(u)"), "$junk\n");
    }

    #[test]
    fn test_lazy_global_reevaluates_on_each_access() {
        // Each access to `g` re-runs `noisy()`; the cell is not memoised.
        let source = "fun noisy() { print(1) ret 2 } var g = noisy() print(g) print(g)";
        assert_eq!(run_ok(source), "1\n2\n1\n2\n");
    }

    #[test]
    fn test_lazy_global_chains() {
        assert_eq!(run_ok("var a = 1 var b = a + 1 print(b)"), "2\n");
    }

    #[test]
    fn test_assignment_replaces_lazy_cell() {
        let source = "fun noisy() { print(1) ret 2 } var g = noisy() g = 5 print(g) print(g)";
        assert_eq!(run_ok(source), "5\n5\n");
    }

    #[test]
    fn test_local_variables_in_brace() {
        assert_eq!(run_ok("{ var x = 1 var y = 2 print(x + y) }"), "3\n");
    }

    // =========================================================================
    // FUNCTIONS AND CLOSURES
    // =========================================================================

    #[test]
    fn test_recursive_function() {
        let source = "fun f(n) { if n < 2 { ret n } ret f(n-1) + f(n-2) } print(f(10))";
        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_closure_captures_parameter() {
        let source = "fun make(a) { fun g(b) { ret a + b } ret g } print(make(10)(32))";
        assert_eq!(run_ok(source), "42\n");
    }

    #[test]
    fn test_closure_stored_in_local() {
        let source = "fun make(a) { fun g(b) { ret a + b } ret g } \
                      { var add10 = make(10) print(add10(1)) print(add10(2)) }";
        assert_eq!(run_ok(source), "11\n12\n");
    }

    #[test]
    fn test_capture_is_a_deep_copy() {
        // `f` copies `a` when it is declared; the later assignment is
        // invisible to it.
        let source = "{ var a = 1 fun f() { ret a } a = 2 print(f()) }";
        assert_eq!(run_ok(source), "1\n");
    }

    #[test]
    fn test_global_function_reads_globals_at_call_time() {
        assert_eq!(run_ok("var g = 5 fun f() { ret g } print(f())"), "5\n");
    }

    #[test]
    fn test_function_value_prints_as_function() {
        assert_eq!(run_ok("fun f() { ret 1 } print(f)"), "$function\n");
        assert_eq!(run_ok("print(print)"), "$function\n");
    }

    #[test]
    fn test_missing_arguments_bind_junk() {
        assert_eq!(run_ok("fun f(a, b) { ret b } print(f(1))"), "$junk\n");
    }

    #[test]
    fn test_extra_arguments_are_dropped() {
        assert_eq!(run_ok("fun f(a) { ret a } print(f(1, 2, 3))"), "1\n");
    }

    #[test]
    fn test_call_without_ret_yields_junk() {
        assert_eq!(run_ok("fun f() { 1 + 1 } print(f())"), "$junk\n");
    }

    #[test]
    fn test_print_call_produces_no_value() {
        assert_eq!(run_ok("{ var y = print(1) print(y) }"), "1\n$junk\n");
    }

    // =========================================================================
    // CONTROL FLOW
    // =========================================================================

    #[test]
    fn test_while_loop_counts() {
        let source = "var i = 0; while i < 3 { print(i); i = i + 1 }";
        assert_eq!(run_ok(source), "0\n1\n2\n");
    }

    #[test]
    fn test_if_else_branches() {
        assert_eq!(run_ok("if true { print(1) } else { print(2) }"), "1\n");
        assert_eq!(run_ok("if false { print(1) } else { print(2) }"), "2\n");
        assert_eq!(run_ok("if false { print(1) }"), "");
    }

    #[test]
    fn test_brk_exits_loop() {
        let source = "var i = 0 while true { i = i + 1 if i == 3 { brk } } print(i)";
        assert_eq!(run_ok(source), "3\n");
    }

    #[test]
    fn test_brk_exits_innermost_loop_only() {
        let source = "var i = 0 var total = 0 \
                      while i < 2 { i = i + 1 while true { total = total + 10 brk } } \
                      print(total)";
        assert_eq!(run_ok(source), "20\n");
    }

    #[test]
    fn test_nxt_continues_loop() {
        let source = "var i = 0 var s = 0 \
                      while i < 5 { i = i + 1 if i == 2 { nxt } s = s + i } \
                      print(s)";
        assert_eq!(run_ok(source), "13\n");
    }

    #[test]
    fn test_ret_through_nested_braces() {
        let source = "fun f() { { { ret 7 } } } print(f())";
        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn test_statements_leave_stack_clean() {
        // Bare expressions at statement position are evaluated and
        // discarded.
        assert_eq!(run_ok("1 + 2\n3 * 4\nprint(5)"), "5\n");
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[test]
    fn test_type_error_int_plus_bool() {
        let (out, handler) = run_err("print(1 + true)");
        assert_eq!(out, "");
        assert!(handler.diagnostics().iter().any(|d| {
            d.message == "operator '+' is not defined for values of type 'Int' and 'Bool'"
        }));
    }

    #[test]
    fn test_type_error_mixed_numerics() {
        // Int and Float do not mix implicitly.
        let (_, handler) = run_err("print(1 + 2.5)");
        assert!(handler.diagnostics().iter().any(|d| {
            d.message == "operator '+' is not defined for values of type 'Int' and 'Float'"
        }));
    }

    #[test]
    fn test_unary_type_error() {
        let (_, handler) = run_err("print(-true)");
        assert!(handler.diagnostics().iter().any(|d| {
            d.message == "unary operator '-' is not defined for value of type 'Bool'"
        }));
    }

    #[test]
    fn test_undefined_identifier() {
        let (_, handler) = run_err("print(nope)");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "undefined identifier 'nope'"));
    }

    #[test]
    fn test_non_boolean_condition_is_an_error() {
        let (_, handler) = run_err("if 1 { }");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "'if' condition must evaluate to a Boolean value"));

        let (_, handler) = run_err("while 1 { }");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "'while' condition must evaluate to a Boolean value"));
    }

    #[test]
    fn test_division_by_zero() {
        let (_, handler) = run_err("print(1 / 0)");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "division by zero"));
        let (_, handler) = run_err("print(1 % 0)");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "division by zero"));
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, handler) = run_err("var x = 1\nx()");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "bad callee"));
    }

    #[test]
    fn test_member_access_is_rejected() {
        let (_, handler) = run_err("var x = 1\nx.y");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "member access is not implemented"));
    }

    #[test]
    fn test_duplicate_local_declaration() {
        let (_, handler) = run_err("{ var x = 1 var x = 2 }");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "duplicate declaration 'x'"));
    }

    #[test]
    fn test_reserved_print_in_globals() {
        // The global pass reports the reserved name but does not abort.
        let (_, status, handler) = run("var print = 1");
        assert_eq!(status, Status::Ok);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "invalid declaration, 'print' is a reserved identifier"));
    }

    #[test]
    fn test_obj_declaration_is_rejected() {
        let (_, status, handler) = run("obj point { }");
        assert_eq!(status, Status::Error);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "object declarations are not implemented"));
    }

    #[test]
    fn test_assignment_to_non_declref() {
        let (_, handler) = run_err("var x = 1\n1 = x");
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "expression is not assignable"));
    }

    #[test]
    fn test_error_in_loop_body_propagates() {
        let (out, handler) = run_err("var i = 0 while i < 3 { print(i) i = i + true }");
        assert_eq!(out, "0\n");
        assert!(handler.error_count() >= 1);
    }
}
