//! Edge case tests for quill-eval: scoping corners and hard limits.

#[cfg(test)]
mod tests {
    use crate::{Interp, Status};
    use quill_par::{Context, Parser};
    use quill_util::Handler;

    fn run(source: &str) -> (String, Status, Handler) {
        let handler = Handler::new();
        let mut context = Context::new(source);
        let decls = Parser::new(&mut context, &handler).parse();
        assert!(!handler.has_errors(), "parse failed");

        let mut out = Vec::new();
        let status = {
            let mut interp = Interp::with_output(&handler, Box::new(&mut out));
            interp.eval_program(&context, &decls)
        };
        (String::from_utf8(out).unwrap(), status, handler)
    }

    #[test]
    fn test_empty_program() {
        let (out, status, handler) = run("");
        assert_eq!(out, "");
        assert_eq!(status, Status::Ok);
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_brace_scopes_shadow() {
        let (out, status, _) = run("{ var x = 1 { var x = 2 print(x) } print(x) }");
        assert_eq!(status, Status::Ok);
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn test_brace_locals_die_with_their_scope() {
        let (_, status, handler) = run("{ { var x = 1 } print(x) }");
        assert_eq!(status, Status::Error);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "undefined identifier 'x'"));
    }

    #[test]
    fn test_function_frame_hides_caller_locals() {
        // The callee's lookup stops at its own function frame and falls
        // back to the globals; the caller's locals are invisible.
        let (_, status, handler) = run("fun f() { ret b } { var b = 1 print(f()) }");
        assert_eq!(status, Status::Error);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "undefined identifier 'b'"));
    }

    #[test]
    fn test_duplicate_parameter_names_fail_at_call() {
        let (_, status, handler) = run("fun f(a, a) { ret a } print(f(1, 2))");
        assert_eq!(status, Status::Error);
        assert!(handler
            .diagnostics()
            .iter()
            .any(|d| d.message == "duplicate declaration 'a'"));
    }

    #[test]
    fn test_deeply_nested_braces() {
        let mut source = String::new();
        for _ in 0..50 {
            source.push_str("{ ");
        }
        source.push_str("print(1)");
        for _ in 0..50 {
            source.push_str(" }");
        }
        let (out, status, _) = run(&source);
        assert_eq!(status, Status::Ok);
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_deep_recursion_within_stack_capacity() {
        let (out, status, _) =
            run("fun down(n) { if n == 0 { ret 0 } ret down(n - 1) } print(down(200))");
        assert_eq!(status, Status::Ok);
        assert_eq!(out, "0\n");
    }

    #[test]
    #[should_panic(expected = "value stack overflow")]
    fn test_value_stack_overflow_is_fatal() {
        // A single application with more arguments than the value stack
        // can hold trips the fatal capacity check.
        let mut source = String::from("fun f() { ret 0 } f(0");
        for _ in 0..1100 {
            source.push_str(", 0");
        }
        source.push(')');
        let _ = run(&source);
    }
}
