//! quill-sem - Static Capture Analysis
//!
//! After parsing and before evaluation, every function declaration gets a
//! capture set: the identifiers that occur free in its body. The evaluator
//! uses the set at function-creation time to deep-copy the captured
//! bindings into the closure's environment.
//!
//! A name referenced inside a function body is *bound* if some enclosing
//! brace inside the body declares it, if it names a parameter, or if it is
//! the function's own name (recursion). Anything else is free. Nested
//! functions contribute transitively: whatever is free in an inner function
//! and not bound by the outer one escapes to the outer capture set.

pub mod capture;

pub use capture::{captures, CaptureSet, MAX_CAPTURE_COUNT};
