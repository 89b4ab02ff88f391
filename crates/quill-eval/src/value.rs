//! Runtime values.

use std::fmt;

use quill_par::NodeId;
use quill_util::SymTable;

/// A runtime value.
///
/// `Clone` is the deep copy: cloning a function value clones its whole
/// environment table, entry by entry. Primitives copy by value. Every
/// binding owns its value; nothing is aliased.
#[derive(Clone, Debug)]
pub enum Value {
    /// The uninitialised value.
    Junk,

    /// The built-in `print` intrinsic. First-class, but only callable.
    Print,

    /// A global whose initializer has not been evaluated. Holds the arena
    /// index of the initializer expression; every access re-evaluates it.
    Lazy(NodeId),

    /// A function. `env` holds the deep-copied captured bindings, absent
    /// for functions that capture nothing.
    Function {
        /// The function's declaration node.
        decl: NodeId,
        /// The captured environment, if any.
        env: Option<Box<SymTable<Value>>>,
    },

    /// A Boolean.
    Bool(bool),

    /// A 64-bit signed integer.
    Int(i64),

    /// A 64-bit float.
    Float(f64),
}

impl Value {
    /// Returns the name of the value's type, as used in diagnostics.
    ///
    /// Lazy globals and the `print` intrinsic read as functions.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Junk => "Junk",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Lazy(_) | Value::Print | Value::Function { .. } => "Function",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Junk
    }
}

/// The rendering used by the `print` intrinsic: one value per line.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Junk => write!(f, "$junk"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Lazy(_) | Value::Print | Value::Function { .. } => write!(f, "$function"),
        }
    }
}
