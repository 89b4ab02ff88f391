//! Runtime frames.

use quill_util::SymTable;

use crate::value::Value;

/// The kind of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A function activation. Name lookup stops here before falling back
    /// to the globals; enclosing frames belong to other activations.
    Function,
    /// A brace scope. Name lookup continues into the previous frame.
    Anonymous,
}

/// A runtime activation record.
#[derive(Debug)]
pub struct Frame {
    /// The frame's kind.
    pub kind: FrameKind,

    /// The value-stack depth when the frame was pushed. Statement cleanup
    /// drains the stack back down to this mark.
    pub value_index: usize,

    /// The frame's local bindings.
    pub locals: SymTable<Value>,
}

impl Frame {
    /// Creates a frame with the given entry mark.
    pub fn new(kind: FrameKind, value_index: usize) -> Self {
        Self {
            kind,
            value_index,
            locals: SymTable::new(),
        }
    }
}
