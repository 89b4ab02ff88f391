//! Edge case tests for quill-par: malformed input and error recovery.
