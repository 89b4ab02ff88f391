//! quill-util - Core Utilities and Foundation Types
//!
//! This crate provides the foundation types shared by every phase of the
//! Quill interpreter:
//!
//! - [`Span`] - byte ranges into the program source, attached to tokens,
//!   AST nodes, and diagnostics.
//! - [`Diagnostic`] / [`Handler`] - error and warning records collected
//!   during parsing and evaluation, formatted by the driver.
//! - [`Idx`] / [`IndexVec`] / [`define_idx!`] - typed indices backing the
//!   AST arena. Arena indices replace pointer graphs: they stay valid when
//!   the arena grows, and the compiler keeps index spaces from mixing.
//! - [`SymTable`] - the open-addressed symbol table used for globals, frame
//!   locals, and closure environments.

pub mod diagnostic;
pub mod index;
pub mod span;
pub mod symtable;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use index::{Idx, IndexVec};
pub use span::Span;
pub use symtable::{fnv1_hash, SymTable};
