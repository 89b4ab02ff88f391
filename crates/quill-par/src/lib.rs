//! quill-par - Parser and AST
//!
//! This crate owns the middle of the pipeline: the AST arena
//! ([`Context`]), the node definitions ([`Node`] / [`NodeKind`] addressed
//! by [`NodeId`]), the two-phase tree walker ([`walk`] / [`Visitor`]), and
//! the recursive-descent parser ([`Parser`]).
//!
//! The grammar, one node per production:
//!
//! ```text
//! program     := (decl | stmt)*      -- non-decls grouped into a top decl
//! decl        := var_decl | fun_decl | obj_decl
//! var_decl    := 'var' NAME ('=' expr)?
//! fun_decl    := 'fun' NAME '(' params ')' brace
//! obj_decl    := 'obj' NAME brace
//! params      := (NAME (',' NAME)*)?
//! stmt        := brace | if_stmt | while_stmt
//!              | 'brk' | 'nxt' | 'ret' expr | expr
//! brace       := '{' stmt* '}'
//! if_stmt     := 'if' expr brace ('else' stmt)?
//! while_stmt  := 'while' expr brace
//! expr        := assign
//! assign      := or  ('=' expr)*
//! or          := and ('or' and)*
//! and         := cmp ('and' cmp)*
//! cmp         := add (('<'|'<='|'>'|'>='|'=='|'!=') add)*
//! add         := mul (('+'|'-'|'|'|'&'|'^') mul)*
//! mul         := shift (('*'|'/'|'%') shift)*
//! shift       := prefix (('<<'|'>>') prefix)*
//! prefix      := ('+'|'-'|'!'|'~') expr | postfix
//! postfix     := primary ('.' NAME | '(' args ')')*
//! primary     := BOOL | INT | FLOAT | NAME | '(' expr ')'
//! ```
//!
//! The parser registers every declaration with its innermost enclosing
//! brace as it goes, which is what later lets capture analysis classify a
//! name reference as local or free without a separate binding pass.

pub mod ast;
pub mod context;
mod decl;
mod expr;
pub mod parser;
mod stmt;
pub mod walk;

mod edge_cases;

pub use ast::{Node, NodeId, NodeKind};
pub use context::Context;
pub use parser::Parser;
pub use walk::{walk, Step, Visitor};
