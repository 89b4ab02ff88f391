//! quill-lex - Lexical Analyzer
//!
//! The first phase of the interpreter pipeline: a pure, on-demand lexer
//! over the raw source bytes. Keywords, identifiers, number literals, and
//! one- or two-byte operators come out as [`Token`]s carrying byte spans;
//! unknown bytes come out as length-1 error tokens for the parser to
//! complain about. The lexer itself never reports diagnostics.
//!
//! Lexical surface:
//!
//! - identifiers `[_A-Za-z][_A-Za-z0-9]*`, with the keyword set
//!   `if else while var fun obj ret brk nxt and or true false`
//! - integer literals `[0-9]+`, float literals `[0-9]+\.[0-9]+`
//! - operators `+ - * / % | & ^ ~ ! < > <= >= == != << >> = . : ; , ( ) { }`
//! - line comments `// ...` up to `\n` or `\r`

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Precedence, Token, TokenKind};
