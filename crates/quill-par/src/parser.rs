//! Parser state and the top-level entry point.
//!
//! The parser pulls tokens on demand through an 8-token ring buffer,
//! allocates nodes in the [`Context`] arena, and tracks the innermost
//! enclosing brace in `scope` so declarations can be registered with their
//! lexical scope as they are parsed.
//!
//! Errors never abort parsing: each one is reported through the handler,
//! an [`NodeKind::Error`] node takes the construct's place, and statement
//! parsing skips ahead to the next statement delimiter.

use quill_lex::{Lexer, Token, TokenKind};
use quill_util::{Diagnostic, Handler, Span};

use crate::ast::{Node, NodeId, NodeKind};
use crate::context::Context;

/// Size of the token lookahead ring buffer.
const LOOKAHEAD: usize = 8;

/// Recursive-descent parser for Quill source code.
pub struct Parser<'s, 'c, 'h> {
    /// The lexer tokenizing the parser's input.
    lexer: Lexer<'s>,

    /// The arena receiving the parsed nodes.
    pub(crate) context: &'c mut Context<'s>,

    /// Sink for parse diagnostics.
    handler: &'h Handler,

    /// The lookahead ring buffer.
    lookahead: [Token; LOOKAHEAD],

    /// Start cursor of the lookahead buffer.
    lookahead_start: usize,

    /// End cursor of the lookahead buffer.
    lookahead_end: usize,

    /// The innermost enclosing brace, or [`NodeId::NONE`] at file level.
    pub(crate) scope: NodeId,
}

impl<'s, 'c, 'h> Parser<'s, 'c, 'h> {
    /// Creates a parser over the context's source.
    pub fn new(context: &'c mut Context<'s>, handler: &'h Handler) -> Self {
        let lexer = Lexer::new(context.source());
        Self {
            lexer,
            context,
            handler,
            lookahead: [Token::new(TokenKind::Error, Span::DUMMY); LOOKAHEAD],
            lookahead_start: 0,
            lookahead_end: 0,
            scope: NodeId::NONE,
        }
    }

    /// Parses a sequence of top-level declarations.
    ///
    /// Consecutive non-declaration statements are grouped into synthesised
    /// [`NodeKind::TopDecl`] nodes; `var`/`fun`/`obj` declarations stand
    /// alone in the returned list.
    pub fn parse(&mut self) -> Vec<NodeId> {
        let stmts = self.parse_stmt_list(None);

        let mut decls = Vec::new();
        let mut run_start = 0;
        for (i, &stmt) in stmts.iter().enumerate() {
            if self.context[stmt].kind.is_declaration() {
                if run_start < i {
                    decls.push(self.make_top_decl(&stmts[run_start..i]));
                }
                decls.push(stmt);
                run_start = i + 1;
            }
        }
        if run_start < stmts.len() {
            decls.push(self.make_top_decl(&stmts[run_start..]));
        }

        decls
    }

    /// Wraps a run of non-declaration statements into a `TopDecl` node.
    fn make_top_decl(&mut self, stmts: &[NodeId]) -> NodeId {
        let start = stmts
            .first()
            .map_or(0, |&stmt| self.context[stmt].span.start);
        let end = stmts.last().map_or(0, |&stmt| self.context[stmt].span.end);
        self.context.push(Node::new(
            Span::new(start, end),
            NodeKind::TopDecl {
                stmts: stmts.to_vec(),
            },
        ))
    }

    // =========================================================================
    // Token stream
    // =========================================================================

    /// Returns the next token without consuming it, lazily lexing.
    pub(crate) fn peek(&mut self) -> Option<Token> {
        if self.lookahead_start < self.lookahead_end {
            return Some(self.lookahead[self.lookahead_start % LOOKAHEAD]);
        }

        let token = self.lexer.next_token()?;
        self.lookahead[self.lookahead_start % LOOKAHEAD] = token;
        self.lookahead_end += 1;
        Some(token)
    }

    /// Consumes the next token and returns it.
    pub(crate) fn consume(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.lookahead_start += 1;
        if self.lookahead_start >= LOOKAHEAD {
            self.lookahead_start -= LOOKAHEAD;
            self.lookahead_end -= LOOKAHEAD;
        }
        Some(token)
    }

    // =========================================================================
    // Diagnostics and recovery
    // =========================================================================

    /// Returns the length of the source, used to locate end-of-input errors.
    pub(crate) fn source_len(&self) -> usize {
        self.context.source().len()
    }

    /// Reports a parse error at a single source offset.
    pub(crate) fn error_at(&self, location: usize, message: impl Into<String>) {
        self.handler
            .emit(Diagnostic::error(message, Span::point(location)));
    }

    /// Allocates an error node covering the given range.
    pub(crate) fn error_node(&mut self, start: usize, end: usize) -> NodeId {
        self.context
            .push(Node::new(Span::new(start, end), NodeKind::Error))
    }

    /// Returns true if the node at `id` is an error node.
    pub(crate) fn is_error(&self, id: NodeId) -> bool {
        matches!(self.context[id].kind, NodeKind::Error)
    }

    /// Returns the end offset of the node at `id`.
    pub(crate) fn node_end(&self, id: NodeId) -> usize {
        self.context[id].span.end
    }

    /// Returns whether `token` can delimit the end of a statement during
    /// recovery: a `;`, the current list terminator, or any token that
    /// starts a new line.
    fn is_stmt_delimiter(&self, token: Token, terminator: Option<TokenKind>) -> bool {
        if token.span.start == 0 {
            false
        } else if token.kind == TokenKind::Semicolon || Some(token.kind) == terminator {
            true
        } else {
            let previous = self.context.source().as_bytes()[token.span.start - 1];
            previous == b'\n' || previous == b'\r'
        }
    }

    // =========================================================================
    // Statement lists
    // =========================================================================

    /// Parses statements until the terminator (or end of input), skipping
    /// to the next statement delimiter after each failed statement.
    pub(crate) fn parse_stmt_list(&mut self, terminator: Option<TokenKind>) -> Vec<NodeId> {
        let mut stmts = Vec::new();

        while let Some(next) = self.peek() {
            if next.kind == TokenKind::Semicolon {
                self.consume();
                continue;
            }
            if Some(next.kind) == terminator {
                break;
            }

            let stmt = self.parse_stmt();
            let has_error = self.is_error(stmt);
            stmts.push(stmt);

            if has_error {
                while let Some(token) = self.peek() {
                    if self.is_stmt_delimiter(token, terminator) {
                        break;
                    }
                    self.consume();
                }
            }
        }

        stmts
    }

    /// Registers a declaration in the current scope's declaration list.
    pub(crate) fn register_decl(&mut self, decl: NodeId) {
        if self.scope.is_none() {
            return;
        }
        let scope = self.scope;
        if let NodeKind::Brace { decls, .. } = &mut self.context[scope].kind {
            decls.push(decl);
        }
    }
}
