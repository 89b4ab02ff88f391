//! Statement parsing - braces, `if`, `while`, `brk`, `nxt`, `ret`.

use quill_lex::TokenKind;
use quill_util::Span;

use crate::ast::{Node, NodeId, NodeKind};
use crate::parser::Parser;

impl<'s, 'c, 'h> Parser<'s, 'c, 'h> {
    /// Parses a single statement or declaration.
    pub(crate) fn parse_stmt(&mut self) -> NodeId {
        let Some(next) = self.peek() else {
            let loc = self.source_len();
            self.error_at(loc, "expected statement");
            return self.error_node(loc, loc);
        };

        if next.kind.is_declaration() {
            return self.parse_decl();
        }

        match next.kind {
            TokenKind::LBrace => self.parse_brace_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Brk => {
                self.consume();
                self.context.push(Node::new(next.span, NodeKind::Brk))
            }
            TokenKind::Nxt => {
                self.consume();
                self.context.push(Node::new(next.span, NodeKind::Nxt))
            }
            TokenKind::Ret => self.parse_ret_stmt(),
            _ => {
                let expr = self.parse_expr();
                let span = self.context[expr].span;
                self.context.push(Node::new(span, NodeKind::ExprStmt(expr)))
            }
        }
    }

    /// Parses `'{' stmt* '}'`, tracking the brace as the current scope so
    /// that inner declarations register with it.
    pub(crate) fn parse_brace_stmt(&mut self) -> NodeId {
        let Some(lbrace) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = lbrace.span.start;

        let stmt = self.context.push(Node::new(
            Span::point(start),
            NodeKind::Brace {
                stmts: Vec::new(),
                parent: self.scope,
                decls: Vec::new(),
            },
        ));
        let previous_scope = std::mem::replace(&mut self.scope, stmt);

        let stmts = self.parse_stmt_list(Some(TokenKind::RBrace));

        let end = match self.peek() {
            Some(token) if token.kind == TokenKind::RBrace => {
                self.consume();
                token.span.end
            }
            next => {
                let end = match stmts.last() {
                    Some(&last) => self.node_end(last),
                    None => next.map_or(self.source_len(), |t| t.span.start),
                };
                self.error_at(end, "missing closing brace");
                end
            }
        };

        self.scope = previous_scope;

        let node = &mut self.context[stmt];
        node.span = Span::new(start, end);
        if let NodeKind::Brace { stmts: slot, .. } = &mut node.kind {
            *slot = stmts;
        }
        stmt
    }

    /// Parses `'if' expr brace ('else' stmt)?`.
    fn parse_if_stmt(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;

        let cond = self.parse_expr();

        let (then_branch, mut end) = match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace => {
                let branch = self.parse_brace_stmt();
                (branch, self.node_end(branch))
            }
            next => {
                let end = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(end, "expected '{' after 'if' condition");
                (self.error_node(end, end), end)
            }
        };

        let else_branch = match self.peek() {
            Some(token) if token.kind == TokenKind::Else => {
                self.consume();
                let branch = self.parse_stmt();
                end = self.node_end(branch);
                branch
            }
            _ => NodeId::NONE,
        };

        self.context.push(Node::new(
            Span::new(start, end),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ))
    }

    /// Parses `'while' expr brace`.
    fn parse_while_stmt(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;

        let cond = self.parse_expr();

        let (body, end) = match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace => {
                let body = self.parse_brace_stmt();
                (body, self.node_end(body))
            }
            next => {
                let end = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(end, "expected '{' after 'while' condition");
                (self.error_node(end, end), end)
            }
        };

        self.context
            .push(Node::new(Span::new(start, end), NodeKind::While { cond, body }))
    }

    /// Parses `'ret' expr`.
    fn parse_ret_stmt(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;

        let value = self.parse_expr();
        let end = self.node_end(value);

        self.context
            .push(Node::new(Span::new(start, end), NodeKind::Ret(value)))
    }
}
