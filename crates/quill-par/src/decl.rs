//! Declaration parsing - `var`, `fun`, `obj`.

use quill_lex::{Token, TokenKind};
use quill_util::Span;

use crate::ast::{Node, NodeId, NodeKind};
use crate::parser::Parser;

impl<'s, 'c, 'h> Parser<'s, 'c, 'h> {
    /// Parses a single declaration. The caller has peeked a declaration
    /// keyword.
    pub(crate) fn parse_decl(&mut self) -> NodeId {
        let Some(head) = self.peek() else {
            let loc = self.source_len();
            self.error_at(loc, "expected declaration");
            return self.error_node(loc, loc);
        };

        match head.kind {
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::Fun => self.parse_fun_decl(),
            TokenKind::Obj => self.parse_obj_decl(),
            _ => {
                self.error_at(head.span.start, "expected declaration");
                self.error_node(head.span.start, head.span.end)
            }
        }
    }

    /// Parses `var NAME ('=' expr)?`.
    fn parse_var_decl(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;

        // Allocate the node up front so it can be registered in the current
        // scope before its initializer is parsed.
        let decl = self.error_node(start, start);

        let Some(next) = self.peek() else {
            self.error_at(self.source_len(), "expected variable name");
            return decl;
        };
        let name = if next.kind == TokenKind::Name {
            self.consume();
            next
        } else {
            self.error_at(next.span.start, "expected variable name");
            Token::new(TokenKind::Error, next.span)
        };

        self.register_decl(decl);

        let (initializer, end) = match self.peek() {
            Some(token) if token.kind == TokenKind::Assign => {
                self.consume();
                let init = self.parse_expr();
                (init, self.node_end(init))
            }
            _ => (NodeId::NONE, name.span.end),
        };

        self.context[decl] = Node::new(
            Span::new(start, end),
            NodeKind::VarDecl { name, initializer },
        );
        decl
    }

    /// Parses `fun NAME '(' params ')' brace`.
    fn parse_fun_decl(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;
        let decl = self.error_node(start, start);

        let Some(next) = self.peek() else {
            self.error_at(self.source_len(), "expected function name");
            return decl;
        };
        let name = if next.kind == TokenKind::Name {
            self.consume();
            next
        } else {
            self.error_at(next.span.start, "expected function name");
            Token::new(TokenKind::Error, next.span)
        };

        self.register_decl(decl);

        let params = self.parse_param_list();

        let (body, end) = match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace => {
                let body = self.parse_brace_stmt();
                (body, self.node_end(body))
            }
            next => {
                let end = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(end, "expected function body");
                (self.error_node(end, end), end)
            }
        };

        self.context[decl] = Node::new(
            Span::new(start, end),
            NodeKind::FunDecl { name, params, body },
        );
        decl
    }

    /// Parses `obj NAME brace`. Objects parse but are rejected further down
    /// the pipeline.
    fn parse_obj_decl(&mut self) -> NodeId {
        let Some(keyword) = self.consume() else {
            let loc = self.source_len();
            return self.error_node(loc, loc);
        };
        let start = keyword.span.start;
        let decl = self.error_node(start, start);

        let Some(next) = self.peek() else {
            self.error_at(self.source_len(), "expected type name");
            return decl;
        };
        let name = if next.kind == TokenKind::Name {
            self.consume();
            next
        } else {
            self.error_at(next.span.start, "expected type name");
            Token::new(TokenKind::Error, next.span)
        };

        self.register_decl(decl);

        let (body, end) = match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace => {
                let body = self.parse_brace_stmt();
                (body, self.node_end(body))
            }
            next => {
                let end = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(end, "expected type body");
                (self.error_node(end, end), end)
            }
        };

        self.context[decl] = Node::new(Span::new(start, end), NodeKind::ObjDecl { name, body });
        decl
    }

    /// Parses a parenthesised parameter list, reporting leading or repeated
    /// commas, missing names, and a missing closing parenthesis.
    fn parse_param_list(&mut self) -> Vec<Token> {
        let mut params = Vec::new();

        match self.peek() {
            Some(token) if token.kind == TokenKind::LParen => {
                self.consume();
            }
            next => {
                let loc = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(loc, "expected parameter list");
                return params;
            }
        }

        loop {
            let Some(mut next) = self.peek() else { break };

            // Stop if we found the list terminator.
            if next.kind == TokenKind::RParen {
                break;
            }

            // Complain if there's a leading separator.
            if next.kind == TokenKind::Comma {
                self.error_at(next.span.start, "expected parameter name");
                while let Some(token) = self.peek() {
                    if token.kind != TokenKind::Comma {
                        break;
                    }
                    self.consume();
                }
                match self.peek() {
                    Some(token) => next = token,
                    None => break,
                }
                if next.kind == TokenKind::RParen {
                    break;
                }
            }

            // Parse one name.
            if next.kind == TokenKind::Name {
                self.consume();
                params.push(next);
            } else {
                self.error_at(next.span.start, "expected parameter name");
                self.consume();
                params.push(Token::new(TokenKind::Error, next.span));
            }

            // Parse a separator, unless we reached the terminator.
            match self.peek() {
                None => break,
                Some(token) if token.kind == TokenKind::RParen => break,
                Some(token) if token.kind == TokenKind::Comma => {
                    self.consume();
                }
                Some(token) => self.error_at(token.span.start, "expected ',' separator"),
            }
        }

        match self.peek() {
            Some(token) if token.kind == TokenKind::RParen => {
                self.consume();
            }
            next => {
                let loc = next.map_or(self.source_len(), |t| t.span.start);
                self.error_at(loc, "missing closing parenthesis");
            }
        }

        params
    }
}
