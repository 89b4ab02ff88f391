//! Expression parsing.
//!
//! Expressions are parsed by precedence climbing over the flat
//! [`Precedence`] ladder: parsing at class `p` folds every operator of
//! class `p` left-associatively, parsing each right-hand side one class
//! tighter (or as a prefix expression at the top of the ladder).
//! Assignment shares the binary node shape; its asymmetry is the
//! evaluator's business.
//!
//! One deliberate quirk is preserved: prefix operators parse their operand
//! at assignment precedence, so they bind loosely - `-a + b` means
//! `-(a + b)`.

use quill_lex::{Precedence, TokenKind};
use quill_util::Span;

use crate::ast::{Node, NodeId, NodeKind};
use crate::parser::Parser;

impl<'s, 'c, 'h> Parser<'s, 'c, 'h> {
    /// Parses a complete expression.
    pub(crate) fn parse_expr(&mut self) -> NodeId {
        self.parse_infix_expr(Precedence::Assignment)
    }

    /// Parses an infix expression, folding operators of class `min` and
    /// tighter.
    fn parse_infix_expr(&mut self, min: Precedence) -> NodeId {
        let mut lhs = self.parse_pre_expr();
        if self.is_error(lhs) {
            return lhs;
        }

        let mut current = min;
        loop {
            let Some(next) = self.peek() else { break };
            let Some(class) = next.kind.precedence() else {
                break;
            };

            if class == current {
                let op = next;
                self.consume();

                let rhs = match current.next() {
                    Some(tighter) => self.parse_infix_expr(tighter),
                    None => self.parse_pre_expr(),
                };

                let span = Span::new(op.span.start, self.node_end(rhs));
                lhs = self
                    .context
                    .push(Node::new(span, NodeKind::Binary { op, lhs, rhs }));
                current = min;
            } else {
                match current.next() {
                    Some(tighter) => current = tighter,
                    None => break,
                }
            }
        }

        lhs
    }

    /// Parses a prefix expression. The operand of `+ - ! ~` is a whole
    /// expression at assignment precedence.
    fn parse_pre_expr(&mut self) -> NodeId {
        if let Some(next) = self.peek() {
            if next.kind.is_prefix() {
                let op = next;
                self.consume();

                let operand = self.parse_expr();
                let span = Span::new(op.span.start, self.node_end(operand));
                return self
                    .context
                    .push(Node::new(span, NodeKind::Unary { op, operand }));
            }
        }

        self.parse_post_expr()
    }

    /// Parses a postfix expression: a primary followed by any number of
    /// member accesses and applications.
    fn parse_post_expr(&mut self) -> NodeId {
        let mut subexpr = self.parse_primary_expr();
        if self.is_error(subexpr) {
            return subexpr;
        }

        while let Some(next) = self.peek() {
            let start = self.context[subexpr].span.start;
            let end = self.context[subexpr].span.end;

            match next.kind {
                TokenKind::Dot => {
                    self.consume();
                    match self.peek() {
                        Some(member) if member.kind == TokenKind::Name => {
                            self.consume();
                            let span = Span::new(start, member.span.end);
                            subexpr = self.context.push(Node::new(
                                span,
                                NodeKind::Member {
                                    base: subexpr,
                                    member,
                                },
                            ));
                        }
                        _ => {
                            self.error_at(end, "expected member name");
                            self.context[subexpr].kind = NodeKind::Error;
                            return subexpr;
                        }
                    }
                }

                TokenKind::LParen => {
                    self.consume();
                    let args = self.parse_expr_list();

                    let end = match self.peek() {
                        Some(token) if token.kind == TokenKind::RParen => {
                            self.consume();
                            token.span.end
                        }
                        next => {
                            let end = match args.last() {
                                Some(&last) => self.node_end(last),
                                None => next.map_or(end, |t| t.span.start),
                            };
                            self.error_at(end, "missing closing parenthesis");
                            end
                        }
                    };

                    let span = Span::new(start, end);
                    subexpr = self.context.push(Node::new(
                        span,
                        NodeKind::Apply {
                            callee: subexpr,
                            args,
                        },
                    ));
                }

                _ => break,
            }
        }

        subexpr
    }

    /// Parses a comma-separated argument list up to (but not consuming) the
    /// closing parenthesis.
    fn parse_expr_list(&mut self) -> Vec<NodeId> {
        let mut items = Vec::new();

        while let Some(next) = self.peek() {
            // Stop if we found the list terminator.
            if next.kind == TokenKind::RParen {
                break;
            }

            // Complain if there's a leading separator.
            if next.kind == TokenKind::Comma {
                self.error_at(next.span.start, "expected expression");
                while let Some(token) = self.peek() {
                    if token.kind != TokenKind::Comma {
                        break;
                    }
                    self.consume();
                }
                if self.peek().is_none() {
                    break;
                }
            }

            items.push(self.parse_expr());

            match self.peek() {
                None => break,
                Some(token) if token.kind == TokenKind::RParen => break,
                Some(token) if token.kind == TokenKind::Comma => {
                    self.consume();
                }
                Some(token) => self.error_at(token.span.start, "expected ',' separator"),
            }
        }

        items
    }

    /// Parses a primary expression: a literal, a name, or a parenthesised
    /// expression.
    fn parse_primary_expr(&mut self) -> NodeId {
        let Some(head) = self.consume() else {
            let loc = self.source_len();
            self.error_at(loc, "expected expression");
            return self.error_node(loc, loc);
        };

        match head.kind {
            TokenKind::True | TokenKind::False => self.context.push(Node::new(
                head.span,
                NodeKind::Bool(head.kind == TokenKind::True),
            )),

            TokenKind::Integer => {
                // Overflowing literals saturate.
                let value = self
                    .context
                    .token_text(&head)
                    .parse::<i64>()
                    .unwrap_or(i64::MAX);
                self.context
                    .push(Node::new(head.span, NodeKind::Integer(value)))
            }

            TokenKind::Float => {
                let value = self
                    .context
                    .token_text(&head)
                    .parse::<f64>()
                    .unwrap_or(0.0);
                self.context
                    .push(Node::new(head.span, NodeKind::Float(value)))
            }

            TokenKind::Name => self
                .context
                .push(Node::new(head.span, NodeKind::DeclRef(head))),

            TokenKind::LParen => {
                let subexpr = self.parse_expr();

                let end = match self.peek() {
                    Some(token) if token.kind == TokenKind::RParen => {
                        self.consume();
                        token.span.end
                    }
                    _ => {
                        let end = self.node_end(subexpr);
                        self.error_at(end, "missing closing parenthesis");
                        end
                    }
                };

                self.context.push(Node::new(
                    Span::new(head.span.start, end),
                    NodeKind::Paren(subexpr),
                ))
            }

            _ => {
                self.error_at(head.span.start, "expected expression");
                self.error_node(head.span.start, head.span.end)
            }
        }
    }
}
