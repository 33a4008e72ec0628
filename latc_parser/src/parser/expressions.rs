//! Expression grammar: simple expressions, postfix chains, and the flat
//! precedence fold for binary operators.

use crate::ast::{BinOp, Expr, ExprKind, Type, UnOp};
use crate::error::ParseResult;
use crate::lexer::unescape;
use crate::token::Token;

use super::Parser;

/// Precedence level of a binary operator; higher binds tighter.
fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 0,
        BinOp::And => 1,
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => 2,
        BinOp::Add | BinOp::Sub => 3,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 4,
    }
}

const MAX_PRECEDENCE: u8 = 4;

fn bin_op_of(token: Token) -> Option<BinOp> {
    Some(match token {
        Token::OrOr => BinOp::Or,
        Token::AndAnd => BinOp::And,
        Token::Lt => BinOp::Lt,
        Token::Le => BinOp::Le,
        Token::Gt => BinOp::Gt,
        Token::Ge => BinOp::Ge,
        Token::EqEq => BinOp::Eq,
        Token::NotEq => BinOp::Ne,
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Percent => BinOp::Mod,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        let first = self.parse_simple_expression()?;
        self.parse_binary_tail(first)
    }

    /// Collect `simple (op simple)*` into flat operand/operator lists,
    /// then fold the highest precedence first, left to right within a
    /// level. All operators are left-associative.
    fn parse_binary_tail(&mut self, first: Expr) -> ParseResult<Expr> {
        let mut operands = vec![first];
        let mut ops = Vec::new();
        while let Some(op) = self.peek(0).and_then(bin_op_of) {
            self.advance();
            ops.push(op);
            operands.push(self.parse_simple_expression()?);
        }
        for level in (0..=MAX_PRECEDENCE).rev() {
            let mut i = 0;
            while i < ops.len() {
                if precedence(ops[i]) != level {
                    i += 1;
                    continue;
                }
                let op = ops.remove(i);
                let right = operands.remove(i + 1);
                let left = operands.remove(i);
                let span = left.span.merge(&right.span);
                operands.insert(
                    i,
                    Expr::new(
                        span,
                        ExprKind::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                    ),
                );
            }
        }
        Ok(operands.remove(0))
    }

    pub(crate) fn parse_simple_expression(&mut self) -> ParseResult<Expr> {
        self.check_eof()?;
        let begin = self.cur_pos();

        if self.check(Token::Not) {
            self.advance();
            let expr = Box::new(self.parse_simple_expression()?);
            return Ok(Expr::new(
                self.span_from(begin),
                ExprKind::Unary {
                    op: UnOp::Not,
                    expr,
                },
            ));
        }
        if self.check(Token::Minus) {
            self.advance();
            let expr = Box::new(self.parse_simple_expression()?);
            return Ok(Expr::new(
                self.span_from(begin),
                ExprKind::Unary {
                    op: UnOp::Neg,
                    expr,
                },
            ));
        }
        // A cast is exactly `( NAME )` followed by a simple expression;
        // `(1+2)` is grouping, not a cast.
        if self.check(Token::LParen)
            && self.peek(1) == Some(Token::Name)
            && self.peek(2) == Some(Token::RParen)
        {
            let target = self
                .tokens
                .get(self.pos + 1)
                .map(|t| Type::from_name(t.text))
                .unwrap_or(Type::Void);
            self.advance();
            self.advance();
            self.advance();
            let expr = Box::new(self.parse_simple_expression()?);
            return Ok(Expr::new(
                self.span_from(begin),
                ExprKind::Cast { expr, target },
            ));
        }

        let mut expr = self.parse_primary()?;

        // Postfix chains: `.name`, `(args)`, `[index]`.
        while !self.is_at_end() {
            match self.peek(0) {
                Some(Token::Dot) => {
                    self.next_token()?;
                    self.expect(Token::Name)?;
                    let member = self.cur_text().to_string();
                    self.advance();
                    expr = Expr::new(
                        self.span_from(begin),
                        ExprKind::Member {
                            object: Box::new(expr),
                            member,
                        },
                    );
                }
                Some(Token::LParen) => {
                    self.next_token()?;
                    let mut args = Vec::new();
                    if !self.check(Token::RParen) {
                        args.push(self.parse_expression()?);
                    }
                    while !self.is_at_end() && !self.check(Token::RParen) {
                        self.expect(Token::Comma)?;
                        self.next_token()?;
                        args.push(self.parse_expression()?);
                    }
                    self.check_eof()?;
                    self.advance();
                    expr = Expr::new(
                        self.span_from(begin),
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                    );
                }
                Some(Token::LBracket) => {
                    self.next_token()?;
                    let index = Box::new(self.parse_expression()?);
                    self.expect(Token::RBracket)?;
                    self.advance();
                    expr = Expr::new(
                        self.span_from(begin),
                        ExprKind::Subscript {
                            array: Box::new(expr),
                            index,
                        },
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        self.check_eof()?;
        let begin = self.cur_pos();
        match self.peek(0) {
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                if !self.check(Token::RParen) {
                    return Err(self.error("Matching bracket not found."));
                }
                self.advance();
                Ok(expr)
            }
            Some(Token::Name) => {
                let name = self.cur_text().to_string();
                self.advance();
                Ok(Expr::new(
                    self.span_from(begin),
                    ExprKind::Variable(name),
                ))
            }
            Some(Token::KwNull) => {
                self.advance();
                Ok(Expr::new(self.span_from(begin), ExprKind::Null))
            }
            Some(Token::Number) => {
                let value: i64 = self
                    .cur_text()
                    .parse()
                    .map_err(|_| self.error("Literal number to Integer parsing failure."))?;
                self.advance();
                Ok(Expr::new(self.span_from(begin), ExprKind::Int(value)))
            }
            Some(Token::LitTrue) => {
                self.advance();
                Ok(Expr::new(self.span_from(begin), ExprKind::Bool(true)))
            }
            Some(Token::LitFalse) => {
                self.advance();
                Ok(Expr::new(self.span_from(begin), ExprKind::Bool(false)))
            }
            Some(Token::StringLiteral) => {
                let value = unescape(self.cur_text());
                self.advance();
                Ok(Expr::new(self.span_from(begin), ExprKind::Str(value)))
            }
            Some(Token::KwNew) => {
                self.advance();
                self.expect(Token::Name)?;
                let name = self.cur_text().to_string();
                self.advance();
                if self.check(Token::LBracket) {
                    self.next_token()?;
                    let size = Box::new(self.parse_expression()?);
                    self.expect(Token::RBracket)?;
                    self.advance();
                    Ok(Expr::new(
                        self.span_from(begin),
                        ExprKind::NewArray {
                            elem: Type::from_name(&name),
                            size,
                        },
                    ))
                } else {
                    Ok(Expr::new(
                        self.span_from(begin),
                        ExprKind::NewObject { class: name },
                    ))
                }
            }
            _ => {
                let text = self.current().map(|t| t.text).unwrap_or("");
                Err(self.error(format!(
                    "Can't match to a known simple expression: {}",
                    text
                )))
            }
        }
    }
}
