//! Statement grammar: blocks, definitions, control flow.

use crate::ast::{DefItem, Definition, Stmt, StmtKind, Type};
use crate::error::ParseResult;
use crate::span::Span;
use crate::token::Token;

use super::Parser;

impl<'a> Parser<'a> {
    /// Parse `T a, b = e, c;`. Initializers always parse here; contexts
    /// that forbid them (class bodies) reject them semantically.
    pub(crate) fn parse_definition(&mut self) -> ParseResult<Definition> {
        self.push_env("variable definition");
        let (ty, begin) = self.parse_type_string(false)?;
        let mut items = Vec::new();
        loop {
            self.expect(Token::Name)?;
            let name = self.cur_text().to_string();
            self.set_env_name(name.clone());
            self.next_token()?;
            let init = if self.check(Token::Assign) {
                self.next_token()?;
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.clear_env_name();
            items.push(DefItem { name, init });
            if self.check(Token::Semicolon) {
                self.advance();
                break;
            } else if self.check(Token::Comma) {
                self.advance();
            } else {
                self.expect_one(&[Token::Semicolon, Token::Comma])?;
            }
        }
        self.pop_env();
        Ok(Definition {
            span: self.span_from(begin),
            ty,
            items,
        })
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        self.push_env("statement");
        self.check_eof()?;
        let begin = self.cur_pos();
        let result = match self.peek(0) {
            Some(Token::Semicolon) => {
                self.advance();
                Stmt::empty(self.span_from(begin))
            }
            Some(Token::LBrace) => {
                let (stmts, span) = self.parse_block()?;
                Stmt::new(span, StmtKind::Block(stmts))
            }
            Some(Token::KwWhile) => {
                self.advance();
                self.expect(Token::LParen)?;
                self.advance();
                let cond = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.advance();
                let body = Box::new(self.parse_statement()?);
                Stmt::new(self.span_from(begin), StmtKind::While { cond, body })
            }
            Some(Token::KwFor) => {
                self.advance();
                self.expect(Token::LParen)?;
                self.advance();
                self.expect(Token::Name)?;
                let elem_ty = Type::from_name(self.cur_text());
                self.advance();
                self.expect(Token::Name)?;
                let var = self.cur_text().to_string();
                self.advance();
                self.expect(Token::Colon)?;
                self.advance();
                let array = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.advance();
                let body = Box::new(self.parse_statement()?);
                Stmt::new(
                    self.span_from(begin),
                    StmtKind::For {
                        elem_ty,
                        var,
                        array,
                        body,
                    },
                )
            }
            Some(Token::KwIf) => {
                self.advance();
                self.expect(Token::LParen)?;
                self.advance();
                let cond = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.advance();
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.check(Token::KwElse) {
                    self.advance();
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Stmt::new(
                    self.span_from(begin),
                    StmtKind::If {
                        cond,
                        then_branch,
                        else_branch,
                    },
                )
            }
            Some(Token::KwReturn) => {
                self.next_token()?;
                if self.check(Token::Semicolon) {
                    self.advance();
                    Stmt::new(self.span_from(begin), StmtKind::Return(None))
                } else {
                    let val = self.parse_expression()?;
                    self.expect(Token::Semicolon)?;
                    self.advance();
                    Stmt::new(self.span_from(begin), StmtKind::Return(Some(val)))
                }
            }
            Some(Token::Name) if self.starts_definition() => {
                let def = self.parse_definition()?;
                Stmt::new(def.span, StmtKind::Definition(def))
            }
            _ => {
                let e = self.parse_expression()?;
                self.check_eof()?;
                let stmt = if self.check(Token::Assign) {
                    self.advance();
                    let value = self.parse_expression()?;
                    Stmt::new(
                        self.span_from(begin),
                        StmtKind::Assign { target: e, value },
                    )
                } else if self.check(Token::PlusPlus) {
                    self.advance();
                    Stmt::new(self.span_from(begin), StmtKind::Incr(e))
                } else if self.check(Token::MinusMinus) {
                    self.advance();
                    Stmt::new(self.span_from(begin), StmtKind::Decr(e))
                } else {
                    Stmt::new(self.span_from(begin), StmtKind::Expr(e))
                };
                self.expect(Token::Semicolon)?;
                self.advance();
                // Recompute the span now that the `;` is consumed.
                Stmt::new(Span::new(begin, self.prev_end()), stmt.kind)
            }
        };
        self.pop_env();
        Ok(result)
    }

    /// A statement starting with two names (possibly separated by `[]`)
    /// is a local definition.
    fn starts_definition(&self) -> bool {
        match self.peek(1) {
            Some(Token::Name) => true,
            Some(Token::LBracket) => self.peek(2) == Some(Token::RBracket),
            _ => false,
        }
    }

    /// Parse `{ … }` and return the statements plus the block's span.
    pub(crate) fn parse_block(&mut self) -> ParseResult<(Vec<Stmt>, Span)> {
        self.push_env("block");
        self.expect(Token::LBrace)?;
        let begin = self.cur_pos();
        self.next_token()?;
        let mut statements = Vec::new();
        while !self.is_at_end() && !self.check(Token::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        self.advance();
        self.pop_env();
        Ok((statements, self.span_from(begin)))
    }
}
