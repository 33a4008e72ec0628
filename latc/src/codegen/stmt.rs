//! Statement emission: definitions, assignments, control flow.

use latc_parser::{Stmt, StmtKind};

use super::frame::Frame;
use super::{default_value, CodeGen, EmitResult};

impl CodeGen<'_> {
    pub(crate) fn emit_stmt(&mut self, frame: &mut Frame, stmt: &Stmt) -> EmitResult {
        match &stmt.kind {
            StmtKind::Empty => Ok(()),
            StmtKind::Block(stmts) => self.emit_block(frame, stmts),
            StmtKind::Definition(def) => {
                for item in &def.items {
                    match &item.init {
                        Some(init) => {
                            self.emit_expr(frame, init)?;
                            self.line("push rax");
                        }
                        None => {
                            self.line(format!("push {}", default_value(&def.ty)));
                        }
                    }
                    frame.push_named(&item.name);
                }
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                self.emit_expr(frame, value)?;
                self.line("push rax");
                frame.push_anon();
                self.emit_addr(frame, target)?;
                self.line("pop rbx");
                frame.pop_value();
                self.line("mov qword [rax], rbx");
                Ok(())
            }
            StmtKind::Incr(target) => {
                self.emit_addr(frame, target)?;
                self.line("inc qword [rax]");
                Ok(())
            }
            StmtKind::Decr(target) => {
                self.emit_addr(frame, target)?;
                self.line("dec qword [rax]");
                Ok(())
            }
            StmtKind::Expr(expr) => self.emit_expr(frame, expr),
            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    self.emit_expr(frame, expr)?;
                }
                let depth = frame.depth();
                if depth > 0 {
                    self.line(format!("add rsp, {}", depth * 8));
                }
                self.line("ret");
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let label = self.next_label();
                self.emit_expr(frame, cond)?;
                self.line("test rax, rax");
                match else_branch {
                    Some(else_branch) => {
                        self.line(format!("jz _if_else_{}", label));
                        self.emit_stmt(frame, then_branch)?;
                        self.line(format!("jmp _if_done_{}", label));
                        self.line(format!("_if_else_{}:", label));
                        self.emit_stmt(frame, else_branch)?;
                        self.line(format!("_if_done_{}:", label));
                    }
                    None => {
                        self.line(format!("jz _if_done_{}", label));
                        self.emit_stmt(frame, then_branch)?;
                        self.line(format!("_if_done_{}:", label));
                    }
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                let label = self.next_label();
                self.line(format!("jmp _while_condition_{}", label));
                self.line(format!("_while_body_{}:", label));
                self.emit_stmt(frame, body)?;
                self.line(format!("_while_condition_{}:", label));
                self.emit_expr(frame, cond)?;
                self.line("test rax, rax");
                self.line(format!("jnz _while_body_{}", label));
                Ok(())
            }
            StmtKind::For {
                var, array, body, ..
            } => {
                let label = self.next_label();
                self.emit_expr(frame, array)?;
                // Three hidden slots: the array pointer, the running
                // index, and the element variable at the stack top.
                frame.push_anon();
                frame.push_anon();
                frame.push_named(var);
                self.line("push rax");
                self.line("push qword 0");
                self.line("sub rsp, 8");
                self.line(format!("jmp _for_condition_{}", label));
                self.line(format!("_for_body_{}:", label));
                self.line("lea rax, [rbx + rax * 8 + 8]");
                self.line("mov rax, [rax]");
                self.line("mov [rsp], rax");
                self.emit_stmt(frame, body)?;
                self.line("inc qword [rsp+8]");
                self.line(format!("_for_condition_{}:", label));
                self.line("mov rax, [rsp+8]");
                self.line("mov rbx, [rsp+16]");
                self.line("cmp rax, [rbx]");
                self.line(format!("jl _for_body_{}", label));
                self.line("add rsp, 24");
                frame.pop_value();
                frame.pop_value();
                frame.pop_value();
                Ok(())
            }
        }
    }
}
