//! Expression emission. Every expression leaves its value in `rax`;
//! intermediates live on the stack and are tracked through [`Frame`].

use latc_parser::{BinOp, Expr, ExprKind, Type, UnOp};

use super::frame::Frame;
use super::{constructor_label, internal, string_label, CodeGen, EmitResult};

impl CodeGen<'_> {
    pub(crate) fn emit_expr(&mut self, frame: &mut Frame, expr: &Expr) -> EmitResult {
        match &expr.kind {
            ExprKind::Int(value) => {
                self.line(format!("mov rax, {}", value));
                Ok(())
            }
            ExprKind::Bool(value) => {
                self.line(format!("mov rax, {}", i64::from(*value)));
                Ok(())
            }
            ExprKind::Str(value) => {
                let id = self.intern_string(value);
                self.line(format!("mov rax, {}", string_label(id)));
                Ok(())
            }
            ExprKind::Null => {
                self.line("mov rax, 0");
                Ok(())
            }
            ExprKind::Variable(_) => {
                self.emit_addr(frame, expr)?;
                self.line("mov rax, [rax]");
                Ok(())
            }
            ExprKind::Unary { op, expr: inner } => {
                self.emit_expr(frame, inner)?;
                match op {
                    UnOp::Neg => self.line("imul rax, -1"),
                    UnOp::Not => {
                        self.line("test rax, rax");
                        self.line("setz bl");
                        self.line("xor rax, rax");
                        self.line("mov al, bl");
                    }
                }
                Ok(())
            }
            ExprKind::Binary { op, left, right } => self.emit_binary(frame, *op, left, right),
            ExprKind::StaticCall { name, args } => {
                for arg in args {
                    self.emit_expr(frame, arg)?;
                    self.line("push rax");
                    frame.push_anon();
                }
                self.line(format!("call {}", name));
                for _ in args {
                    frame.pop_value();
                }
                if !args.is_empty() {
                    self.line(format!("add rsp, {}", args.len() * 8));
                }
                Ok(())
            }
            ExprKind::VirtualCall { object, name, args } => {
                self.emit_virtual_call(frame, object, name, args)
            }
            ExprKind::Call { .. } => {
                Err(internal("ambiguous call operator survived type checking"))
            }
            ExprKind::Subscript { .. } => {
                self.emit_addr(frame, expr)?;
                self.line("mov rax, [rax]");
                Ok(())
            }
            ExprKind::Member { object, .. } => {
                // An array's only member is its length word, which the
                // array pointer itself addresses.
                if object.ty.as_ref().map(Type::is_array).unwrap_or(false) {
                    self.emit_expr(frame, object)?;
                } else {
                    self.emit_addr(frame, expr)?;
                }
                self.line("mov rax, [rax]");
                Ok(())
            }
            ExprKind::Cast { expr: inner, .. } => self.emit_expr(frame, inner),
            ExprKind::NewObject { class } => {
                self.line(format!("call {}", constructor_label(class)));
                Ok(())
            }
            ExprKind::NewArray { elem, size } => {
                self.emit_expr(frame, size)?;
                let default = if *elem == Type::Str {
                    "_empty_str"
                } else {
                    "0"
                };
                self.line(format!("push qword {}", default));
                self.line("push rax");
                self.line("call _new_array");
                self.line("add rsp, 16");
                Ok(())
            }
        }
    }

    fn emit_binary(
        &mut self,
        frame: &mut Frame,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> EmitResult {
        match op {
            BinOp::Add => self.int_op(frame, left, right, "add"),
            BinOp::Sub => self.int_op(frame, left, right, "sub"),
            BinOp::Mul => self.int_op(frame, left, right, "imul"),
            BinOp::Div => self.int_div(frame, left, right),
            BinOp::Mod => {
                self.int_div(frame, left, right)?;
                self.line("mov rax, rdx");
                Ok(())
            }
            BinOp::And => self.short_circuit(frame, left, right, "jz"),
            BinOp::Or => self.short_circuit(frame, left, right, "jnz"),
            BinOp::Lt => self.compare(frame, left, right, "setl"),
            BinOp::Le => self.compare(frame, left, right, "setle"),
            BinOp::Gt => self.compare(frame, left, right, "setg"),
            BinOp::Ge => self.compare(frame, left, right, "setge"),
            BinOp::Eq => self.compare(frame, left, right, "sete"),
            BinOp::Ne => self.compare(frame, left, right, "setne"),
        }
    }

    /// Evaluate right into `rbx` (via the stack), left into `rax`.
    fn operands(&mut self, frame: &mut Frame, left: &Expr, right: &Expr) -> EmitResult {
        self.emit_expr(frame, right)?;
        self.line("push rax");
        frame.push_anon();
        self.emit_expr(frame, left)?;
        self.line("pop rbx");
        frame.pop_value();
        Ok(())
    }

    fn int_op(&mut self, frame: &mut Frame, left: &Expr, right: &Expr, op: &str) -> EmitResult {
        self.operands(frame, left, right)?;
        self.line(format!("{} rax, rbx", op));
        Ok(())
    }

    fn int_div(&mut self, frame: &mut Frame, left: &Expr, right: &Expr) -> EmitResult {
        self.operands(frame, left, right)?;
        self.line("cqo");
        self.line("idiv rbx");
        Ok(())
    }

    fn compare(&mut self, frame: &mut Frame, left: &Expr, right: &Expr, set: &str) -> EmitResult {
        self.operands(frame, left, right)?;
        self.line("cmp rax, rbx");
        self.line(format!("{} bl", set));
        self.line("xor rax, rax");
        self.line("mov al, bl");
        Ok(())
    }

    /// `&&`/`||`: evaluate the left operand and skip the right one on
    /// the deciding value.
    fn short_circuit(
        &mut self,
        frame: &mut Frame,
        left: &Expr,
        right: &Expr,
        jump: &str,
    ) -> EmitResult {
        let label = self.next_label();
        self.emit_expr(frame, left)?;
        self.line("test rax, rax");
        self.line(format!("{} _boolean_op_after_{}", jump, label));
        self.emit_expr(frame, right)?;
        self.line(format!("_boolean_op_after_{}:", label));
        Ok(())
    }

    fn emit_virtual_call(
        &mut self,
        frame: &mut Frame,
        object: &Expr,
        name: &str,
        args: &[Expr],
    ) -> EmitResult {
        for arg in args {
            self.emit_expr(frame, arg)?;
            self.line("push rax");
            frame.push_anon();
        }
        self.emit_expr(frame, object)?;
        let info = self.info;
        let slot = match &object.ty {
            Some(Type::Class(class)) => info
                .classes
                .get(class)
                .and_then(|ci| ci.method_slots.get(name))
                .copied()
                .ok_or_else(|| internal(format!("method {} missing from class {}", name, class)))?,
            other => {
                return Err(internal(format!(
                    "virtual call through non-class type {:?}",
                    other
                )))
            }
        };
        self.line("push rax");
        self.line("mov rax, [rax]");
        self.line(format!("add rax, {}", slot * 8));
        self.line("mov rax, [rax]");
        self.line("call rax");
        for _ in args {
            frame.pop_value();
        }
        self.line(format!("add rsp, {}", (args.len() + 1) * 8));
        Ok(())
    }

    /// Leave the address of an lvalue in `rax`.
    pub(crate) fn emit_addr(&mut self, frame: &mut Frame, expr: &Expr) -> EmitResult {
        match &expr.kind {
            ExprKind::Variable(name) => {
                if let Some(offset) = frame.local_offset(name) {
                    self.line(format!("lea rax, [rsp+{}]", offset));
                    Ok(())
                } else if let Some(offset) = frame.param_offset(name) {
                    self.line(format!("lea rax, [rsp+{}]", offset));
                    Ok(())
                } else {
                    Err(internal(format!("no storage location for {}", name)))
                }
            }
            ExprKind::Subscript { array, index } => {
                self.emit_expr(frame, index)?;
                self.line("push rax");
                frame.push_anon();
                self.emit_expr(frame, array)?;
                self.line("pop rbx");
                frame.pop_value();
                // Index checked against the length word; the runtime
                // `error` routine never returns.
                self.line("cmp [rax], rbx");
                self.line("jle error");
                self.line("lea rax, [rax + rbx * 8 + 8]");
                Ok(())
            }
            ExprKind::Cast { expr: inner, .. } => self.emit_addr(frame, inner),
            ExprKind::Member { object, member } => {
                self.emit_expr(frame, object)?;
                let info = self.info;
                let field_id = match &object.ty {
                    Some(Type::Class(class)) => info
                        .classes
                        .get(class)
                        .and_then(|ci| ci.field_ids.get(member))
                        .copied()
                        .ok_or_else(|| {
                            internal(format!("field {} missing from class {}", member, class))
                        })?,
                    other => {
                        return Err(internal(format!(
                            "member access through non-class type {:?}",
                            other
                        )))
                    }
                };
                self.line(format!("add rax, {}", (field_id + 1) * 8));
                Ok(())
            }
            _ => Err(internal("address requested for a non-lvalue expression")),
        }
    }
}
