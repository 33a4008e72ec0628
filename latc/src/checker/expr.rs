//! Expression rules: annotation, resolution, folding and rewrites.

use latc_parser::{BinOp, Expr, ExprKind, Param, Span, Type, UnOp};

use crate::builtins::{BUILTIN_FUNCTIONS, CONCAT_FUN, LENGTH_ATTR, SELF_NAME};

use super::{ExprFlags, FnChecker};

/// The callable type of a resolved function or method.
fn function_type(ret: &Type, params: &[Param]) -> Type {
    Type::Function(
        Box::new(ret.clone()),
        params.iter().map(|p| p.ty.clone()).collect(),
    )
}

/// Move an expression out, leaving a typeless `null` in its place.
fn take_expr(slot: &mut Expr) -> Expr {
    let span = slot.span;
    std::mem::replace(
        slot,
        Expr {
            span,
            ty: None,
            kind: ExprKind::Null,
        },
    )
}

impl FnChecker<'_> {
    pub(crate) fn check_expr(&mut self, expr: &mut Expr) -> ExprFlags {
        match &expr.kind {
            ExprKind::Int(_) => {
                expr.ty = Some(Type::Int);
                ExprFlags::pure()
            }
            ExprKind::Bool(_) => {
                expr.ty = Some(Type::Bool);
                ExprFlags::pure()
            }
            ExprKind::Str(_) => {
                expr.ty = Some(Type::Str);
                ExprFlags::pure()
            }
            ExprKind::Null => {
                expr.ty = Some(Type::Null);
                ExprFlags::place()
            }
            ExprKind::Variable(_) => self.check_variable(expr),
            ExprKind::Unary { .. } => self.check_unary(expr),
            ExprKind::Binary { .. } => self.check_binary(expr),
            ExprKind::Call { .. } => self.check_call(expr),
            ExprKind::StaticCall { .. } | ExprKind::VirtualCall { .. } => {
                self.err(expr.span, "Internal parser error.");
                expr.ty = None;
                ExprFlags::pure()
            }
            ExprKind::Subscript { .. } => self.check_subscript(expr),
            ExprKind::Member { .. } => self.check_member(expr),
            ExprKind::Cast { .. } => self.check_cast(expr),
            ExprKind::NewObject { .. } => self.check_new_object(expr),
            ExprKind::NewArray { .. } => self.check_new_array(expr),
        }
    }

    /// Resolution order: locals, enclosing-class methods, enclosing-class
    /// fields, `self`, free functions, builtins. Member hits are
    /// rewritten onto an implicit `self`.
    fn check_variable(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let name = match &expr.kind {
            ExprKind::Variable(n) => n.clone(),
            _ => return ExprFlags::pure(),
        };

        if let Some(ty) = self.scopes.lookup(&name) {
            expr.ty = Some(ty.clone());
            return ExprFlags::place();
        }

        if let Some(class_name) = self.class_name.clone() {
            let ci = &self.info.classes[&class_name];
            if let Some(&slot) = ci.method_slots.get(&name) {
                let method = &ci.methods[slot];
                let ty = function_type(&method.return_type, &method.params);
                self.rewrite_to_self_member(expr, &class_name, name, ty);
                return ExprFlags::pure();
            }
            if let Some(&id) = ci.field_ids.get(&name) {
                let ty = ci.fields[id].0.clone();
                self.rewrite_to_self_member(expr, &class_name, name, ty);
                return ExprFlags::place();
            }
            if name == SELF_NAME {
                expr.ty = Some(Type::Class(class_name));
                return ExprFlags::place();
            }
        }

        if let Some(fun) = self.info.functions.get(&name) {
            expr.ty = Some(function_type(&fun.return_type, &fun.params));
            return ExprFlags::pure();
        }
        if let Some((ret, params)) = BUILTIN_FUNCTIONS.get(name.as_str()) {
            expr.ty = Some(Type::Function(Box::new(ret.clone()), params.clone()));
            return ExprFlags::pure();
        }

        self.err(
            span,
            format!("use of undeclared variable/function {}.", name),
        );
        expr.ty = None;
        ExprFlags::pure()
    }

    fn rewrite_to_self_member(&self, expr: &mut Expr, class_name: &str, member: String, ty: Type) {
        let start = expr.span.start;
        let receiver = Expr::typed(
            Span::new(start, start),
            Type::Class(class_name.to_string()),
            ExprKind::Variable(SELF_NAME.to_string()),
        );
        expr.kind = ExprKind::Member {
            object: Box::new(receiver),
            member,
        };
        expr.ty = Some(ty);
    }

    fn check_unary(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::Unary { op, expr: inner } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let op = *op;
        let flags = self.check_expr(inner);
        let (operand_ty, op_name) = match op {
            UnOp::Neg => (Type::Int, "an int negation"),
            UnOp::Not => (Type::Bool, "a bool negation"),
        };
        let ty = match &inner.ty {
            Some(t) if self.info.casts_implicitly(t, &operand_ty) => Some(operand_ty),
            Some(t) => {
                let msg = format!(
                    "type {} cannot be casted to {} in {} expression.",
                    t, operand_ty, op_name
                );
                self.err(span, msg);
                None
            }
            None => None,
        };
        let folded = match op {
            UnOp::Neg => inner
                .as_int_literal()
                .map(|v| ExprKind::Int(v.wrapping_neg())),
            UnOp::Not => inner.as_bool_literal().map(|v| ExprKind::Bool(!v)),
        };
        expr.ty = ty;
        if let Some(kind) = folded {
            expr.kind = kind;
        }
        ExprFlags {
            side_effects: flags.side_effects,
            lvalue: false,
        }
    }

    fn check_binary(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::Binary { op, left, right } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let op = *op;
        let lf = self.check_expr(left);
        let rf = self.check_expr(right);
        let side_effects = lf.side_effects || rf.side_effects;

        match op {
            BinOp::Add => self.check_addition(expr, span),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                self.check_arithmetic(expr, span, op)
            }
            BinOp::And | BinOp::Or => self.check_boolean(expr, span, op),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => self.check_comparison(expr, span, op),
            BinOp::Eq | BinOp::Ne => self.check_equality(expr, span, op),
        }
        ExprFlags {
            side_effects,
            lvalue: false,
        }
    }

    /// `+` is integer addition or, when both sides are strings, a
    /// rewrite into a `_concat` call.
    fn check_addition(&mut self, expr: &mut Expr, span: Span) {
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return;
        };
        let (Some(lt), Some(rt)) = (left.ty.clone(), right.ty.clone()) else {
            expr.ty = None;
            return;
        };
        if self.info.casts_implicitly(&lt, &Type::Str) && self.info.casts_implicitly(&rt, &Type::Str)
        {
            let l = take_expr(left);
            let r = take_expr(right);
            expr.kind = ExprKind::StaticCall {
                name: CONCAT_FUN.to_string(),
                args: vec![l, r],
            };
            expr.ty = Some(Type::Str);
        } else if self.info.casts_implicitly(&lt, &Type::Int)
            && self.info.casts_implicitly(&rt, &Type::Int)
        {
            let folded = match (left.as_int_literal(), right.as_int_literal()) {
                (Some(a), Some(b)) => Some(ExprKind::Int(a.wrapping_add(b))),
                _ => None,
            };
            expr.ty = Some(Type::Int);
            if let Some(kind) = folded {
                expr.kind = kind;
            }
        } else {
            let msg = format!(
                "the plus operator got arguments of {} and {} instead of string + string or int + int",
                lt, rt
            );
            self.err(span, msg);
            expr.ty = None;
        }
    }

    fn check_arithmetic(&mut self, expr: &mut Expr, span: Span, op: BinOp) {
        let op_name = match op {
            BinOp::Sub => "a substraction",
            BinOp::Mul => "a multiplication",
            BinOp::Div => "a division",
            BinOp::Mod => "a modulo",
            _ => "an arithmetic",
        };
        let valid = self.check_operands(expr, span, &Type::Int, op_name);
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return;
        };
        let folded = match (left.as_int_literal(), right.as_int_literal()) {
            (Some(a), Some(b)) => match op {
                BinOp::Sub => Some(a.wrapping_sub(b)),
                BinOp::Mul => Some(a.wrapping_mul(b)),
                BinOp::Div => {
                    if b == 0 {
                        self.err(span, "division by zero");
                        Some(0)
                    } else {
                        Some(a.wrapping_div(b))
                    }
                }
                BinOp::Mod => {
                    if b == 0 {
                        self.err(span, "modulo by zero");
                        Some(0)
                    } else {
                        Some(a.wrapping_rem(b))
                    }
                }
                _ => None,
            },
            _ => None,
        };
        expr.ty = if valid { Some(Type::Int) } else { None };
        if let Some(v) = folded {
            expr.kind = ExprKind::Int(v);
        }
    }

    fn check_boolean(&mut self, expr: &mut Expr, span: Span, op: BinOp) {
        let op_name = if op == BinOp::And {
            "a conjunction"
        } else {
            "an alternative"
        };
        let valid = self.check_operands(expr, span, &Type::Bool, op_name);
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return;
        };
        let folded = match (left.as_bool_literal(), right.as_bool_literal()) {
            (Some(a), Some(b)) => Some(if op == BinOp::And { a && b } else { a || b }),
            _ => None,
        };
        expr.ty = if valid { Some(Type::Bool) } else { None };
        if let Some(v) = folded {
            expr.kind = ExprKind::Bool(v);
        }
    }

    fn check_comparison(&mut self, expr: &mut Expr, span: Span, op: BinOp) {
        let op_name = match op {
            BinOp::Lt => "a lt comparison",
            BinOp::Le => "a le comparison",
            BinOp::Gt => "a gt comparison",
            BinOp::Ge => "a ge comparison",
            _ => "a comparison",
        };
        let valid = self.check_operands(expr, span, &Type::Int, op_name);
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return;
        };
        let folded = match (left.as_int_literal(), right.as_int_literal()) {
            (Some(a), Some(b)) => Some(match op {
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                _ => a >= b,
            }),
            _ => None,
        };
        expr.ty = if valid { Some(Type::Bool) } else { None };
        if let Some(v) = folded {
            expr.kind = ExprKind::Bool(v);
        }
    }

    /// Both operands must cast to `operand_ty`; the right operand is
    /// reported first. Returns whether both sides were valid.
    fn check_operands(&mut self, expr: &mut Expr, span: Span, operand_ty: &Type, op_name: &str) -> bool {
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return false;
        };
        let mut valid = true;
        let mut msgs = Vec::new();
        match &right.ty {
            None => valid = false,
            Some(t) if !self.info.casts_implicitly(t, operand_ty) => {
                msgs.push(format!(
                    "type {} cannot be casted to {} in the right operand of {} expression.",
                    t, operand_ty, op_name
                ));
                valid = false;
            }
            _ => {}
        }
        match &left.ty {
            None => valid = false,
            Some(t) if !self.info.casts_implicitly(t, operand_ty) => {
                msgs.push(format!(
                    "type {} cannot be casted to {} in the left operand of {} expression.",
                    t, operand_ty, op_name
                ));
                valid = false;
            }
            _ => {}
        }
        for msg in msgs {
            self.err(span, msg);
        }
        valid
    }

    /// `==`/`!=`: each side must cast to the other in at least one
    /// direction; literal pairs of the same kind fold.
    fn check_equality(&mut self, expr: &mut Expr, span: Span, op: BinOp) {
        let negated = op == BinOp::Ne;
        let ExprKind::Binary { left, right, .. } = &mut expr.kind else {
            return;
        };
        let ty = match (&left.ty, &right.ty) {
            (Some(lt), Some(rt)) => {
                if self.info.casts_implicitly(lt, rt) || self.info.casts_implicitly(rt, lt) {
                    Some(Type::Bool)
                } else {
                    let msg = format!("type {} and {} cannot be compared.", lt, rt);
                    self.err(span, msg);
                    None
                }
            }
            _ => None,
        };
        let folded = match (&left.kind, &right.kind) {
            (ExprKind::Int(a), ExprKind::Int(b)) => Some(a == b),
            (ExprKind::Bool(a), ExprKind::Bool(b)) => Some(a == b),
            (ExprKind::Str(a), ExprKind::Str(b)) => Some(a == b),
            _ => None,
        };
        expr.ty = ty;
        if let Some(eq) = folded {
            expr.kind = ExprKind::Bool(if negated { !eq } else { eq });
        }
    }

    /// Check the ambiguous call form, then classify it: a resolved bare
    /// name becomes a static call, a member becomes a virtual call.
    fn check_call(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::Call { callee, args } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let mut valid = true;
        let mut actual = Vec::new();
        for arg in args.iter_mut() {
            self.check_expr(arg);
            if arg.ty.is_none() {
                valid = false;
            }
            actual.push(arg.ty.clone());
        }
        self.check_expr(callee);
        if callee.ty.is_none() {
            valid = false;
        }

        let mut result_ty = None;
        if valid {
            match callee.ty.clone() {
                Some(Type::Function(ret, declared)) => {
                    let arity_ok = declared.len() == actual.len();
                    let args_ok = arity_ok
                        && actual.iter().zip(&declared).all(|(a, d)| {
                            a.as_ref()
                                .map(|a| self.info.casts_implicitly(a, d))
                                .unwrap_or(false)
                        });
                    if args_ok {
                        result_ty = Some(*ret);
                    } else {
                        let shown = actual
                            .iter()
                            .map(|t| {
                                t.as_ref().map(|t| t.to_string()).unwrap_or_default()
                            })
                            .collect::<Vec<_>>()
                            .join(",");
                        let callee_ty = Type::Function(ret, declared);
                        let msg = format!(
                            "type {} cannot be called with arguments: ({})",
                            callee_ty, shown
                        );
                        self.err(span, msg);
                    }
                }
                Some(other) => {
                    let msg = format!("type {} does not support the call operator.", other);
                    self.err(span, msg);
                }
                None => {}
            }
        }

        let kind = std::mem::replace(&mut expr.kind, ExprKind::Null);
        if let ExprKind::Call { callee, args } = kind {
            let callee = *callee;
            match callee.kind {
                ExprKind::Variable(name) => {
                    expr.kind = ExprKind::StaticCall { name, args };
                }
                ExprKind::Member { object, member } => {
                    expr.kind = ExprKind::VirtualCall {
                        object,
                        name: member,
                        args,
                    };
                }
                other => {
                    // Reported above as non-callable; keep the node.
                    expr.kind = ExprKind::Call {
                        callee: Box::new(Expr {
                            span: callee.span,
                            ty: callee.ty,
                            kind: other,
                        }),
                        args,
                    };
                }
            }
        }
        expr.ty = result_ty;
        ExprFlags {
            side_effects: true,
            lvalue: false,
        }
    }

    fn check_subscript(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::Subscript { array, index } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let index_flags = self.check_expr(index);
        let index_ty = index.ty.clone();
        let array_flags = self.check_expr(array);
        let array_ty = array.ty.clone();

        if let Some(t) = &index_ty {
            if !self.info.casts_implicitly(t, &Type::Int) {
                let msg = format!(
                    "cannot cast from type {} to int as the index argument in the array subscript operator.",
                    t
                );
                self.err(span, msg);
            }
        }
        expr.ty = match array_ty {
            None => None,
            Some(Type::Array(elem)) => Some(*elem),
            Some(other) => {
                let msg = format!("type {} does not support index subscript operator.", other);
                self.err(span, msg);
                None
            }
        };
        ExprFlags {
            side_effects: index_flags.side_effects || array_flags.side_effects,
            lvalue: true,
        }
    }

    fn check_member(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let info = self.info;
        let ExprKind::Member { object, member } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let flags = self.check_expr(object);
        let member = member.clone();
        let object_ty = object.ty.clone();

        let mut lvalue = true;
        let ty = match object_ty {
            None => None,
            Some(ref t) if t.is_array() => {
                lvalue = false;
                if member == LENGTH_ATTR {
                    Some(Type::Int)
                } else {
                    let msg = format!(
                        "member access operator applied to an array requests member {} but only {} is available.",
                        member, LENGTH_ATTR
                    );
                    self.err(span, msg);
                    None
                }
            }
            Some(Type::Class(ref class_name)) if info.classes.contains_key(class_name) => {
                let ci = &info.classes[class_name];
                match (ci.field_ids.get(&member), ci.method_slots.get(&member)) {
                    (Some(_), Some(_)) => {
                        let msg = format!(
                            "ambiguous member access: {} of the class {} can be both a variable and a function.",
                            member, class_name
                        );
                        self.err(span, msg);
                        None
                    }
                    (None, None) => {
                        let msg = format!(
                            "member {} of the class {} not found.",
                            member, class_name
                        );
                        self.err(span, msg);
                        None
                    }
                    (Some(&id), None) => Some(ci.fields[id].0.clone()),
                    (None, Some(&slot)) => {
                        lvalue = false;
                        let m = &ci.methods[slot];
                        Some(function_type(&m.return_type, &m.params))
                    }
                }
            }
            Some(other) => {
                let msg = format!(
                    "member access operator applied to a non-class non-array type {}",
                    other
                );
                self.err(span, msg);
                None
            }
        };
        expr.ty = ty;
        ExprFlags {
            side_effects: flags.side_effects,
            lvalue,
        }
    }

    fn check_cast(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::Cast { expr: inner, target } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let flags = self.check_expr(inner);
        let target = target.clone();
        expr.ty = match &inner.ty {
            Some(t) if self.info.casts_explicitly(t, &target) => Some(target),
            Some(t) => {
                let msg = format!("cannot explicitly cast from {} to {}.", t, target);
                self.err(span, msg);
                None
            }
            None => None,
        };
        flags
    }

    fn check_new_object(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let class = match &expr.kind {
            ExprKind::NewObject { class } => class.clone(),
            _ => return ExprFlags::pure(),
        };
        if self.info.classes.contains_key(&class) {
            expr.ty = Some(Type::Class(class));
        } else {
            let msg = format!("cannot construct a new object of unknown class {}.", class);
            self.err(span, msg);
            expr.ty = None;
        }
        ExprFlags::pure()
    }

    fn check_new_array(&mut self, expr: &mut Expr) -> ExprFlags {
        let span = expr.span;
        let ExprKind::NewArray { elem, size } = &mut expr.kind else {
            return ExprFlags::pure();
        };
        let flags = self.check_expr(size);
        let elem = elem.clone();
        if let Some(t) = &size.ty {
            if !self.info.casts_implicitly(t, &Type::Int) {
                let msg = format!(
                    "cannot cast from type {} to int as the size argument in the construction of an array.",
                    t
                );
                self.err(span, msg);
            }
        }
        let elem_ok = match &elem {
            Type::Int | Type::Bool | Type::Str => true,
            Type::Class(name) => self.info.classes.contains_key(name),
            _ => false,
        };
        if elem_ok {
            expr.ty = Some(Type::array_of(elem));
        } else {
            let msg = format!("cannot construct a new array of unknown type {}.", elem);
            self.err(span, msg);
            expr.ty = None;
        }
        ExprFlags {
            side_effects: flags.side_effects,
            lvalue: false,
        }
    }
}
