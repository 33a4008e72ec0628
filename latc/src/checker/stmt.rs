//! Statement rules: scoping, return coverage and dead-code elision.

use latc_parser::{ExprKind, Stmt, StmtKind, Type};

use super::FnChecker;

impl FnChecker<'_> {
    /// Check one statement; the return value is its `does_return` flag.
    pub(crate) fn check_stmt(&mut self, stmt: &mut Stmt) -> bool {
        match &mut stmt.kind {
            StmtKind::Empty => false,
            StmtKind::Block(_) => self.check_block(stmt),
            StmtKind::Definition(_) => self.check_definition_stmt(stmt),
            StmtKind::Assign { .. } => self.check_assign(stmt),
            StmtKind::Incr(_) | StmtKind::Decr(_) => self.check_incr_decr(stmt),
            StmtKind::Expr(_) => self.check_expr_stmt(stmt),
            StmtKind::Return(_) => self.check_return(stmt),
            StmtKind::If { .. } => self.check_if(stmt),
            StmtKind::While { .. } => self.check_while(stmt),
            StmtKind::For { .. } => self.check_for(stmt),
        }
    }

    /// After the first returning statement, the rest of the block is
    /// dead and replaced with `Empty`.
    fn check_block(&mut self, stmt: &mut Stmt) -> bool {
        let StmtKind::Block(stmts) = &mut stmt.kind else {
            return false;
        };
        self.scopes.push_frame();
        let mut returned = false;
        for s in stmts.iter_mut() {
            let r = self.check_stmt(s);
            if returned {
                *s = Stmt::empty(s.span);
            } else {
                returned |= r;
            }
        }
        self.scopes.pop_frame();
        returned
    }

    fn check_definition_stmt(&mut self, stmt: &mut Stmt) -> bool {
        let StmtKind::Definition(def) = &mut stmt.kind else {
            return false;
        };
        let base = match &def.ty {
            Type::Array(elem) => elem.as_ref().clone(),
            other => other.clone(),
        };
        if !self.info.is_known_type(&def.ty, false) {
            let msg = format!("Usage of undeclared type {}", base);
            self.err(def.span, msg);
        }
        let span = def.span;
        let declared_ty = def.ty.clone();
        for item in def.items.iter_mut() {
            if let Some(init) = &mut item.init {
                self.check_expr(init);
                if let Some(t) = &init.ty {
                    if !self.info.casts_implicitly(t, &declared_ty) {
                        let msg = format!(
                            "cannot cast from {} to {} in the definition of variable {}",
                            t, declared_ty, item.name
                        );
                        self.err(span, msg);
                    }
                }
            }
            if self.scopes.declared_in_current(&item.name) {
                let msg = format!("redeclaration of variable {}", item.name);
                self.err(span, msg);
            } else {
                self.scopes.declare(&item.name, declared_ty.clone());
            }
        }
        false
    }

    fn check_assign(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        let StmtKind::Assign { target, value } = &mut stmt.kind else {
            return false;
        };
        self.check_expr(value);
        let target_flags = self.check_expr(target);
        if let (Some(vt), Some(tt)) = (&value.ty, &target.ty) {
            if !self.info.casts_implicitly(vt, tt) {
                let msg = format!("cannot cast from {} to {} for assignment.", vt, tt);
                self.err(span, msg);
            }
        }
        if target.ty.is_some() && !target_flags.lvalue {
            self.err(span, "assignment expects a variable.");
        }
        false
    }

    fn check_incr_decr(&mut self, stmt: &mut Stmt) -> bool {
        let (StmtKind::Incr(expr) | StmtKind::Decr(expr)) = &mut stmt.kind else {
            return false;
        };
        let flags = self.check_expr(expr);
        let span = expr.span;
        if let Some(t) = &expr.ty {
            if !self.info.casts_implicitly(t, &Type::Int) {
                let msg = format!(
                    "cannot cast from {} to int for incrementation/decrementation.",
                    t
                );
                self.err(span, msg);
            }
        }
        if !flags.lvalue {
            self.err(span, "incrementation/decrementation expects a variable.");
        }
        false
    }

    /// An expression statement without side effects is dropped. Calling
    /// the non-returning builtin `error` counts as returning.
    fn check_expr_stmt(&mut self, stmt: &mut Stmt) -> bool {
        let StmtKind::Expr(expr) = &mut stmt.kind else {
            return false;
        };
        let flags = self.check_expr(expr);
        let is_error_call = matches!(
            &expr.kind,
            ExprKind::StaticCall { name, .. } if name == "error"
        );
        if !flags.side_effects {
            stmt.kind = StmtKind::Empty;
        }
        is_error_call
    }

    fn check_return(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        let StmtKind::Return(value) = &mut stmt.kind else {
            return false;
        };
        match value {
            None => {
                if self.return_type != Type::Void {
                    self.err(span, "argumentless return in a non-void function");
                }
            }
            Some(expr) => {
                self.check_expr(expr);
                if let Some(t) = &expr.ty {
                    if !self.info.casts_implicitly(t, &self.return_type) {
                        let msg = format!(
                            "cannot cast from {} to {} in the return statement.",
                            t, self.return_type
                        );
                        self.err(span, msg);
                    }
                }
            }
        }
        true
    }

    /// A constant condition hoists the chosen branch into this position
    /// and drops the other.
    fn check_if(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        let StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } = &mut stmt.kind
        else {
            return false;
        };
        self.check_expr(cond);
        if let Some(t) = &cond.ty {
            if !self.info.casts_implicitly(t, &Type::Bool) {
                let msg = format!("cannot cast from {} to bool in the condition of if statement.", t);
                self.err(span, msg);
            }
        }
        let ret_then = self.check_stmt(then_branch);
        let ret_else = match else_branch {
            Some(e) => self.check_stmt(e),
            None => false,
        };
        if matches!(then_branch.kind, StmtKind::Definition(_)) {
            self.err(span, "cannot define variable in if-then, try wrapping in a block.");
        }
        if let Some(e) = else_branch {
            if matches!(e.kind, StmtKind::Definition(_)) {
                self.err(span, "cannot define variable in if-else, try wrapping in a block.");
            }
        }
        let folded = cond.as_bool_literal();
        match folded {
            Some(true) => {
                if let StmtKind::If { then_branch, .. } =
                    std::mem::replace(&mut stmt.kind, StmtKind::Empty)
                {
                    *stmt = *then_branch;
                }
                ret_then
            }
            Some(false) => {
                if let StmtKind::If {
                    else_branch: Some(e),
                    ..
                } = std::mem::replace(&mut stmt.kind, StmtKind::Empty)
                {
                    *stmt = *e;
                }
                ret_else
            }
            None => ret_then && ret_else,
        }
    }

    /// `while (true)` is treated as non-terminating; `while (false)` is
    /// dropped entirely.
    fn check_while(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        let StmtKind::While { cond, body } = &mut stmt.kind else {
            return false;
        };
        self.check_expr(cond);
        if let Some(t) = &cond.ty {
            if !self.info.casts_implicitly(t, &Type::Bool) {
                let cond_span = cond.span;
                let msg = format!(
                    "cannot cast from {} to boolean in the condition of while loop.",
                    t
                );
                self.err(cond_span, msg);
            }
        }
        self.check_stmt(body);
        if matches!(body.kind, StmtKind::Definition(_)) {
            self.err(span, "cannot define variable in while, try wrapping in a block.");
        }
        let folded = cond.as_bool_literal();
        match folded {
            Some(true) => true,
            Some(false) => {
                stmt.kind = StmtKind::Empty;
                false
            }
            None => false,
        }
    }

    fn check_for(&mut self, stmt: &mut Stmt) -> bool {
        let span = stmt.span;
        let StmtKind::For {
            elem_ty,
            var,
            array,
            body,
        } = &mut stmt.kind
        else {
            return false;
        };
        if matches!(body.kind, StmtKind::Definition(_)) {
            self.err(span, "cannot define variable in for, try wrapping in a block.");
        }
        self.check_expr(array);
        let array_span = array.span;
        if let Some(t) = array.ty.clone() {
            match t {
                Type::Array(elem) => {
                    if !self.info.casts_implicitly(&elem, elem_ty) {
                        let msg = format!(
                            "type {} does not implicitly cast to {} in for argument.",
                            elem, elem_ty
                        );
                        self.err(array_span, msg);
                    }
                }
                _ => {
                    self.err(array_span, "non-array type used as a for argument.");
                }
            }
        }
        if !self.info.is_known_type(elem_ty, true) {
            let msg = format!("Usage of undeclared type {}", elem_ty);
            self.err(span, msg);
        }
        let var = var.clone();
        let elem_ty = elem_ty.clone();
        self.scopes.push_frame();
        self.scopes.declare(&var, elem_ty);
        self.check_stmt(body);
        self.scopes.pop_frame();
        false
    }
}
