//! Type checker and tree normalizer.
//!
//! Visits every function body once, annotating each expression with its
//! resolved type and rewriting the tree in place: ambiguous calls become
//! static or virtual calls, bare member names grow an implicit `self`,
//! string `+` becomes a `_concat` call, literal-only subexpressions fold
//! and constant-condition branches are pruned. Statement checking also
//! computes return coverage and appends the implicit `return` of `void`
//! functions.

mod expr;
mod scope;
mod stmt;

pub use scope::ScopeStack;

use latc_parser::{Param, Program, Span, Stmt, StmtKind, Type};

use crate::typeinfo::{build_type_info, TypeError, TypeErrors, TypeInfo};

/// Flags the checker computes for every expression.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExprFlags {
    /// Can evaluating the expression change observable state?
    pub side_effects: bool,
    /// Does the expression denote a storage location?
    pub lvalue: bool,
}

impl ExprFlags {
    pub fn pure() -> Self {
        Self {
            side_effects: false,
            lvalue: false,
        }
    }

    pub fn place() -> Self {
        Self {
            side_effects: false,
            lvalue: true,
        }
    }
}

/// Build the type tables, then check and normalize every function body.
pub fn check_program(program: &mut Program) -> Result<TypeInfo, TypeErrors> {
    let info = build_type_info(program)?;
    let mut errors = Vec::new();

    for idx in 0..program.functions.len() {
        let name = program.functions[idx].name.clone();
        let Some(fi) = info.functions.get(&name) else {
            continue;
        };
        if fi.fn_idx != idx {
            continue;
        }
        let return_type = fi.return_type.clone();
        let params = fi.params.clone();
        let fun = &mut program.functions[idx];
        let body_span = fun.body_span;
        let mut checker = FnChecker::new(&info, &mut errors, return_type, name, None);
        checker.check_function(&params, &mut fun.body, body_span);
    }

    for class_idx in 0..program.classes.len() {
        let class_name = program.classes[class_idx].name.clone();
        let Some(ci) = info.classes.get(&class_name) else {
            continue;
        };
        if ci.class_idx != class_idx {
            continue;
        }
        check_overrides(&info, &class_name, &mut errors);
        for slot in 0..info.classes[&class_name].methods.len() {
            let method = info.classes[&class_name].methods[slot].clone();
            if method.owner != class_name {
                continue;
            }
            let name = method.name.clone();
            let fun = &mut program.classes[method.class_idx].methods[method.method_idx];
            let body_span = fun.body_span;
            let mut checker = FnChecker::new(
                &info,
                &mut errors,
                method.return_type.clone(),
                name,
                Some(class_name.clone()),
            );
            checker.check_function(&method.params, &mut fun.body, body_span);
        }
    }

    if errors.is_empty() {
        Ok(info)
    } else {
        Err(TypeErrors(errors))
    }
}

/// Verify each overriding method against the slot it replaces: the
/// return type must cast to the parent's, arity must match, and each
/// parameter type must cast to the parent's (covariantly, as the
/// language defines it).
fn check_overrides(info: &TypeInfo, class_name: &str, errors: &mut Vec<TypeError>) {
    let ci = &info.classes[class_name];
    let Some(parent_id) = info.forest.node(ci.node).parent else {
        return;
    };
    let parent_name = info.forest.node(parent_id).class.clone();
    let pi = &info.classes[&parent_name];
    for slot in 0..pi.methods.len() {
        let parent_m = &pi.methods[slot];
        let child_m = &ci.methods[slot];
        if parent_m.class_idx == child_m.class_idx && parent_m.method_idx == child_m.method_idx {
            continue;
        }
        let method_name = &child_m.name;
        if !info.casts_implicitly(&child_m.return_type, &parent_m.return_type) {
            errors.push(TypeError::spanned(
                child_m.dec_span,
                format!(
                    "Class {}: overridden function {}: cannot implicitly cast type {} to {} as the return type.",
                    class_name, method_name, child_m.return_type, parent_m.return_type
                ),
            ));
        }
        if parent_m.params.len() != child_m.params.len() {
            errors.push(TypeError::spanned(
                child_m.dec_span,
                format!(
                    "Class {}: overridden function {} has an incorrect argument count.",
                    class_name, method_name
                ),
            ));
            continue;
        }
        for i in 0..parent_m.params.len() {
            if !info.casts_implicitly(&child_m.params[i].ty, &parent_m.params[i].ty) {
                errors.push(TypeError::spanned(
                    child_m.dec_span,
                    format!(
                        "Class {}: overridden function {}: cannot implicitly cast type {} to {} as the type of argument {}.",
                        class_name,
                        method_name,
                        child_m.params[i].ty,
                        parent_m.params[i].ty,
                        i
                    ),
                ));
            }
        }
    }
}

/// Per-function checking context.
pub(crate) struct FnChecker<'a> {
    pub(crate) info: &'a TypeInfo,
    pub(crate) errors: &'a mut Vec<TypeError>,
    pub(crate) scopes: ScopeStack,
    pub(crate) return_type: Type,
    pub(crate) fun_name: String,
    pub(crate) class_name: Option<String>,
}

impl<'a> FnChecker<'a> {
    pub(crate) fn new(
        info: &'a TypeInfo,
        errors: &'a mut Vec<TypeError>,
        return_type: Type,
        fun_name: String,
        class_name: Option<String>,
    ) -> Self {
        Self {
            info,
            errors,
            scopes: ScopeStack::new(),
            return_type,
            fun_name,
            class_name,
        }
    }

    pub(crate) fn err(&mut self, span: Span, msg: impl AsRef<str>) {
        self.errors.push(TypeError::spanned(
            span,
            format!("Function {}: {}", self.fun_name, msg.as_ref()),
        ));
    }

    /// Check a function body. The parameters share the body's outermost
    /// declaration frame, so a top-level redeclaration of a parameter is
    /// an error.
    pub(crate) fn check_function(
        &mut self,
        params: &[Param],
        body: &mut Vec<Stmt>,
        body_span: Span,
    ) {
        self.scopes.clear();
        self.scopes.push_frame();
        for param in params {
            self.scopes.declare(&param.name, param.ty.clone());
        }
        let mut returned = false;
        for stmt in body.iter_mut() {
            let r = self.check_stmt(stmt);
            if returned {
                *stmt = Stmt::empty(stmt.span);
            } else {
                returned |= r;
            }
        }
        if !returned {
            if self.return_type == Type::Void {
                let end = Span::new(body_span.end.saturating_sub(1), body_span.end);
                body.push(Stmt::new(end, StmtKind::Return(None)));
            } else {
                let end = Span::new(body_span.end.saturating_sub(1), body_span.end);
                self.err(end, "not all paths return a value in a non-void function.");
            }
        }
        self.scopes.pop_frame();
    }
}
