//! Type checker and normalizer tests: annotation, rewrites, folding,
//! dead-code elision and return coverage.

use latc_parser::{parse, tokenize, Expr, ExprKind, Program, Stmt, StmtKind, Type};
use pretty_assertions::assert_eq;

use latc::checker::check_program;
use latc::typeinfo::{TypeErrors, TypeInfo};

fn check(source: &str) -> Result<(Program, TypeInfo), TypeErrors> {
    let tokens = tokenize(source).expect("tokenize failed");
    let mut program = parse(tokens).expect("parse failed");
    let info = check_program(&mut program)?;
    Ok((program, info))
}

fn check_ok(source: &str) -> (Program, TypeInfo) {
    match check(source) {
        Ok(result) => result,
        Err(e) => panic!("expected success, got errors: {:?}", e.0),
    }
}

fn check_err(source: &str) -> TypeErrors {
    match check(source) {
        Ok(_) => panic!("expected type errors"),
        Err(e) => e,
    }
}

fn assert_has_error(errors: &TypeErrors, needle: &str) {
    assert!(
        errors.0.iter().any(|e| e.msg.contains(needle)),
        "no error containing {:?} in {:?}",
        needle,
        errors.0.iter().map(|e| &e.msg).collect::<Vec<_>>()
    );
}

// ==================== Tree walkers ====================

fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(expr);
    match &expr.kind {
        ExprKind::Unary { expr, .. } => walk_expr(expr, visit),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, visit);
            walk_expr(right, visit);
        }
        ExprKind::Call { callee, args } => {
            walk_expr(callee, visit);
            for a in args {
                walk_expr(a, visit);
            }
        }
        ExprKind::StaticCall { args, .. } => {
            for a in args {
                walk_expr(a, visit);
            }
        }
        ExprKind::VirtualCall { object, args, .. } => {
            walk_expr(object, visit);
            for a in args {
                walk_expr(a, visit);
            }
        }
        ExprKind::Subscript { array, index } => {
            walk_expr(array, visit);
            walk_expr(index, visit);
        }
        ExprKind::Member { object, .. } => walk_expr(object, visit),
        ExprKind::Cast { expr, .. } => walk_expr(expr, visit),
        ExprKind::NewArray { size, .. } => walk_expr(size, visit),
        _ => {}
    }
}

fn walk_stmt(stmt: &Stmt, visit: &mut impl FnMut(&Expr)) {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                walk_stmt(s, visit);
            }
        }
        StmtKind::Definition(def) => {
            for item in &def.items {
                if let Some(init) = &item.init {
                    walk_expr(init, visit);
                }
            }
        }
        StmtKind::Assign { target, value } => {
            walk_expr(target, visit);
            walk_expr(value, visit);
        }
        StmtKind::Incr(e) | StmtKind::Decr(e) | StmtKind::Expr(e) => walk_expr(e, visit),
        StmtKind::Return(Some(e)) => walk_expr(e, visit),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(cond, visit);
            walk_stmt(then_branch, visit);
            if let Some(e) = else_branch {
                walk_stmt(e, visit);
            }
        }
        StmtKind::While { cond, body } => {
            walk_expr(cond, visit);
            walk_stmt(body, visit);
        }
        StmtKind::For { array, body, .. } => {
            walk_expr(array, visit);
            walk_stmt(body, visit);
        }
        _ => {}
    }
}

fn walk_program(program: &Program, visit: &mut impl FnMut(&Expr)) {
    for fun in &program.functions {
        for s in &fun.body {
            walk_stmt(s, visit);
        }
    }
    for class in &program.classes {
        for method in &class.methods {
            for s in &method.body {
                walk_stmt(s, visit);
            }
        }
    }
}

fn body_of<'a>(program: &'a Program, name: &str) -> &'a [Stmt] {
    &program
        .functions
        .iter()
        .find(|f| f.name == name)
        .expect("function not found")
        .body
}

// ==================== Normalization ====================

#[test]
fn test_no_ambiguous_call_survives_and_all_typed() {
    let (program, _) = check_ok(
        "class Greeter {
            string text;
            string get() { return text; }
            string twice() { return get() + get(); }
        }
        string describe(Greeter g) { return g.get(); }
        int main() {
            Greeter g = new Greeter;
            printString(describe(g));
            printString(g.twice());
            return 0;
        }",
    );
    walk_program(&program, &mut |e| {
        assert!(
            !matches!(e.kind, ExprKind::Call { .. }),
            "ambiguous call survived checking"
        );
        assert!(e.ty.is_some(), "untyped expression after checking");
    });
}

#[test]
fn test_call_classification() {
    let (program, _) = check_ok(
        "int free() { return 1; }
         class A { int m() { return 2; } int chain() { return m(); } }
         int main() { A a = new A; return free() + a.m(); }",
    );
    let main_body = body_of(&program, "main");
    let mut statics = 0;
    let mut virtuals = 0;
    for s in main_body {
        walk_stmt(s, &mut |e| match &e.kind {
            ExprKind::StaticCall { .. } => statics += 1,
            ExprKind::VirtualCall { .. } => virtuals += 1,
            _ => {}
        });
    }
    assert_eq!(statics, 1);
    assert_eq!(virtuals, 1);

    // A bare method call inside a method dispatches through `self`.
    let chain = &program.classes[0].methods[1].body;
    let mut found_self_dispatch = false;
    for s in chain {
        walk_stmt(s, &mut |e| {
            if let ExprKind::VirtualCall { object, name, .. } = &e.kind {
                assert_eq!(name, "m");
                assert!(matches!(&object.kind, ExprKind::Variable(v) if v == "self"));
                found_self_dispatch = true;
            }
        });
    }
    assert!(found_self_dispatch);
}

#[test]
fn test_bare_field_gets_implicit_self() {
    let (program, _) = check_ok(
        "class Counter {
            int value;
            void bump() { value = value + 1; }
        }
        int main() { return 0; }",
    );
    let body = &program.classes[0].methods[0].body;
    let StmtKind::Assign { target, .. } = &body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Member { object, member } = &target.kind else {
        panic!("expected member access, got {:?}", target.kind);
    };
    assert_eq!(member, "value");
    assert!(matches!(&object.kind, ExprKind::Variable(v) if v == "self"));
    assert_eq!(object.ty, Some(Type::Class("Counter".to_string())));
}

#[test]
fn test_local_shadows_field() {
    let (program, _) = check_ok(
        "class C {
            int x;
            int get() { int x = 7; return x; }
        }
        int main() { return 0; }",
    );
    let body = &program.classes[0].methods[0].body;
    let StmtKind::Return(Some(e)) = &body[1].kind else {
        panic!("expected return");
    };
    assert!(matches!(&e.kind, ExprKind::Variable(v) if v == "x"));
}

#[test]
fn test_string_plus_becomes_concat() {
    let (program, _) = check_ok(r#"int main() { string s = "x" + "y"; printString(s); return 0; }"#);
    let body = body_of(&program, "main");
    let StmtKind::Definition(def) = &body[0].kind else {
        panic!("expected definition");
    };
    let init = def.items[0].init.as_ref().expect("missing initializer");
    let ExprKind::StaticCall { name, args } = &init.kind else {
        panic!("expected _concat call, got {:?}", init.kind);
    };
    assert_eq!(name, "_concat");
    assert_eq!(args.len(), 2);
    assert_eq!(init.ty, Some(Type::Str));
}

// ==================== Folding and elision ====================

#[test]
fn test_constant_folding() {
    let (program, _) = check_ok("int main() { return 1 + 2 * 3; }");
    let body = body_of(&program, "main");
    let StmtKind::Return(Some(e)) = &body[0].kind else {
        panic!("expected return");
    };
    assert_eq!(e.as_int_literal(), Some(7));
}

#[test]
fn test_boolean_and_comparison_folding() {
    let (program, _) = check_ok("boolean f() { return 1 < 2 && !false; } int main() { return 0; }");
    let body = body_of(&program, "f");
    let StmtKind::Return(Some(e)) = &body[0].kind else {
        panic!("expected return");
    };
    assert_eq!(e.as_bool_literal(), Some(true));
}

#[test]
fn test_dead_branch_elided() {
    let (program, _) = check_ok("int main() { if (false) { printInt(99); } return 0; }");
    let body = body_of(&program, "main");
    assert!(matches!(body[0].kind, StmtKind::Empty));
}

#[test]
fn test_true_branch_hoisted() {
    let (program, _) = check_ok("int main() { if (true) { printInt(1); } return 0; }");
    let body = body_of(&program, "main");
    assert!(matches!(body[0].kind, StmtKind::Block(_)));
}

#[test]
fn test_while_false_elided() {
    let (program, _) = check_ok("int main() { while (false) { printInt(1); } return 0; }");
    let body = body_of(&program, "main");
    assert!(matches!(body[0].kind, StmtKind::Empty));
}

#[test]
fn test_pure_expression_statement_dropped() {
    let (program, _) = check_ok("int main() { 1 + 2; return 0; }");
    let body = body_of(&program, "main");
    assert!(matches!(body[0].kind, StmtKind::Empty));
}

#[test]
fn test_statements_after_return_are_dead() {
    let (program, _) = check_ok("int main() { return 0; printInt(1); }");
    let body = body_of(&program, "main");
    assert!(matches!(body[1].kind, StmtKind::Empty));
}

// ==================== Return coverage ====================

#[test]
fn test_while_true_counts_as_returning() {
    check_ok("int main() { while (true) { } }");
}

#[test]
fn test_folded_condition_satisfies_coverage() {
    check_ok("int f() { if (1 == 1) return 0; } int main() { return f(); }");
}

#[test]
fn test_missing_return_rejected() {
    let errors = check_err("int f(int x) { if (x > 0) return 1; } int main() { return f(1); }");
    assert_has_error(&errors, "not all paths return");
}

#[test]
fn test_implicit_void_return_appended() {
    let (program, _) = check_ok("void f() { printInt(1); } int main() { return 0; }");
    let body = body_of(&program, "f");
    assert_eq!(body.len(), 2);
    assert!(matches!(body[1].kind, StmtKind::Return(None)));
}

#[test]
fn test_error_builtin_counts_as_returning() {
    check_ok("int main() { error(); }");
}

// ==================== Scoping ====================

#[test]
fn test_shadowing_in_nested_block() {
    check_ok("int main() { int x = 1; { int x = 2; x = 3; } return x; }");
}

#[test]
fn test_same_block_redeclaration_rejected() {
    let errors = check_err("int main() { int x = 1; int x = 2; return x; }");
    assert_has_error(&errors, "redeclaration of variable x");
}

#[test]
fn test_parameter_redeclaration_rejected() {
    let errors = check_err("int f(int x) { int x = 1; return x; } int main() { return 0; }");
    assert_has_error(&errors, "redeclaration of variable x");
}

#[test]
fn test_bare_definition_in_if_rejected() {
    let errors = check_err("int main() { if (true) int x = 1; return 0; }");
    assert_has_error(&errors, "cannot define variable in if-then");
}

// ==================== Types and members ====================

#[test]
fn test_undeclared_variable() {
    let errors = check_err("int main() { return ghost; }");
    assert_has_error(&errors, "use of undeclared variable/function ghost");
}

#[test]
fn test_assignment_needs_lvalue() {
    let errors = check_err("int main() { 1 = 2; return 0; }");
    assert_has_error(&errors, "assignment expects a variable");
}

#[test]
fn test_division_by_literal_zero() {
    let errors = check_err("int main() { return 1 / 0; }");
    assert_has_error(&errors, "division by zero");
}

#[test]
fn test_incompatible_equality() {
    let errors = check_err(r#"int main() { boolean b = 1 == "a"; return 0; }"#);
    assert_has_error(&errors, "cannot be compared");
}

#[test]
fn test_array_length_and_subscript() {
    check_ok("int main() { int[] a = new int[3]; a[0] = 5; return a.length + a[0]; }");
    let errors = check_err("int main() { int[] a = new int[3]; return a.size; }");
    assert_has_error(&errors, "only length is available");
}

#[test]
fn test_ambiguous_member() {
    let errors = check_err(
        "class P { int x() { return 1; } }
         class C extends P { int x; }
         int main() { C c = new C; return c.x; }",
    );
    assert_has_error(&errors, "ambiguous member access");
}

#[test]
fn test_null_comparisons_and_assignment() {
    check_ok(
        "class A { }
         int main() { A a = null; if (a == null) return 1; return 0; }",
    );
}

#[test]
fn test_casts_follow_hierarchy() {
    check_ok(
        "class A { } class B extends A { }
         int main() { A a = new B; B b = (B)a; return 0; }",
    );
    let errors = check_err("class A { } int main() { A a = (A)5; return 0; }");
    assert_has_error(&errors, "cannot explicitly cast from int to A");
}

#[test]
fn test_for_element_type_must_match() {
    check_ok(
        "class A { } class B extends A {  }
         int main() {
            B[] bs = new B[2];
            for (A a : bs) printInt(1);
            return 0;
         }",
    );
    let errors = check_err(
        "int main() { string[] ss = new string[1]; for (int i : ss) printInt(i); return 0; }",
    );
    assert_has_error(&errors, "does not implicitly cast to int in for argument");
}

// ==================== Overrides ====================

#[test]
fn test_override_return_type_mismatch() {
    let errors = check_err(
        r#"class A { int f() { return 1; } }
           class B extends A { string f() { return "x"; } }
           int main() { return 0; }"#,
    );
    assert_has_error(&errors, "as the return type");
}

#[test]
fn test_override_arity_mismatch() {
    let errors = check_err(
        "class A { int f(int x) { return x; } }
         class B extends A { int f(int x, int y) { return x; } }
         int main() { return 0; }",
    );
    assert_has_error(&errors, "incorrect argument count");
}

#[test]
fn test_override_covariant_parameters_accepted() {
    check_ok(
        "class A { int f(A a) { return 0; } }
         class B extends A { int f(B b) { return 1; } }
         int main() { return 0; }",
    );
}

#[test]
fn test_override_unrelated_parameter_rejected() {
    let errors = check_err(
        "class A { int f(int x) { return x; } }
         class B extends A { int f(string s) { return 0; } }
         int main() { return 0; }",
    );
    assert_has_error(&errors, "as the type of argument 0");
}
