//! Parser tests
//!
//! Grammar-level tests: expression precedence, statement dispatch,
//! class bodies, and error traces.

use pretty_assertions::assert_eq;

use latc_parser::{
    parse, tokenize, BinOp, Expr, ExprKind, Program, Stmt, StmtKind, Type, UnOp,
};

fn parse_ok(source: &str) -> Program {
    let tokens = tokenize(source).expect("tokenize failed");
    parse(tokens).expect("parse failed")
}

/// Parse `int main() { return <expr>; }` and extract the expression.
fn parse_expr(expr: &str) -> Expr {
    let source = format!("int main() {{ return {}; }}", expr);
    let mut program = parse_ok(&source);
    let mut body = program.functions.remove(0).body;
    match body.remove(0).kind {
        StmtKind::Return(Some(e)) => e,
        other => panic!("expected return statement, got {:?}", other),
    }
}

/// Parse a single statement inside `void f() { … }`.
fn parse_stmt(stmt: &str) -> Stmt {
    let source = format!("void f() {{ {} }}", stmt);
    let mut program = parse_ok(&source);
    program.functions.remove(0).body.remove(0)
}

fn binary(expr: &Expr) -> (BinOp, &Expr, &Expr) {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => (*op, left, right),
        other => panic!("expected binary operator, got {:?}", other),
    }
}

// ==================== Expressions ====================

#[test]
fn test_precedence_mul_over_add() {
    let e = parse_expr("1 + 2 * 3");
    let (op, left, right) = binary(&e);
    assert_eq!(op, BinOp::Add);
    assert_eq!(left.as_int_literal(), Some(1));
    let (op, l, r) = binary(right);
    assert_eq!(op, BinOp::Mul);
    assert_eq!(l.as_int_literal(), Some(2));
    assert_eq!(r.as_int_literal(), Some(3));
}

#[test]
fn test_left_associativity() {
    let e = parse_expr("10 - 2 - 3");
    let (op, left, right) = binary(&e);
    assert_eq!(op, BinOp::Sub);
    assert_eq!(right.as_int_literal(), Some(3));
    let (op, l, r) = binary(left);
    assert_eq!(op, BinOp::Sub);
    assert_eq!(l.as_int_literal(), Some(10));
    assert_eq!(r.as_int_literal(), Some(2));
}

#[test]
fn test_and_binds_tighter_than_or() {
    let e = parse_expr("a || b && c");
    let (op, _, right) = binary(&e);
    assert_eq!(op, BinOp::Or);
    let (op, _, _) = binary(right);
    assert_eq!(op, BinOp::And);
}

#[test]
fn test_comparison_groups_left() {
    let e = parse_expr("1 < 2 == true");
    let (op, left, _) = binary(&e);
    assert_eq!(op, BinOp::Eq);
    let (op, _, _) = binary(left);
    assert_eq!(op, BinOp::Lt);
}

#[test]
fn test_unary_binds_tighter() {
    let e = parse_expr("-1 + 2");
    let (op, left, _) = binary(&e);
    assert_eq!(op, BinOp::Add);
    match &left.kind {
        ExprKind::Unary { op, expr } => {
            assert_eq!(*op, UnOp::Neg);
            assert_eq!(expr.as_int_literal(), Some(1));
        }
        other => panic!("expected unary negation, got {:?}", other),
    }
}

#[test]
fn test_cast_vs_grouping() {
    let e = parse_expr("(Shape)s");
    match &e.kind {
        ExprKind::Cast { target, expr } => {
            assert_eq!(*target, Type::Class("Shape".to_string()));
            assert!(matches!(expr.kind, ExprKind::Variable(_)));
        }
        other => panic!("expected cast, got {:?}", other),
    }

    let e = parse_expr("(1 + 2) * 3");
    let (op, left, _) = binary(&e);
    assert_eq!(op, BinOp::Mul);
    let (op, _, _) = binary(left);
    assert_eq!(op, BinOp::Add);
}

#[test]
fn test_postfix_chain() {
    let e = parse_expr("a.b[1](2)");
    let (callee, args) = match &e.kind {
        ExprKind::Call { callee, args } => (callee, args),
        other => panic!("expected call, got {:?}", other),
    };
    assert_eq!(args.len(), 1);
    let array = match &callee.kind {
        ExprKind::Subscript { array, .. } => array,
        other => panic!("expected subscript, got {:?}", other),
    };
    match &array.kind {
        ExprKind::Member { member, .. } => assert_eq!(member, "b"),
        other => panic!("expected member access, got {:?}", other),
    }
}

#[test]
fn test_new_expressions() {
    let e = parse_expr("new Node");
    assert!(matches!(e.kind, ExprKind::NewObject { .. }));

    let e = parse_expr("new int[2 * n]");
    match &e.kind {
        ExprKind::NewArray { elem, size } => {
            assert_eq!(*elem, Type::Int);
            assert!(matches!(size.kind, ExprKind::Binary { .. }));
        }
        other => panic!("expected new array, got {:?}", other),
    }
}

#[test]
fn test_string_literal_unescaped() {
    let e = parse_expr(r#""a\tb""#);
    match &e.kind {
        ExprKind::Str(s) => assert_eq!(s, "a\tb"),
        other => panic!("expected string literal, got {:?}", other),
    }
}

// ==================== Statements ====================

#[test]
fn test_definition_vs_expression_statement() {
    let s = parse_stmt("int x = 5;");
    match s.kind {
        StmtKind::Definition(def) => {
            assert_eq!(def.ty, Type::Int);
            assert_eq!(def.items[0].name, "x");
            assert!(def.items[0].init.is_some());
        }
        other => panic!("expected definition, got {:?}", other),
    }

    assert!(matches!(parse_stmt("x = 5;").kind, StmtKind::Assign { .. }));
    assert!(matches!(parse_stmt("x++;").kind, StmtKind::Incr(_)));
    assert!(matches!(parse_stmt("x--;").kind, StmtKind::Decr(_)));
    assert!(matches!(parse_stmt("f(x);").kind, StmtKind::Expr(_)));
}

#[test]
fn test_array_definition() {
    let s = parse_stmt("int[] xs;");
    match s.kind {
        StmtKind::Definition(def) => {
            assert_eq!(def.ty, Type::array_of(Type::Int));
            assert!(def.items[0].init.is_none());
        }
        other => panic!("expected definition, got {:?}", other),
    }
}

#[test]
fn test_multi_item_definition() {
    let s = parse_stmt("int a, b = 2, c;");
    match s.kind {
        StmtKind::Definition(def) => {
            assert_eq!(def.items.len(), 3);
            assert!(def.items[0].init.is_none());
            assert!(def.items[1].init.is_some());
        }
        other => panic!("expected definition, got {:?}", other),
    }
}

#[test]
fn test_for_statement() {
    let s = parse_stmt("for (int x : xs) sum = sum + x;");
    match s.kind {
        StmtKind::For {
            elem_ty,
            var,
            body,
            ..
        } => {
            assert_eq!(elem_ty, Type::Int);
            assert_eq!(var, "x");
            assert!(matches!(body.kind, StmtKind::Assign { .. }));
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn test_if_else_chain() {
    let s = parse_stmt("if (a) x = 1; else if (b) x = 2; else x = 3;");
    match s.kind {
        StmtKind::If { else_branch, .. } => {
            let else_branch = else_branch.expect("missing else");
            assert!(matches!(else_branch.kind, StmtKind::If { .. }));
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_empty_and_block_statements() {
    assert!(matches!(parse_stmt(";").kind, StmtKind::Empty));
    let s = parse_stmt("{ int x; x = 1; }");
    match s.kind {
        StmtKind::Block(stmts) => assert_eq!(stmts.len(), 2),
        other => panic!("expected block, got {:?}", other),
    }
}

// ==================== Top level ====================

#[test]
fn test_class_with_fields_and_methods() {
    let program = parse_ok(
        "class Counter extends Base {
            int value;
            int[] history;
            int get() { return value; }
            void bump() { value++; }
        }",
    );
    let class = &program.classes[0];
    assert_eq!(class.name, "Counter");
    assert_eq!(class.superclass.as_deref(), Some("Base"));
    assert_eq!(class.fields.len(), 2);
    assert_eq!(class.methods.len(), 2);
    assert_eq!(class.methods[0].name, "get");
    assert_eq!(class.methods[1].return_type, Type::Void);
}

#[test]
fn test_function_signature() {
    let program = parse_ok("string join(string[] parts, string sep) { return sep; }");
    let fun = &program.functions[0];
    assert_eq!(fun.name, "join");
    assert_eq!(fun.return_type, Type::Str);
    assert_eq!(fun.params.len(), 2);
    assert_eq!(fun.params[0].ty, Type::array_of(Type::Str));
    assert_eq!(fun.params[1].name, "sep");
}

#[test]
fn test_mixed_classes_and_functions() {
    let program = parse_ok(
        "int helper() { return 1; }
         class A { int x; }
         int main() { return helper(); }",
    );
    assert_eq!(program.classes.len(), 1);
    assert_eq!(program.functions.len(), 2);
}

// ==================== Errors ====================

#[test]
fn test_error_carries_environment_stack() {
    let tokens = tokenize("int main() { int x = ; }").expect("tokenize failed");
    let err = parse(tokens).expect_err("expected parse error");
    let whats: Vec<&str> = err.frames.iter().map(|f| f.what).collect();
    assert_eq!(
        whats,
        vec!["function", "block", "statement", "variable definition"]
    );
    assert_eq!(err.frames[0].name.as_deref(), Some("main"));
}

#[test]
fn test_error_on_unclosed_block() {
    let tokens = tokenize("int main() { return 0;").expect("tokenize failed");
    let err = parse(tokens).expect_err("expected parse error");
    assert_eq!(err.pos, usize::MAX);
    assert!(err.msg.contains("Unexpected"));
}

#[test]
fn test_error_on_bad_top_level() {
    let tokens = tokenize("return 1;").expect("tokenize failed");
    let err = parse(tokens).expect_err("expected parse error");
    assert!(err.msg.contains("expected"));
}

#[test]
fn test_statement_requires_semicolon() {
    let tokens = tokenize("int main() { x = 1 }").expect("tokenize failed");
    let err = parse(tokens).expect_err("expected parse error");
    assert!(err.msg.contains(";"));
}
