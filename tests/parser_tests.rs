// tests/parser_tests.rs

use tally_lang::ast::{BinOp, Builtin, Expr, Statement};
use tally_lang::lexer::Lexer;
use tally_lang::parser::{ParseErrorKind, Parser, parse_program};
use tally_lang::{Config, Value};

fn parse(input: &str) -> Expr {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer).unwrap();
    parser.parse().unwrap()
}

fn parse_error(input: &str) -> ParseErrorKind {
    parse_program(input, &Config::default()).unwrap_err().kind
}

fn op_of(expr: &Expr) -> BinOp {
    match expr {
        Expr::Binary { op, .. } => *op,
        other => panic!("expected binary expression, got {:?}", other),
    }
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_parentheses() {
    // Should be: Multiply(Add(1, 2), 3)
    match parse("(1 + 2) * 3") {
        Expr::Binary {
            op: BinOp::Multiply,
            left,
            ..
        } => assert_eq!(op_of(&left), BinOp::Add),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match parse("3 + x * sqrt(4)") {
        Expr::Binary {
            op: BinOp::Add,
            right,
            ..
        } => match *right {
            Expr::Binary {
                op: BinOp::Multiply,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Builtin {
                    function: Builtin::Sqrt,
                    ..
                }
            )),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_comparison_binds_tighter_than_arithmetic() {
    // a + (b > c)
    match parse("a + b > c") {
        Expr::Binary {
            op: BinOp::Add,
            right,
            ..
        } => assert_eq!(op_of(&right), BinOp::GreaterThan),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_power_binds_tighter_than_multiplication() {
    match parse("2 * 3 ^ 2") {
        Expr::Binary {
            op: BinOp::Multiply,
            right,
            ..
        } => assert_eq!(op_of(&right), BinOp::Power),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(op_of(&parse("2 $ 3")), BinOp::Power);
}

#[test]
fn test_bitwise_binds_tighter_than_comparison() {
    match parse("a & 1 == 1") {
        Expr::Binary {
            op: BinOp::Equal,
            left,
            ..
        } => assert_eq!(op_of(&left), BinOp::BitAnd),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_logical_operators_share_a_tier() {
    // (a || b) && c, left to right
    match parse("a || b && c") {
        Expr::Binary {
            op: BinOp::And,
            left,
            ..
        } => assert_eq!(op_of(&left), BinOp::Or),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_logical_is_looser_than_additive() {
    match parse("a + 1 && b") {
        Expr::Binary {
            op: BinOp::And,
            left,
            ..
        } => assert_eq!(op_of(&left), BinOp::Add),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_left_associative_subtraction() {
    // (10 - 4) - 3
    match parse("10 - 4 - 3") {
        Expr::Binary {
            op: BinOp::Subtract,
            left,
            right,
        } => {
            assert_eq!(op_of(&left), BinOp::Subtract);
            assert_eq!(*right, Expr::Literal(Value::from(3)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_not_is_right_associative_and_tightest() {
    match parse("!!a == b") {
        Expr::Binary {
            op: BinOp::Equal,
            left,
            ..
        } => match *left {
            Expr::Not(inner) => assert!(matches!(*inner, Expr::Not(_))),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assignment_is_right_associative() {
    match parse("a = b = 1") {
        Expr::Assign { target, value } => {
            assert_eq!(target.name, "a");
            assert!(matches!(*value, Expr::Assign { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_element_assignment() {
    match parse("items[i + 1] = 0") {
        Expr::Assign { target, .. } => {
            assert_eq!(target.name, "items");
            assert_eq!(op_of(target.index.as_deref().unwrap()), BinOp::Add);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_to_constants() {
    assert_eq!(parse_error("true = 1"), ParseErrorKind::ConstAssignment);
    assert_eq!(parse_error("null = 1"), ParseErrorKind::ConstAssignment);
    assert_eq!(parse_error("PI = 3"), ParseErrorKind::ConstAssignment);
    assert_eq!(parse_error("5 = x"), ParseErrorKind::ConstAssignment);
}

#[test]
fn test_assignment_to_expression_is_syntax_error() {
    assert_eq!(parse_error("a + b = 1"), ParseErrorKind::Syntax);
    assert_eq!(parse_error("f(x) = 1"), ParseErrorKind::Syntax);
}

// ============================================================================
// Atoms
// ============================================================================

#[test]
fn test_constants() {
    assert_eq!(parse("PI"), Expr::Literal(Value::Numeric(rust_decimal::Decimal::PI)));
    assert_eq!(parse("NULL"), Expr::Literal(Value::Null));
    // Constants are case sensitive; `pi` is a variable
    assert!(matches!(parse("pi"), Expr::Variable(_)));
}

#[test]
fn test_local_variable() {
    match parse("var counter") {
        Expr::Variable(var) => {
            assert!(var.local);
            assert_eq!(var.name, "counter");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_builtin_name_without_call_is_variable() {
    assert!(matches!(parse("size"), Expr::Variable(_)));
    assert!(matches!(
        parse("size(x)"),
        Expr::Builtin {
            function: Builtin::Size,
            ..
        }
    ));
}

#[test]
fn test_user_call() {
    match parse("discount(price, 0.1)") {
        Expr::Call { name, args } => {
            assert_eq!(name, "discount");
            assert_eq!(args.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(parse("ping()"), Expr::Call { args, .. } if args.is_empty()));
}

#[test]
fn test_substitution_chains() {
    // a?(b?5)
    match parse("a?b?5") {
        Expr::Substitute { primary, fallback } => {
            assert!(matches!(*primary, Expr::Variable(_)));
            assert!(matches!(*fallback, Expr::Substitute { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_substitution_applies_to_atom_only() {
    // (a?0) * 2
    match parse("a?0 * 2") {
        Expr::Binary {
            op: BinOp::Multiply,
            left,
            ..
        } => assert!(matches!(*left, Expr::Substitute { .. })),
        other => panic!("unexpected {:?}", other),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_program_statements() {
    let program = parse_program("a = 1; b = 2;", &Config::default()).unwrap();
    assert_eq!(program.body.statements.len(), 2);
}

#[test]
fn test_if_else_if_chain() {
    let program = parse_program(
        "if (a) { x = 1 } else if (b) { x = 2 } else { x = 3 }",
        &Config::default(),
    )
    .unwrap();
    match &program.body.statements[0] {
        Statement::If {
            else_branch: Some(else_branch),
            ..
        } => assert!(matches!(
            else_branch[0],
            Statement::If {
                else_branch: Some(_),
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_braced_statement_needs_no_semicolon() {
    let program = parse_program("while (i < 3) { i = i + 1 } done = true", &Config::default()).unwrap();
    assert_eq!(program.body.statements.len(), 2);
}

#[test]
fn test_functions_are_hoisted() {
    let program = parse_program("y = f(2); function f(x) { f = x * 2 }", &Config::default()).unwrap();
    assert_eq!(program.body.functions.len(), 1);
    assert_eq!(program.body.functions[0].params, vec!["x".to_string()]);
    assert_eq!(program.body.statements.len(), 1);
}

#[test]
fn test_nested_function_declaration_allowed_in_function_body() {
    let program = parse_program(
        "function outer() { function inner() { inner = 1 }; outer = inner() }",
        &Config::default(),
    )
    .unwrap();
    assert_eq!(program.body.functions[0].body.functions.len(), 1);
}

#[test]
fn test_function_declaration_errors() {
    assert_eq!(
        parse_error("if (a) { function f() { f = 1 } }"),
        ParseErrorKind::FunctionDeclaration
    );
    assert_eq!(parse_error("function (x) { }"), ParseErrorKind::FunctionDeclaration);
    assert_eq!(parse_error("function f(1) { }"), ParseErrorKind::FunctionDeclaration);
    assert_eq!(parse_error("function f(x) x"), ParseErrorKind::FunctionDeclaration);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_kinds() {
    let test_cases = vec![
        ("1 +", ParseErrorKind::IncompleteStatement),
        ("(1 + 2", ParseErrorKind::MissingParenthesis),
        ("max(1, 2", ParseErrorKind::MissingParenthesis),
        ("max(1 2)", ParseErrorKind::MissingComma),
        ("arr[1", ParseErrorKind::MissingBracket),
        ("if (a) { b = 1", ParseErrorKind::MissingBrace),
        ("\"open", ParseErrorKind::MissingQuotation),
        ("a # b", ParseErrorKind::IllegalSymbol),
        ("1abc", ParseErrorKind::IllegalVariableName),
        ("var 1", ParseErrorKind::IllegalVariableName),
        ("a b", ParseErrorKind::Syntax),
    ];

    for (input, expected) in test_cases {
        assert_eq!(parse_error(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_error_codes_are_stable() {
    let kinds = [
        ParseErrorKind::IncompleteStatement,
        ParseErrorKind::Syntax,
        ParseErrorKind::MissingParenthesis,
        ParseErrorKind::MissingBrace,
        ParseErrorKind::MissingBracket,
        ParseErrorKind::MissingQuotation,
        ParseErrorKind::IllegalSymbol,
        ParseErrorKind::IllegalVariableName,
        ParseErrorKind::MissingComma,
        ParseErrorKind::FunctionDeclaration,
        ParseErrorKind::ConstAssignment,
    ];
    let codes: Vec<u32> = kinds.iter().map(|k| k.code()).collect();
    assert_eq!(codes, (1..=11).collect::<Vec<u32>>());
}

#[test]
fn test_error_reports_line_and_position() {
    let err = parse_program("a = 1;\nb = 2 +\n  * 3", &Config::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Syntax);
    assert_eq!((err.line, err.position), (3, 3));
}

#[test]
fn test_empty_input_uses_default_expression() {
    let config = Config::default().with_default_expression("0");
    let program = parse_program("\n\t ", &config).unwrap();
    assert_eq!(program.source, "0");
    assert_eq!(program.body.statements.len(), 1);
}
