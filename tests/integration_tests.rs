// Parser robustness suite for slim
//
// Table-driven cases grouped into suites. Every case runs the lexer and
// parser only; evaluation is covered in tests/language.rs.

use slim::ast::Program;
use slim::error::ParseError;
use slim::lexer::lex;
use slim::parser::parse_program;

/// What a case expects from the parser.
#[derive(Debug, Clone)]
enum Expect {
    Parses,
    Fails,
    FailsWith(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    expect: Expect,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self::new(name, input, Expect::Parses)
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self::new(name, input, Expect::Fails)
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self::new(name, input, Expect::FailsWith(expected_msg.to_string()))
    }

    fn new(name: &str, input: &str, expect: Expect) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            expect,
        }
    }

    /// Parses the input and compares against the expectation. A panic
    /// inside the parser counts as a failure.
    fn check(&self) -> Result<(), String> {
        let input = self.input.clone();
        let parsed = std::panic::catch_unwind(move || parse_input(&input))
            .map_err(|panic| format!("parser panicked: {}", panic_message(&*panic)))?;

        match (&self.expect, parsed) {
            (Expect::Parses, Ok(_)) | (Expect::Fails, Err(_)) => Ok(()),
            (Expect::Parses, Err(errors)) => Err(format!("expected success, got: {}", errors[0].message)),
            (_, Ok(_)) => Err("expected a syntax error, but parsing succeeded".to_string()),
            (Expect::FailsWith(expected), Err(errors)) => {
                if errors.iter().any(|error| error.message.contains(expected.as_str())) {
                    Ok(())
                } else {
                    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
                    Err(format!("errors {:?} don't mention '{}'", messages, expected))
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Parse input and return the program or every syntax error
fn parse_input(input: &str) -> Result<Program, Vec<ParseError>> {
    let (program, errors) = parse_program(lex(input));
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// A named group of cases.
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Runs every case, printing a line each, and returns the failing
    /// case names with their reasons.
    pub fn run(&self) -> Vec<(String, String)> {
        println!("Running test suite: {}", self.name);

        let failures: Vec<(String, String)> = self
            .tests
            .iter()
            .filter_map(|test| match test.check() {
                Ok(()) => {
                    println!("  ok   {}", test.name);
                    None
                }
                Err(reason) => {
                    println!("  FAIL {}: {}", test.name, reason);
                    Some((test.name.clone(), reason))
                }
            })
            .collect();

        println!("{} passed, {} failed\n", self.tests.len() - failures.len(), failures.len());
        failures
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "(1 + 2;",
        "Expected ')' after expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren_nested",
        "((1 + 2);",
        "Expected ')' after expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "1 + 2);",
        "Expected ';' after expression.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "();",
        "Expected expression, found ')'.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses_in_expression",
        "1 + ();",
        "Expected expression, found ')'.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_bracket",
        "[1, 2;",
        "Expected ']' after array elements.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_brace",
        "{ let x = 1;",
        "Expected '}' after block.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_brace",
        "let x = 1; }",
        "unmatched closing brace",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comment", "# nothing to see #"));
    suite.add_test(TestCase::should_succeed("unknown_characters_dropped", "let x = 1; @ $ ?"));

    suite.add_test(TestCase::should_fail("unexpected_eof_after_operator", "1 +"));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_expression", "1 + ("));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon_at_eof",
        "print(1)",
        "Expected ';' after expression.",
    ));

    let deep_parens = "(".repeat(100) + "1" + &")".repeat(100) + ";";
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::should_fail("missing_left_operand", "+ 1;"));
    suite.add_test(TestCase::should_fail("missing_right_operand", "1 +;"));
    suite.add_test(TestCase::should_fail("double_plus", "1 ++ 2;"));
    suite.add_test(TestCase::should_fail("arrow_is_not_an_operator", "x => y;"));
    suite.add_test(TestCase::should_fail("literal_assignment_target", "1 = x;"));

    // Unary minus nests
    suite.add_test(TestCase::should_succeed("double_minus", "1 -- 2;"));
    suite.add_test(TestCase::should_succeed("mixed_operators", "1 +- 2;"));

    suite.add_test(TestCase::should_succeed("comparison_equal", "1 == 2;"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "1 != 2;"));
    suite.add_test(TestCase::should_succeed("comparison_less_equal", "1 <= 2;"));
    suite.add_test(TestCase::should_succeed("comparison_greater", "1 > 2;"));
    suite.add_test(TestCase::should_succeed("logical_keywords", "a and not b or c;"));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::should_succeed("valid_if", "if (true) { x = 1; }"));
    suite.add_test(TestCase::should_succeed("if_else_without_blocks", "if (a) b; else c;"));
    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_condition",
        "if { x = 1; }",
        "Expected '(' after 'if'.",
    ));
    suite.add_test(TestCase::should_fail("if_missing_body", "if (true)"));

    suite.add_test(TestCase::should_succeed("valid_while", "while (x) { x = 1; }"));
    suite.add_test(TestCase::should_fail_with_message(
        "while_missing_condition",
        "while { x = 1; }",
        "Expected '(' after 'while'.",
    ));
    suite.add_test(TestCase::should_fail("while_missing_body", "while (true)"));

    suite.add_test(TestCase::should_fail_with_message(
        "unknown_block_keyword",
        "repeat(3) { print(1); }",
        "'repeat' is not a valid keyword",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_block",
        "x { print(1); }",
        "Unexpected '{' after expression.",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::should_succeed("integer_literal", "42;"));
    suite.add_test(TestCase::should_succeed("decimal_literal", "3.14;"));
    suite.add_test(TestCase::should_succeed("string_literal", "\"hello\";"));
    suite.add_test(TestCase::should_succeed("single_quoted_string", "'hello';"));
    suite.add_test(TestCase::should_succeed("array_literal", "[1, \"two\", [3]];"));
    suite.add_test(TestCase::should_succeed("empty_array", "[];"));

    // A trailing dot is punctuation, which no statement accepts.
    suite.add_test(TestCase::should_fail("trailing_dot", "42.;"));
    suite.add_test(TestCase::should_fail("multiple_dots", "3.14.159;"));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Tests");

    suite.add_test(TestCase::should_succeed("empty_function", "func f() { }"));
    suite.add_test(TestCase::should_succeed("function_with_params", "func f(a, b) { return a; }"));
    suite.add_test(TestCase::should_succeed("bare_return", "func f() { return; }"));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_function_name",
        "func (a) { }",
        "Expected function name after 'func'.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_param_comma",
        "func f(a b) { }",
        "Expected ')' after parameters.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_body",
        "func f(a)",
        "Expected '{' before function body.",
    ));

    suite.add_test(TestCase::should_succeed("simple_call", "foo();"));
    suite.add_test(TestCase::should_succeed("call_with_args", "foo(1, 2, 3);"));
    suite.add_test(TestCase::should_succeed("chained_postfix", "f()[0](x);"));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_closing_paren",
        "foo(1, 2;",
        "Expected ')' after arguments.",
    ));
    suite.add_test(TestCase::should_fail("trailing_comma", "foo(1, 2,);"));
    suite.add_test(TestCase::should_fail("missing_opening_paren", "foo 1;"));

    suite
}

fn create_declaration_tests() -> TestSuite {
    let mut suite = TestSuite::new("Declaration Tests");

    suite.add_test(TestCase::should_succeed("let_with_value", "let x = 1 + 2;"));
    suite.add_test(TestCase::should_succeed("let_without_value", "let x;"));
    suite.add_test(TestCase::should_succeed("export", "let x = 1; export x;"));
    suite.add_test(TestCase::should_succeed("compound_assignment", "x += 1; x -= 1; x *= 2; x /= 2;"));
    suite.add_test(TestCase::should_fail_with_message(
        "let_without_name",
        "let;",
        "Expected identifier after 'let'.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "let_without_semicolon",
        "let x = 1",
        "Expected ';' after let declaration.",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "export_without_name",
        "export;",
        "Expected name after 'export'.",
    ));
    suite.add_test(TestCase::should_fail("missing_value", "x =;"));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_malformed_expressions_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
        create_function_tests(),
        create_declaration_tests(),
    ];

    let failures: Vec<String> = suites
        .iter()
        .flat_map(|suite| {
            suite
                .run()
                .into_iter()
                .map(move |(name, reason)| format!("{}::{}: {}", suite.name, name, reason))
        })
        .collect();

    assert!(failures.is_empty(), "failing cases:\n{}", failures.join("\n"));
}

#[test]
fn independent_errors_are_all_reported() {
    let (program, errors) = parse_program(lex("let = 5; let y = 2; let z 3;"));
    assert_eq!(errors.len(), 2);
    assert_eq!(program.statements.len(), 1);

    let (_, errors) = parse_program(lex("let a = ; let b = 1; func (x) { } print(b);"));
    assert_eq!(errors.len(), 2);
}

#[test]
fn errors_inside_blocks_recover_within_the_block() {
    let source = "func f() { let = 1; return 2; } let ok = 3;";
    let (program, errors) = parse_program(lex(source));
    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 2);
}
