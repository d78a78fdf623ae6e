#[cfg(test)]
mod resolver_tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use phortugol::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
    use phortugol::error::Diagnostics;
    use phortugol::interpreter::Interpreter;
    use phortugol::output::Output;
    use phortugol::parser::Parser;
    use phortugol::resolver::Resolver;
    use phortugol::scanner::scan_tokens;
    use phortugol::token::{Token, TokenType};

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    fn var(id: usize, name: &str) -> Expr {
        Expr::Variable {
            id: ExprId(id),
            name: ident(name),
        }
    }

    fn number(n: f64) -> Expr {
        Expr::Literal(LiteralValue::Number(n))
    }

    fn declare(name: &str, value: Expr) -> Stmt {
        Stmt::Var {
            name: ident(name),
            initializer: Some(value),
        }
    }

    fn interpreter() -> Interpreter {
        Interpreter::with_output(Output::buffer().0)
    }

    /// Parse and resolve `source`, returning the rendered diagnostics.
    fn resolve_errors(source: &str) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(&tokens, &mut diagnostics)
            .parse()
            .expect("source parses");

        let mut interpreter = interpreter();
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

        diagnostics.reports().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_resolve_scoped_variable() {
        let program = vec![
            declare("a", number(1.0)),
            Stmt::Block(vec![
                declare("b", number(2.0)),
                Stmt::Expression(var(0, "b")),
            ]),
            Stmt::Print(var(1, "a")),
        ];

        let mut interpreter = interpreter();
        let mut diagnostics = Diagnostics::new();

        assert!(Resolver::new(&mut interpreter, &mut diagnostics).resolve(&program));
        assert!(!diagnostics.had_error());
        assert_eq!(interpreter.resolved_depth(ExprId(0)), Some(0));
        assert_eq!(interpreter.resolved_depth(ExprId(1)), None);
    }

    #[test]
    fn test_resolve_nested_scoped_variable() {
        let foo = FunctionDecl {
            name: Some(ident("foo")),
            params: vec![ident("x")],
            body: vec![Stmt::If {
                condition: Expr::Literal(LiteralValue::True),
                then_branch: Box::new(Stmt::Block(vec![
                    Stmt::Print(var(0, "a")),
                    Stmt::Return {
                        keyword: Token::new(TokenType::RETURN, "retorne", 1),
                        value: Some(var(1, "x")),
                    },
                ])),
                else_branch: Some(Box::new(Stmt::Print(var(2, "a")))),
            }],
        };

        let program = vec![Stmt::Block(vec![
            declare("a", number(1.0)),
            Stmt::Function(Rc::new(foo)),
        ])];

        let mut interpreter = interpreter();
        let mut diagnostics = Diagnostics::new();
        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&program);

        assert!(!diagnostics.had_error());
        assert_eq!(interpreter.resolved_depth(ExprId(0)), Some(2));
        assert_eq!(interpreter.resolved_depth(ExprId(1)), Some(1));
        assert_eq!(interpreter.resolved_depth(ExprId(2)), Some(1));
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            resolve_errors("retorne 1;"),
            vec!["[line 1] Error at 'retorne': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve_errors("classe A { init() { retorne 1; } }"),
            vec!["[line 1] Error at 'retorne': Can't return a value from an initializer."]
        );
        assert_eq!(
            resolve_errors("classe A { init() { retorne; } }"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve_errors("escreva meu;"),
            vec!["[line 1] Error at 'meu': Can't use 'meu' outside of a class."]
        );
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            resolve_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        // globals may be redeclared
        assert_eq!(resolve_errors("var a = 1; var a = 2;"), Vec::<String>::new());
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("var a = 1; { var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_reports_every_error_in_one_pass() {
        let errors = resolve_errors("retorne 1;\nescreva meu;\n{ var b = b; }");

        assert_eq!(errors.len(), 3);
        assert!(errors[2].starts_with("[line 3]"));
    }

    #[test]
    fn test_loop_exit_outside_loop_in_hand_built_tree() {
        let program = vec![Stmt::Break(Token::new(TokenType::BREAK, "pare", 4))];

        let mut interpreter = interpreter();
        let mut diagnostics = Diagnostics::new();

        assert!(!Resolver::new(&mut interpreter, &mut diagnostics).resolve(&program));
        assert_eq!(
            diagnostics.reports()[0].to_string(),
            "[line 4] Error at 'pare': 'pare' is only allowed inside a loop."
        );
    }

    #[test]
    fn test_fallback_increment_matches_body_copy() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(
            "funcao f() { repita (var i = 0; i < 3; i++) { continue; } }",
            &mut diagnostics,
        );
        let statements = Parser::new(&tokens, &mut diagnostics)
            .parse()
            .expect("source parses");

        let mut interpreter = interpreter();
        assert!(Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements));

        let Stmt::Function(f) = &statements[0] else {
            panic!("expected a function");
        };
        let Stmt::Block(outer) = &f.body[0] else {
            panic!("expected the desugared block");
        };
        let Stmt::While {
            body,
            fallback_increment: Some(fallback),
            ..
        } = &outer[1]
        else {
            panic!("expected a while loop with a fallback increment");
        };
        let Stmt::Block(body) = body.as_ref() else {
            panic!("expected the loop body block");
        };

        let assigned_at = |stmt: &Stmt| match stmt {
            Stmt::Expression(Expr::Assign { id, .. }) => interpreter.resolved_depth(*id),
            other => panic!("expected an increment, got {:?}", other),
        };

        assert_eq!(assigned_at(&body[1]), Some(1));
        assert_eq!(assigned_at(fallback.as_ref()), Some(1));
    }
}
