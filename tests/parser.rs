#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use phortugol::ast::{Expr, ExprId, Stmt};
    use phortugol::ast_printer::AstPrinter;
    use phortugol::error::Diagnostics;
    use phortugol::parser::Parser;
    use phortugol::scanner::scan_tokens;

    fn parse(source: &str) -> (Option<Vec<Stmt>>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(&tokens, &mut diagnostics).parse();

        (statements, diagnostics)
    }

    fn printed(source: &str) -> Vec<String> {
        let (statements, diagnostics) = parse(source);
        let errors: Vec<String> = diagnostics.reports().iter().map(|e| e.to_string()).collect();
        assert_eq!(errors, Vec::<String>::new());

        statements
            .unwrap_or_default()
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    fn errors(source: &str) -> Vec<String> {
        let (statements, diagnostics) = parse(source);
        assert!(statements.is_none(), "expected the parse to fail");

        diagnostics.reports().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(printed("1 + 2 * 3;"), vec!["(; (+ 1 (* 2 3)))"]);
        assert_eq!(printed("(1 + 2) * 3;"), vec!["(; (* (group (+ 1 2)) 3))"]);
        assert_eq!(printed("-a % 2 == 0;"), vec!["(; (== (% (- a) 2) 0))"]);
        assert_eq!(printed("a OU b E c;"), vec!["(; (OU a (E b c)))"]);
    }

    #[test]
    fn test_single_expression() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("1 + 2 * 3", &mut diagnostics);
        let expr = Parser::new(&tokens, &mut diagnostics)
            .parse_expression()
            .expect("expression parses");

        assert_eq!(AstPrinter::print(&expr), "(+ 1 (* 2 3))");
    }

    #[test]
    fn test_conditional_is_right_associative() {
        assert_eq!(
            printed("a ? b : c ? d : e;"),
            vec!["(; (?: a b (?: c d e)))"]
        );
    }

    #[test]
    fn test_postfix_increment_desugars_to_assignment() {
        assert_eq!(printed("i++;"), vec!["(; (= i (+ i 1)))"]);
        assert_eq!(printed("i--;"), vec!["(; (= i (- i 1)))"]);
    }

    #[test]
    fn test_for_loop_desugaring() {
        let (statements, _) = parse("repita (var i = 0; i < 3; i++) escreva i;");
        let statements = statements.expect("parses");

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(block (var i 0) (enquanto (< i 3) (block (escreva i) (; (= i (+ i 1))))))"
        );

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block, got {:?}", statements[0]);
        };
        let Stmt::While {
            fallback_increment, ..
        } = &outer[1]
        else {
            panic!("expected a while loop, got {:?}", outer[1]);
        };

        assert_eq!(
            fallback_increment.as_deref().map(AstPrinter::print_stmt),
            Some("(; (= i (+ i 1)))".to_owned())
        );
    }

    #[test]
    fn test_for_loop_without_clauses() {
        assert_eq!(
            printed("repita (;;) pare;"),
            vec!["(enquanto verdadeiro (pare))"]
        );
    }

    #[test]
    fn test_lambdas() {
        assert_eq!(
            printed("var f = (a, b) => a + b;"),
            vec!["(var f (lambda (a b) (retorne (+ a b))))"]
        );
        assert_eq!(
            printed("var g = (x) => { retorne x; }"),
            vec!["(var g (lambda (x) (retorne x)))"]
        );
        assert_eq!(
            printed("((a) => a)(3);"),
            vec!["(; (call (group (lambda (a) (retorne a))) 3))"]
        );
    }

    #[test]
    fn test_arrays_and_indexing() {
        assert_eq!(printed("[1, 2][0];"), vec!["(; (index (array 1 2) 0))"]);
        assert_eq!(
            printed("xs[0] = xs[1];"),
            vec!["(; (index= xs 0 (index xs 1)))"]
        );
        assert_eq!(printed("var vazio = [];"), vec!["(var vazio (array))"]);
    }

    #[test]
    fn test_class_with_optional_funcao_prefix() {
        let source = "classe A { init(x) { meu.x = x; } funcao pega() { retorne meu.x; } }";

        assert_eq!(
            printed(source),
            vec!["(classe A (metodo init (x) (; (.= meu x x))) (metodo pega () (retorne (. meu x))))"]
        );
    }

    #[test]
    fn test_break_outside_loop_is_a_syntax_error() {
        assert_eq!(
            errors("pare;"),
            vec!["[line 1] Error at 'pare': 'pare' is only allowed inside a loop."]
        );
    }

    #[test]
    fn test_loop_does_not_reach_into_function_body() {
        assert_eq!(
            errors("enquanto (verdadeiro) {\n funcao f() { continue; }\n}"),
            vec!["[line 2] Error at 'continue': 'continue' is only allowed inside a loop."]
        );
        assert_eq!(printed("enquanto (verdadeiro) { pare; }").len(), 1);
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            errors("1 = 2;"),
            vec!["[line 1] Error at '=': Expected a variable before '='."]
        );
    }

    #[test]
    fn test_missing_colon_in_conditional() {
        assert_eq!(
            errors("a ? b;"),
            vec!["[line 1] Error at ';': Expected ':' and the expression for the false case."]
        );
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            errors("escreva 1"),
            vec!["[line 1] Error at end: Expected ';' after value."]
        );
    }

    #[test]
    fn test_recovers_and_reports_every_statement() {
        assert_eq!(
            errors("var = 1;\nescreva ;\nvar x = 2;"),
            vec![
                "[line 1] Error at '=': Expected variable name.",
                "[line 2] Error at ';': Expected expression.",
            ]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let source = format!("f({});", args);

        assert_eq!(
            errors(&source),
            vec!["[line 1] Error at '1': Can't have more than 255 arguments."]
        );
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let source = "funcao f(n) { se (n < 2) retorne n; retorne f(n - 1) + f(n - 2); } escreva f(10);";

        let (first, _) = parse(source);
        let (second, _) = parse(source);

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_expression_ids_start_at_given_base() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("a = b;", &mut diagnostics);
        let mut parser = Parser::new(&tokens, &mut diagnostics).with_first_id(ExprId(10));

        let statements = parser.parse().expect("parses");

        let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
            panic!("expected an assignment, got {:?}", statements[0]);
        };
        let Expr::Variable { id: read_id, .. } = value.as_ref() else {
            panic!("expected a variable, got {:?}", value);
        };

        assert_eq!(*id, ExprId(10));
        assert_eq!(*read_id, ExprId(11));
        assert_eq!(parser.next_id(), ExprId(12));
    }
}
