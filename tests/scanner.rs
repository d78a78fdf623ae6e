#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use phortugol::error::Diagnostics;
    use phortugol::scanner::*;
    use phortugol::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})[]%?:",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::PERCENT, "%"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "++ -- == => != <= >= && ||",
            &[
                (TokenType::PLUS_PLUS, "++"),
                (TokenType::MINUS_MINUS, "--"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::ARROW, "=>"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::AND, "&&"),
                (TokenType::OR, "||"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_portuguese_keywords() {
        assert_token_sequence(
            "se senao senão enquanto repita função classe retorne meu E OU NL",
            &[
                (TokenType::IF, "se"),
                (TokenType::ELSE, "senao"),
                (TokenType::ELSE, "senão"),
                (TokenType::WHILE, "enquanto"),
                (TokenType::FOR, "repita"),
                (TokenType::FUNCTION, "função"),
                (TokenType::CLASS, "classe"),
                (TokenType::RETURN, "retorne"),
                (TokenType::THIS, "meu"),
                (TokenType::AND, "E"),
                (TokenType::OR, "OU"),
                (TokenType::NL, "NL"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_accented_identifiers() {
        assert_token_sequence(
            "var ação = 1;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "ação"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_literals_carry_values() {
        let tokens: Vec<Token> = Scanner::new("3.25 'simples' \"duplas\"")
            .filter_map(Result::ok)
            .collect();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 3.25));
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "simples"));
        assert!(matches!(&tokens[2].token_type, TokenType::STRING(s) if s == "duplas"));
    }

    #[test]
    fn test_comments_and_lines() {
        let tokens: Vec<Token> = Scanner::new("// nada aqui\nescreva 1; // fim\n\n'a\nb'")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[3].line, 5, "multi-line string ends on line 5");
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $".to_owned(),
                "[line 1] Error: Unexpected character: #".to_owned(),
            ]
        );
    }

    #[test]
    fn test_lone_ampersand_is_an_error() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("a & b", &mut diagnostics);

        assert!(diagnostics.had_error());
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_unterminated_string_emits_no_token() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("var s = \"aberta", &mut diagnostics);

        assert_eq!(diagnostics.reports().len(), 1);
        assert_eq!(diagnostics.reports()[0].message(), "Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_display_format() {
        let token = Token::new(TokenType::NUMBER(3.0), "3", 1);
        assert_eq!(token.to_string(), "NUMBER 3 3.0");

        let token = Token::new(TokenType::STRING("oi".into()), "\"oi\"", 1);
        assert_eq!(token.to_string(), "STRING \"oi\" oi");
    }

    fn assert_token_matches(result: &Result<Token, phortugol::PhortError>, ty: TokenType, lexeme: &str) {
        match result {
            Ok(token) => {
                assert_eq!(token.token_type, ty);
                assert_eq!(token.lexeme, lexeme);
            }
            Err(e) => panic!("expected token, got error: {}", e),
        }
    }
}
