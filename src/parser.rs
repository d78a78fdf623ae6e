/*!
Recursive‑descent parser for Phortugol.

Time & Space Complexity
-----------------------
* **n** = number of tokens (including the sole EOF).

| Phase / function              | Cost | Rationale                                                   |
|-------------------------------|-----:|-------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                |
| Lambda detection `is_lambda`  | O(k) | Scans only the parameter list it is about to parse.         |
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary ( `k ≤ n`).       |

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, desugarings   | `debug`| High‑level descent into grammar branches. |
| Error paths                  | `debug`| Context before recording the error.       |

Grammar (EBNF, condensed)
-------------------------

```text
program      → declaration* EOF ;
declaration  → classDecl | funDecl | varDecl | statement ;
classDecl    → "classe" IDENT "{" ( "funcao"? IDENT "(" parameters? ")" block )* "}" ;
funDecl      → "funcao" IDENT "(" parameters? ")" block ;
varDecl      → "var" IDENT ( "=" expression )? ";" ;
statement    → printStmt | ifStmt | block | whileStmt | forStmt
             | "pare" ";" | "continue" ";" | returnStmt | exprStmt ;
forStmt      → "repita" "(" ( varDecl | exprStmt | ";" ) expression? ";" expression? ")" statement ;
expression   → IDENT ( "++" | "--" ) ";"? | lambda | assignment ;
lambda       → "(" parameters? ")" "=>" ( block | expression ) ;
assignment   → ( call "." IDENT | call "[" expression "]" | IDENT ) "=" assignment
             | conditional ;
conditional  → logic_or ( "?" expression ":" conditional )? ;
logic_or     → logic_and ( ( "OU" | "||" ) logic_and )* ;
logic_and    → equality ( ( "E" | "&&" ) equality )* ;
equality     → comparison ( ( "!=" | "==" ) comparison )* ;
comparison   → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term         → factor ( ( "-" | "+" ) factor )* ;
factor       → unary ( ( "/" | "*" | "%" ) unary )* ;
unary        → ( "!" | "-" ) unary | call ;
call         → array ( "(" arguments? ")" | "." IDENT | "[" expression "]" )* ;
array        → "[" ( expression ( "," expression )* )? "]" | primary ;
primary      → NUMBER | STRING | "verdadeiro" | "falso" | "nulo" | "indefinido"
             | "NL" | "meu" | IDENT | "(" expression ")" ;
```

Errors are recorded in the caller's [`Diagnostics`]; a hard error unwinds to
the nearest `declaration`, which synchronizes and keeps going, so one pass
reports every independent mistake.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::{Diagnostics, PhortError};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Hard errors unwind with this; soft ones are recorded and parsing goes on.
type ParseResult<T> = std::result::Result<T, PhortError>;

const MAX_ARGS: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token],
    diagnostics: &'a mut Diagnostics,
    current: usize,
    /// Nesting of `enquanto`/`repita` bodies in the current function.
    loop_depth: usize,
    next_id: usize,
    errors: usize,
    /// Returned by `peek` when the slice does not end in EOF.
    eof: Token,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token], diagnostics: &'a mut Diagnostics) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        let last_line = tokens.last().map_or(1, |t| t.line);

        Self {
            tokens,
            diagnostics,
            current: 0,
            loop_depth: 0,
            next_id: 0,
            errors: 0,
            eof: Token::synthetic(TokenType::EOF, "", last_line),
        }
    }

    /// Start numbering expression identities at `first`, so trees parsed in
    /// one session never share an [`ExprId`].
    pub fn with_first_id(mut self, first: ExprId) -> Self {
        self.next_id = first.0;
        self
    }

    /// The first identity not handed out yet.
    pub fn next_id(&self) -> ExprId {
        ExprId(self.next_id)
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Returns `None` when any error was reported,
    /// however many statements were built successfully.
    pub fn parse(&mut self) -> Option<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parse phase finished: {} statement(s), {} error(s)",
            statements.len(),
            self.errors
        );

        if self.errors > 0 {
            None
        } else {
            Some(statements)
        }
    }

    /// Parse a single expression (used by the `parse` CLI and tests).
    pub fn parse_expression(&mut self) -> Option<Expr> {
        match self.expression() {
            Ok(expr) if self.errors == 0 => Some(expr),
            Ok(_) => None,
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUNCTION) {
            self.function_declaration()
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.report(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name.")?;

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            self.matches(TokenType::FUNCTION); // optional in a class body

            let method_name = self.consume(TokenType::IDENTIFIER, "Expected method name.")?;
            methods.push(self.function_rest(Some(method_name))?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        Ok(Stmt::Class { name, methods })
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected function name.")?;

        Ok(Stmt::Function(self.function_rest(Some(name))?))
    }

    /// `"(" parameters? ")" block` after a function or method name.
    fn function_rest(&mut self, name: Option<Token>) -> ParseResult<Rc<FunctionDecl>> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name.")?;

        let params = self.parameters()?;

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body.")?;

        let body = self.function_body()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn parameters(&mut self) -> ParseResult<Vec<Token>> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    let e = PhortError::parse_at(self.peek(), "Can't have more than 255 parameters.");
                    self.report(e);
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        Ok(params)
    }

    /// A block that starts a new function: loop signals cannot cross it.
    fn function_body(&mut self) -> ParseResult<Vec<Stmt>> {
        let enclosing_depth = self.loop_depth;
        self.loop_depth = 0;

        let body = self.block();

        self.loop_depth = enclosing_depth;
        body
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.terminate(initializer.as_ref(), "Expected ';' after variable declaration.")?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::BREAK) {
            self.loop_exit(Stmt::Break, "'pare' is only allowed inside a loop.")
        } else if self.matches(TokenType::CONTINUE) {
            self.loop_exit(Stmt::Continue, "'continue' is only allowed inside a loop.")
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value: Expr = self.expression()?;

        self.terminate(Some(&value), "Expected ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr: Expr = self.expression()?;

        self.terminate(Some(&expr), "Expected ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'se'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'enquanto'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

        let body = self.loop_body()?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
            fallback_increment: None,
        })
    }

    /// `repita (init; cond; incr) body` ⇒ `{ init; enquanto (cond) { body; incr } }`
    /// with `incr` also kept as the loop's fallback increment for `continue`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'repita'.")?;

        let initializer = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after 'repita' clauses.")?;

        let mut body = self.loop_body()?;

        debug!("Desugaring 'repita' into 'enquanto'");

        if let Some(incr) = &increment {
            body = Stmt::Block(vec![body, Stmt::Expression(incr.clone())]);
        }

        let condition = condition.unwrap_or(Expr::Literal(LiteralValue::True));

        let mut desugared = Stmt::While {
            condition,
            body: Box::new(body),
            fallback_increment: increment.map(|incr| Box::new(Stmt::Expression(incr))),
        };

        if let Some(init) = initializer {
            desugared = Stmt::Block(vec![init, desugared]);
        }

        Ok(desugared)
    }

    fn loop_body(&mut self) -> ParseResult<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        body
    }

    /// `pare ;` / `continue ;`.  Outside a loop the error is recorded but the
    /// statement is still built so parsing continues undisturbed.
    fn loop_exit(&mut self, build: fn(Token) -> Stmt, message: &str) -> ParseResult<Stmt> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            debug!("Loop exit outside loop at line {}", keyword.line);
            let e = PhortError::parse_at(&keyword, message);
            self.report(e);
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after loop exit.")?;

        Ok(build(keyword))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.terminate(value.as_ref(), "Expected ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    /// Statement terminator.  A postfix `i++;` already swallowed its `;`, and
    /// a lambda may stand without one.
    fn terminate(&mut self, expr: Option<&Expr>, message: &str) -> ParseResult<()> {
        if self.current > 0 && self.previous().token_type == TokenType::SEMICOLON {
            return Ok(());
        }

        if let Some(Expr::Lambda(_)) = expr {
            self.matches(TokenType::SEMICOLON);
            return Ok(());
        }

        self.consume(TokenType::SEMICOLON, message).map(|_| ())
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> ParseResult<Expr> {
        if self.check(TokenType::IDENTIFIER)
            && matches!(
                self.peek_next().token_type,
                TokenType::PLUS_PLUS | TokenType::MINUS_MINUS
            )
        {
            return Ok(self.postfix_step());
        }

        self.lambda()
    }

    /// `i++` / `i--` ⇒ `i = i + 1` / `i = i - 1`, eating an optional `;`.
    fn postfix_step(&mut self) -> Expr {
        let name: Token = self.advance();
        let step: Token = self.advance();
        self.matches(TokenType::SEMICOLON);

        debug!("Desugaring '{}{}'", name.lexeme, step.lexeme);

        let operator = if step.token_type == TokenType::PLUS_PLUS {
            Token::synthetic(TokenType::PLUS, "+", step.line)
        } else {
            Token::synthetic(TokenType::MINUS, "-", step.line)
        };

        let read = Expr::Variable {
            id: self.fresh_id(),
            name: name.clone(),
        };

        Expr::Assign {
            id: self.fresh_id(),
            name,
            value: Box::new(Expr::Binary {
                left: Box::new(read),
                operator,
                right: Box::new(Expr::Literal(LiteralValue::Number(1.0))),
            }),
        }
    }

    fn lambda(&mut self) -> ParseResult<Expr> {
        if !self.check(TokenType::LEFT_PAREN) || !self.is_lambda() {
            return self.assignment();
        }

        self.consume(TokenType::LEFT_PAREN, "Expected '(' to open a lambda.")?;
        let params = self.parameters()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        let arrow: Token = self.consume(TokenType::ARROW, "Expected '=>' after parameters.")?;

        let body: Vec<Stmt> = if self.matches(TokenType::LEFT_BRACE) {
            self.function_body()?
        } else {
            vec![Stmt::Return {
                keyword: arrow,
                value: Some(self.expression()?),
            }]
        };

        Ok(Expr::Lambda(Rc::new(FunctionDecl {
            name: None,
            params,
            body,
        })))
    }

    /// At `(`: is this a parameter list followed by `=>`?
    fn is_lambda(&self) -> bool {
        let mut i = self.current + 1;

        while let Some(token) = self.tokens.get(i) {
            match token.token_type {
                TokenType::IDENTIFIER | TokenType::COMMA => i += 1,
                TokenType::RIGHT_PAREN => {
                    return matches!(
                        self.tokens.get(i + 1).map(|t| &t.token_type),
                        Some(TokenType::ARROW)
                    );
                }
                _ => return false,
            }
        }

        false
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr: Expr = self.conditional()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Box<Expr> = Box::new(self.assignment()?);

            return Ok(match expr {
                Expr::Variable { id, name } => Expr::Assign { id, name, value },

                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value,
                },

                Expr::Index {
                    bracket,
                    array,
                    index,
                } => Expr::IndexSet {
                    bracket,
                    array,
                    index,
                    value,
                },

                other => {
                    let e = PhortError::parse_at(&equals, "Expected a variable before '='.");
                    self.report(e);
                    other
                }
            });
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> ParseResult<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr = self.expression()?;

            if !self.matches(TokenType::COLON) {
                return Err(PhortError::parse_at(
                    self.peek(),
                    "Expected ':' and the expression for the false case.",
                ));
            }

            let else_branch: Expr = self.conditional()?;

            return Ok(Expr::Conditional {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches(TokenType::STAR)
            || self.matches(TokenType::SLASH)
            || self.matches(TokenType::PERCENT)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.array()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let bracket: Token = self.previous().clone();
                let index: Expr = self.expression()?;

                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index.")?;

                expr = Expr::Index {
                    bracket,
                    array: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let e = PhortError::parse_at(self.peek(), "Can't have more than 255 arguments.");
                    self.report(e);
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn array(&mut self) -> ParseResult<Expr> {
        if !self.matches(TokenType::LEFT_BRACKET) {
            return self.primary();
        }

        let bracket: Token = self.previous().clone();
        let mut elements: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_BRACKET) {
            loop {
                elements.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after array elements.")?;

        Ok(Expr::Array { bracket, elements })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NULL) || self.matches(TokenType::UNDEFINED) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }
        if self.matches(TokenType::NL) {
            return Ok(Expr::Literal(LiteralValue::Str("\n".to_owned())));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(s) = &self.peek().token_type {
            let s = s.clone();
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(PhortError::parse_at(self.peek(), "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn report(&mut self, error: PhortError) {
        debug!("Parse error: {}", error);

        self.errors += 1;
        self.diagnostics.report(error);
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!("Expected token missing at line {}: {}", self.peek().line, message);

        Err(PhortError::parse_at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous().clone()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    #[inline(always)]
    fn peek_next(&self) -> &Token {
        self.tokens.get(self.current + 1).unwrap_or(&self.eof)
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        self.tokens
            .get(self.current.saturating_sub(1))
            .unwrap_or(&self.eof)
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUNCTION
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}

fn binary(left: Expr, operator: Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}
