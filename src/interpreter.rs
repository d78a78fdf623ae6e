//! Tree-walking evaluator.
//!
//! Statements complete with a [`Flow`]: loop exits and `retorne` travel back
//! up as ordinary values and are consumed by the nearest loop or call frame.
//! Only genuine failures use the error channel, as [`RuntimeError`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::{mem, slice};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::native;
use crate::output::Output;
use crate::token::{Token, TokenType};
use crate::value::{
    ArrayValue, Class, Function, Instance, Value, INITIALIZER_NAME, THIS_NAME,
};

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Hop distances recorded by the resolver; absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    output: Output,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with the natives installed.
    pub fn new() -> Self {
        Self::with_output(Output::Stdout)
    }

    pub fn with_output(output: Output) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        native::install(&mut globals);

        let globals = Rc::new(RefCell::new(globals));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record that expression `id` refers to a binding `depth` scopes out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Runs a program until it ends or the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let flow @ (Flow::Break | Flow::Continue | Flow::Return(_)) = self.execute(stmt)? {
                debug!("Ignoring {:?} at top level", flow);
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                match &value {
                    Value::String(s) => self.output.print(&s.replace("\\n", "\n")),
                    other => self.output.print(&other.to_string()),
                }

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                fallback_increment,
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        Flow::Continue => {
                            if let Some(increment) = fallback_increment {
                                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                                self.execute_block(
                                    slice::from_ref(&**increment),
                                    Rc::new(RefCell::new(scope)),
                                )?;
                            }
                        }
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(decl.display_name(), Value::Function(Rc::new(function)));

                info!("Function '{}' defined", decl.display_name());
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let methods: HashMap<String, Rc<Function>> = methods
                    .iter()
                    .map(|decl| {
                        let is_initializer = decl.display_name() == INITIALIZER_NAME;
                        let method = Function::new(
                            Rc::clone(decl),
                            Rc::clone(&self.environment),
                            is_initializer,
                        );

                        (decl.display_name().to_owned(), Rc::new(method))
                    })
                    .collect();

                let class = Class {
                    name: name.lexeme.clone(),
                    methods,
                };

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                info!("Class '{}' defined", name.lexeme);
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` in `scope`, restoring the current environment however
    /// the block exits.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        scope: Rc<RefCell<Environment>>,
    ) -> IResult<Flow> {
        let previous = mem::replace(&mut self.environment, scope);
        let result = self.run_statements(statements);
        self.environment = previous;

        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    // ──────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(operator, "Operand of '-' must be a number.")),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee, paren, args)
            }

            Expr::Lambda(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                Ok(Value::Function(Rc::new(function)))
            }

            Expr::Array { elements, .. } => {
                let mut values: Vec<Value> = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::Array(Rc::new(RefCell::new(ArrayValue::from_values(values)))))
            }

            Expr::Index {
                bracket,
                array,
                index,
            } => {
                let array = self.evaluate(array)?;
                let index = self.evaluate(index)?;

                let array = expect_array(bracket, &array)?;
                let key = index_key(bracket, &index)?;

                let found = array.borrow().get(&key);
                found.ok_or_else(|| RuntimeError::new(bracket, format!("Undefined key '{}'.", key)))
            }

            Expr::IndexSet {
                bracket,
                array,
                index,
                value,
            } => {
                let array = self.evaluate(array)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;

                let array = expect_array(bracket, &array)?;
                let key = index_key(bracket, &index)?;

                array.borrow_mut().put(key, value.clone());
                Ok(value)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    // ─────────────────────────────── calls ────────────────────────────────

    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> IResult<Value> {
        debug!("Calling {} with {} argument(s)", callee, args.len());

        match callee {
            Value::Function(function) => {
                check_arity(paren, function.arity(), args.len())?;
                self.call_function(&function, args, paren)
            }

            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(arity_error(paren, native.arity, args.len()));
                }

                (native.func)(&args).map_err(|message| RuntimeError::new(paren, message))
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), args.len())?;

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method(INITIALIZER_NAME) {
                    self.call_function(&init.bind(Rc::clone(&instance)), args, paren)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(RuntimeError::new(paren, "Can only call functions and classes.")),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        paren: &Token,
    ) -> IResult<Value> {
        let FunctionDecl { params, body, .. } = &*function.decl;

        let mut scope = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in params.iter().zip(args) {
            scope.define(&param.lexeme, arg);
        }

        let flow = self.execute_block(body, Rc::new(RefCell::new(scope)))?;

        if function.is_initializer {
            let this = Token::synthetic(TokenType::THIS, THIS_NAME, paren.line);
            return Environment::get_at(&function.closure, 0, &this);
        }

        // Loop signals cannot cross a function body; the parser rejects them.
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal | Flow::Break | Flow::Continue => Value::Nil,
        })
    }
}

// ───────────────────────────── operators ─────────────────────────────

fn binary(operator: &Token, left: Value, right: Value) -> IResult<Value> {
    use Value::{Bool, Number};

    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Bool(left.is_equal(&right))),
        TokenType::BANG_EQUAL => return Ok(Bool(!left.is_equal(&right))),
        TokenType::PLUS => return plus(operator, left, right),
        _ => {}
    }

    let (a, b) = match (&left, &right) {
        (Number(a), Number(b)) => (*a, *b),
        _ => {
            return Err(RuntimeError::new(
                operator,
                format!("Operator '{}' expects numbers.", operator.lexeme),
            ))
        }
    };

    Ok(match operator.token_type {
        TokenType::MINUS => Number(a - b),
        TokenType::STAR => Number(a * b),
        TokenType::SLASH => Number(a / non_zero(operator, b)?),
        TokenType::PERCENT => Number(a % non_zero(operator, b)?),
        TokenType::GREATER => Bool(a > b),
        TokenType::GREATER_EQUAL => Bool(a >= b),
        TokenType::LESS => Bool(a < b),
        TokenType::LESS_EQUAL => Bool(a <= b),
        _ => {
            return Err(RuntimeError::new(
                operator,
                format!("Unknown binary operator '{}'.", operator.lexeme),
            ))
        }
    })
}

/// Numbers add; a string on either side concatenates the other's display form.
fn plus(operator: &Token, left: Value, right: Value) -> IResult<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (Value::String(a), other) => Ok(Value::String(format!("{}{}", a, other))),
        (other, Value::String(b)) => Ok(Value::String(format!("{}{}", other, b))),
        _ => Err(RuntimeError::new(
            operator,
            "Operator '+' expects two numbers or a string.",
        )),
    }
}

fn non_zero(operator: &Token, divisor: f64) -> IResult<f64> {
    if divisor == 0.0 {
        debug!("Division by zero on line {}", operator.line);
        return Err(RuntimeError::new(operator, "Divisor must be non-zero."));
    }

    Ok(divisor)
}

fn expect_array<'v>(bracket: &Token, value: &'v Value) -> IResult<&'v Rc<RefCell<ArrayValue>>> {
    match value {
        Value::Array(array) => Ok(array),
        other => Err(RuntimeError::new(
            bracket,
            format!("Only arrays can be indexed, not {}.", other.type_name()),
        )),
    }
}

fn index_key(bracket: &Token, index: &Value) -> IResult<String> {
    index
        .index_key()
        .ok_or_else(|| RuntimeError::new(bracket, "Array index must be a number or a string."))
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> IResult<()> {
    if expected != got {
        return Err(arity_error(paren, native::Arity::Fixed(expected), got));
    }

    Ok(())
}

fn arity_error(paren: &Token, expected: native::Arity, got: usize) -> RuntimeError {
    RuntimeError::new(
        paren,
        format!("Expected {} arguments but got {}.", expected, got),
    )
}
