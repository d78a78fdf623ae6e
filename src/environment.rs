//! Lexical variable storage.
//!
//! Environments form a parent-linked chain shared through `Rc<RefCell<_>>`:
//! closures keep their defining frame alive, and blocks push a child frame
//! that is dropped when the block is left.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame, replacing any earlier binding.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}'", name);

        self.values.insert(name.to_owned(), value);
    }

    /// Walk the chain outward until `name` is found.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Rebind an existing `name`; never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read `name` exactly `distance` frames up the chain.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let value = frame.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Write `name` exactly `distance` frames up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }

    /// The frame `distance` hops out.  A chain shorter than `distance` stops
    /// at the outermost frame; the lookup there then reports the name.
    fn ancestor(env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let parent = match &frame.borrow().enclosing {
                Some(parent) => Rc::clone(parent),
                None => break,
            };
            frame = parent;
        }

        frame
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_walks_to_enclosing() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let local = Environment::with_enclosing(Rc::clone(&globals));

        assert_eq!(local.get(&ident("a")).unwrap().to_string(), "1");
    }

    #[test]
    fn assign_requires_existing_binding() {
        let mut env = Environment::new();
        let err = env.assign(&ident("x"), Value::Nil).unwrap_err();

        assert_eq!(err.message, "Undefined variable 'x'.");
    }

    #[test]
    fn get_at_skips_shadowing_frames() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::String("outer".into()));

        let inner = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(&outer))));
        inner.borrow_mut().define("a", Value::String("inner".into()));

        let at_one = Environment::get_at(&inner, 1, &ident("a")).unwrap();
        assert_eq!(at_one.to_string(), "outer");

        Environment::assign_at(&inner, 0, &ident("a"), Value::Bool(true)).unwrap();
        assert_eq!(inner.borrow().get(&ident("a")).unwrap().to_string(), "verdadeiro");
        assert_eq!(outer.borrow().get(&ident("a")).unwrap().to_string(), "outer");
    }
}
