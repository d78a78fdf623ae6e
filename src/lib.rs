//! Phortugol: a small dynamically typed scripting language with Portuguese
//! keywords, run by a tree-walking interpreter.
//!
//! Source text flows through four stages:
//!
//! ```text
//! scanner → parser → resolver → interpreter
//! ```
//!
//! Every stage reports into a caller-owned [`Diagnostics`]; a run that hits
//! any static error never reaches the interpreter.  [`Phortugol`] wires the
//! stages together and keeps one interpreter alive across runs, as a REPL
//! needs.

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod native;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::info;

use crate::ast::ExprId;
pub use crate::error::{Diagnostics, PhortError, RuntimeError};
use crate::interpreter::Interpreter;
use crate::output::Output;
use crate::parser::Parser;
use crate::resolver::Resolver;

/// A session: globals, closures and resolved distances persist between
/// calls to [`run`](Phortugol::run).
pub struct Phortugol {
    interpreter: Interpreter,
    /// First expression id not yet handed out in this session.
    next_id: ExprId,
}

impl Default for Phortugol {
    fn default() -> Self {
        Self::new()
    }
}

impl Phortugol {
    pub fn new() -> Self {
        Self::with_output(Output::Stdout)
    }

    pub fn with_output(output: Output) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            next_id: ExprId(0),
        }
    }

    /// Scan, parse, resolve and execute `source`.  Static errors stop the
    /// pipeline before execution; a runtime error stops execution.  Both end
    /// up in `diagnostics`.
    pub fn run(&mut self, source: &str, diagnostics: &mut Diagnostics) {
        info!("Running {} bytes of source", source.len());

        let tokens = scanner::scan_tokens(source, diagnostics);
        if diagnostics.had_error() {
            return;
        }

        let statements = {
            let mut parser = Parser::new(&tokens, diagnostics).with_first_id(self.next_id);
            let statements = parser.parse();
            self.next_id = parser.next_id();
            statements
        };

        let Some(statements) = statements else {
            return;
        };

        if !Resolver::new(&mut self.interpreter, diagnostics).resolve(&statements) {
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            diagnostics.runtime_error(e);
        }
    }
}
