//! Centralised error hierarchy for the **Phortugol interpreter**.
//!
//! Static stages (scanner, parser, resolver) never abort on the first problem:
//! they record a [`PhortError`] in a [`Diagnostics`] sink handed to them by the
//! caller and keep going, so one pass reports every independent mistake.
//! Evaluation failures are [`RuntimeError`]s; exactly one of them can escape
//! a run, and the driver forwards it to the same sink's runtime channel.
//!
//! The module prints nothing unless the sink was built with
//! [`Diagnostics::echoing`].

use std::io;
use thiserror::Error;

use log::{debug, info};

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PhortError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'`, ` at end`, or empty.
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl PhortError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        PhortError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, located at `token`.
    pub fn parse_at<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, lexeme={}, msg={}",
            token.line, token.lexeme, message
        );

        PhortError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**, located at `token`.
    pub fn resolve_at<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, lexeme={}, msg={}",
            token.line, token.lexeme, message
        );

        PhortError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            PhortError::Lex { line, .. }
            | PhortError::Parse { line, .. }
            | PhortError::Resolve { line, .. } => Some(*line),
            PhortError::Runtime(e) => Some(e.token.line),
            PhortError::Io(_) | PhortError::Utf8(_) => None,
        }
    }

    /// The bare message, without location decoration.
    pub fn message(&self) -> String {
        match self {
            PhortError::Lex { message, .. }
            | PhortError::Parse { message, .. }
            | PhortError::Resolve { message, .. } => message.clone(),
            PhortError::Runtime(e) => e.message.clone(),
            PhortError::Io(e) => e.to_string(),
            PhortError::Utf8(e) => e.to_string(),
        }
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_owned()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Evaluation‑time failure, located at the token that triggered it.
#[derive(Debug, Clone, Error)]
#[error("{message}\n[line {}]", token.line)]
pub struct RuntimeError {
    /// Operator, name or parenthesis the failure is attributed to.
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Runtime error: line={}, lexeme={}, msg={}",
            token.line, token.lexeme, message
        );

        RuntimeError {
            token: token.clone(),
            message,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, PhortError>;

/// Explicit error sink threaded through every pipeline stage.
///
/// Static diagnostics accumulate in order; the runtime channel keeps the
/// error that aborted the last run.  Hosts read [`had_error`] and
/// [`had_runtime_error`] to choose an exit status.
///
/// [`had_error`]: Diagnostics::had_error
/// [`had_runtime_error`]: Diagnostics::had_runtime_error
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<PhortError>,
    runtime: Option<RuntimeError>,
    echo: bool,
}

impl Diagnostics {
    /// A silent sink: records only.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that also writes every diagnostic to stderr as it arrives.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Record a lexical, syntax or resolution error.
    pub fn report(&mut self, error: PhortError) {
        debug!("Diagnostic recorded: {}", error);

        if self.echo {
            eprintln!("{}", error);
        }

        self.reports.push(error);
    }

    /// Record the runtime error that stopped evaluation.
    pub fn runtime_error(&mut self, error: RuntimeError) {
        debug!("Runtime diagnostic recorded: {}", error);

        if self.echo {
            eprintln!("{}", error);
        }

        self.runtime = Some(error);
    }

    /// Was any lexical, syntax or resolution error reported?
    pub fn had_error(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn reports(&self) -> &[PhortError] {
        &self.reports
    }

    pub fn runtime(&self) -> Option<&RuntimeError> {
        self.runtime.as_ref()
    }

    /// Forget everything recorded so far (REPL: one line, one verdict).
    pub fn clear(&mut self) {
        self.reports.clear();
        self.runtime = None;
    }
}
