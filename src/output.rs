//! Destination for `escreva`.
//!
//! The binary writes straight to stdout; tests and embedders capture into a
//! shared buffer they keep a handle to.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Buffer(Rc<RefCell<String>>),
}

impl Output {
    /// A capturing output and the handle to read it back through.
    pub fn buffer() -> (Self, Rc<RefCell<String>>) {
        let shared = Rc::new(RefCell::new(String::new()));

        (Output::Buffer(Rc::clone(&shared)), shared)
    }

    /// Write without a trailing newline.
    pub fn print(&self, text: &str) {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                // A closed stdout is not a program error.
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
            Output::Buffer(buffer) => buffer.borrow_mut().push_str(text),
        }
    }
}
