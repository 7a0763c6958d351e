//! Console sinks for the `print` operation.

use std::cell::RefCell;

use crate::value::Value;

/// Destination of program output.
pub trait Console {
    fn print(&self, value: &Value);
}

/// Writes each printed value as a line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&self, value: &Value) {
        println!("{}", value);
    }
}

/// Collects printed lines in memory.
#[derive(Debug, Default)]
pub struct BufferConsole {
    lines: RefCell<Vec<String>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        BufferConsole::default()
    }

    /// Lines printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

impl Console for BufferConsole {
    fn print(&self, value: &Value) {
        self.lines.borrow_mut().push(value.to_string());
    }
}
