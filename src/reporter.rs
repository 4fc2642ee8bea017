use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::interpreter::RuntimeError;

/// Receives the rendered value of every `print` statement
pub trait PrintSink {
    fn print_line(&mut self, line: &str);
}

/// Receives runtime errors once they reach the top of a run
pub trait ErrorReporter {
    fn report(&mut self, error: &RuntimeError);
}

// A sink that renders printed values to a writer, one per line
pub struct WriteSink<W> {
    writer: W,
}

impl<W> WriteSink<W> {
    pub fn new(writer: W) -> WriteSink<W> {
        WriteSink { writer }
    }
}

impl<W> PrintSink for WriteSink<W>
where
    W: Write,
{
    fn print_line(&mut self, line: &str) {
        // If the write fails, we don't care
        _ = writeln!(self.writer, "{}", line);
    }
}

/// Collects printed lines into a shared buffer so the embedder can read them back
#[derive(Clone, Default)]
pub struct BufferSink {
    buffer: Rc<RefCell<String>>,
}

impl BufferSink {
    pub fn new() -> BufferSink {
        BufferSink::default()
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.borrow().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl PrintSink for BufferSink {
    fn print_line(&mut self, line: &str) {
        let mut buffer = self.buffer.borrow_mut();
        buffer.push_str(line);
        buffer.push('\n');
    }
}

// A reporter that renders error messages to the output
pub struct WriteErrorReporter<W> {
    writer: W,
}

impl<W> WriteErrorReporter<W> {
    pub fn new(writer: W) -> WriteErrorReporter<W> {
        WriteErrorReporter { writer }
    }
}

impl<W> ErrorReporter for WriteErrorReporter<W>
where
    W: Write,
{
    fn report(&mut self, error: &RuntimeError) {
        _ = writeln!(self.writer, "error at {}: {}", error.pos, error.kind);
    }
}

pub struct NoopReporter {}

impl ErrorReporter for NoopReporter {
    fn report(&mut self, _error: &RuntimeError) {}
}

/// Keeps every reported error; clones share the same list
#[derive(Clone, Default)]
pub struct CollectingReporter {
    errors: Rc<RefCell<Vec<RuntimeError>>>,
}

impl CollectingReporter {
    pub fn new() -> CollectingReporter {
        CollectingReporter::default()
    }

    pub fn errors(&self) -> Vec<RuntimeError> {
        self.errors.borrow().clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, error: &RuntimeError) {
        self.errors.borrow_mut().push(error.clone());
    }
}
