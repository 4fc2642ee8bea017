mod builtin;
mod callable;
mod environment;
mod runtime;
mod stack;
mod value;

use std::io::{stderr, stdout};

use anyhow::Result;

pub use builtin::{clock, populate_builtin};
pub use callable::{Callable, NativeFn, NativeFunction, UserFunction};
pub use environment::Environment;
pub use runtime::{ErrorKind, Flow, Interpreter, RuntimeError};
pub use value::Value;

use crate::config::Config;
use crate::reporter::{WriteErrorReporter, WriteSink};

/// An interpreter printing to stdout and reporting errors on stderr
pub fn stock_interpreter() -> Interpreter {
    stock_interpreter_with(Config::default())
}

/// Like `stock_interpreter`, configured from `JIDO_*` environment variables
pub fn stock_interpreter_from_env() -> Result<Interpreter> {
    Ok(stock_interpreter_with(Config::from_env()?))
}

fn stock_interpreter_with(config: Config) -> Interpreter {
    Interpreter::new(
        config,
        Box::new(WriteSink::new(stdout())),
        Box::new(WriteErrorReporter::new(stderr())),
    )
}

#[cfg(test)]
pub(crate) fn test_interpreter() -> (
    Interpreter,
    crate::reporter::BufferSink,
    crate::reporter::CollectingReporter,
) {
    test_interpreter_with(Config::default())
}

#[cfg(test)]
pub(crate) fn test_interpreter_with(
    config: Config,
) -> (
    Interpreter,
    crate::reporter::BufferSink,
    crate::reporter::CollectingReporter,
) {
    let sink = crate::reporter::BufferSink::new();
    let reporter = crate::reporter::CollectingReporter::new();
    let interpreter = Interpreter::new(config, Box::new(sink.clone()), Box::new(reporter.clone()));
    (interpreter, sink, reporter)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stock_interpreter_has_natives() {
        let interpreter = stock_interpreter();
        assert!(interpreter.globals().get("clock").is_ok());
        assert_eq!(&Config::default(), interpreter.config());
    }
}
