//! Tree-walking evaluator for the jido scripting language.
//!
//! The parser lives elsewhere: it hands over a [`ast::Program`] and the [`interpreter::Interpreter`]
//! runs it against a global environment, writing `print` output to a [`reporter::PrintSink`] and
//! runtime errors to a [`reporter::ErrorReporter`].

pub mod ast;
pub mod config;
pub mod interpreter;
pub mod reporter;

pub use config::Config;
pub use interpreter::{stock_interpreter, stock_interpreter_from_env, Interpreter, RuntimeError, Value};
