use std::rc::Rc;

use tracing::trace;

use super::environment::Environment;
use super::runtime::{ErrorKind, Flow, Interpreter, RuntimeError};
use super::value::Value;
use crate::ast::{FunDecl, Pos};

pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    /// How the function shows up when printed
    fn label(&self) -> String;
    /// Arity has already been checked by the caller. `pos` is the call site.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        pos: Pos,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

pub type NativeFn = fn(&mut Interpreter, Vec<Value>) -> Result<Value, ErrorKind>;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub call: NativeFn,
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn label(&self) -> String {
        "<native fn>".to_string()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        pos: Pos,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.call)(interpreter, args).map_err(|kind| RuntimeError::new(pos, kind))
    }
}

/// A function declared in the program, closed over the environment it was declared in
pub struct UserFunction {
    pub declaration: Rc<FunDecl>,
    pub closure: Rc<Environment>,
}

impl UserFunction {
    pub fn new(declaration: Rc<FunDecl>, closure: Rc<Environment>) -> UserFunction {
        UserFunction {
            declaration,
            closure,
        }
    }
}

impl Callable for UserFunction {
    fn name(&self) -> &str {
        &self.declaration.name
    }

    fn arity(&self) -> usize {
        self.declaration.parameters.len()
    }

    fn label(&self) -> String {
        format!("<fn {}>", self.declaration.name)
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        pos: Pos,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        // Parameters live in a fresh frame hung off the closure, never off the caller's frame
        let env = Environment::open_scope(&self.closure);
        for (parameter, value) in self.declaration.parameters.iter().zip(args) {
            env.define(parameter, value);
        }

        interpreter.enter_call(pos)?;
        trace!(function = %self.declaration.name, depth = interpreter.call_depth(), "call");
        let result = interpreter.execute_block(&self.declaration.body, env);
        interpreter.exit_call();

        match result? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return(value) => Ok(value),
            Flow::Break(break_pos) => Err(RuntimeError::new(break_pos, ErrorKind::InvalidBreak)),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::build::*;
    use crate::ast::BinaryOp;
    use crate::interpreter::test_interpreter;

    fn adder() -> Rc<FunDecl> {
        Rc::new(FunDecl {
            name: "add".to_string(),
            parameters: vec!["a".to_string(), "b".to_string()],
            body: vec![ret(Some(binary(var("a"), BinaryOp::Add, var("b"))))],
        })
    }

    #[test]
    fn test_user_function_metadata() {
        let func = UserFunction::new(adder(), Environment::new_global());
        assert_eq!("add", func.name());
        assert_eq!(2, func.arity());
        assert_eq!("<fn add>", func.label());
    }

    #[test]
    fn test_call_binds_parameters_in_closure_scope() {
        let (mut interpreter, _, _) = test_interpreter();
        let closure = Environment::new_global();
        let func = UserFunction::new(adder(), closure.clone());
        let result = func
            .call(
                &mut interpreter,
                Pos::default(),
                vec![Value::Number(2f64), Value::Number(3f64)],
            )
            .unwrap();
        assert_eq!(Value::Number(5f64), result);
        // Parameters never leak into the closure frame
        assert!(!closure.contains_local("a"));
        assert_eq!(0, interpreter.call_depth());
    }

    #[test]
    fn test_call_without_return_yields_nil() {
        let (mut interpreter, _, _) = test_interpreter();
        let decl = Rc::new(FunDecl {
            name: "noop".to_string(),
            parameters: vec![],
            body: vec![expr_stmt(num(1f64))],
        });
        let func = UserFunction::new(decl, Environment::new_global());
        let result = func.call(&mut interpreter, Pos::default(), vec![]).unwrap();
        assert_eq!(Value::Nil, result);
    }

    #[test]
    fn test_break_cannot_escape_function() {
        let (mut interpreter, _, _) = test_interpreter();
        let decl = Rc::new(FunDecl {
            name: "escape".to_string(),
            parameters: vec![],
            body: vec![brk()],
        });
        let func = UserFunction::new(decl, Environment::new_global());
        let err = func
            .call(&mut interpreter, Pos::default(), vec![])
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidBreak, err.kind);
    }
}
