use std::rc::Rc;

use ordered_float::OrderedFloat;
use thiserror::Error;
use tracing::debug;

use super::builtin::populate_builtin;
use super::callable::UserFunction;
use super::environment::Environment;
use super::stack::ensure_sufficient_stack;
use super::value::Value;
use crate::ast::{
    BinaryOp, Expr, ExprInner, Literal, LogicalOp, Pos, Program, Stmt, StmtInner, UnaryOp,
};
use crate::config::Config;
use crate::reporter::{ErrorReporter, PrintSink};

pub const OPERAND_NOT_NUMBER: &str = "operand must be a number";
pub const OPERANDS_NOT_NUMBERS: &str = "operands must be numbers";
pub const BAD_ADD_OPERANDS: &str =
    "operands must contain either two numbers for addition, or at least one string for concatenation";
pub const NOT_CALLABLE: &str = "can only call functions and classes";
pub const BAD_POSTFIX_TARGET: &str = "can only apply '++' or '--' to variables";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("{0}")]
    Type(&'static str),
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("expected {expected} arguments but got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("cannot divide zero by zero")]
    DivideZeroByZero,
    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
    #[error("break outside of a loop")]
    InvalidBreak,
    #[error("return outside of a function")]
    InvalidReturn,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {pos}")]
pub struct RuntimeError {
    pub pos: Pos,
    pub kind: ErrorKind,
}

impl RuntimeError {
    pub fn new(pos: Pos, kind: ErrorKind) -> RuntimeError {
        RuntimeError { pos, kind }
    }
}

/// How a statement finished. `Break` and `Return` travel outwards until a loop or a call consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break(Pos),
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<Environment>,
    env: Rc<Environment>,
    sink: Box<dyn PrintSink>,
    reporter: Box<dyn ErrorReporter>,
    config: Config,
    call_depth: usize,
}

impl Interpreter {
    pub fn new(
        config: Config,
        sink: Box<dyn PrintSink>,
        reporter: Box<dyn ErrorReporter>,
    ) -> Interpreter {
        let globals = Environment::new_global();
        if config.install_natives {
            populate_builtin(&globals);
        }
        Interpreter {
            env: globals.clone(),
            globals,
            sink,
            reporter,
            config,
            call_depth: 0,
        }
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    pub fn current_env(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every statement in order. The first error stops the run, is handed to the reporter and
    /// is returned.
    #[tracing::instrument(skip_all, fields(statements = program.0.len()))]
    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in program.0.iter() {
            if let Err(error) = self.execute_top_level(stmt) {
                self.report(&error);
                return Err(error);
            }
        }
        debug!("program finished");
        Ok(())
    }

    /// Run one statement, yielding the value when it is a bare expression. Used for echoing in a REPL.
    pub fn interpret_one(&mut self, stmt: &Stmt) -> Result<Option<Value>, RuntimeError> {
        self.execute_top_level(stmt).map_err(|error| {
            self.report(&error);
            error
        })
    }

    fn report(&mut self, error: &RuntimeError) {
        debug!(pos = %error.pos, "runtime error: {}", error.kind);
        self.reporter.report(error);
    }

    fn execute_top_level(&mut self, stmt: &Stmt) -> Result<Option<Value>, RuntimeError> {
        if let StmtInner::Expr(expr) = &stmt.inner {
            return self.eval(expr).map(Some);
        }
        match self.execute(stmt)? {
            Flow::Normal => Ok(None),
            Flow::Break(pos) => Err(RuntimeError::new(pos, ErrorKind::InvalidBreak)),
            Flow::Return(_) => Err(RuntimeError::new(stmt.pos, ErrorKind::InvalidReturn)),
        }
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub(super) fn enter_call(&mut self, pos: Pos) -> Result<(), RuntimeError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(
                pos,
                ErrorKind::CallDepthExceeded(self.config.max_call_depth),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(super) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub(super) fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match &stmt.inner {
            StmtInner::VarDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                self.env.define(name, value);
                Ok(Flow::Normal)
            }
            StmtInner::FunDecl(decl) => {
                let func = UserFunction::new(decl.clone(), self.env.clone());
                self.env.define(&decl.name, Value::Callable(Rc::new(func)));
                Ok(Flow::Normal)
            }
            StmtInner::Print(expr) => {
                let value = self.eval(expr)?;
                self.sink.print_line(&value.to_string());
                Ok(Flow::Normal)
            }
            StmtInner::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtInner::Block(stmts) => {
                let env = Environment::open_scope(&self.env);
                self.execute_block(stmts, env)
            }
            StmtInner::If {
                expr: test,
                then: if_true,
                or_else: if_false,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.execute(if_true)
                } else if let Some(false_stmt) = if_false {
                    self.execute(false_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtInner::Loop { expr, body } => {
                while self.eval(expr)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            StmtInner::Break => Ok(Flow::Break(stmt.pos)),
            StmtInner::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `stmts` with `env` as the current environment. The previous environment is put back no
    /// matter how the block exits.
    pub(super) fn execute_block(
        &mut self,
        stmts: &[Stmt],
        env: Rc<Environment>,
    ) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.env, env);
        let result = self.execute_stmts(stmts);
        self.env = previous;
        result
    }

    fn execute_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        let pos = expr.pos;
        match &expr.inner {
            ExprInner::Literal(Literal::Number(OrderedFloat(n))) => Ok(Value::Number(*n)),
            ExprInner::Literal(Literal::String(s)) => Ok(Value::string(s)),
            ExprInner::Literal(Literal::Boolean(b)) => Ok(Value::Bool(*b)),
            ExprInner::Literal(Literal::Nil) => Ok(Value::Nil),
            ExprInner::Group(inner) => self.eval(inner),
            ExprInner::Ternary {
                test,
                if_true,
                if_false,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            ExprInner::Unary { op, expr: operand } => {
                let val = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!val.is_truthy())),
                    UnaryOp::Negative => match val {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(type_error(pos, OPERAND_NOT_NUMBER)),
                    },
                }
            }
            ExprInner::Binary { left, op, right } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                binary_op(*op, lhs, rhs).map_err(|kind| RuntimeError::new(pos, kind))
            }
            // Both operators hand back an operand rather than a bool i.e. false or "a" evaluates to "a"
            ExprInner::Logical {
                left,
                op: LogicalOp::And,
                right,
            } => {
                let left_val = self.eval(left)?;
                if left_val.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left_val)
                }
            }
            ExprInner::Logical {
                left,
                op: LogicalOp::Or,
                right,
            } => {
                let left_val = self.eval(left)?;
                if left_val.is_truthy() {
                    Ok(left_val)
                } else {
                    self.eval(right)
                }
            }
            ExprInner::Postfix { op, expr: operand } => {
                let current = self.eval(operand)?;
                let ExprInner::Variable { name } = &operand.inner else {
                    return Err(type_error(pos, BAD_POSTFIX_TARGET));
                };
                let old = current
                    .as_number()
                    .ok_or_else(|| type_error(pos, OPERAND_NOT_NUMBER))?;
                self.env
                    .assign(name, Value::Number(old + op.delta()))
                    .map_err(|kind| RuntimeError::new(operand.pos, kind))?;
                Ok(Value::Number(old))
            }
            ExprInner::Variable { name } => self
                .env
                .get(name)
                .map_err(|kind| RuntimeError::new(pos, kind)),
            ExprInner::Assignment { target, expr } => {
                let value = self.eval(expr)?;
                self.env
                    .assign(target, value.clone())
                    .map_err(|kind| RuntimeError::new(pos, kind))?;
                Ok(value)
            }
            ExprInner::Call { callee, arguments } => {
                let callee = self.eval(callee)?;
                let args = arguments
                    .iter()
                    .map(|expr| self.eval(expr))
                    .collect::<Result<Vec<_>, _>>()?;
                let callable = callee
                    .as_callable()
                    .ok_or_else(|| type_error(pos, NOT_CALLABLE))?;
                if args.len() != callable.arity() {
                    return Err(RuntimeError::new(
                        pos,
                        ErrorKind::Arity {
                            expected: callable.arity(),
                            actual: args.len(),
                        },
                    ));
                }
                callable.call(self, pos, args)
            }
        }
    }
}

// User functions hold their defining frame and the frame holds them back, so the globals are
// emptied by hand to let those cycles go
impl Drop for Interpreter {
    fn drop(&mut self) {
        self.globals.clear();
    }
}

fn type_error(pos: Pos, message: &'static str) -> RuntimeError {
    RuntimeError::new(pos, ErrorKind::Type(message))
}

fn numbers(lhs: &Value, rhs: &Value) -> Result<(f64, f64), ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(ErrorKind::Type(OPERANDS_NOT_NUMBERS)),
    }
}

fn binary_op(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEqual => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Add => add_values(lhs, rhs),
        BinaryOp::LessThan => numbers(&lhs, &rhs).map(|(l, r)| Value::Bool(l < r)),
        BinaryOp::LessThanEqual => numbers(&lhs, &rhs).map(|(l, r)| Value::Bool(l <= r)),
        BinaryOp::GreaterThan => numbers(&lhs, &rhs).map(|(l, r)| Value::Bool(l > r)),
        BinaryOp::GreaterThanEqual => numbers(&lhs, &rhs).map(|(l, r)| Value::Bool(l >= r)),
        BinaryOp::Subtract => numbers(&lhs, &rhs).map(|(l, r)| Value::Number(l - r)),
        BinaryOp::Multiply => numbers(&lhs, &rhs).map(|(l, r)| Value::Number(l * r)),
        BinaryOp::Divide => {
            let (l, r) = numbers(&lhs, &rhs)?;
            // Any other zero denominator gives an IEEE infinity
            if l == 0f64 && r == 0f64 {
                Err(ErrorKind::DivideZeroByZero)
            } else {
                Ok(Value::Number(l / r))
            }
        }
    }
}

fn add_values(lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
        (l @ Value::String(_), r) | (l, r @ Value::String(_)) => {
            Ok(Value::from(format!("{}{}", l, r)))
        }
        _ => Err(ErrorKind::Type(BAD_ADD_OPERANDS)),
    }
}
