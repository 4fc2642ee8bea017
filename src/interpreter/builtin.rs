use std::rc::Rc;
use std::time::SystemTime;

use super::callable::{Callable, NativeFunction};
use super::environment::Environment;
use super::runtime::{ErrorKind, Interpreter};
use super::value::Value;

fn clock_impl(_interpreter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, ErrorKind> {
    // A clock set before 1970 reads as a negative offset rather than failing the program
    let seconds = match SystemTime::UNIX_EPOCH.elapsed() {
        Ok(duration) => duration.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    };
    Ok(Value::Number(seconds))
}

pub fn clock() -> Rc<dyn Callable> {
    Rc::new(NativeFunction {
        name: "clock",
        arity: 0,
        call: clock_impl,
    })
}

pub fn populate_builtin(global_env: &Environment) {
    let clock = clock();
    global_env.define(clock.name(), Value::Callable(clock.clone()));
}
