use std::{cell::RefCell, collections::HashMap, rc::Rc};

use tracing::trace;

use super::{runtime::ErrorKind, value::Value};

/// One frame of bindings. Frames are shared through `Rc` because a closure keeps the frame it was
/// declared in alive after the block or call that created it has finished.
#[derive(Debug, Default)]
pub struct Environment {
    values: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new_global() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    pub fn open_scope(parent: &Rc<Environment>) -> Rc<Environment> {
        trace!(depth = parent.depth() + 1, "open scope");
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    pub fn parent(&self) -> Option<&Rc<Environment>> {
        self.parent.as_ref()
    }

    /// Number of frames from here to the global frame, inclusive
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent.as_ref();
        while let Some(env) = current {
            depth += 1;
            current = env.parent.as_ref();
        }
        depth
    }

    // Redefinition in the same frame just overwrites
    pub fn define(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, ErrorKind> {
        if let Some(value) = self.values.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(ErrorKind::UndefinedVariable(name.to_string())),
        }
    }

    pub fn assign(&self, name: &str, value: Value) -> Result<(), ErrorKind> {
        if let Some(slot) = self.values.borrow_mut().get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(ErrorKind::UndefinedVariable(name.to_string())),
        }
    }

    /// Drop every binding in this frame
    pub fn clear(&self) {
        let values = std::mem::take(&mut *self.values.borrow_mut());
        drop(values);
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_define_and_get() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        assert_eq!(Ok(Value::Number(1f64)), global.get("a"));
    }

    #[test]
    fn test_redefine_overwrites() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        global.define("a", Value::string("two"));
        assert_eq!(Ok(Value::string("two")), global.get("a"));
    }

    #[test]
    fn test_lookup_walks_parents() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        let inner = Environment::open_scope(&Environment::open_scope(&global));
        assert_eq!(3, inner.depth());
        let middle = inner.parent().unwrap();
        assert!(Rc::ptr_eq(middle.parent().unwrap(), &global));
        assert!(global.parent().is_none());
        assert_eq!(Ok(Value::Number(1f64)), inner.get("a"));
        assert!(!inner.contains_local("a"));
    }

    #[test]
    fn test_shadowing_leaves_outer_alone() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        let inner = Environment::open_scope(&global);
        inner.define("a", Value::Number(2f64));
        assert_eq!(Ok(Value::Number(2f64)), inner.get("a"));
        assert_eq!(Ok(Value::Number(1f64)), global.get("a"));
    }

    #[test]
    fn test_assign_updates_nearest_frame() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        let inner = Environment::open_scope(&global);
        inner.assign("a", Value::Number(5f64)).unwrap();
        assert!(!inner.contains_local("a"));
        assert_eq!(Ok(Value::Number(5f64)), global.get("a"));
    }

    #[test]
    fn test_clear_empties_only_this_frame() {
        let global = Environment::new_global();
        global.define("a", Value::Number(1f64));
        let inner = Environment::open_scope(&global);
        inner.define("b", Value::Number(2f64));
        inner.clear();
        assert!(!inner.contains_local("b"));
        assert_eq!(Ok(Value::Number(1f64)), inner.get("a"));
    }

    #[test]
    fn test_undefined_names() {
        let global = Environment::new_global();
        let inner = Environment::open_scope(&global);
        assert_eq!(
            Err(ErrorKind::UndefinedVariable("nope".to_string())),
            inner.get("nope")
        );
        assert_eq!(
            Err(ErrorKind::UndefinedVariable("nope".to_string())),
            inner.assign("nope", Value::Nil)
        );
        // Assignment never creates a binding
        assert!(global.get("nope").is_err());
    }
}
