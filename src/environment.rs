//! Lexical scopes for the evaluator.
//!
//! Scopes are reference counted so a closure can keep its defining scope
//! alive after the block that created it has finished.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Shared handle to a scope. Single-threaded by construction (`Rc`).
pub type Env = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

/// Returned by [`Environment::assign`] when no scope binds the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undefined;

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn with_enclosing(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Rebinds the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), Undefined> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(Undefined)
        }
    }
}
