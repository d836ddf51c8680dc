use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::console::Console;
use crate::environment::Env;
use crate::error::RuntimeError;

/// Shared, mutable array storage. Every alias sees every mutation.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Storage address of an array, used to stop at cycles.
type ArrayId = *const RefCell<Vec<Value>>;

/// Host implementation of a builtin.
pub type NativeImpl = fn(&mut dyn Console, Vec<Value>) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
    Nil,
    Array(ArrayRef),
    Fn(Rc<Function>),
    NativeFn(NativeFunction),
}

/// A user function paired with the environment it was declared in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Env,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    /// `None` means the implementation checks its own argument count.
    pub arity: Option<usize>,
    pub func: NativeImpl,
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Num(_) | Value::Str(_) | Value::Array(_) | Value::Fn(_) | Value::NativeFn(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Array(_) => "array",
            Value::Fn(_) => "function",
            Value::NativeFn(_) => "native",
        }
    }

    /// Structural equality. Values of different tags are never equal.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_tracked(other, &mut Vec::new())
    }

    /// A pair of arrays already under comparison further up counts as
    /// equal, so self-containing arrays terminate.
    fn equals_tracked(&self, other: &Value, comparing: &mut Vec<(ArrayId, ArrayId)>) -> bool {
        match (self, other) {
            (Value::Num(l), Value::Num(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(l), Value::Array(r)) => {
                if Rc::ptr_eq(l, r) {
                    return true;
                }
                let pair = (Rc::as_ptr(l), Rc::as_ptr(r));
                if comparing.contains(&pair) {
                    return true;
                }

                comparing.push(pair);
                let (l, r) = (l.borrow(), r.borrow());
                let equal = l.len() == r.len()
                    && l.iter()
                        .zip(r.iter())
                        .all(|(a, b)| a.equals_tracked(b, comparing));
                comparing.pop();
                equal
            }
            (Value::Fn(l), Value::Fn(r)) => Rc::ptr_eq(l, r),
            (Value::NativeFn(l), Value::NativeFn(r)) => l.name == r.name,
            _ => false,
        }
    }

    /// Ordering between two values of the same tag. Returns `Ok(None)` for
    /// incomparable numbers (NaN).
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>, RuntimeError> {
        match (self, other) {
            (Value::Num(l), Value::Num(r)) => Ok(l.partial_cmp(r)),
            (Value::Str(l), Value::Str(r)) => Ok(Some(l.cmp(r))),
            (Value::Bool(l), Value::Bool(r)) => Ok(Some(l.cmp(r))),
            (Value::Nil, Value::Nil) => Ok(Some(Ordering::Equal)),
            (l, r) if l.type_name() == r.type_name() => Err(RuntimeError::type_mismatch(format!(
                "Values of type {} cannot be ordered",
                l.type_name()
            ))),
            (l, r) => Err(RuntimeError::type_mismatch(format!(
                "Cannot compare {} with {}",
                l.type_name(),
                r.type_name()
            ))),
        }
    }

    /// Strings nested inside arrays are quoted. An array already being
    /// printed further up renders as `[...]`.
    fn fmt_display(&self, f: &mut fmt::Formatter, nested: bool, open: &mut Vec<ArrayId>) -> fmt::Result {
        match self {
            // f64's Display already drops a zero fraction: 7.0 prints as 7.
            Value::Num(n) => write!(f, "{}", n),
            Value::Str(s) if nested => write!(f, "{:?}", s),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => write!(f, "nil"),
            Value::Array(items) => {
                let id = Rc::as_ptr(items);
                if open.contains(&id) {
                    return write!(f, "[...]");
                }

                open.push(id);
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_display(f, true, open)?;
                }
                open.pop();
                write!(f, "]")
            }
            Value::Fn(function) => write!(f, "<fn {}>", function.name()),
            Value::NativeFn(native) => write!(f, "<native fn {}>", native.name),
        }
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter, open: &mut Vec<ArrayId>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Num(n) => write!(f, "Num({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Nil => write!(f, "Nil"),
            Value::Array(items) => {
                let id = Rc::as_ptr(items);
                if open.contains(&id) {
                    return write!(f, "Array([...])");
                }

                open.push(id);
                write!(f, "Array([")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_debug(f, open)?;
                }
                open.pop();
                write!(f, "])")
            }
            // The captured environment may contain this very function.
            Value::Fn(function) => write!(f, "Fn({}/{})", function.name(), function.arity()),
            Value::NativeFn(native) => write!(f, "NativeFn({})", native.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_display(f, false, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_debug(f, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
