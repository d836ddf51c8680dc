use crate::console::Console;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::value::{NativeFunction, NativeImpl, Value};

/// The builtins installed into an evaluator's global scope.
///
/// Each evaluator owns its own table, so two interpreters never share
/// registrations.
#[derive(Clone)]
pub struct Natives {
    functions: Vec<NativeFunction>,
}

impl Natives {
    pub fn empty() -> Self {
        Self { functions: Vec::new() }
    }

    /// `print`, `scan`, `len` (also `length`), `type`, `smallest`,
    /// `biggest` and `append`.
    pub fn standard() -> Self {
        let mut natives = Self::empty();
        natives.register("print", None, native_print);
        natives.register("scan", None, native_scan);
        natives.register("len", Some(1), native_len);
        natives.register("length", Some(1), native_len);
        natives.register("type", Some(1), native_type);
        natives.register("smallest", None, native_smallest);
        natives.register("biggest", None, native_biggest);
        natives.register("append", Some(2), native_append);
        natives
    }

    /// Adds a builtin, replacing any earlier one with the same name.
    pub fn register(&mut self, name: &'static str, arity: Option<usize>, func: NativeImpl) {
        self.functions.retain(|native| native.name != name);
        self.functions.push(NativeFunction { name, arity, func });
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.iter().find(|native| native.name == name)
    }

    pub fn install(&self, env: &mut Environment) {
        for native in &self.functions {
            env.define(native.name, Value::NativeFn(*native));
        }
    }
}

impl Default for Natives {
    fn default() -> Self {
        Self::standard()
    }
}

fn native_print(console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    console.write_line(&line)?;
    Ok(Value::Nil)
}

fn native_scan(console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let prompt = match args.first() {
        Some(Value::Str(prompt)) => prompt.as_str(),
        _ => "> ",
    };
    let line = console.read_line(prompt)?;
    Ok(Value::Str(line))
}

fn native_len(_console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match args.first() {
        Some(Value::Str(s)) => Ok(Value::Num(s.chars().count() as f64)),
        Some(Value::Array(items)) => Ok(Value::Num(items.borrow().len() as f64)),
        Some(other) => Err(RuntimeError::type_mismatch(format!(
            "len() not supported for type {}",
            other.type_name()
        ))),
        None => Err(RuntimeError::type_mismatch("len() expects one argument")),
    }
}

fn native_type(_console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let name = args.first().map(Value::type_name).unwrap_or("nil");
    Ok(Value::Str(name.to_string()))
}

fn numbers(name: &str, args: &[Value]) -> Result<Vec<f64>, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::type_mismatch(format!(
            "{}() expects at least one number",
            name
        )));
    }

    args.iter()
        .map(|arg| match arg {
            Value::Num(n) => Ok(*n),
            other => Err(RuntimeError::type_mismatch(format!(
                "{}() expects numbers, got {}",
                name,
                other.type_name()
            ))),
        })
        .collect()
}

fn native_smallest(_console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let values = numbers("smallest", &args)?;
    let mut smallest = values[0];
    for value in &values[1..] {
        if *value < smallest {
            smallest = *value;
        }
    }
    Ok(Value::Num(smallest))
}

fn native_biggest(_console: &mut dyn Console, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let values = numbers("biggest", &args)?;
    let mut biggest = values[0];
    for value in &values[1..] {
        if *value > biggest {
            biggest = *value;
        }
    }
    Ok(Value::Num(biggest))
}

/// Pushes onto the array in place and hands back the same array.
fn native_append(_console: &mut dyn Console, mut args: Vec<Value>) -> Result<Value, RuntimeError> {
    let item = args.pop().unwrap_or(Value::Nil);
    match args.pop() {
        Some(Value::Array(items)) => {
            items.borrow_mut().push(item);
            Ok(Value::Array(items))
        }
        Some(other) => Err(RuntimeError::type_mismatch(format!(
            "append() expects an array as its first argument, got {}",
            other.type_name()
        ))),
        None => Err(RuntimeError::type_mismatch("append() expects an array and a value")),
    }
}
