use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::console::{Console, StdConsole};
use crate::environment::{Env, Environment};
use crate::error::{RuntimeError, Span};
use crate::natives::Natives;
use crate::value::{Function, Value};

/// Nested user-function calls allowed before a run fails.
pub const MAX_CALL_DEPTH: usize = 10_000;

// The stack grows by STACK_PER_RECURSION whenever less than RED_ZONE is left.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// How a statement finished. `Return` travels up to the nearest call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// The top-level program's module record: its scope and the values it
/// has exported.
pub struct Module {
    pub name: String,
    pub env: Env,
    exports: HashMap<String, Value>,
}

impl Module {
    fn new(name: &str, globals: &Env) -> Self {
        Self {
            name: name.to_string(),
            env: Environment::with_enclosing(globals),
            exports: HashMap::new(),
        }
    }

    pub fn exports(&self) -> &HashMap<String, Value> {
        &self.exports
    }

    pub fn export(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }
}

pub struct Evaluator {
    module: Module,
    environment: Env,
    console: Box<dyn Console>,
    call_depth: usize,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_console(Natives::standard(), Box::new(StdConsole))
    }

    pub fn with_console(natives: Natives, console: Box<dyn Console>) -> Self {
        let globals = Environment::new();
        {
            let mut scope = globals.borrow_mut();
            natives.install(&mut scope);
            scope.define("true", Value::Bool(true));
            scope.define("false", Value::Bool(false));
            scope.define("nil", Value::Nil);
        }

        let module = Module::new("main", &globals);
        let environment = Rc::clone(&module.env);

        Self {
            module,
            environment,
            console,
            call_depth: 0,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Resolves `name` from the current scope outward.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.environment.borrow().get(name)
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.run(&program.statements)
    }

    /// Executes top-level statements in order. The first runtime error
    /// stops the run; a top-level `return` ends it early.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = statements.len()))]
    pub fn run(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute_statement(statement) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(_)) => {
                    tracing::debug!("top-level return, stopping");
                    break;
                }
                Err(error) => {
                    tracing::debug!(%error, "runtime error");
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.execute_statement_inner(stmt))
    }

    fn execute_statement_inner(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Let { name, initializer, .. } => {
                let value = match initializer {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.as_str(), value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, op, value, span } => {
                let rhs = self.evaluate_expression(value)?;
                let new_value = match op.binary_op() {
                    None => rhs,
                    Some(operator) => {
                        let current = self.read_variable(name, *span)?;
                        arithmetic(operator, current, rhs, *span)?
                    }
                };
                self.environment
                    .borrow_mut()
                    .assign(name, new_value)
                    .map_err(|_| RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        span: *span,
                    })?;
                Ok(Flow::Normal)
            }
            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Block { statements, .. } => {
                let scope = Environment::with_enclosing(&self.environment);
                self.execute_block(statements, scope)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_statement(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute_statement(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute_statement(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                let function = Value::Fn(Rc::new(Function {
                    decl: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                }));
                self.environment.borrow_mut().define(decl.name.as_str(), function);
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Export { name, span } => {
                let value = self.module.env.borrow().get(name).ok_or_else(|| {
                    RuntimeError::UndefinedVariable {
                        name: name.clone(),
                        span: *span,
                    }
                })?;
                tracing::debug!(module = %self.module.name, name = %name, "exported binding");
                self.module.exports.insert(name.clone(), value);
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `scope` as the current environment. The
    /// previous environment is restored however the block exits.
    fn execute_block(&mut self, statements: &[Stmt], scope: Env) -> Result<Flow, RuntimeError> {
        self.with_environment(scope, |this| {
            for statement in statements {
                if let Flow::Return(value) = this.execute_statement(statement)? {
                    return Ok(Flow::Return(value));
                }
            }
            Ok(Flow::Normal)
        })
    }

    fn with_environment<T>(&mut self, scope: Env, body: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.environment, scope);
        tracing::trace!("entered scope");
        let result = body(self);
        self.environment = previous;
        result
    }

    fn read_variable(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        self.environment
            .borrow()
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            })
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.evaluate_expression_inner(expr))
    }

    fn evaluate_expression_inner(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Num(*value)),
            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Nil { .. } => Ok(Value::Nil),
            Expr::Ident { name, span } => self.read_variable(name, *span),
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr),
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.evaluate_expression(operand)?;
                match operator {
                    UnaryOp::Minus => arithmetic(BinaryOp::Star, operand, Value::Num(-1.0), *span),
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left = self.evaluate_expression(left)?;

                match operator {
                    BinaryOp::Or if left.is_truthy() => return Ok(left),
                    BinaryOp::And if !left.is_truthy() => return Ok(left),
                    BinaryOp::Or | BinaryOp::And => return self.evaluate_expression(right),
                    _ => {}
                }

                let right = self.evaluate_expression(right)?;
                evaluate_binary_op(*operator, left, right, *span)
            }
            Expr::Array { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expression(element)?);
                }
                Ok(Value::array(items))
            }
            Expr::Index { target, index, span } => {
                let target = self.evaluate_expression(target)?;
                let index = self.evaluate_expression(index)?;

                let items = match target {
                    Value::Array(items) => items,
                    other => {
                        return Err(RuntimeError::NotIndexable {
                            type_name: other.type_name(),
                            span: *span,
                        })
                    }
                };
                let position = match index {
                    Value::Num(n) => n.trunc(),
                    other => {
                        return Err(RuntimeError::InvalidIndex {
                            type_name: other.type_name(),
                            span: *span,
                        })
                    }
                };

                let items = items.borrow();
                if position >= 0.0 && position < items.len() as f64 {
                    Ok(items[position as usize].clone())
                } else {
                    Ok(Value::Nil)
                }
            }
            Expr::Call { callee, args, span } => {
                let callee = self.evaluate_expression(callee)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.evaluate_expression(arg)?);
                }
                self.call_value(callee, arguments, *span)
            }
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        match callee {
            Value::NativeFn(native) => {
                if let Some(arity) = native.arity {
                    if args.len() != arity {
                        return Err(RuntimeError::ArityMismatch {
                            callee: native.name.to_string(),
                            expected: arity,
                            got: args.len(),
                            span,
                        });
                    }
                }
                tracing::trace!(native = native.name, args = args.len(), "calling builtin");
                (native.func)(self.console.as_mut(), args).map_err(|error| error.at(span))
            }
            Value::Fn(function) => {
                if args.len() != function.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        callee: function.name().to_string(),
                        expected: function.arity(),
                        got: args.len(),
                        span,
                    });
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::StackOverflow {
                        depth: MAX_CALL_DEPTH,
                        span,
                    });
                }

                tracing::trace!(function = function.name(), args = args.len(), "calling function");
                let scope = Environment::with_enclosing(&function.closure);
                {
                    let mut scope = scope.borrow_mut();
                    for (param, arg) in function.decl.params.iter().zip(args) {
                        scope.define(param.as_str(), arg);
                    }
                }

                self.call_depth += 1;
                let flow = self.execute_block(&function.decl.body, scope);
                self.call_depth -= 1;

                match flow? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                }
            }
            other => Err(RuntimeError::NotCallable {
                type_name: other.type_name(),
                span,
            }),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate_binary_op(operator: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match operator {
        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Star | BinaryOp::Slash => {
            arithmetic(operator, left, right, span)
        }
        BinaryOp::Equal => Ok(Value::Bool(left.equals(&right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.equals(&right))),
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let ordering = left.compare(&right).map_err(|error| error.at(span))?;
            let result = match operator {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Bool(result))
        }
        // Short-circuited by the caller; reached only if both sides were
        // evaluated eagerly.
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
    }
}

/// `+` on two numbers or two strings; `- * /` on two numbers.
fn arithmetic(operator: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match (operator, left, right) {
        (BinaryOp::Plus, Value::Num(l), Value::Num(r)) => Ok(Value::Num(l + r)),
        (BinaryOp::Plus, Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
        (BinaryOp::Minus, Value::Num(l), Value::Num(r)) => Ok(Value::Num(l - r)),
        (BinaryOp::Star, Value::Num(l), Value::Num(r)) => Ok(Value::Num(l * r)),
        (BinaryOp::Slash, Value::Num(l), Value::Num(r)) => Ok(Value::Num(l / r)),
        (operator, l, r) => {
            let verb = match operator {
                BinaryOp::Plus => "add",
                BinaryOp::Minus => "subtract",
                BinaryOp::Star => "multiply",
                _ => "divide",
            };
            Err(RuntimeError::TypeMismatch {
                message: format!("Cannot {} {} and {}", verb, l.type_name(), r.type_name()),
                span,
            })
        }
    }
}
