//! FILENAME: engine/src/script.rs
//! PURPOSE: Statement interpreter for the script language.
//! CONTEXT: Library functions are statements over the shared value type.
//! Execution threads an explicit control-flow signal (normal, return,
//! break, continue) distinct from data errors, so `return` can unwind
//! loops without being mistaken for a failure.

use crate::context::CallingContext;
use crate::error::{typed, EvalError};
use crate::evaluator::evaluate;
use crate::value::{FunctionValue, ScriptFunction, Value};
use parser::ast::Statement;
use std::rc::Rc;

/// The result of executing one statement.
pub enum ControlFlow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Conditions must be Floats; nonzero is true.
fn truthy(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Float(f) => Ok(*f != 0.0),
        other => Err(typed(format!(
            "Error using {} as a condition.",
            other.type_name()
        ))),
    }
}

pub fn execute(stmt: &Statement, ctx: &mut CallingContext) -> Result<ControlFlow, EvalError> {
    match stmt {
        Statement::Seq(statements) => {
            for statement in statements {
                match execute(statement, ctx)? {
                    ControlFlow::Normal => {}
                    other => return Ok(other),
                }
            }
            Ok(ControlFlow::Normal)
        }

        Statement::If(_, condition, then_branch, else_branch) => {
            let cond = evaluate(condition, ctx)?;
            if truthy(&cond)? {
                execute(then_branch, ctx)
            } else {
                execute(else_branch, ctx)
            }
        }

        Statement::While(_, condition, body) => {
            loop {
                let cond = evaluate(condition, ctx)?;
                if !truthy(&cond)? {
                    break;
                }
                match execute(body, ctx)? {
                    ControlFlow::Normal | ControlFlow::Continue => {}
                    ControlFlow::Break => break,
                    ret @ ControlFlow::Return(_) => return Ok(ret),
                }
            }
            Ok(ControlFlow::Normal)
        }

        Statement::For(_, var, iterable, body) => {
            let collection = evaluate(iterable, ctx)?;
            match collection {
                Value::Array(items) => {
                    for item in items.iter() {
                        match run_iteration(var, item.clone(), body, ctx)? {
                            ControlFlow::Normal => {}
                            ControlFlow::Break => break,
                            ret @ ControlFlow::Return(_) => return Ok(ret),
                            ControlFlow::Continue => unreachable!(),
                        }
                    }
                }
                Value::Dictionary(entries) => {
                    for key in entries.keys() {
                        match run_iteration(var, key.clone(), body, ctx)? {
                            ControlFlow::Normal => {}
                            ControlFlow::Break => break,
                            ret @ ControlFlow::Return(_) => return Ok(ret),
                            ControlFlow::Continue => unreachable!(),
                        }
                    }
                }
                Value::Float(n) => {
                    let limit = n.floor();
                    let mut i = 0.0;
                    while i < limit {
                        match run_iteration(var, Value::Float(i), body, ctx)? {
                            ControlFlow::Normal => {}
                            ControlFlow::Break => break,
                            ret @ ControlFlow::Return(_) => return Ok(ret),
                            ControlFlow::Continue => unreachable!(),
                        }
                        i += 1.0;
                    }
                }
                other => {
                    return Err(typed(format!(
                        "Error iterating over {}.",
                        other.type_name()
                    )))
                }
            }
            Ok(ControlFlow::Normal)
        }

        Statement::Assignment(_, name, expr) => {
            let value = evaluate(expr, ctx)?;
            ctx.assign(name, value);
            Ok(ControlFlow::Normal)
        }

        Statement::ExprStatement(_, expr) => {
            evaluate(expr, ctx)?;
            Ok(ControlFlow::Normal)
        }

        Statement::FunctionDef(_, name, parameters, body) => {
            let function = Value::Function(Rc::new(FunctionValue::Scripted(ScriptFunction {
                name: name.clone(),
                parameters: parameters.clone(),
                body: body.clone(),
                captured: ctx.current_scope(),
            })));
            ctx.assign(name, function);
            Ok(ControlFlow::Normal)
        }

        Statement::Return(_, expr) => {
            let value = evaluate(expr, ctx)?;
            Ok(ControlFlow::Return(value))
        }

        Statement::Break(_) => Ok(ControlFlow::Break),

        Statement::Continue(_) => Ok(ControlFlow::Continue),

        Statement::Nop => Ok(ControlFlow::Normal),
    }
}

/// Binds the loop variable and runs one body iteration, flattening
/// Continue into Normal (the loop itself decides what Break/Return mean).
fn run_iteration(
    var: &str,
    item: Value,
    body: &Statement,
    ctx: &mut CallingContext,
) -> Result<ControlFlow, EvalError> {
    ctx.assign(var, item);
    match execute(body, ctx)? {
        ControlFlow::Normal | ControlFlow::Continue => Ok(ControlFlow::Normal),
        other => Ok(other),
    }
}
