//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Evaluates expression trees to values.
//! CONTEXT: A closed-world match over the node kinds. Children evaluate
//! left to right, fully, before an operator or call dispatches. Cell
//! references and ranges evaluate to themselves; dereferencing happens
//! only through the `EvalCell` builtin, which re-enters the sheet's
//! compute_cell with rethrow so the outer cell sees inner failures.

use crate::context::CallingContext;
use crate::coord::column_to_string;
use crate::error::{typed, EvalError};
use crate::ops;
use crate::script::{self, ControlFlow};
use crate::value::{FunctionValue, Value};
use parser::ast::{CellRef, Expression, Literal};
use std::rc::Rc;

/// Largest number of cells `ExpandRange` will materialize.
const MAX_RANGE_CELLS: i64 = 1_000_000;

pub fn evaluate(expr: &Expression, ctx: &mut CallingContext) -> Result<Value, EvalError> {
    match expr {
        Expression::Constant(_, Literal::Number(n)) => Ok(Value::Float(*n)),
        Expression::Constant(_, Literal::Str(s)) => Ok(Value::string(s)),

        Expression::Variable(token, name) => ctx.lookup(name).ok_or_else(|| {
            typed(format!("Undefined name \"{}\" at {}.", name, token.pos))
        }),

        Expression::BinaryOp(_, op, left, right) => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            ops::binary_op(*op, &l, &r)
        }

        Expression::UnaryOp(_, op, operand) => {
            let v = evaluate(operand, ctx)?;
            ops::unary_op(*op, &v)
        }

        Expression::FunctionCall(_, callee, args) => {
            let callee_value = evaluate(callee, ctx)?;
            let function = match &callee_value {
                Value::Function(f) => f.clone(),
                other => {
                    return Err(typed(format!(
                        "Error calling {} as a function.",
                        other.type_name()
                    )))
                }
            };
            if args.len() != function.arity() {
                return Err(typed(format!(
                    "Function {} expected {} arguments, but got {}.",
                    function.name(),
                    function.arity(),
                    args.len()
                )));
            }
            let mut argv = Vec::with_capacity(args.len());
            for arg in args {
                argv.push(evaluate(arg, ctx)?);
            }
            call_function(&function, argv, ctx)
        }

        Expression::CellRefNode(_, r) => Ok(Value::CellRef(*r)),
        Expression::CellRangeNode(_, r) => Ok(Value::CellRange(*r)),
    }
}

/// Invokes a callable with already evaluated arguments. Host builtins run
/// directly; scripted functions run their body under a fresh local scope
/// chained onto the function's captured scope.
pub fn call_function(
    function: &Rc<FunctionValue>,
    args: Vec<Value>,
    ctx: &mut CallingContext,
) -> Result<Value, EvalError> {
    match function.as_ref() {
        FunctionValue::Host(host) => (host.f)(ctx, &args),
        FunctionValue::Scripted(script_fn) => {
            let local = crate::context::new_scope();
            {
                let mut scope = local.borrow_mut();
                for (param, arg) in script_fn.parameters.iter().zip(args) {
                    scope.set(param, arg);
                }
            }
            let saved = std::mem::take(&mut ctx.scopes);
            ctx.scopes.push(script_fn.captured.clone());
            ctx.scopes.push(local);
            let result = script::execute(&script_fn.body, ctx);
            ctx.scopes = saved;
            match result? {
                ControlFlow::Return(value) => Ok(value),
                ControlFlow::Normal => Ok(Value::Nil),
                ControlFlow::Break => Err(typed("Break used outside of a loop.")),
                ControlFlow::Continue => Err(typed("Continue used outside of a loop.")),
            }
        }
    }
}

/// Dereferences a cell reference: the `EvalCell` semantics.
pub fn eval_cell_reference(r: &CellRef, ctx: &mut CallingContext) -> Result<Value, EvalError> {
    let (frame_col, frame_row) = match ctx.top_cell() {
        Some(frame) => (frame.col, frame.row),
        None => {
            return Err(typed(
                "Error evaluating a cell reference outside of any cell.",
            ))
        }
    };
    let (col, row) = r.resolve(frame_col, frame_row);
    if col < 0 || row < 0 {
        return Ok(Value::Nil);
    }
    let (col, row) = (col as usize, row as usize);

    let sheet = ctx.sheet;
    let cell_rc = match sheet.get_cell_at(col, row) {
        Some(cell) => cell,
        None => return Ok(Value::Nil),
    };

    {
        let cell = cell_rc.borrow();
        if cell.previous_generation == ctx.generation {
            if let Some(value) = &cell.previous_value {
                return Ok(value.clone());
            }
        }
        if cell.in_evaluation {
            return Err(typed(format!(
                "Cycle detected evaluating cell {}{}.",
                column_to_string(col as i64),
                row + 1
            )));
        }
    }

    let mut out = None;
    sheet.compute_cell(ctx, &mut out, col, row, true)?;
    Ok(out.unwrap_or(Value::Nil))
}

/// Expands a range into an array of absolute cell references spanning the
/// rectangle, column-major. Inverted corners are normalized for iteration.
pub fn expand_range(range: &parser::ast::CellRange) -> Result<Value, EvalError> {
    let (c1, c2) = (range.col1.min(range.col2), range.col1.max(range.col2));
    let (r1, r2) = (range.row1.min(range.row2), range.row1.max(range.row2));

    let cells = (c2 - c1 + 1).saturating_mul(r2 - r1 + 1);
    if cells > MAX_RANGE_CELLS {
        return Err(typed("Range too large to expand."));
    }

    let mut refs = Vec::with_capacity(cells as usize);
    for col in c1..=c2 {
        for row in r1..=r2 {
            refs.push(Value::CellRef(CellRef::new(true, col, true, row)));
        }
    }
    Ok(Value::Array(Rc::new(refs)))
}
