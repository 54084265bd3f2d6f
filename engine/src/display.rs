//! FILENAME: engine/src/display.rs
//! PURPOSE: Text rendering of values and parsed expressions.
//! CONTEXT: The grid shows evaluated values; saved files re-render parsed
//! formulas back into source text. Both renderings depend on the position
//! of the owning cell, because relative references name different cells
//! from different positions.

use crate::coord::{cell_range_to_string, cell_ref_to_string};
use crate::numeric::format_number;
use crate::value::Value;
use parser::ast::{BinaryOperator, Expression, Literal, UnaryOperator};

/// Renders a value for the grid and for saved label content.
pub fn value_to_display_string(value: &Value, col: usize, row: usize) -> String {
    match value {
        Value::Float(n) => format_number(*n),
        Value::String(s) => s.to_string(),
        Value::Nil => "Nil".to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|v| value_to_display_string(v, col, row))
                .collect();
            format!("{{{}}}", parts.join("; "))
        }
        Value::Dictionary(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}: {}",
                        value_to_display_string(k, col, row),
                        value_to_display_string(v, col, row)
                    )
                })
                .collect();
            format!("{{{}}}", parts.join("; "))
        }
        Value::Function(_) => "Function".to_string(),
        Value::CellRef(r) => cell_ref_to_string(r, col, row),
        Value::CellRange(r) => cell_range_to_string(r),
    }
}

fn operator_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Equal => "=",
        BinaryOperator::NotEqual => "<>",
        BinaryOperator::LessThan => "<",
        BinaryOperator::GreaterThan => ">",
        BinaryOperator::LessEqual => "<=",
        BinaryOperator::GreaterEqual => ">=",
        BinaryOperator::And => "&",
        BinaryOperator::Or => "|",
    }
}

fn operator_precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterEqual => 1,
        BinaryOperator::Or => 2,
        BinaryOperator::And => 3,
        BinaryOperator::Add | BinaryOperator::Subtract => 4,
        BinaryOperator::Multiply | BinaryOperator::Divide => 5,
    }
}

fn expression_precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::BinaryOp(_, op, _, _) => operator_precedence(*op),
        Expression::UnaryOp(_, _, _) => 6,
        _ => 7,
    }
}

/// Re-renders a parsed expression as source text, as seen from the cell at
/// (col, row), inserting only the parentheses precedence requires.
pub fn expression_to_string(expr: &Expression, col: usize, row: usize) -> String {
    match expr {
        Expression::Constant(_, Literal::Number(n)) => format_number(*n),
        Expression::Constant(_, Literal::Str(s)) => format!("\"{}\"", s),
        Expression::Variable(_, name) => name.clone(),
        Expression::BinaryOp(_, op, left, right) => {
            let prec = operator_precedence(*op);
            let l = render_child(left, col, row, prec, false);
            let r = render_child(right, col, row, prec, true);
            format!("{}{}{}", l, operator_symbol(*op), r)
        }
        Expression::UnaryOp(_, op, operand) => {
            let symbol = match op {
                UnaryOperator::Negate => "-",
                UnaryOperator::Not => "!",
            };
            let inner = render_child(operand, col, row, 6, false);
            format!("{}{}", symbol, inner)
        }
        Expression::FunctionCall(_, callee, args) => {
            let rendered: Vec<String> = args
                .iter()
                .map(|a| expression_to_string(a, col, row))
                .collect();
            format!(
                "{}({})",
                expression_to_string(callee, col, row),
                rendered.join(",")
            )
        }
        Expression::CellRefNode(_, r) => cell_ref_to_string(r, col, row),
        Expression::CellRangeNode(_, r) => cell_range_to_string(r),
    }
}

fn render_child(child: &Expression, col: usize, row: usize, parent: u8, is_right: bool) -> String {
    let text = expression_to_string(child, col, row);
    let prec = expression_precedence(child);
    let needs_parens = if is_right { prec <= parent } else { prec < parent };
    if needs_parens {
        format!("({})", text)
    } else {
        text
    }
}
