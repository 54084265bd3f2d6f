//! FILENAME: engine/src/sheet.rs
//! PURPOSE: The spreadsheet model and recalculation driver.
//! CONTEXT: A column-major sparse matrix of cells behind shared handles;
//! evaluation is re-entrant (resolving a reference may compute another
//! cell while the first is mid-evaluation), so cells sit in RefCells and
//! no borrow is held across a nested evaluation. Recalc is a full sweep
//! in one of eight traversal orders; there is no dependency analysis, and
//! on-demand resolution through EvalCell fills in forward references.

use crate::cell::{Cell, CellType};
use crate::context::{CallingContext, CellFrame};
use crate::error::EvalError;
use crate::evaluator;
use crate::value::Value;
use parser::ast::{Expression, Literal};
use parser::expression::parse_cell_input;
use parser::token::Token;
use std::cell::RefCell;
use std::rc::Rc;

/// Keeps only the first line of a (possibly multi-line) error message.
fn first_line(message: &str) -> String {
    match message.find('\n') {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

pub struct SpreadSheet {
    /// Column-major storage: `sheet[col][row]`.
    pub sheet: Vec<Vec<Option<Rc<RefCell<Cell>>>>>,
    /// Highest number of rows any column has ever held.
    pub max_row: usize,
    /// Traversal order flags for recalc.
    pub c_major: bool,
    pub top_down: bool,
    pub left_right: bool,
}

impl SpreadSheet {
    pub fn new() -> Self {
        SpreadSheet {
            sheet: Vec::new(),
            max_row: 0,
            c_major: true,
            top_down: true,
            left_right: true,
        }
    }

    pub fn get_cell_at(&self, col: usize, row: usize) -> Option<Rc<RefCell<Cell>>> {
        self.sheet
            .get(col)
            .and_then(|column| column.get(row))
            .and_then(|cell| cell.clone())
    }

    /// Creates (or replaces) the cell at the coordinate, growing the
    /// storage as needed.
    pub fn init_cell_at(&mut self, col: usize, row: usize) {
        if col >= self.sheet.len() {
            self.sheet.resize_with(col + 1, Vec::new);
        }
        if row >= self.sheet[col].len() {
            self.sheet[col].resize_with(row + 1, || None);
            if row >= self.max_row {
                self.max_row = row + 1;
            }
        }
        self.sheet[col][row] = Some(Rc::new(RefCell::new(Cell::new())));
    }

    pub fn remove_cell_at(&mut self, col: usize, row: usize) {
        if let Some(column) = self.sheet.get_mut(col) {
            if let Some(slot) = column.get_mut(row) {
                *slot = None;
            }
        }
    }

    /// Convenience for building sheets: installs a cell holding the given
    /// contents.
    pub fn set_cell(&mut self, col: usize, row: usize, cell: Cell) {
        self.init_cell_at(col, row);
        self.sheet[col][row] = Some(Rc::new(RefCell::new(cell)));
    }

    /// Evaluates one cell. `out` receives the computed value; the returned
    /// string is the first line of any recorded error message (empty when
    /// none). With `rethrow`, evaluation failures also propagate as `Err`
    /// so a referencing cell sees the inner failure.
    pub fn compute_cell(
        &self,
        ctx: &mut CallingContext,
        out: &mut Option<Value>,
        col: usize,
        row: usize,
        rethrow: bool,
    ) -> Result<String, EvalError> {
        let mut result = String::new();
        *out = None;

        let cell_rc = match self.get_cell_at(col, row) {
            Some(cell) => cell,
            None => return Ok(result),
        };

        // Decide what to evaluate: the parsed expression, a synthetic
        // constant for an unparsed label, or a fresh parse of the input.
        let mut value: Option<Rc<Expression>> = cell_rc.borrow().value.clone();
        if value.is_none() && cell_rc.borrow().cell_type == CellType::Label {
            let text = cell_rc.borrow().current_input.clone();
            value = Some(Rc::new(Expression::Constant(
                Token::synthetic(),
                Literal::Str(text),
            )));
        }
        if value.is_none() {
            let input = cell_rc.borrow().current_input.clone();
            match parse_cell_input(&input, col, row) {
                Ok(expr) => value = Some(Rc::new(expr)),
                Err(e) => result = first_line(&e.to_string()),
            }
        }
        let value = match value {
            Some(v) => v,
            None => return Ok(result),
        };

        // Commit the parse, unless this is a preview evaluation.
        if !ctx.in_user_input {
            let mut cell = cell_rc.borrow_mut();
            cell.current_input.clear();
            cell.value = Some(value.clone());
        }

        ctx.push_cell(CellFrame {
            cell: cell_rc.clone(),
            col,
            row,
        });
        cell_rc.borrow_mut().in_evaluation = true;

        match evaluator::evaluate(&value, ctx) {
            Ok(new_value) => {
                cell_rc.borrow_mut().in_evaluation = false;
                if !ctx.in_user_input {
                    let mut cell = cell_rc.borrow_mut();
                    cell.previous_generation = ctx.generation;
                    cell.previous_value = Some(new_value.clone());
                }
                *out = Some(new_value);
                ctx.pop_cell();
            }
            Err(e) => {
                result = first_line(&e.to_string());
                cell_rc.borrow_mut().in_evaluation = false;
                ctx.pop_cell();
                if rethrow {
                    return Err(e);
                }
            }
        }

        Ok(result)
    }

    /// Full-sheet recalculation in the order selected by the traversal
    /// flags. Every cell is visited exactly once; errors are recorded per
    /// cell and do not stop the sweep.
    pub fn recalc(&self, ctx: &mut CallingContext) {
        ctx.in_user_input = false;
        ctx.generation += 1;

        if self.c_major {
            let cols: Vec<usize> = ordered(self.sheet.len(), self.left_right);
            for col in cols {
                let rows = ordered(self.sheet[col].len(), self.top_down);
                for row in rows {
                    self.recalc_one(ctx, col, row);
                }
            }
        } else {
            let row_count = self.sheet.iter().map(Vec::len).max().unwrap_or(0);
            let rows = ordered(row_count, self.top_down);
            for row in rows {
                let cols: Vec<usize> = ordered(self.sheet.len(), self.left_right);
                for col in cols {
                    if row < self.sheet[col].len() {
                        self.recalc_one(ctx, col, row);
                    }
                }
            }
        }
    }

    fn recalc_one(&self, ctx: &mut CallingContext, col: usize, row: usize) {
        let cell_rc = match self.get_cell_at(col, row) {
            Some(cell) => cell,
            None => return,
        };
        // Already computed this generation through on-demand resolution.
        {
            let cell = cell_rc.borrow();
            if cell.previous_generation == ctx.generation && cell.previous_value.is_some() {
                return;
            }
        }
        // Labels that were never parsed evaluate as their literal text.
        {
            let mut cell = cell_rc.borrow_mut();
            if cell.cell_type == CellType::Label && cell.value.is_none() {
                let text = cell.current_input.clone();
                cell.value = Some(Rc::new(Expression::Constant(
                    Token::synthetic(),
                    Literal::Str(text),
                )));
            }
        }
        let mut trash = None;
        if let Ok(message) = self.compute_cell(ctx, &mut trash, col, row, false) {
            if !message.is_empty() {
                ctx.log(&message);
            }
        }
    }

    /// The grid text for the cell at (col, row); empty for empty slots.
    pub fn display_at(&self, col: usize, row: usize) -> String {
        match self.get_cell_at(col, row) {
            Some(cell) => cell.borrow().display_string(col, row),
            None => String::new(),
        }
    }
}

impl Default for SpreadSheet {
    fn default() -> Self {
        Self::new()
    }
}

fn ordered(len: usize, forward: bool) -> Vec<usize> {
    if forward {
        (0..len).collect()
    } else {
        (0..len).rev().collect()
    }
}
