//! FILENAME: persistence/src/html_writer.rs
//! PURPOSE: Serializes a sheet to the HTML table format.
//! CONTEXT: Trailing empty cells and columns are trimmed before writing.
//! Parsed value cells are re-rendered from their expression trees, so the
//! saved formula text is normalized; unparsed ones keep their raw input.
//! Label text is written verbatim behind an `&lt;` marker. Entities are
//! escaped ampersand-first so unescaping can run in the reverse order.

use crate::error::PersistenceError;
use crate::{HEADER_LINE, TRAILER_LINE};
use engine::{expression_to_string, CellType, Expression, SpreadSheet};
use parser::ast::Literal;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Escapes `&`, `<`, `>` for embedding in the document. The ampersand
/// must go first.
fn harden(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Drops trailing empty slots from every column, then trailing empty
/// columns from the sheet.
fn trim_trailing(sheet: &mut SpreadSheet) {
    for column in &mut sheet.sheet {
        while matches!(column.last(), Some(None)) {
            column.pop();
        }
    }
    while matches!(sheet.sheet.last(), Some(column) if column.is_empty()) {
        sheet.sheet.pop();
    }
}

/// Writes the sheet to `file_name`, trimming trailing blanks in place.
pub fn save_sheet(file_name: &str, sheet: &mut SpreadSheet) -> Result<(), PersistenceError> {
    trim_trailing(sheet);

    let file = File::create(file_name)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", HEADER_LINE)?;

    for (col, column) in sheet.sheet.iter().enumerate() {
        write!(out, "   <tr>")?;
        for (row, slot) in column.iter().enumerate() {
            match slot {
                None => write!(out, "<td />")?,
                Some(cell_rc) => {
                    let cell = cell_rc.borrow();
                    if cell.cell_type == CellType::Value {
                        match &cell.value {
                            Some(expr) => write!(
                                out,
                                "<td>={}</td>",
                                harden(&expression_to_string(expr, col, row))
                            )?,
                            None => write!(out, "<td>={}</td>", harden(&cell.current_input))?,
                        }
                    } else {
                        write!(out, "<td>&lt;{}</td>", harden(&label_text(&cell)))?;
                    }
                }
            }
        }
        writeln!(out, "</tr>")?;
    }

    writeln!(out, "{}", TRAILER_LINE)?;
    out.flush()?;
    Ok(())
}

/// The literal text of a label cell, whether or not it has been through a
/// recalc (which installs a constant expression and clears the input).
fn label_text(cell: &engine::Cell) -> String {
    if let Some(expr) = &cell.value {
        if let Expression::Constant(_, Literal::Str(s)) = expr.as_ref() {
            return s.clone();
        }
    }
    cell.current_input.clone()
}
