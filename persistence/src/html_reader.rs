//! FILENAME: persistence/src/html_reader.rs
//! PURPOSE: Loads a sheet from the HTML table format.
//! CONTEXT: The reader is line oriented: the first line must match the
//! fixed header exactly, and every following line up to the trailer is
//! one sheet column. A file that cannot be opened or does not start with
//! the header yields a one-cell sheet holding a failure label instead of
//! an error, matching the interactive program's behavior.

use crate::{HEADER_LINE, TRAILER_LINE};
use engine::{CellType, SpreadSheet};
use std::fs;

/// Unescapes entities in the reverse of the order they were applied.
fn soften(text: &str) -> String {
    text.replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

fn failure(sheet: &mut SpreadSheet, file_name: &str) -> usize {
    sheet.init_cell_at(0, 0);
    if let Some(cell) = sheet.get_cell_at(0, 0) {
        let mut cell = cell.borrow_mut();
        cell.cell_type = CellType::Label;
        cell.current_input = format!("Failed to open file {}", file_name);
    }
    1
}

fn make_cell(sheet: &mut SpreadSheet, col: usize, row: usize, cell_type: CellType, input: &str) {
    sheet.init_cell_at(col, row);
    if let Some(cell) = sheet.get_cell_at(col, row) {
        let mut cell = cell.borrow_mut();
        cell.cell_type = cell_type;
        cell.current_input = input.to_string();
    }
}

/// Loads `file_name` into `sheet` and returns the largest row count seen
/// in any column (at least 1 when the file could not be read).
pub fn load_sheet(file_name: &str, sheet: &mut SpreadSheet) -> usize {
    let text = match fs::read_to_string(file_name) {
        Ok(text) => text,
        Err(_) => return failure(sheet, file_name),
    };

    let mut lines = text.lines();
    if lines.next() != Some(HEADER_LINE) {
        return failure(sheet, file_name);
    }

    let mut max_rows = 0usize;
    let mut col = 0usize;
    for line in lines {
        if line == TRAILER_LINE {
            break;
        }
        let mut row = 0usize;

        if let Some(start) = line.find("<tr>") {
            let mut n = start + 4;
            while n < line.len() {
                let rest = &line[n..];
                if rest.starts_with("</tr>") {
                    break;
                } else if let Some(after) = rest.strip_prefix("<td />") {
                    n = line.len() - after.len();
                    row += 1;
                } else if let Some(after) = rest.strip_prefix("<td>") {
                    let content_start = line.len() - after.len();
                    let content_end = match after.find("</td>") {
                        Some(offset) => content_start + offset,
                        None => line.len(),
                    };
                    let content = soften(&line[content_start..content_end]);
                    if !content.is_empty() {
                        if let Some(formula) = content.strip_prefix('=') {
                            make_cell(sheet, col, row, CellType::Value, formula);
                        } else if let Some(label) = content.strip_prefix('<') {
                            make_cell(sheet, col, row, CellType::Label, label);
                        } else {
                            make_cell(sheet, col, row, CellType::Label, &content);
                        }
                    }
                    n = match line[content_end..].strip_prefix("</td>") {
                        Some(_) => content_end + 5,
                        None => line.len(),
                    };
                    row += 1;
                } else {
                    // Skip junk up to the next tag, always making progress.
                    let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                    n = match rest[first..].find('<') {
                        Some(offset) => n + first + offset,
                        None => line.len(),
                    };
                }
            }
        }

        if row > max_rows {
            max_rows = row;
        }
        col += 1;
    }

    max_rows
}
