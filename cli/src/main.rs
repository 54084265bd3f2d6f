//! FILENAME: cli/src/main.rs
//! PURPOSE: The tabula command line tool.
//! CONTEXT: Loads script libraries and a sheet, runs one full
//! recalculation, prints the computed grid (or a JSON dump), reports any
//! logged messages, and writes the sheet back.

use anyhow::Context;
use clap::Parser;
use engine::{
    column_to_string, prepare_globals, CallingContext, LoggerHandle, SpreadSheet, StringLogger,
};
use persistence::{load_sheet, save_sheet};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "tabula", about = "Recalculates a Tabula sheet")]
struct Args {
    /// Script library files loaded before the sheet, in order
    #[arg(short = 'l', long = "library", value_name = "FILE")]
    libraries: Vec<String>,

    /// The sheet to open
    #[arg(default_value = "untitled.html")]
    sheet: String,

    /// Emit computed cells as JSON instead of a grid
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut sheet = SpreadSheet::new();
    load_sheet(&args.sheet, &mut sheet);

    let buffer = Rc::new(RefCell::new(StringLogger::new()));
    let logger: LoggerHandle = buffer.clone();
    let (global_scope, map) = prepare_globals(&sheet, &logger, &args.libraries);

    let mut ctx = CallingContext::new(&sheet, &map, logger, global_scope);
    sheet.recalc(&mut ctx);

    if args.json {
        print_json(&sheet);
    } else {
        print_grid(&sheet);
    }

    // Surface logged messages the way the status area would.
    let logs = buffer.borrow();
    for message in logs.logs.iter() {
        eprintln!("{}", message);
    }

    save_sheet(&args.sheet, &mut sheet)
        .with_context(|| format!("saving {}", args.sheet))?;
    Ok(())
}

/// Prints the computed grid with per-column widths, row-major like a
/// terminal screen.
fn print_grid(sheet: &SpreadSheet) {
    let col_count = sheet.sheet.len();
    if col_count == 0 {
        return;
    }
    let row_count = sheet.sheet.iter().map(Vec::len).max().unwrap_or(0);

    let mut widths = vec![1usize; col_count];
    let mut texts = vec![vec![String::new(); row_count]; col_count];
    for (col, width) in widths.iter_mut().enumerate() {
        for row in 0..row_count {
            let text = sheet.display_at(col, row);
            *width = (*width).max(text.chars().count());
            texts[col][row] = text;
        }
        *width = (*width).max(column_to_string(col as i64).len());
    }

    let row_label_width = format!("{}", row_count).len();
    print!("{:width$}", "", width = row_label_width);
    for (col, width) in widths.iter().enumerate() {
        print!(" {:>width$}", column_to_string(col as i64), width = width);
    }
    println!();
    for row in 0..row_count {
        print!("{:>width$}", row + 1, width = row_label_width);
        for (col, width) in widths.iter().enumerate() {
            print!(" {:>width$}", texts[col][row], width = width);
        }
        println!();
    }
}

/// Dumps every populated cell as {"A1": "value", ...}.
fn print_json(sheet: &SpreadSheet) {
    let mut cells = serde_json::Map::new();
    for (col, column) in sheet.sheet.iter().enumerate() {
        for (row, slot) in column.iter().enumerate() {
            if slot.is_some() {
                let name = format!("{}{}", column_to_string(col as i64), row + 1);
                cells.insert(
                    name,
                    serde_json::Value::String(sheet.display_at(col, row)),
                );
            }
        }
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(cells))
            .unwrap_or_else(|_| "{}".to_string())
    );
}
