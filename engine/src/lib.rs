//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod context;
pub mod coord;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod numeric;
pub mod ops;
pub mod script;
pub mod sheet;
pub mod stdlib;
pub mod value;

// Re-export commonly used types at the crate root
pub use cell::{Cell, CellType};
pub use context::{
    new_scope, CallingContext, CellFrame, DebuggerHook, GetterMap, Logger, LoggerHandle, Scope,
    ScopeHandle, StringLogger,
};
pub use coord::{cell_range_to_string, cell_ref_to_string, column_to_string};
pub use display::{expression_to_string, value_to_display_string};
pub use error::EvalError;
pub use evaluator::{call_function, evaluate};
pub use numeric::RoundMode;
pub use script::{execute, ControlFlow};
pub use sheet::SpreadSheet;
pub use stdlib::{load_libraries, prepare_globals, STDLIB_SOURCE};
pub use value::{consts, FunctionValue, HostFunction, ScriptFunction, Value};

// Re-export the AST types the engine evaluates
pub use parser::ast::{CellRange, CellRef, Expression, Statement};
