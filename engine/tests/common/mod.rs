//! FILENAME: engine/tests/common/mod.rs
//! PURPOSE: Shared fixture for engine integration tests.

use engine::{
    prepare_globals, CallingContext, Cell, GetterMap, LoggerHandle, ScopeHandle, SpreadSheet,
    StringLogger, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// A sheet plus everything needed to evaluate it. The generation counter
/// survives across recalcs, like a live session.
pub struct Fixture {
    pub sheet: SpreadSheet,
    pub logger: Rc<RefCell<StringLogger>>,
    pub global_scope: ScopeHandle,
    pub map: GetterMap,
    pub generation: u64,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_libraries(&[])
    }

    pub fn with_libraries(library_files: &[String]) -> Self {
        let sheet = SpreadSheet::new();
        let logger = Rc::new(RefCell::new(StringLogger::new()));
        let handle: LoggerHandle = logger.clone();
        let (global_scope, map) = prepare_globals(&sheet, &handle, library_files);
        Fixture {
            sheet,
            logger,
            global_scope,
            map,
            generation: 0,
        }
    }

    /// Installs a value cell holding the given formula text.
    pub fn set_value(&mut self, col: usize, row: usize, text: &str) {
        self.sheet.set_cell(col, row, Cell::new_value(text));
    }

    /// Installs a label cell holding literal text.
    pub fn set_label(&mut self, col: usize, row: usize, text: &str) {
        self.sheet.set_cell(col, row, Cell::new_label(text));
    }

    fn context(&self) -> CallingContext<'_> {
        let mut ctx = CallingContext::new(
            &self.sheet,
            &self.map,
            self.logger.clone(),
            self.global_scope.clone(),
        );
        ctx.generation = self.generation;
        ctx
    }

    /// Runs one full recalculation sweep.
    pub fn recalc(&mut self) {
        let mut ctx = self.context();
        self.sheet.recalc(&mut ctx);
        self.generation = ctx.generation;
    }

    /// Evaluates one cell in preview (user-input) mode, returning the
    /// value without committing anything.
    pub fn preview(&mut self, col: usize, row: usize) -> (Option<Value>, String) {
        let mut ctx = self.context();
        ctx.in_user_input = true;
        let mut out = None;
        let message = self
            .sheet
            .compute_cell(&mut ctx, &mut out, col, row, false)
            .expect("compute without rethrow cannot fail");
        (out, message)
    }

    /// The memoized result of the last recalc for a cell.
    pub fn value_at(&self, col: usize, row: usize) -> Option<Value> {
        self.sheet
            .get_cell_at(col, row)
            .and_then(|cell| cell.borrow().previous_value.clone())
    }

    pub fn generation_of(&self, col: usize, row: usize) -> u64 {
        self.sheet
            .get_cell_at(col, row)
            .map(|cell| cell.borrow().previous_generation)
            .unwrap_or(0)
    }

    pub fn display(&self, col: usize, row: usize) -> String {
        self.sheet.display_at(col, row)
    }

    pub fn logs(&self) -> Vec<String> {
        self.logger.borrow().logs.clone()
    }
}
