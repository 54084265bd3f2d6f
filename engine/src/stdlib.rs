//! FILENAME: engine/src/stdlib.rs
//! PURPOSE: The host standard library and library loading.
//! CONTEXT: Host builtins are plain functions over already evaluated
//! arguments; they are installed both into the script global scope (so
//! library code can call them) and into the getter map (so cell formulas
//! can). A small embedded script library defines the uppercase
//! spreadsheet aggregates on top of them; `load_libraries` runs it plus
//! any user-supplied files, then every all-uppercase global name becomes
//! callable from formulas.

use crate::context::{CallingContext, GetterMap, LoggerHandle, ScopeHandle};
use crate::error::{typed, EvalError};
use crate::evaluator;
use crate::numeric::{self, RoundMode};
use crate::script;
use crate::sheet::SpreadSheet;
use crate::value::{consts, FunctionValue, HostFunction, Value};
use parser::statement::parse_functions;
use std::rc::Rc;

// ---------------------------------------------------------------------
// Container builtins
// ---------------------------------------------------------------------

fn new_array(_ctx: &mut CallingContext, _args: &[Value]) -> Result<Value, EvalError> {
    Ok(consts::empty_array())
}

fn new_dictionary(_ctx: &mut CallingContext, _args: &[Value]) -> Result<Value, EvalError> {
    Ok(consts::empty_dictionary())
}

fn push_back(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].push_back(args[1].clone())
}

fn push_front(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].push_front(args[1].clone())
}

fn pop_back(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].pop_back()
}

fn pop_front(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].pop_front()
}

fn insert(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].insert(args[1].clone(), args[2].clone())
}

fn get_value(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].get_value(&args[1])
}

fn contains_key(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].contains_key(&args[1])
}

fn remove_key(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].remove_key(&args[1])
}

fn get_keys(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].get_keys()
}

fn get_index(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].get_index(&args[1])
}

fn set_index(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].set_index(&args[1], args[2].clone())
}

fn size(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].size()
}

fn length(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    args[0].length()
}

fn new_array_default(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Float(n) => {
            if *n >= 0.0 && *n < u32::MAX as f64 {
                let count = *n as usize;
                Ok(Value::Array(Rc::new(vec![args[1].clone(); count])))
            } else {
                Err(typed("Error creating Array size either negative or too big."))
            }
        }
        _ => Err(typed("Error creating Array with non-Float size.")),
    }
}

fn sub_string(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let text = match &args[0] {
        Value::String(s) => s,
        _ => return Err(typed("Error getting substring of non-String.")),
    };
    let start = match &args[1] {
        Value::Float(n) => *n,
        _ => {
            return Err(typed(
                "Error getting substring with non-Float starting position.",
            ))
        }
    };
    let end = match &args[2] {
        Value::Float(n) => *n,
        _ => {
            return Err(typed(
                "Error getting substring with non-Float ending position.",
            ))
        }
    };
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as f64;
    if start >= 0.0 && start <= len && end >= 0.0 && end <= len && end >= start {
        let slice: String = chars[start as usize..end as usize].iter().collect();
        Ok(Value::string(slice))
    } else {
        Err(typed(
            "Error getting substring with either beginning or ending index not in String, or ending before beginning.",
        ))
    }
}

// ---------------------------------------------------------------------
// Numeric builtins
// ---------------------------------------------------------------------

fn nan(_ctx: &mut CallingContext, _args: &[Value]) -> Result<Value, EvalError> {
    Ok(consts::float_nan())
}

/// Min/Max deliberately depart from IEEE: a NaN argument is returned, not
/// discarded. The first argument wins when both are NaN.
fn min_max(args: &[Value], keep_first: fn(f64, f64) -> bool, name: &str) -> Result<Value, EvalError> {
    match (&args[0], &args[1]) {
        (Value::Float(a), Value::Float(b)) => {
            if a.is_nan() {
                Ok(args[0].clone())
            } else if b.is_nan() {
                Ok(args[1].clone())
            } else if keep_first(*a, *b) {
                Ok(args[0].clone())
            } else {
                Ok(args[1].clone())
            }
        }
        (Value::Float(_), _) => Err(typed(format!(
            "Error computing {} with non-Float second argument.",
            name
        ))),
        _ => Err(typed(format!(
            "Error computing {} with non-Float first argument.",
            name
        ))),
    }
}

fn max(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    min_max(args, |a, b| a >= b, "max")
}

fn min(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    min_max(args, |a, b| a <= b, "min")
}

fn float_arg(args: &[Value], message: &str) -> Result<f64, EvalError> {
    match &args[0] {
        Value::Float(f) => Ok(*f),
        _ => Err(typed(message)),
    }
}

fn abs(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(args, "Error trying to compute absolute value of non-Float.")?;
    Ok(Value::Float(f.abs()))
}

fn round(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(args, "Error trying to compute rounded value of non-Float.")?;
    Ok(Value::Float(numeric::round(f)))
}

fn floor(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(
        args,
        "Error trying to compute rounded to negative infinity of non-Float.",
    )?;
    Ok(Value::Float(f.floor()))
}

fn ceil(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(
        args,
        "Error trying to compute rounded to positive infinity of non-Float.",
    )?;
    Ok(Value::Float(f.ceil()))
}

fn is_infinity(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(args, "Error trying to compute is infinity of non-Float.")?;
    Ok(consts::bool_value(f.is_infinite()))
}

fn is_nan(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(
        args,
        "Error trying to compute is special not-a-number value of non-Float.",
    )?;
    Ok(consts::bool_value(f.is_nan()))
}

fn sqr(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    let f = float_arg(args, "Error trying to square non-Float.")?;
    Ok(Value::Float(f * f))
}

fn value_of(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => match numeric::parse_number(s) {
            Some(f) => Ok(Value::Float(f)),
            None => Err(typed("String did not contain valid Float value.")),
        },
        _ => Err(typed("Error trying to get value of non-String.")),
    }
}

fn to_string(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Float(f) => Ok(Value::string(numeric::format_number(*f))),
        _ => Err(typed("Error converting non-Float to String.")),
    }
}

fn from_character(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Float(c as u32 as f64)),
                _ => Err(typed("String was not single character.")),
            }
        }
        _ => Err(typed(
            "Error trying to convert non-String to Float character code point.",
        )),
    }
}

fn to_character(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Float(f) => {
            // Strictly inside the provider's character range.
            if *f > 0.0 && *f < 127.0 {
                let c = *f as u8 as char;
                Ok(Value::string(c.to_string()))
            } else {
                Err(typed("Float is not a valid character code point."))
            }
        }
        _ => Err(typed(
            "Error trying to convert non-Float to single character String.",
        )),
    }
}

fn get_round_mode(_ctx: &mut CallingContext, _args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Float(numeric::get_round_mode() as i64 as f64))
}

fn set_round_mode(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::Float(f) => match RoundMode::from_value(*f) {
            Some(mode) => {
                numeric::set_round_mode(mode);
                Ok(args[0].clone())
            }
            None => Err(typed("Float is not a valid rounding mode.")),
        },
        _ => Err(typed("Error trying to convert non-Float to rounding mode.")),
    }
}

// ---------------------------------------------------------------------
// Type predicates
// ---------------------------------------------------------------------

fn type_check(args: &[Value], want: &'static str) -> Result<Value, EvalError> {
    Ok(consts::bool_value(args[0].type_name() == want))
}

fn is_float(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "Float")
}

fn is_string(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "String")
}

fn is_array(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "Array")
}

fn is_dictionary(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "Dictionary")
}

fn is_function(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "Function")
}

fn is_nil(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "Nil")
}

fn is_cell_range(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "CellRange")
}

fn is_cell_ref(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    type_check(args, "CellRef")
}

// ---------------------------------------------------------------------
// Logging and debugging
// ---------------------------------------------------------------------

fn log_with_prefix(
    ctx: &mut CallingContext,
    args: &[Value],
    prefix: &str,
) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => {
            ctx.log(&format!("{}{}", prefix, s));
            Ok(args[0].clone())
        }
        _ => Err(typed("Error logging non-String.")),
    }
}

fn log_error(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    log_with_prefix(ctx, args, "ERROR: ")
}

fn log_warn(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    log_with_prefix(ctx, args, "WARN: ")
}

fn log_info(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    log_with_prefix(ctx, args, "INFO: ")
}

fn fatal(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => {
            ctx.log(&format!("FATAL: {}", s));
            Err(EvalError::Fatal(s.to_string()))
        }
        _ => Err(EvalError::Fatal(
            "Error logging non-String while trying to generate a Fatal message.".to_string(),
        )),
    }
}

fn debug_print(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::String(s) => {
            ctx.log(s);
            Ok(args[0].clone())
        }
        _ => Err(typed("Error logging non-String.")),
    }
}

fn enter_debugger(ctx: &mut CallingContext, _args: &[Value]) -> Result<Value, EvalError> {
    if let Some(debugger) = ctx.debugger.take() {
        let global_scope = ctx.global_scope.clone();
        let logger = ctx.logger.clone();
        debugger.enter_debugger("", &global_scope, &logger);
        ctx.debugger = Some(debugger);
    }
    Ok(consts::float_zero())
}

// ---------------------------------------------------------------------
// Sheet access
// ---------------------------------------------------------------------

fn eval_cell(ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::CellRef(r) => evaluator::eval_cell_reference(r, ctx),
        _ => Err(typed("Error trying to evaluate non-CellRef.")),
    }
}

fn expand_range(_ctx: &mut CallingContext, args: &[Value]) -> Result<Value, EvalError> {
    match &args[0] {
        Value::CellRange(r) => evaluator::expand_range(r),
        _ => Err(typed("Error trying to expand non-CellRange.")),
    }
}

// ---------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------

fn builtins() -> Vec<HostFunction> {
    fn host(name: &'static str, arity: usize, f: crate::value::HostFn) -> HostFunction {
        HostFunction { name, arity, f }
    }
    vec![
        host("NewArray", 0, new_array),
        host("NewDictionary", 0, new_dictionary),
        host("PushBack", 2, push_back),
        host("PushFront", 2, push_front),
        host("PopBack", 1, pop_back),
        host("PopFront", 1, pop_front),
        host("Insert", 3, insert),
        host("GetValue", 2, get_value),
        host("ContainsKey", 2, contains_key),
        host("RemoveKey", 2, remove_key),
        host("GetKeys", 1, get_keys),
        host("GetIndex", 2, get_index),
        host("SetIndex", 3, set_index),
        host("Size", 1, size),
        host("Length", 1, length),
        host("NewArrayDefault", 2, new_array_default),
        host("SubString", 3, sub_string),
        host("NaN", 0, nan),
        host("Min", 2, min),
        host("Max", 2, max),
        host("Abs", 1, abs),
        host("Round", 1, round),
        host("Floor", 1, floor),
        host("Ceil", 1, ceil),
        host("IsInfinity", 1, is_infinity),
        host("IsNaN", 1, is_nan),
        host("Sqr", 1, sqr),
        host("ValueOf", 1, value_of),
        host("ToString", 1, to_string),
        host("FromCharacter", 1, from_character),
        host("ToCharacter", 1, to_character),
        host("GetRoundMode", 0, get_round_mode),
        host("SetRoundMode", 1, set_round_mode),
        host("IsFloat", 1, is_float),
        host("IsString", 1, is_string),
        host("IsArray", 1, is_array),
        host("IsDictionary", 1, is_dictionary),
        host("IsFunction", 1, is_function),
        host("IsNil", 1, is_nil),
        host("IsCellRange", 1, is_cell_range),
        host("IsCellRef", 1, is_cell_ref),
        host("Error", 1, log_error),
        host("Warn", 1, log_warn),
        host("Info", 1, log_info),
        host("Fatal", 1, fatal),
        host("DebugPrint", 1, debug_print),
        host("EvalCell", 1, eval_cell),
        host("ExpandRange", 1, expand_range),
        host("EnterDebugger", 0, enter_debugger),
    ]
}

/// Installs every host builtin into the script global scope.
pub fn create_global_scope(global_scope: &ScopeHandle) {
    let mut scope = global_scope.borrow_mut();
    for builtin in builtins() {
        let name = builtin.name;
        scope.set(name, Value::Function(Rc::new(FunctionValue::Host(builtin))));
    }
}

/// Installs every host builtin into the getter map under its own name, so
/// cell formulas can call them directly.
pub fn register_builtins(map: &mut GetterMap) {
    for builtin in builtins() {
        let name = builtin.name;
        map.insert(
            name.to_string(),
            Value::Function(Rc::new(FunctionValue::Host(builtin))),
        );
    }
}

/// The library shipped with the engine, written in the script language.
/// It defines the uppercase spreadsheet aggregates over ranges,
/// references, arrays, and plain numbers.
pub const STDLIB_SOURCE: &str = r#"
# Collects the Float contents of whatever the caller handed in: a range,
# a single reference, an array of either, or a plain number.
function values_of(arg)
   if IsCellRange(arg)
      arg = ExpandRange(arg)
   end if
   if IsCellRef(arg)
      arg = EvalCell(arg)
   end if
   result = NewArray()
   if IsArray(arg)
      for item in arg
         v = item
         if IsCellRef(v)
            v = EvalCell(v)
         end if
         if IsFloat(v)
            result = PushBack(result, v)
         end if
      end for
   elseif IsFloat(arg)
      result = PushBack(result, arg)
   end if
   return result
end function

function SUM(arg)
   total = 0
   for v in values_of(arg)
      total = total + v
   end for
   return total
end function

function COUNT(arg)
   return Size(values_of(arg))
end function

function AVERAGE(arg)
   return SUM(arg) / COUNT(arg)
end function

function MIN(arg)
   best = NaN()
   seen = 0
   for v in values_of(arg)
      if seen = 0
         best = v
         seen = 1
      else
         best = Min(best, v)
      end if
   end for
   return best
end function

function MAX(arg)
   best = NaN()
   seen = 0
   for v in values_of(arg)
      if seen = 0
         best = v
         seen = 1
      else
         best = Max(best, v)
      end if
   end for
   return best
end function
"#;

/// Parses and executes the embedded library plus each user library file
/// against the global scope. Failures are logged and do not stop the
/// remaining files from loading.
pub fn load_libraries(
    library_files: &[String],
    sheet: &SpreadSheet,
    global_scope: &ScopeHandle,
    logger: &LoggerHandle,
) {
    let map = GetterMap::new();
    let mut ctx = CallingContext::new(sheet, &map, logger.clone(), global_scope.clone());

    match parse_functions(STDLIB_SOURCE) {
        Ok(program) => {
            if let Err(e) = script::execute(&program, &mut ctx) {
                ctx.log(&format!("Error loading standard library: {}", e));
            }
        }
        Err(e) => ctx.log(&format!("Error parsing standard library: {}", e)),
    }

    for file in library_files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                ctx.log(&format!("Error processing file: {}: {}", file, e));
                continue;
            }
        };
        match parse_functions(&text) {
            Ok(program) => {
                if let Err(e) = script::execute(&program, &mut ctx) {
                    ctx.log(&format!("Caught runtime exception: {}", e));
                    ctx.log(&format!("Error processing file: {}", file));
                }
            }
            Err(e) => {
                ctx.log(&e.to_string());
                ctx.log(&format!("Error processing file: {}", file));
            }
        }
    }
}

/// Publishes every all-uppercase global name into the getter map, making
/// script-defined library functions callable from cell formulas.
pub fn export_uppercase_names(global_scope: &ScopeHandle, map: &mut GetterMap) {
    let scope = global_scope.borrow();
    for name in scope.names() {
        if *name == name.to_uppercase() {
            if let Some(value) = scope.get(name) {
                map.insert(name.clone(), value);
            }
        }
    }
}

/// One-stop setup: builds the global scope with every builtin, runs the
/// embedded library and the given user libraries, and returns the scope
/// plus the populated getter map.
pub fn prepare_globals(
    sheet: &SpreadSheet,
    logger: &LoggerHandle,
    library_files: &[String],
) -> (ScopeHandle, GetterMap) {
    let global_scope = crate::context::new_scope();
    create_global_scope(&global_scope);
    load_libraries(library_files, sheet, &global_scope, logger);
    let mut map = GetterMap::new();
    register_builtins(&mut map);
    export_uppercase_names(&global_scope, &mut map);
    (global_scope, map)
}
