//! FILENAME: engine/tests/builtins.rs
//! PURPOSE: Host standard library behavior, exercised through the
//! expression language.

mod common;

use common::Fixture;
use engine::{evaluate, CallingContext, EvalError, Value};
use parser::statement::parse_script_expression;

fn eval(fx: &Fixture, expr: &str) -> Result<Value, EvalError> {
    let expression = parse_script_expression(expr).expect("expression parses");
    let mut ctx = CallingContext::new(
        &fx.sheet,
        &fx.map,
        fx.logger.clone(),
        fx.global_scope.clone(),
    );
    evaluate(&expression, &mut ctx)
}

fn eval_ok(fx: &Fixture, expr: &str) -> Value {
    eval(fx, expr).unwrap()
}

#[test]
fn test_min_max_returns_an_operand() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "Max(3, 7)"), Value::Float(7.0));
    assert_eq!(eval_ok(&fx, "Min(3, 7)"), Value::Float(3.0));
    assert_eq!(eval_ok(&fx, "Max(7, 7)"), Value::Float(7.0));
    assert!(eval(&fx, "Max(1, \"x\")").is_err());
    assert!(eval(&fx, "Min(\"x\", 1)").is_err());
}

#[test]
fn test_min_max_propagate_nan() {
    let fx = Fixture::new();
    // Unlike IEEE min/max, the NaN argument itself is the result.
    for expr in ["Max(NaN(), 1)", "Max(1, NaN())", "Min(NaN(), 1)", "Min(1, NaN())"] {
        match eval_ok(&fx, expr) {
            Value::Float(f) => assert!(f.is_nan(), "{} should be NaN", expr),
            other => panic!("Expected Float from {}, got {:?}", expr, other),
        }
    }
}

#[test]
fn test_sqr_is_self_multiplication() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "Sqr(9)"), Value::Float(81.0));
    assert_eq!(eval_ok(&fx, "Sqr(-2)"), Value::Float(4.0));
    assert!(eval(&fx, "Sqr(\"3\")").is_err());
}

#[test]
fn test_abs_floor_ceil() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "Abs(-3.5)"), Value::Float(3.5));
    assert_eq!(eval_ok(&fx, "Floor(2.9)"), Value::Float(2.0));
    assert_eq!(eval_ok(&fx, "Floor(-2.1)"), Value::Float(-3.0));
    assert_eq!(eval_ok(&fx, "Ceil(2.1)"), Value::Float(3.0));
    assert_eq!(eval_ok(&fx, "Ceil(-2.9)"), Value::Float(-2.0));
}

#[test]
fn test_round_follows_the_mode() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "GetRoundMode()"), Value::Float(0.0));
    assert_eq!(eval_ok(&fx, "Round(2.5)"), Value::Float(2.0)); // ties to even

    // TowardZero
    eval_ok(&fx, "SetRoundMode(1)");
    assert_eq!(eval_ok(&fx, "Round(2.7)"), Value::Float(2.0));
    assert_eq!(eval_ok(&fx, "Round(-2.7)"), Value::Float(-2.0));
    assert_eq!(eval_ok(&fx, "GetRoundMode()"), Value::Float(1.0));

    // FromZero
    eval_ok(&fx, "SetRoundMode(4)");
    assert_eq!(eval_ok(&fx, "Round(2.1)"), Value::Float(3.0));
    assert_eq!(eval_ok(&fx, "Round(-2.1)"), Value::Float(-3.0));

    // Restore the default for the rest of the thread.
    eval_ok(&fx, "SetRoundMode(0)");
    assert!(eval(&fx, "SetRoundMode(9)").is_err());
    assert!(eval(&fx, "SetRoundMode(\"up\")").is_err());
}

#[test]
fn test_is_infinity_and_is_nan() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "IsInfinity(1/0)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsInfinity(5)"), Value::Float(0.0));
    assert_eq!(eval_ok(&fx, "IsNaN(NaN())"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsNaN(0/0)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsNaN(5)"), Value::Float(0.0));
}

#[test]
fn test_value_of_is_strict() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "ValueOf(\"42\")"), Value::Float(42.0));
    assert_eq!(eval_ok(&fx, "ValueOf(\"  1.5\")"), Value::Float(1.5));
    assert_eq!(eval_ok(&fx, "ValueOf(\"2e3\")"), Value::Float(2000.0));
    assert!(eval(&fx, "ValueOf(\"42x\")").is_err());
    assert!(eval(&fx, "ValueOf(\"\")").is_err());
    assert!(eval(&fx, "ValueOf(12)").is_err());
}

#[test]
fn test_to_string_formats_numbers() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "ToString(3)"), Value::string("3"));
    assert_eq!(eval_ok(&fx, "ToString(1.5)"), Value::string("1.5"));
    assert!(eval(&fx, "ToString(\"x\")").is_err());
}

#[test]
fn test_character_conversions() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "FromCharacter(\"A\")"), Value::Float(65.0));
    assert_eq!(eval_ok(&fx, "ToCharacter(65)"), Value::string("A"));
    // Round trip.
    assert_eq!(
        eval_ok(&fx, "ToCharacter(FromCharacter(\"z\"))"),
        Value::string("z")
    );
    // Strict bounds and single-character requirement.
    assert!(eval(&fx, "ToCharacter(0)").is_err());
    assert!(eval(&fx, "ToCharacter(127)").is_err());
    assert!(eval(&fx, "ToCharacter(-65)").is_err());
    assert!(eval(&fx, "FromCharacter(\"ab\")").is_err());
    assert!(eval(&fx, "FromCharacter(\"\")").is_err());
}

#[test]
fn test_substring() {
    let fx = Fixture::new();
    assert_eq!(
        eval_ok(&fx, "SubString(\"spreadsheet\", 0, 6)"),
        Value::string("spread")
    );
    assert_eq!(
        eval_ok(&fx, "SubString(\"abc\", 1, 1)"),
        Value::string("")
    );
    assert!(eval(&fx, "SubString(\"abc\", 2, 1)").is_err());
    assert!(eval(&fx, "SubString(\"abc\", 0, 4)").is_err());
    assert!(eval(&fx, "SubString(\"abc\", -1, 2)").is_err());
}

#[test]
fn test_length_and_size() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "Length(\"hello\")"), Value::Float(5.0));
    assert_eq!(eval_ok(&fx, "Size(NewArray())"), Value::Float(0.0));
    assert_eq!(eval_ok(&fx, "Size(NewDictionary())"), Value::Float(0.0));
    assert!(eval(&fx, "Size(\"hello\")").is_err());
    assert!(eval(&fx, "Length(NewArray())").is_err());
}

#[test]
fn test_array_builtins_compose() {
    let fx = Fixture::new();
    assert_eq!(
        eval_ok(&fx, "GetIndex(SetIndex(NewArrayDefault(3, 0), 1, 9), 1)"),
        Value::Float(9.0)
    );
    assert_eq!(
        eval_ok(&fx, "Size(NewArrayDefault(5, \"x\"))"),
        Value::Float(5.0)
    );
    assert_eq!(
        eval_ok(&fx, "GetIndex(PopFront(PushFront(NewArrayDefault(1, 2), 1)), 0)"),
        Value::Float(2.0)
    );
    assert!(eval(&fx, "NewArrayDefault(-1, 0)").is_err());
    assert!(eval(&fx, "GetIndex(NewArray(), 0)").is_err());
}

#[test]
fn test_dictionary_builtins_compose() {
    let fx = Fixture::new();
    assert_eq!(
        eval_ok(&fx, "GetValue(Insert(NewDictionary(), \"k\", 42), \"k\")"),
        Value::Float(42.0)
    );
    assert_eq!(
        eval_ok(&fx, "ContainsKey(RemoveKey(Insert(NewDictionary(), 1, 2), 1), 1)"),
        Value::Float(0.0)
    );
    assert_eq!(
        eval_ok(
            &fx,
            "GetIndex(GetKeys(Insert(Insert(NewDictionary(), 2, 0), 1, 0)), 0)"
        ),
        Value::Float(1.0)
    );
    assert!(eval(&fx, "GetValue(NewDictionary(), \"missing\")").is_err());
    assert!(eval(&fx, "RemoveKey(NewDictionary(), 1)").is_err());
}

#[test]
fn test_type_predicates() {
    let fx = Fixture::new();
    assert_eq!(eval_ok(&fx, "IsFloat(1)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsFloat(\"1\")"), Value::Float(0.0));
    assert_eq!(eval_ok(&fx, "IsString(\"1\")"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsArray(NewArray())"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsDictionary(NewDictionary())"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsFunction(IsFloat)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsNil(EvalCell)"), Value::Float(0.0));
    assert_eq!(eval_ok(&fx, "IsCellRef($A$1)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsCellRange($A$1:$B$2)"), Value::Float(1.0));
}

#[test]
fn test_is_function_on_a_function_value() {
    let fx = Fixture::new();
    // Passing a bare name hands the function value itself to the callee.
    assert_eq!(eval_ok(&fx, "IsFunction(SUM)"), Value::Float(1.0));
    assert_eq!(eval_ok(&fx, "IsNil(SUM)"), Value::Float(0.0));
}

#[test]
fn test_expand_range_rejects_non_range() {
    let fx = Fixture::new();
    assert!(eval(&fx, "ExpandRange(1)").is_err());
    assert!(eval(&fx, "EvalCell(1)").is_err());
}

#[test]
fn test_undefined_name() {
    let fx = Fixture::new();
    let err = eval(&fx, "NoSuchFunction(1)").unwrap_err();
    match err {
        EvalError::TypedOperation(message) => {
            assert!(message.contains("NoSuchFunction"), "message: {}", message)
        }
        other => panic!("Expected TypedOperation, got {:?}", other),
    }
}
