//! Row-level expression evaluation

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};

use crate::dataset::{Schema, Value};
use crate::plan::{BinaryOperator, Expr};

/// Date-only layouts accepted by `day_of_week`
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
/// Datetime layouts accepted by `day_of_week`
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Evaluate an expression against one row laid out by `schema`.
///
/// Predicates use three-valued logic: comparisons involving null yield null,
/// and only `Bool(true)` selects a row.
pub fn evaluate(expr: &Expr, schema: &Schema, row: &[Value]) -> Value {
    match expr {
        Expr::Column(name) => schema
            .index_of(name)
            .and_then(|idx| row.get(idx))
            .cloned()
            .unwrap_or(Value::Null),
        Expr::Literal(value) => value.clone(),
        Expr::BinaryOp { left, op, right } => {
            let l = evaluate(left, schema, row);
            let r = evaluate(right, schema, row);
            match l.compare(&r) {
                Some(ord) => Value::Bool(apply_op(*op, ord)),
                None if l.is_null() || r.is_null() => Value::Null,
                // Incomparable non-null values are simply unequal
                None => match op {
                    BinaryOperator::NotEq => Value::Bool(true),
                    BinaryOperator::Eq => Value::Bool(false),
                    _ => Value::Null,
                },
            }
        }
        Expr::In { expr, values } => {
            let v = evaluate(expr, schema, row);
            if v.is_null() {
                return Value::Null;
            }
            Value::Bool(values.iter().any(|candidate| v.compare(candidate) == Some(Ordering::Equal)))
        }
        Expr::And(parts) => {
            let mut saw_null = false;
            for part in parts {
                match evaluate(part, schema, row) {
                    Value::Bool(false) => return Value::Bool(false),
                    Value::Bool(true) => {}
                    _ => saw_null = true,
                }
            }
            if saw_null { Value::Null } else { Value::Bool(true) }
        }
        Expr::Or(parts) => {
            let mut saw_null = false;
            for part in parts {
                match evaluate(part, schema, row) {
                    Value::Bool(true) => return Value::Bool(true),
                    Value::Bool(false) => {}
                    _ => saw_null = true,
                }
            }
            if saw_null { Value::Null } else { Value::Bool(false) }
        }
        Expr::Not(inner) => match evaluate(inner, schema, row) {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Null,
        },
        Expr::Add(l, r) => arithmetic(
            evaluate(l, schema, row),
            evaluate(r, schema, row),
            i64::checked_add,
            |a, b| a + b,
        ),
        Expr::Subtract(l, r) => arithmetic(
            evaluate(l, schema, row),
            evaluate(r, schema, row),
            i64::checked_sub,
            |a, b| a - b,
        ),
        Expr::Multiply(l, r) => arithmetic(
            evaluate(l, schema, row),
            evaluate(r, schema, row),
            i64::checked_mul,
            |a, b| a * b,
        ),
        Expr::Divide(l, r) => {
            match (evaluate(l, schema, row).as_f64(), evaluate(r, schema, row).as_f64()) {
                (Some(_), Some(d)) if d == 0.0 => Value::Null,
                (Some(n), Some(d)) => Value::Float(n / d),
                _ => Value::Null,
            }
        }
        Expr::IsNull(inner) => Value::Bool(evaluate(inner, schema, row).is_null()),
        Expr::IsNotNull(inner) => Value::Bool(!evaluate(inner, schema, row).is_null()),
        Expr::Case {
            when_then,
            else_result,
        } => {
            for (when, then) in when_then {
                if evaluate(when, schema, row).is_true() {
                    return evaluate(then, schema, row);
                }
            }
            else_result
                .as_deref()
                .map(|e| evaluate(e, schema, row))
                .unwrap_or(Value::Null)
        }
        Expr::DayOfWeek(inner) => match evaluate(inner, schema, row) {
            Value::Str(s) => parse_weekday(&s)
                .map(|day| Value::Str(weekday_name(day).to_string()))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
    }
}

fn apply_op(op: BinaryOperator, ord: Ordering) -> bool {
    match op {
        BinaryOperator::Eq => ord == Ordering::Equal,
        BinaryOperator::NotEq => ord != Ordering::Equal,
        BinaryOperator::Lt => ord == Ordering::Less,
        BinaryOperator::LtEq => ord != Ordering::Greater,
        BinaryOperator::Gt => ord == Ordering::Greater,
        BinaryOperator::GtEq => ord != Ordering::Less,
    }
}

/// Integer arithmetic stays integral (null on overflow); anything involving
/// a float is computed in f64. Non-numeric operands yield null.
fn arithmetic(
    l: Value,
    r: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    match (&l, &r) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).unwrap_or(Value::Null),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Value::Float(float_op(a, b)),
            _ => Value::Null,
        },
    }
}

/// Parse a date or datetime string and return its weekday
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.weekday());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.weekday());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.weekday())
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
