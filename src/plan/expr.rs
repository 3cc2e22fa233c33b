//! Expression types for query plans

use std::fmt;

use crate::dataset::{DataType, Schema, Value};

/// Scalar expressions, evaluated per row at materialization time
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference by output name
    Column(String),
    /// Literal value
    Literal(Value),
    /// Comparison (e.g., a = b, a > 5)
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// IN expression (expr IN (values))
    In { expr: Box<Expr>, values: Vec<Value> },
    /// AND of multiple expressions
    And(Vec<Expr>),
    /// OR of multiple expressions
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Addition: a + b
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction: a - b
    Subtract(Box<Expr>, Box<Expr>),
    /// Multiplication: a * b
    Multiply(Box<Expr>, Box<Expr>),
    /// Division: a / b, always floating point; null when b is zero
    Divide(Box<Expr>, Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    /// CASE WHEN expression
    Case {
        /// List of (condition, result) pairs
        when_then: Vec<(Expr, Expr)>,
        /// Optional ELSE result
        else_result: Option<Box<Expr>>,
    },
    /// English weekday name of a date or datetime string
    DayOfWeek(Box<Expr>),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
        }
    }
}

/// Column reference
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Literal value
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn binary(self, op: BinaryOperator, other: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    pub fn not_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::NotEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::LtEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::GtEq, other)
    }

    /// Inclusive range check: low <= self <= high
    pub fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::And(vec![self.clone().gt_eq(low), self.lt_eq(high)])
    }

    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut parts) => {
                parts.push(other);
                Expr::And(parts)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(vec![self, other])
    }

    pub fn add(self, other: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: Expr) -> Expr {
        Expr::Subtract(Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: Expr) -> Expr {
        Expr::Multiply(Box::new(self), Box::new(other))
    }

    pub fn div(self, other: Expr) -> Expr {
        Expr::Divide(Box::new(self), Box::new(other))
    }

    pub fn day_of_week(self) -> Expr {
        Expr::DayOfWeek(Box::new(self))
    }

    /// Names of every column this expression reads, in first-use order
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. }
            | Expr::Add(left, right)
            | Expr::Subtract(left, right)
            | Expr::Multiply(left, right)
            | Expr::Divide(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::In { expr, .. }
            | Expr::Not(expr)
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::DayOfWeek(expr) => expr.collect_columns(out),
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    part.collect_columns(out);
                }
            }
            Expr::Case {
                when_then,
                else_result,
            } => {
                for (when, then) in when_then {
                    when.collect_columns(out);
                    then.collect_columns(out);
                }
                if let Some(e) = else_result {
                    e.collect_columns(out);
                }
            }
        }
    }

    /// Output type of the expression against an input schema.
    ///
    /// Callers validate column references first; unknown columns type as string.
    pub fn data_type(&self, schema: &Schema) -> DataType {
        match self {
            Expr::Column(name) => schema
                .field(name)
                .map(|f| f.data_type)
                .unwrap_or_default(),
            Expr::Literal(value) => value.data_type().unwrap_or_default(),
            Expr::BinaryOp { .. }
            | Expr::In { .. }
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Not(_)
            | Expr::IsNull(_)
            | Expr::IsNotNull(_) => DataType::Bool,
            Expr::Add(l, r) | Expr::Subtract(l, r) | Expr::Multiply(l, r) => {
                l.data_type(schema).widen(r.data_type(schema))
            }
            Expr::Divide(_, _) => DataType::Float,
            Expr::Case {
                when_then,
                else_result,
            } => when_then
                .iter()
                .map(|(_, then)| then)
                .chain(else_result.as_deref())
                .filter(|e| !matches!(e, Expr::Literal(Value::Null)))
                .map(|e| e.data_type(schema))
                .reduce(DataType::widen)
                .unwrap_or_default(),
            Expr::DayOfWeek(_) => DataType::String,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(Value::Str(s)) => write!(f, "'{}'", s),
            Expr::Literal(Value::Null) => write!(f, "NULL"),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Expr::In { expr, values } => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", expr, list.join(", "))
            }
            Expr::And(parts) => write_joined(f, parts, " AND "),
            Expr::Or(parts) => write_joined(f, parts, " OR "),
            Expr::Not(e) => write!(f, "NOT ({})", e),
            Expr::Add(l, r) => write!(f, "({} + {})", l, r),
            Expr::Subtract(l, r) => write!(f, "({} - {})", l, r),
            Expr::Multiply(l, r) => write!(f, "({} * {})", l, r),
            Expr::Divide(l, r) => write!(f, "({} / {})", l, r),
            Expr::IsNull(e) => write!(f, "{} IS NULL", e),
            Expr::IsNotNull(e) => write!(f, "{} IS NOT NULL", e),
            Expr::Case {
                when_then,
                else_result,
            } => {
                write!(f, "CASE")?;
                for (when, then) in when_then {
                    write!(f, " WHEN {} THEN {}", when, then)?;
                }
                if let Some(e) = else_result {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            Expr::DayOfWeek(e) => write!(f, "day_of_week({})", e),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Expr], sep: &str) -> fmt::Result {
    let rendered: Vec<String> = parts.iter().map(|p| format!("({})", p)).collect();
    write!(f, "{}", rendered.join(sep))
}

/// Aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Count of non-null values
    Count,
    /// Count of distinct non-null values
    CountDistinct,
    /// Sum of values
    Sum,
    /// Arithmetic mean of values
    Mean,
    Min,
    Max,
    /// Most frequent value; ties go to the value seen first in row order
    Mode,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Count => write!(f, "count"),
            Aggregation::CountDistinct => write!(f, "count_distinct"),
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Mode => write!(f, "mode"),
        }
    }
}

/// An aggregate expression: func(expr) [FILTER (WHERE filter)] AS alias
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub func: Aggregation,
    pub expr: Expr,
    /// Only rows passing this predicate feed the aggregate
    pub filter: Option<Expr>,
    pub alias: String,
}

impl AggregateExpr {
    pub fn new(func: Aggregation, expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            func,
            expr,
            filter: None,
            alias: alias.into(),
        }
    }

    /// Count of rows (COUNT(*))
    pub fn count_rows(alias: impl Into<String>) -> Self {
        Self::new(Aggregation::Count, lit(1i64), alias)
    }

    /// Count of rows matching `predicate`
    pub fn count_where(predicate: Expr, alias: impl Into<String>) -> Self {
        Self::count_rows(alias).with_filter(predicate)
    }

    pub fn with_filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Output type given the input schema
    pub fn data_type(&self, schema: &Schema) -> DataType {
        match self.func {
            Aggregation::Count | Aggregation::CountDistinct => DataType::Int,
            Aggregation::Mean => DataType::Float,
            Aggregation::Sum => match self.expr.data_type(schema) {
                DataType::Int => DataType::Int,
                _ => DataType::Float,
            },
            Aggregation::Min | Aggregation::Max | Aggregation::Mode => self.expr.data_type(schema),
        }
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.func, self.expr)?;
        if let Some(filter) = &self.filter {
            write!(f, " FILTER (WHERE {})", filter)?;
        }
        write!(f, " AS {}", self.alias)
    }
}
