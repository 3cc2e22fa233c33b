//! Plan node types

use std::fmt;
use std::sync::Arc;

use crate::dataset::Schema;
use super::expr::{AggregateExpr, Expr};

/// A node in the logical plan tree.
///
/// Every node records its output schema when it is built, so plans can be
/// validated and composed without reading any rows.
#[derive(Debug, Clone)]
pub enum PlanNode {
    /// Scan a registered dataset, optionally filtered
    Scan(Scan),
    /// Filter rows of another plan
    Filter(Filter),
    /// Join two relations on a shared key
    Join(Join),
    /// Append a computed column
    Derive(Derive),
    /// Aggregate (GROUP BY)
    Aggregate(Aggregate),
    /// Keep a subset of columns
    Project(Project),
    /// Sort rows (ORDER BY)
    Sort(Sort),
    /// Keep the first N rows
    Limit(Limit),
}

impl PlanNode {
    /// Output schema of this node
    pub fn schema(&self) -> &Schema {
        match self {
            PlanNode::Scan(n) => &n.schema,
            PlanNode::Filter(n) => n.input.schema(),
            PlanNode::Join(n) => &n.schema,
            PlanNode::Derive(n) => &n.schema,
            PlanNode::Aggregate(n) => &n.schema,
            PlanNode::Project(n) => &n.schema,
            PlanNode::Sort(n) => n.input.schema(),
            PlanNode::Limit(n) => n.input.schema(),
        }
    }

    /// Datasets read by this plan, in scan order
    pub fn datasets(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_datasets(&mut out);
        out
    }

    fn collect_datasets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PlanNode::Scan(n) => out.push(&n.dataset),
            PlanNode::Join(n) => {
                n.left.collect_datasets(out);
                n.right.collect_datasets(out);
            }
            PlanNode::Filter(Filter { input, .. })
            | PlanNode::Derive(Derive { input, .. })
            | PlanNode::Aggregate(Aggregate { input, .. })
            | PlanNode::Project(Project { input, .. })
            | PlanNode::Sort(Sort { input, .. })
            | PlanNode::Limit(Limit { input, .. }) => input.collect_datasets(out),
        }
    }

    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            PlanNode::Scan(n) => {
                write!(f, "{}Scan: {}", pad, n.dataset)?;
                if let Some(p) = &n.predicate {
                    write!(f, " WHERE {}", p)?;
                }
                writeln!(f)
            }
            PlanNode::Filter(n) => {
                writeln!(f, "{}Filter: {}", pad, n.predicate)?;
                n.input.fmt_indent(f, depth + 1)
            }
            PlanNode::Join(n) => {
                writeln!(f, "{}Join: {} ON {}", pad, n.join_type, n.key)?;
                n.left.fmt_indent(f, depth + 1)?;
                n.right.fmt_indent(f, depth + 1)
            }
            PlanNode::Derive(n) => {
                writeln!(f, "{}Derive: {} AS {}", pad, n.expr, n.name)?;
                n.input.fmt_indent(f, depth + 1)
            }
            PlanNode::Aggregate(n) => {
                let aggs: Vec<String> = n.aggregates.iter().map(|a| a.to_string()).collect();
                writeln!(
                    f,
                    "{}Aggregate: group_by=[{}] aggregates=[{}]",
                    pad,
                    n.group_by.join(", "),
                    aggs.join(", ")
                )?;
                n.input.fmt_indent(f, depth + 1)
            }
            PlanNode::Project(n) => {
                writeln!(f, "{}Project: {}", pad, n.schema.names().join(", "))?;
                n.input.fmt_indent(f, depth + 1)
            }
            PlanNode::Sort(n) => {
                let keys: Vec<String> = n.sort_keys.iter().map(|k| k.to_string()).collect();
                writeln!(f, "{}Sort: {}", pad, keys.join(", "))?;
                n.input.fmt_indent(f, depth + 1)
            }
            PlanNode::Limit(n) => {
                writeln!(f, "{}Limit: {}", pad, n.fetch)?;
                n.input.fmt_indent(f, depth + 1)
            }
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

/// Scan a dataset by logical name
#[derive(Debug, Clone)]
pub struct Scan {
    /// Dataset name in the store
    pub dataset: String,
    /// Columns to read, as they existed when the plan was built
    pub schema: Schema,
    /// Row filter applied while scanning
    pub predicate: Option<Expr>,
}

/// Filter rows (WHERE clause)
#[derive(Debug, Clone)]
pub struct Filter {
    pub input: Arc<PlanNode>,
    pub predicate: Expr,
}

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    /// Keeps every left row; unmatched right columns are null
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "inner"),
            JoinType::Left => write!(f, "left"),
        }
    }
}

/// Equi-join on a column present on both sides.
///
/// Output columns are the left columns followed by the right columns minus
/// the right key; right names that collide with a left name get `_right`.
#[derive(Debug, Clone)]
pub struct Join {
    pub left: Arc<PlanNode>,
    pub right: Arc<PlanNode>,
    pub join_type: JoinType,
    pub key: String,
    pub schema: Schema,
}

/// Append a computed column
#[derive(Debug, Clone)]
pub struct Derive {
    pub input: Arc<PlanNode>,
    pub name: String,
    pub expr: Expr,
    pub schema: Schema,
}

/// Aggregate (GROUP BY)
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub input: Arc<PlanNode>,
    /// GROUP BY columns; empty means a single global group
    pub group_by: Vec<String>,
    pub aggregates: Vec<AggregateExpr>,
    pub schema: Schema,
}

/// Project specific columns
#[derive(Debug, Clone)]
pub struct Project {
    pub input: Arc<PlanNode>,
    pub schema: Schema,
}

/// Sort rows (ORDER BY). Stable: equal keys keep their input order.
#[derive(Debug, Clone)]
pub struct Sort {
    pub input: Arc<PlanNode>,
    pub sort_keys: Vec<SortKey>,
}

/// A sort key with direction
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Column name to sort by
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{} ASC", self.column),
            SortDirection::Descending => write!(f, "{} DESC", self.column),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Keep the first `fetch` rows
#[derive(Debug, Clone)]
pub struct Limit {
    pub input: Arc<PlanNode>,
    pub fetch: usize,
}
