//! Logical plan types (noun module)
//!
//! A relational algebra tree over the store's datasets. Building a plan
//! never reads rows; only the engine's materializer does.

mod expr;
mod node;

pub use expr::{col, lit, AggregateExpr, Aggregation, BinaryOperator, Expr};
pub use node::{
    Aggregate, Derive, Filter, Join, JoinType, Limit, PlanNode, Project, Scan, Sort, SortDirection,
    SortKey,
};
