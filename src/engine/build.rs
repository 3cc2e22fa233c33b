//! Plan construction
//!
//! Every builder validates column references against the input schema and
//! records the output schema, but none of them reads rows.

use std::fmt;
use std::sync::Arc;

use crate::dataset::{Field, Schema};
use crate::plan::{
    Aggregate, AggregateExpr, Derive, Expr, Filter, Join, JoinType, Limit, PlanNode, Project,
    Scan, Sort, SortKey,
};
use crate::store::Store;
use super::error::QueryError;
use super::execute::execute;
use super::result::MaterializedResult;

/// Suffix for right-hand join columns whose name is already taken
const JOIN_COLLISION_SUFFIX: &str = "_right";

/// An unevaluated, shareable query plan.
///
/// Cloning is cheap; a plan can feed any number of larger plans.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    root: Arc<PlanNode>,
}

impl QueryPlan {
    fn new(node: PlanNode) -> Self {
        Self {
            root: Arc::new(node),
        }
    }

    pub fn schema(&self) -> &Schema {
        self.root.schema()
    }

    pub fn node(&self) -> &PlanNode {
        &self.root
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Builds and materializes plans over a shared store
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<Store>,
}

impl QueryEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Read a dataset, optionally keeping only rows matching `predicate`
    pub fn scan(&self, dataset: &str, predicate: Option<Expr>) -> Result<QueryPlan, QueryError> {
        let schema = self
            .store
            .schema(dataset)
            .ok_or_else(|| QueryError::UnknownDataset(dataset.to_string()))?;
        if let Some(p) = &predicate {
            check_columns(&schema, p)?;
        }
        Ok(QueryPlan::new(PlanNode::Scan(Scan {
            dataset: dataset.to_string(),
            schema,
            predicate,
        })))
    }

    pub fn filter(&self, plan: &QueryPlan, predicate: Expr) -> Result<QueryPlan, QueryError> {
        check_columns(plan.schema(), &predicate)?;
        Ok(QueryPlan::new(PlanNode::Filter(Filter {
            input: plan.root.clone(),
            predicate,
        })))
    }

    /// Equi-join on `key`, which must exist on both sides
    pub fn join(
        &self,
        left: &QueryPlan,
        right: &QueryPlan,
        key: &str,
        join_type: JoinType,
    ) -> Result<QueryPlan, QueryError> {
        require_column(left.schema(), key)?;
        require_column(right.schema(), key)?;

        let mut schema = left.schema().clone();
        for field in right.schema().fields().iter().filter(|f| f.name != key) {
            let mut name = field.name.clone();
            if schema.contains(&name) {
                name = format!("{}{}", name, JOIN_COLLISION_SUFFIX);
                if schema.contains(&name) {
                    return Err(QueryError::DuplicateColumn(name));
                }
            }
            schema.push(Field::new(name, field.data_type));
        }

        Ok(QueryPlan::new(PlanNode::Join(Join {
            left: left.root.clone(),
            right: right.root.clone(),
            join_type,
            key: key.to_string(),
            schema,
        })))
    }

    /// Append a column computed per row at materialization time
    pub fn with_derived(
        &self,
        plan: &QueryPlan,
        name: &str,
        expr: Expr,
    ) -> Result<QueryPlan, QueryError> {
        check_columns(plan.schema(), &expr)?;
        if plan.schema().contains(name) {
            return Err(QueryError::DuplicateColumn(name.to_string()));
        }
        let mut schema = plan.schema().clone();
        schema.push(Field::new(name, expr.data_type(plan.schema())));
        Ok(QueryPlan::new(PlanNode::Derive(Derive {
            input: plan.root.clone(),
            name: name.to_string(),
            expr,
            schema,
        })))
    }

    /// Group by `group_keys` and reduce each group with `aggregations`.
    ///
    /// Output rows follow the order in which groups first appear.
    pub fn aggregate(
        &self,
        plan: &QueryPlan,
        group_keys: &[&str],
        aggregations: Vec<AggregateExpr>,
    ) -> Result<QueryPlan, QueryError> {
        if group_keys.is_empty() && aggregations.is_empty() {
            return Err(QueryError::InvalidPlan(
                "aggregate needs at least one group key or aggregation".to_string(),
            ));
        }
        let input = plan.schema();
        let mut schema = Schema::default();
        for key in group_keys {
            let field = require_column(input, key)?;
            if schema.contains(key) {
                return Err(QueryError::DuplicateColumn(key.to_string()));
            }
            schema.push(field.clone());
        }
        for agg in &aggregations {
            check_columns(input, &agg.expr)?;
            if let Some(filter) = &agg.filter {
                check_columns(input, filter)?;
            }
            if schema.contains(&agg.alias) {
                return Err(QueryError::DuplicateColumn(agg.alias.clone()));
            }
            schema.push(Field::new(agg.alias.clone(), agg.data_type(input)));
        }
        Ok(QueryPlan::new(PlanNode::Aggregate(Aggregate {
            input: plan.root.clone(),
            group_by: group_keys.iter().map(|k| k.to_string()).collect(),
            aggregates: aggregations,
            schema,
        })))
    }

    /// Keep only `columns`, in the given order
    pub fn project(&self, plan: &QueryPlan, columns: &[&str]) -> Result<QueryPlan, QueryError> {
        let mut schema = Schema::default();
        for column in columns {
            let field = require_column(plan.schema(), column)?;
            if schema.contains(column) {
                return Err(QueryError::DuplicateColumn(column.to_string()));
            }
            schema.push(field.clone());
        }
        Ok(QueryPlan::new(PlanNode::Project(Project {
            input: plan.root.clone(),
            schema,
        })))
    }

    /// Stable sort by `keys`; nulls sort last in either direction
    pub fn sort(&self, plan: &QueryPlan, keys: Vec<SortKey>) -> Result<QueryPlan, QueryError> {
        for key in &keys {
            require_column(plan.schema(), &key.column)?;
        }
        Ok(QueryPlan::new(PlanNode::Sort(Sort {
            input: plan.root.clone(),
            sort_keys: keys,
        })))
    }

    pub fn limit(&self, plan: &QueryPlan, fetch: usize) -> QueryPlan {
        QueryPlan::new(PlanNode::Limit(Limit {
            input: plan.root.clone(),
            fetch,
        }))
    }

    /// Execute the whole plan against the store's current tables.
    ///
    /// Nothing is cached: each call re-reads the datasets.
    pub fn materialize(&self, plan: &QueryPlan) -> Result<MaterializedResult, QueryError> {
        let rows = execute(&self.store, plan.node())?;
        tracing::debug!(
            datasets = ?plan.node().datasets(),
            rows = rows.len(),
            "materialized plan"
        );
        Ok(MaterializedResult::new(plan.schema().clone(), rows))
    }
}

fn require_column<'a>(schema: &'a Schema, name: &str) -> Result<&'a Field, QueryError> {
    schema.field(name).ok_or_else(|| QueryError::UnknownColumn {
        column: name.to_string(),
        available: schema.names(),
    })
}

/// Every column an expression reads must exist in `schema`
fn check_columns(schema: &Schema, expr: &Expr) -> Result<(), QueryError> {
    for column in expr.referenced_columns() {
        require_column(schema, column)?;
    }
    Ok(())
}
