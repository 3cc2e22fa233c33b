//! Plan materialization

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::dataset::{Schema, Value};
use crate::plan::{Aggregate, AggregateExpr, Aggregation, Join, JoinType, PlanNode, SortDirection};
use crate::store::Store;
use super::error::QueryError;
use super::eval::evaluate;

type Row = Vec<Value>;

/// Evaluate a plan node bottom-up into rows laid out by its schema
pub(crate) fn execute(store: &Store, node: &PlanNode) -> Result<Vec<Row>, QueryError> {
    match node {
        PlanNode::Scan(scan) => {
            let table = store
                .table(&scan.dataset)
                .ok_or_else(|| QueryError::UnknownDataset(scan.dataset.clone()))?;
            // The dataset may have been reloaded with a different layout since
            // the plan was built
            if let Some(missing) = scan
                .schema
                .fields()
                .iter()
                .find(|f| !table.schema().contains(&f.name))
            {
                return Err(QueryError::UnknownColumn {
                    column: missing.name.clone(),
                    available: table.schema().names(),
                });
            }
            let rows = table.rows_for(&scan.schema.names()).unwrap_or_default();
            Ok(match &scan.predicate {
                Some(p) => rows
                    .into_iter()
                    .filter(|row| evaluate(p, &scan.schema, row).is_true())
                    .collect(),
                None => rows,
            })
        }
        PlanNode::Filter(filter) => {
            let schema = filter.input.schema();
            Ok(execute(store, &filter.input)?
                .into_iter()
                .filter(|row| evaluate(&filter.predicate, schema, row).is_true())
                .collect())
        }
        PlanNode::Join(join) => execute_join(store, join),
        PlanNode::Derive(derive) => {
            let schema = derive.input.schema();
            Ok(execute(store, &derive.input)?
                .into_iter()
                .map(|mut row| {
                    let value = evaluate(&derive.expr, schema, &row);
                    row.push(value);
                    row
                })
                .collect())
        }
        PlanNode::Aggregate(aggregate) => {
            let rows = execute(store, &aggregate.input)?;
            Ok(execute_aggregate(aggregate, &rows))
        }
        PlanNode::Project(project) => {
            let input_schema = project.input.schema();
            let indices: Vec<usize> = project
                .schema
                .fields()
                .iter()
                .filter_map(|f| input_schema.index_of(&f.name))
                .collect();
            Ok(execute(store, &project.input)?
                .into_iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect())
        }
        PlanNode::Sort(sort) => {
            let schema = sort.input.schema();
            let keys: Vec<(usize, SortDirection)> = sort
                .sort_keys
                .iter()
                .filter_map(|k| schema.index_of(&k.column).map(|i| (i, k.direction)))
                .collect();
            let mut rows = execute(store, &sort.input)?;
            rows.sort_by(|a, b| compare_rows(a, b, &keys));
            Ok(rows)
        }
        PlanNode::Limit(limit) => {
            let mut rows = execute(store, &limit.input)?;
            rows.truncate(limit.fetch);
            Ok(rows)
        }
    }
}

fn compare_rows(a: &Row, b: &Row, keys: &[(usize, SortDirection)]) -> Ordering {
    for &(idx, direction) in keys {
        let (x, y) = (&a[idx], &b[idx]);
        let ord = if x.is_null() || y.is_null() {
            x.sort_cmp(y)
        } else {
            match direction {
                SortDirection::Ascending => x.sort_cmp(y),
                SortDirection::Descending => y.sort_cmp(x),
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn execute_join(store: &Store, join: &Join) -> Result<Vec<Row>, QueryError> {
    let left_schema = join.left.schema();
    let right_schema = join.right.schema();
    let (left_key, right_key) = match (
        left_schema.index_of(&join.key),
        right_schema.index_of(&join.key),
    ) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(QueryError::InvalidPlan(format!(
                "join key '{}' missing from an input",
                join.key
            )))
        }
    };
    let right_keep: Vec<usize> = (0..right_schema.len()).filter(|&i| i != right_key).collect();

    // A string key is read as a number only when the other side is numeric
    let left_type = left_schema.fields()[left_key].data_type;
    let right_type = right_schema.fields()[right_key].data_type;
    let left_key_of = key_fn(right_type.is_numeric() && !left_type.is_numeric());
    let right_key_of = key_fn(left_type.is_numeric() && !right_type.is_numeric());

    let left_rows = execute(store, &join.left)?;
    let right_rows = execute(store, &join.right)?;

    let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in right_rows.iter().enumerate() {
        if let Some(key) = right_key_of(&row[right_key]) {
            lookup.entry(key).or_default().push(idx);
        }
    }

    let mut out = Vec::with_capacity(left_rows.len());
    for left in left_rows {
        let matches = left_key_of(&left[left_key]).and_then(|k| lookup.get(&k));
        match matches {
            Some(indices) => {
                for &r in indices {
                    let mut row = left.clone();
                    row.extend(right_keep.iter().map(|&i| right_rows[r][i].clone()));
                    out.push(row);
                }
            }
            None if join.join_type == JoinType::Left => {
                let mut row = left;
                row.extend(std::iter::repeat(Value::Null).take(right_keep.len()));
                out.push(row);
            }
            None => {}
        }
    }
    Ok(out)
}

fn key_fn(numeric_peer: bool) -> fn(&Value) -> Option<String> {
    if numeric_peer {
        Value::numeric_key
    } else {
        Value::key
    }
}

fn execute_aggregate(aggregate: &Aggregate, rows: &[Row]) -> Vec<Row> {
    let schema = aggregate.input.schema();
    let key_indices: Vec<usize> = aggregate
        .group_by
        .iter()
        .filter_map(|k| schema.index_of(k))
        .collect();

    let mut slots: HashMap<Vec<Option<String>>, usize> = HashMap::new();
    let mut groups: Vec<(Row, Vec<usize>)> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let key: Vec<Option<String>> = key_indices.iter().map(|&k| row[k].key()).collect();
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push((key_indices.iter().map(|&k| row[k].clone()).collect(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(idx);
    }
    // A global aggregate over no rows still yields one row
    if groups.is_empty() && key_indices.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    groups
        .into_iter()
        .map(|(mut out, members)| {
            for agg in &aggregate.aggregates {
                out.push(reduce(agg, schema, rows, &members));
            }
            out
        })
        .collect()
}

fn reduce(agg: &AggregateExpr, schema: &Schema, rows: &[Row], members: &[usize]) -> Value {
    let values: Vec<Value> = members
        .iter()
        .map(|&i| &rows[i])
        .filter(|row| {
            agg.filter
                .as_ref()
                .map_or(true, |p| evaluate(p, schema, row).is_true())
        })
        .map(|row| evaluate(&agg.expr, schema, row))
        .filter(|v| !v.is_null())
        .collect();

    match agg.func {
        Aggregation::Count => Value::Int(values.len() as i64),
        Aggregation::CountDistinct => {
            let distinct: HashSet<String> = values.iter().filter_map(Value::key).collect();
            Value::Int(distinct.len() as i64)
        }
        Aggregation::Sum => sum(&values),
        Aggregation::Mean => {
            let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                Value::Float(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        Aggregation::Min => extreme(values, Ordering::Less),
        Aggregation::Max => extreme(values, Ordering::Greater),
        Aggregation::Mode => mode(values),
    }
}

fn sum(values: &[Value]) -> Value {
    if values.is_empty() {
        return Value::Null;
    }
    if values.iter().all(|v| matches!(v, Value::Int(_))) {
        let total = values.iter().try_fold(0i64, |acc, v| match v {
            Value::Int(i) => acc.checked_add(*i),
            _ => None,
        });
        if let Some(total) = total {
            return Value::Int(total);
        }
    }
    Value::Float(values.iter().filter_map(Value::as_f64).sum())
}

fn extreme(values: Vec<Value>, keep: Ordering) -> Value {
    values
        .into_iter()
        .reduce(|best, v| if v.compare(&best) == Some(keep) { v } else { best })
        .unwrap_or(Value::Null)
}

/// Most frequent value. Ties resolve to the value encountered first.
fn mode(values: Vec<Value>) -> Value {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<(String, Value)> = Vec::new();
    for value in values {
        let Some(key) = value.key() else {
            continue;
        };
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push((key, value));
        }
        *count += 1;
    }

    let mut best: Option<(usize, Value)> = None;
    for (key, value) in first_seen {
        let count = counts[&key];
        if best.as_ref().map_or(true, |(top, _)| count > *top) {
            best = Some((count, value));
        }
    }
    best.map(|(_, v)| v).unwrap_or(Value::Null)
}
