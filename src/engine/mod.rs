//! Lazy query engine (verb module)
//!
//! `QueryEngine` builds composable `QueryPlan`s (scan, filter, join, derive,
//! aggregate, project, sort, limit) and materializes them on demand.

mod build;
mod error;
mod eval;
mod execute;
mod result;

pub use build::{QueryEngine, QueryPlan};
pub use error::QueryError;
pub use eval::{evaluate, parse_weekday, weekday_name};
pub use result::MaterializedResult;
