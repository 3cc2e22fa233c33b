//! retail-triage - Intent triage over a lazy retail analytics engine
//!
//! This library provides:
//! - Columnar datasets loaded from delimited files
//! - Composable, deferred query plans (scan, filter, join, derive, aggregate)
//! - Customer, group and campaign profiles built from those plans
//! - An intent dispatcher routing JSON requests to route handlers
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `dataset/` - values, schemas and in-memory tables
//! - `plan/` - logical plan types (PlanNode, Expr, AggregateExpr)
//!
//! **Verb modules** (transformations):
//! - `config/` - YAML → AppConfig
//! - `store/` - delimited files → named tables
//! - `engine/` - plan building and materialization
//! - `profile/` - plans → digests, group profiles, leaderboards, habits
//! - `dispatch/` - raw request → route → handler → response envelope
//! - `handlers/` - per-route metric computation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use retail_triage::{config, QueryEngine, ProfileAggregator, Store};
//!
//! let config = config::parse_file("retail.yaml")?;
//! let store = Arc::new(Store::load(&config.locators(Path::new("data"))?)?);
//! let profiles = ProfileAggregator::new(QueryEngine::new(store));
//! let summary = profiles.spend_summary("1001")?;
//! ```

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod engine;
pub mod handlers;
pub mod logging;
pub mod plan;
pub mod profile;
pub mod store;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use dataset::{DataType, Field, Schema, Table, Value};
pub use dispatch::{
    DispatchError, Dispatcher, ErrorClass, IntentClassifier, KeywordClassifier, RequestEnvelope,
    ResponseEnvelope, Route, RoutingDecision,
};
pub use engine::{MaterializedResult, QueryEngine, QueryError, QueryPlan};
pub use handlers::{builtin_handlers, Generator, Handler, HandlerError};
pub use plan::{col, lit, AggregateExpr, Aggregation, Expr, JoinType, PlanNode, SortKey};
pub use profile::{GroupProfile, ProfileAggregator, ProfileError, ShoppingHabits, SpendSummary};
pub use store::{LoadError, SourceLocator, Store};
