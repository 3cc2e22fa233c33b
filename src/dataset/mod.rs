//! Dataset types (noun module)
//!
//! Values, column types and the immutable columnar tables held by the store.

mod table;
mod types;
mod value;

pub use table::{Field, Schema, Table};
pub use types::DataType;
pub use value::Value;
