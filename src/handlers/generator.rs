//! Optional content generation seam

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::dispatch::{CapabilityError, Route};

/// Turns computed metrics into generated content (persona text, campaign
/// copy, receipt messages).
///
/// Handlers work without one; generated fields are merged into the result
/// without overwriting computed fields.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, route: Route, context: &Value) -> Result<Map<String, Value>, CapabilityError>;
}

/// Merge generated fields into a handler result, keeping computed keys
pub(crate) async fn enrich(
    generator: Option<&dyn Generator>,
    route: Route,
    mut result: Map<String, Value>,
) -> Result<Map<String, Value>, CapabilityError> {
    let Some(generator) = generator else {
        return Ok(result);
    };
    let generated = generator.generate(route, &Value::Object(result.clone())).await?;
    for (key, value) in generated {
        result.entry(key).or_insert(value);
    }
    Ok(result)
}
