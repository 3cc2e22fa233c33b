//! Route handlers
//!
//! One handler per [`Route`]. Each validates its own parameters, computes
//! metrics through the [`ProfileAggregator`] and optionally enriches the
//! result through a [`Generator`].

mod brand_voice;
mod error;
mod generator;
mod smart_receipt;
mod vibe;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::dispatch::{RequestEnvelope, Route};
use crate::profile::ProfileAggregator;

pub use brand_voice::BrandVoiceHandler;
pub use error::HandlerError;
pub use generator::Generator;
pub use smart_receipt::SmartReceiptHandler;
pub use vibe::VibeReportHandler;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError>;
}

/// The built-in handler for every route
pub fn builtin_handlers(
    profiles: Arc<ProfileAggregator>,
    generator: Option<Arc<dyn Generator>>,
    leaderboard_size: usize,
) -> HashMap<Route, Arc<dyn Handler>> {
    let mut handlers: HashMap<Route, Arc<dyn Handler>> = HashMap::new();
    handlers.insert(
        Route::VibeReport,
        Arc::new(VibeReportHandler::new(profiles.clone(), generator.clone())),
    );
    handlers.insert(
        Route::BrandVoice,
        Arc::new(BrandVoiceHandler::new(profiles.clone(), generator.clone(), leaderboard_size)),
    );
    handlers.insert(
        Route::SmartReceipt,
        Arc::new(SmartReceiptHandler::new(profiles, generator)),
    );
    handlers
}
