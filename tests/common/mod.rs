//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use retail_triage::{config, AppConfig, ProfileAggregator, QueryEngine, SourceLocator, Store};

/// Directory holding the CSV fixtures and config.yaml
pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test_data")
}

pub fn load_config() -> AppConfig {
    config::parse_file(fixture_dir().join("config.yaml"))
        .unwrap_or_else(|e| panic!("Failed to load test config: {}", e))
}

pub fn fixture_locators() -> BTreeMap<String, SourceLocator> {
    load_config()
        .locators(&fixture_dir())
        .unwrap_or_else(|e| panic!("Invalid test config: {}", e))
}

/// Store with every fixture dataset loaded
pub fn load_store() -> Arc<Store> {
    Arc::new(Store::load(&fixture_locators()).unwrap_or_else(|e| panic!("Failed to load fixtures: {}", e)))
}

pub fn engine() -> QueryEngine {
    QueryEngine::new(load_store())
}

pub fn profiles() -> Arc<ProfileAggregator> {
    Arc::new(ProfileAggregator::new(engine()))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} but got {}",
        expected,
        actual
    );
}
