//! Integration tests for request triage and dispatch

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use common::{load_config, profiles};
use retail_triage::config::DispatcherConfig;
use retail_triage::dispatch::{CapabilityError, DispatchError};
use retail_triage::{
    builtin_handlers, Dispatcher, ErrorClass, Generator, Handler, HandlerError, IntentClassifier,
    KeywordClassifier, RequestEnvelope, ResponseEnvelope, Route, RoutingDecision,
};

/// Classifier returning a fixed decision and recording what it saw
struct ScriptedClassifier {
    decision: Result<RoutingDecision, CapabilityError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Value>>,
}

impl ScriptedClassifier {
    fn routing(route: &str, confidence: f64, params: Value) -> Arc<Self> {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Arc::new(Self {
            decision: Ok(RoutingDecision {
                route: route.to_string(),
                params,
                confidence,
                rationale: "scripted".to_string(),
            }),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            decision: Err(CapabilityError::unavailable("classifier", "model endpoint timed out")),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(&self, request: &Value) -> Result<RoutingDecision, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(request.clone());
        self.decision.clone()
    }
}

/// Handler echoing its envelope back as the result
#[derive(Default)]
struct EchoHandler {
    envelopes: Mutex<Vec<RequestEnvelope>>,
}

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError> {
        self.envelopes.lock().push(envelope.clone());
        Ok(envelope.params().clone())
    }
}

struct FailingHandler(fn() -> HandlerError);

#[async_trait]
impl Handler for FailingHandler {
    async fn handle(&self, _envelope: &RequestEnvelope) -> Result<Map<String, Value>, HandlerError> {
        Err((self.0)())
    }
}

fn echo_dispatcher(classifier: Arc<ScriptedClassifier>) -> (Dispatcher, Arc<EchoHandler>) {
    let echo = Arc::new(EchoHandler::default());
    let mut dispatcher = Dispatcher::new(classifier, DispatcherConfig::default());
    for route in Route::ALL {
        dispatcher = dispatcher.with_handler(route, echo.clone());
    }
    (dispatcher, echo)
}

fn builtin_dispatcher() -> Dispatcher {
    let config = load_config();
    Dispatcher::new(Arc::new(KeywordClassifier::default()), config.dispatcher.clone())
        .with_handlers(builtin_handlers(profiles(), None, config.leaderboard.top_n))
}

fn success_parts(response: ResponseEnvelope) -> (String, Map<String, Value>, f64) {
    match response {
        ResponseEnvelope::Success {
            route,
            result,
            confidence,
            ..
        } => (route, result, confidence),
        other => panic!("expected success, got {:?}", other),
    }
}

fn failure_class(response: &ResponseEnvelope) -> ErrorClass {
    match response {
        ResponseEnvelope::Failure { error_class, .. } => *error_class,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_explicit_route_skips_classification() {
    let classifier = ScriptedClassifier::routing("vibe_report", 0.9, json!({}));
    let (dispatcher, _) = echo_dispatcher(classifier.clone());

    let response = dispatcher
        .dispatch(json!({"agent_type": "smart_receipt", "query": "make me a vibe report", "user_id": "1001"}))
        .await;
    let (route, _, confidence) = success_parts(response);
    assert_eq!(route, "smart_receipt");
    assert_eq!(confidence, 1.0);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_unknown_explicit_route_is_client_error() {
    let classifier = ScriptedClassifier::routing("vibe_report", 0.9, json!({}));
    let (dispatcher, echo) = echo_dispatcher(classifier.clone());

    let response = dispatcher.dispatch(json!({"agent_type": "loyalty_points"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Client);
    assert_eq!(response.status_code(), 400);
    assert_eq!(classifier.calls(), 0);
    assert!(echo.envelopes.lock().is_empty());
}

#[tokio::test]
async fn test_classifier_route_outside_fixed_set() {
    let classifier = ScriptedClassifier::routing("churn_report", 0.8, json!({}));
    let (dispatcher, _) = echo_dispatcher(classifier);

    let err = dispatcher
        .try_dispatch(json!({"query": "who is about to churn?"}))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownRoute(ref label) if label == "churn_report"));
    assert_eq!(err.class(), ErrorClass::Client);
}

#[tokio::test]
async fn test_classifier_failure_is_server_error() {
    let (dispatcher, echo) = echo_dispatcher(ScriptedClassifier::failing());

    let response = dispatcher.dispatch(json!({"query": "vibe check"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Server);
    assert_eq!(response.status_code(), 500);
    assert!(echo.envelopes.lock().is_empty());
}

#[tokio::test]
async fn test_default_query_synthesized_from_identifier() {
    let classifier = ScriptedClassifier::routing("vibe_report", 0.7, json!({}));
    let (dispatcher, _) = echo_dispatcher(classifier.clone());

    dispatcher.dispatch(json!({"data": {"user_id": 1001}})).await;
    let seen = classifier.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["query"], json!("Generate a vibe report for user 1001"));
}

#[tokio::test]
async fn test_existing_query_is_kept() {
    let classifier = ScriptedClassifier::routing("brand_voice", 0.7, json!({}));
    let (dispatcher, _) = echo_dispatcher(classifier.clone());

    dispatcher
        .dispatch(json!({"query": "draft spring campaign copy", "user_id": "1001"}))
        .await;
    assert_eq!(classifier.seen.lock()[0]["query"], json!("draft spring campaign copy"));
}

#[tokio::test]
async fn test_envelope_merge_precedence() {
    let classifier = ScriptedClassifier::routing(
        "smart_receipt",
        0.6,
        json!({"user_id": null, "current_basket_items": ["Oat Milk"], "store": "north"}),
    );
    let (dispatcher, echo) = echo_dispatcher(classifier);

    let response = dispatcher
        .dispatch(json!({
            "query": "what should I add to my basket?",
            "user_id": "1001",
            "store": "south",
            "data": {"user_id": "2001", "channel": "app"}
        }))
        .await;
    assert!(response.is_success());

    let envelopes = echo.envelopes.lock();
    let envelope = &envelopes[0];
    // Top-level caller fields win over the context object
    assert_eq!(envelope.identifier("user_id").as_deref(), Some("1001"));
    assert_eq!(envelope.get("channel"), Some(&json!("app")));
    // Extracted params win over caller fields, except null identifiers
    assert_eq!(envelope.get("store"), Some(&json!("north")));
    assert_eq!(envelope.get("current_basket_items"), Some(&json!(["Oat Milk"])));
    assert!(envelope.get("query").is_none());
}

#[tokio::test]
async fn test_identifiers_absent_from_extraction_survive() {
    let classifier = ScriptedClassifier::routing(
        "smart_receipt",
        0.8,
        json!({"current_basket_items": ["Oat Milk"]}),
    );
    let (dispatcher, echo) = echo_dispatcher(classifier);

    let (_, result, _) = success_parts(
        dispatcher
            .dispatch(json!({"query": "what goes with my basket?", "user_id": "1001", "cid": "CUST-AB12"}))
            .await,
    );
    assert_eq!(result["user_id"], json!("1001"));
    assert_eq!(result["cid"], json!("CUST-AB12"));

    let envelopes = echo.envelopes.lock();
    assert_eq!(envelopes[0].identifier("user_id").as_deref(), Some("1001"));
    assert_eq!(envelopes[0].identifier("cid").as_deref(), Some("CUST-AB12"));
    assert_eq!(envelopes[0].get("current_basket_items"), Some(&json!(["Oat Milk"])));
}

#[tokio::test]
async fn test_identifier_case_survives_classification() {
    let echo = Arc::new(EchoHandler::default());
    let dispatcher = Dispatcher::new(Arc::new(KeywordClassifier::default()), DispatcherConfig::default())
        .with_handler(Route::VibeReport, echo.clone());

    let outcome = dispatcher.try_dispatch(json!({"cid": "CUST-AB12"})).await.unwrap();
    assert_eq!(outcome.route, Route::VibeReport);
    assert_eq!(outcome.envelope.identifier("user_id").as_deref(), Some("CUST-AB12"));
    assert_eq!(outcome.envelope.identifier("cid").as_deref(), Some("CUST-AB12"));

    let outcome = dispatcher
        .try_dispatch(json!({"query": "Generate a vibe report for user CUST-AB12"}))
        .await
        .unwrap();
    assert_eq!(outcome.envelope.identifier("user_id").as_deref(), Some("CUST-AB12"));
    assert_eq!(echo.envelopes.lock().len(), 2);
}

#[tokio::test]
async fn test_confidence_is_clamped() {
    let (dispatcher, _) = echo_dispatcher(ScriptedClassifier::routing("vibe_report", 3.5, json!({})));
    let (_, _, confidence) = success_parts(dispatcher.dispatch(json!({"query": "vibe"})).await);
    assert_eq!(confidence, 1.0);

    let (dispatcher, _) = echo_dispatcher(ScriptedClassifier::routing("vibe_report", f64::NAN, json!({})));
    let (_, _, confidence) = success_parts(dispatcher.dispatch(json!({"query": "vibe"})).await);
    assert_eq!(confidence, 0.0);
}

#[tokio::test]
async fn test_malformed_requests() {
    let (dispatcher, _) = echo_dispatcher(ScriptedClassifier::routing("vibe_report", 0.5, json!({})));

    let response = dispatcher.dispatch(json!(["not", "an", "object"])).await;
    assert_eq!(failure_class(&response), ErrorClass::Client);

    let response = dispatcher.dispatch(json!({"query": "vibe", "data": "user 1001"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Client);
}

#[tokio::test]
async fn test_handler_errors_are_classified() {
    let classifier = ScriptedClassifier::routing("vibe_report", 0.5, json!({}));
    let dispatcher = Dispatcher::new(classifier.clone(), DispatcherConfig::default())
        .with_handler(
            Route::VibeReport,
            Arc::new(FailingHandler(|| HandlerError::Validation("user_id is required".into()))),
        )
        .with_handler(
            Route::BrandVoice,
            Arc::new(FailingHandler(|| HandlerError::Internal("renderer crashed".into()))),
        );

    let response = dispatcher.dispatch(json!({"query": "vibe"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Client);

    let response = dispatcher.dispatch(json!({"agent_type": "brand_voice"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Server);

    // No handler registered for this route
    let response = dispatcher.dispatch(json!({"agent_type": "smart_receipt"})).await;
    assert_eq!(failure_class(&response), ErrorClass::Server);
}

#[tokio::test]
async fn test_vibe_report_end_to_end() {
    let response = builtin_dispatcher()
        .dispatch(json!({"query": "Generate a vibe report for user 1001"}))
        .await;
    let (route, result, _) = success_parts(response);
    assert_eq!(route, "vibe_report");
    assert_eq!(result["user_id"], json!("1001"));
    assert_eq!(result["behavioral_metrics"]["transactions"], json!(3));
    assert_eq!(result["behavioral_metrics"]["avg_order_value"], json!(20.0));
    assert_eq!(result["purchase_metrics"]["peak_day"], json!("Monday"));
    assert_eq!(result["purchase_metrics"]["top_category"], json!("Coffee"));
}

#[tokio::test]
async fn test_vibe_report_for_customer_without_history() {
    let response = builtin_dispatcher()
        .dispatch(json!({"agent_type": "vibe_report", "user_id": 2001}))
        .await;
    let (_, result, _) = success_parts(response);
    assert_eq!(result["behavioral_metrics"]["transactions"], json!(0));
    assert_eq!(result["purchase_metrics"]["peak_day"], Value::Null);
}

#[tokio::test]
async fn test_smart_receipt_recommends_from_top_category() {
    let response = builtin_dispatcher()
        .dispatch(json!({
            "query": "Recommend the next best item for my basket",
            "data": {"user_id": "1001", "current_basket_items": [{"item_name": "Oat Milk"}]}
        }))
        .await;
    let (route, result, _) = success_parts(response);
    assert_eq!(route, "smart_receipt");
    assert_eq!(result["basket_items_count"], json!(1));
    assert_eq!(result["past_transactions"], json!(3));
    assert_eq!(result["next_best_item"]["item_name"], json!("Cold Brew Kit"));
    assert_eq!(result["next_best_item"]["item_id"], json!(504));

    let response = builtin_dispatcher()
        .dispatch(json!({
            "agent_type": "smart_receipt",
            "user_id": "1001",
            "current_basket_items": ["cold brew kit"]
        }))
        .await;
    let (_, result, _) = success_parts(response);
    assert_eq!(result["next_best_item"]["item_name"], json!("Espresso Beans"));
}

#[tokio::test]
async fn test_smart_receipt_requires_basket() {
    let response = builtin_dispatcher()
        .dispatch(json!({"agent_type": "smart_receipt", "user_id": "1001"}))
        .await;
    assert_eq!(failure_class(&response), ErrorClass::Client);
    assert_eq!(
        response.to_json()["error"],
        json!("Invalid request: current_basket_items list is required")
    );
}

#[tokio::test]
async fn test_brand_voice_attaches_leaderboard() {
    let response = builtin_dispatcher()
        .dispatch(json!({"campaign_texts": ["Spring is here", "Fresh roast drop"]}))
        .await;
    let (route, result, _) = success_parts(response);
    assert_eq!(route, "brand_voice");
    assert_eq!(result["campaigns_analyzed"], json!(2));

    let templates = result["reference_templates"].as_array().unwrap();
    assert_eq!(templates.len(), 3);
    assert_eq!(templates[0]["template_id"], json!("T2"));
}

#[tokio::test]
async fn test_brand_voice_requires_texts_or_contacts() {
    let dispatcher = builtin_dispatcher();
    let response = dispatcher
        .dispatch(json!({"agent_type": "brand_voice", "user_id": "1001"}))
        .await;
    assert_eq!(failure_class(&response), ErrorClass::Client);

    let response = dispatcher
        .dispatch(json!({"agent_type": "brand_voice", "campaign_texts": [], "contact_ids": []}))
        .await;
    assert_eq!(failure_class(&response), ErrorClass::Client);

    let response = dispatcher
        .dispatch(json!({"agent_type": "brand_voice", "contact_ids": [1001, 1002]}))
        .await;
    let (_, result, _) = success_parts(response);
    assert_eq!(result["contacts_targeted"], json!(2));
}

#[tokio::test]
async fn test_identifier_only_request_routes_to_vibe_report() {
    let dispatcher = builtin_dispatcher();
    let outcome = dispatcher.try_dispatch(json!({"user_id": "1003"})).await.unwrap();
    assert_eq!(outcome.route, Route::VibeReport);
    assert!(outcome.classified);
    assert_eq!(outcome.envelope.identifier("user_id").as_deref(), Some("1003"));
}

#[tokio::test]
async fn test_explicit_brand_voice_has_full_confidence() {
    let outcome = builtin_dispatcher()
        .try_dispatch(json!({"agent_type": "brand_voice", "campaign_texts": ["Back to school"]}))
        .await
        .unwrap();
    assert_eq!(outcome.route, Route::BrandVoice);
    assert_eq!(outcome.confidence, 1.0);
    assert!(!outcome.classified);
    assert_eq!(outcome.rationale, "explicit override");
}

/// Generator adding a persona and trying to overwrite a computed field
struct PersonaGenerator;

#[async_trait]
impl Generator for PersonaGenerator {
    async fn generate(&self, route: Route, _context: &Value) -> Result<Map<String, Value>, CapabilityError> {
        let mut fields = Map::new();
        fields.insert("shopping_persona".to_string(), json!(format!("{} persona", route)));
        fields.insert("user_id".to_string(), json!("overwritten"));
        Ok(fields)
    }
}

#[tokio::test]
async fn test_generator_enriches_without_overwriting() {
    let dispatcher = Dispatcher::new(Arc::new(KeywordClassifier::default()), DispatcherConfig::default())
        .with_handlers(builtin_handlers(profiles(), Some(Arc::new(PersonaGenerator)), 3));

    let response = dispatcher
        .dispatch(json!({"agent_type": "vibe_report", "user_id": "1003"}))
        .await;
    let (_, result, _) = success_parts(response);
    assert_eq!(result["shopping_persona"], json!("vibe_report persona"));
    assert_eq!(result["user_id"], json!("1003"));
}
