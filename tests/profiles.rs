//! Integration tests for customer, group and campaign profiles

mod common;

use std::io::Write;

use common::{assert_close, load_store, profiles};
use retail_triage::engine::QueryError;
use retail_triage::profile::DistributionBucket;
use retail_triage::{ProfileAggregator, ProfileError, QueryEngine, SourceLocator, Value};

fn bucket(value: &str, count: i64) -> DistributionBucket {
    DistributionBucket {
        value: value.to_string(),
        count,
    }
}

#[test]
fn test_transaction_digest_derives_spend() {
    let digest = profiles().transaction_digest("1001").unwrap();
    assert_eq!(digest.num_rows(), 3);

    let gross: Vec<f64> = digest
        .column("gross_spend")
        .unwrap()
        .into_iter()
        .filter_map(Value::as_f64)
        .collect();
    assert_eq!(gross, vec![20.0, 4.0, 36.0]);
    assert_eq!(digest.value(0, "item_category"), Some(&Value::from("Coffee")));
    assert_eq!(digest.value(2, "discount_value").and_then(Value::as_f64), Some(6.0));
}

#[test]
fn test_digest_keeps_uncatalogued_items() {
    let digest = profiles().transaction_digest("1004").unwrap();
    assert_eq!(digest.num_rows(), 1);
    assert_eq!(digest.value(0, "description"), Some(&Value::Null));
    assert_eq!(digest.value(0, "gross_spend").and_then(Value::as_f64), Some(12.0));
}

#[test]
fn test_unknown_customer_has_empty_digest() {
    let profiles = profiles();
    assert!(profiles.transaction_digest("9999").unwrap().is_empty());

    let summary = profiles.spend_summary("9999").unwrap();
    assert_eq!(summary.transactions, 0);
    assert_eq!(summary.avg_spend, None);
    assert_eq!(summary.total_spend, 0.0);
}

#[test]
fn test_spend_summary() {
    let summary = profiles().spend_summary("1002").unwrap();
    assert_eq!(summary.transactions, 2);
    assert_close(summary.total_spend, 48.0);
    assert_close(summary.avg_spend.unwrap(), 24.0);
    assert_close(summary.total_discount, 7.0);
}

#[test]
fn test_customer_profile_and_user_analytics() {
    let profiles = profiles();
    let contact = profiles.customer_profile("1003").unwrap();
    assert_eq!(contact.num_rows(), 1);
    assert_eq!(contact.value(0, "city"), Some(&Value::from("Austin")));
    assert_eq!(contact.value(0, "loyalty_customer"), Some(&Value::Bool(true)));

    let analytics = profiles.user_analytics("1001").unwrap();
    assert_eq!(analytics.num_rows(), 3);
    assert!(analytics
        .column("first_name")
        .unwrap()
        .iter()
        .all(|v| **v == Value::from("Ava")));
}

#[test]
fn test_group_profile_distributions() {
    let group = profiles().group_profile(1001, 1003).unwrap();
    assert_eq!(group.total_users, 3);
    assert_eq!(group.distributions["gender"], vec![bucket("F", 2), bucket("M", 1)]);
    assert_eq!(group.distributions["city"], vec![bucket("Austin", 2), bucket("Denver", 1)]);
    assert_eq!(
        group.distributions["loyalty_customer"],
        vec![bucket("true", 2), bucket("false", 1)]
    );
    // Per-customer means 20, 24 and 36
    assert_close(group.avg_spend.unwrap(), 80.0 / 3.0);
}

#[test]
fn test_group_profile_single_member() {
    let group = profiles().group_profile(1003, 1003).unwrap();
    assert_eq!(group.total_users, 1);
    assert_close(group.avg_spend.unwrap(), 36.0);
}

#[test]
fn test_group_without_sales_has_no_average() {
    let group = profiles().group_profile(1005, 1005).unwrap();
    assert_eq!(group.total_users, 1);
    assert_eq!(group.avg_spend, None);
}

#[test]
fn test_empty_group_is_an_error() {
    let err = profiles().group_profile(3000, 4000).unwrap_err();
    assert_eq!(err, ProfileError::EmptyGroup { start: 3000, end: 4000 });
}

#[test]
fn test_campaign_leaderboard_order() {
    let board = profiles().campaign_leaderboard(10).unwrap();
    let templates: Vec<String> = board
        .column("template_id")
        .unwrap()
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(templates, vec!["T2", "T5", "T1", "T3", "T0", "T4"]);

    let rates: Vec<f64> = board
        .column("success_rate")
        .unwrap()
        .into_iter()
        .filter_map(Value::as_f64)
        .collect();
    assert_eq!(rates, vec![1.0, 1.0, 0.5, 0.25, 0.0, 0.0]);
    assert_eq!(board.value(3, "delivered"), Some(&Value::Int(4)));
}

#[test]
fn test_campaign_leaderboard_top_n() {
    let board = profiles().campaign_leaderboard(3).unwrap();
    assert_eq!(board.num_rows(), 3);
    assert_eq!(board.value(2, "template_id"), Some(&Value::from("T1")));
}

#[test]
fn test_campaign_events() {
    let events = profiles().campaign_events("C1").unwrap();
    assert_eq!(events.num_rows(), 5);
    assert!(profiles().campaign_events("C9").unwrap().is_empty());
}

#[test]
fn test_peak_day_and_top_category() {
    let profiles = profiles();

    let habits = profiles.peak_day_and_top_category("1001").unwrap();
    assert_eq!(habits.peak_day.as_deref(), Some("Monday"));
    // Coffee, Dairy and Home tie; the first purchase wins
    assert_eq!(habits.top_category.as_deref(), Some("Coffee"));

    let habits = profiles.peak_day_and_top_category("1002").unwrap();
    assert_eq!(habits.peak_day.as_deref(), Some("Tuesday"));

    let habits = profiles.peak_day_and_top_category("1004").unwrap();
    assert_eq!(habits.peak_day.as_deref(), Some("Sunday"));
    assert_eq!(habits.top_category, None);
}

#[test]
fn test_habits_without_transactions() {
    let err = profiles().peak_day_and_top_category("2001").unwrap_err();
    assert!(matches!(err, ProfileError::Query(QueryError::EmptyResult(_))));
}

#[test]
fn test_category_catalog_most_expensive_first() {
    let catalog = profiles().category_catalog("Coffee").unwrap();
    assert_eq!(
        catalog.column("description").unwrap(),
        vec![&Value::from("Cold Brew Kit"), &Value::from("Espresso Beans")]
    );
}

#[test]
fn test_sales_history_for_one_customer() {
    let history = profiles().sales_history(Some("1001")).unwrap();
    assert_eq!(
        history.column("sales_id").unwrap(),
        vec![&Value::from("S1"), &Value::from("S2"), &Value::from("S3")]
    );
    assert_eq!(history.value(0, "first_name"), Some(&Value::from("Ava")));

    assert!(profiles().sales_history(Some("2001")).unwrap().is_empty());
}

#[test]
fn test_sales_history_drops_unknown_customers() {
    let store = load_store();
    let profiles = ProfileAggregator::new(QueryEngine::new(store.clone()));
    assert_eq!(profiles.sales_history(None).unwrap().num_rows(), 7);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "cid,first_name,last_name,gender,city,loyalty_customer").unwrap();
    writeln!(file, "1001,Ava,Stone,F,Austin,true").unwrap();
    writeln!(file, "1002,Ben,Okafor,M,Denver,false").unwrap();
    file.flush().unwrap();
    store.reload("contacts", &SourceLocator::csv(file.path())).unwrap();

    let history = profiles.sales_history(None).unwrap();
    assert_eq!(
        history.column("sales_id").unwrap(),
        vec![
            &Value::from("S1"),
            &Value::from("S4"),
            &Value::from("S5"),
            &Value::from("S2"),
            &Value::from("S3"),
        ]
    );
    assert!(profiles.sales_history(Some("1004")).unwrap().is_empty());
}
