//! Htable adapter tests against a mock upstream

mod common;

use common::{error, ok, MockUpstream};
use kamrpc_client::{ClientBuilder, KamailioClient, SlotValue, TableQuery};
use kamrpc_core::Error;
use serde_json::{json, Value};

fn client(url: &str) -> KamailioClient {
    ClientBuilder::new(url).build().unwrap()
}

fn users_dump() -> Value {
    json!([
        {"entry": 0, "size": 2, "slot": [
            {"name": "user:alice", "value": "sip:alice@10.0.0.1", "type": "str"},
            {"name": "user:bob", "value": "sip:bob@10.0.0.2", "type": "str"}
        ]},
        {"entry": 3, "size": 1, "slot": [
            {"name": "counter", "value": 42, "type": "int"}
        ]}
    ])
}

#[tokio::test]
async fn test_dump_decodes_slots() {
    let upstream = MockUpstream::start(|_| ok(users_dump())).await;
    let client = client(&upstream.url());

    let entries = client.htable_dump("users").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].slots[1].name, "user:bob");
    assert_eq!(entries[1].slots[0].value, SlotValue::Int("42".into()));
    assert_eq!(entries[1].slots[0].value.as_str(), "42");

    upstream.shutdown();
}

#[tokio::test]
async fn test_dump_without_result_is_empty() {
    let upstream = MockUpstream::start(|_| (200, r#"{"jsonrpc":"2.0","id":"1"}"#.to_string())).await;
    let client = client(&upstream.url());

    assert!(client.htable_dump("empty").await.unwrap().is_empty());

    upstream.shutdown();
}

#[tokio::test]
async fn test_set_forwards_typed_values() {
    let upstream = MockUpstream::start(|_| ok(Value::Null)).await;
    let client = client(&upstream.url());

    client.htable_sets("users", "user:carol", "sip:carol@10.0.0.3").await.unwrap();
    client.htable_seti("users", "counter", 7).await.unwrap();

    let recorded = upstream.recorded();
    assert_eq!(recorded[0].method(), "htable.sets");
    assert_eq!(
        recorded[0].params(),
        &json!({"htable": "users", "key": "user:carol", "value": "sip:carol@10.0.0.3"})
    );
    assert_eq!(recorded[1].method(), "htable.seti");
    assert_eq!(recorded[1].params()["value"], json!(7));

    upstream.shutdown();
}

#[tokio::test]
async fn test_get_reads_item_value() {
    let upstream = MockUpstream::start(|_| ok(json!({"item": {"value": 5}}))).await;
    let client = client(&upstream.url());

    assert_eq!(client.htable_get("users", "counter").await.unwrap(), "5");

    upstream.shutdown();
}

#[tokio::test]
async fn test_get_not_found() {
    let upstream = MockUpstream::start(|_| error(404, 404, "Key not found")).await;
    let client = client(&upstream.url());

    match client.htable_get("users", "nobody").await {
        Err(Error::NotFound(what)) => assert_eq!(what, "users/nobody"),
        other => panic!("Expected NotFound, got {:?}", other),
    }

    upstream.shutdown();
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let upstream = MockUpstream::start(|_| error(404, 404, "Key not found")).await;
    let client = client(&upstream.url());

    client.htable_delete("users", "gone").await.unwrap();
    client.htable_delete("users", "gone").await.unwrap();
    assert_eq!(upstream.methods(), vec!["htable.delete", "htable.delete"]);

    upstream.shutdown();
}

#[tokio::test]
async fn test_delete_other_failures_surface() {
    let upstream = MockUpstream::start(|_| error(500, 500, "locked")).await;
    let client = client(&upstream.url());

    assert!(matches!(
        client.htable_delete("users", "k").await,
        Err(Error::Rpc(_))
    ));

    upstream.shutdown();
}

#[tokio::test]
async fn test_query_filters() {
    let upstream = MockUpstream::start(|_| ok(users_dump())).await;
    let client = client(&upstream.url());

    let by_key = client.htable_query_key_contains("users", "alice").await.unwrap();
    assert_eq!(by_key.len(), 1);
    assert_eq!(by_key[0].slots.len(), 1);
    assert_eq!(by_key[0].slots[0].name, "user:alice");

    let by_value = client.htable_query_value_contains("users", "10.0.0.2").await.unwrap();
    assert_eq!(by_value[0].slots[0].name, "user:bob");

    let by_int = client.htable_query_value_contains("users", "4").await.unwrap();
    assert_eq!(by_int.len(), 1);
    assert_eq!(by_int[0].slots[0].name, "counter");

    assert!(client
        .htable_query_key_contains("users", "ALICE")
        .await
        .unwrap()
        .is_empty());

    upstream.shutdown();
}

#[tokio::test]
async fn test_delete_by_query_continues_past_failures() {
    let upstream = MockUpstream::start(|envelope| match envelope["method"].as_str() {
        Some("htable.dump") => ok(users_dump()),
        Some("htable.delete") if envelope["params"]["key"] == "user:alice" => {
            error(500, 500, "locked")
        }
        _ => ok(Value::Null),
    })
    .await;
    let client = ClientBuilder::new(upstream.url())
        .with_metrics()
        .build()
        .unwrap();

    let report = client
        .htable_delete_by_query("users", &TableQuery::KeyContains("user:".into()))
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.deleted, vec!["user:bob".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "user:alice");
    assert_eq!(
        upstream.methods(),
        vec!["htable.dump", "htable.delete", "htable.delete"]
    );

    upstream.shutdown();
}

#[tokio::test]
async fn test_delete_by_query_fails_when_dump_fails() {
    let upstream = MockUpstream::start(|_| error(500, 500, "no such table")).await;
    let client = client(&upstream.url());

    let result = client
        .htable_delete_by_query("missing", &TableQuery::ValueContains("x".into()))
        .await;
    assert!(result.is_err());
    assert_eq!(upstream.methods(), vec!["htable.dump"]);

    upstream.shutdown();
}
