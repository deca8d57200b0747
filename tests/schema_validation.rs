//! Schema validation tests for ActivityPub documents
//!
//! Documents served by the API are checked against the draft-07 schemas
//! in tests/schemas.

mod common;

use common::TestServer;
use common::schema_validator::{load_test_schema, validate_against_schema};
use reqwest::Method;
use serde_json::{Value, json};

async fn get_json(server: &TestServer, path: &str) -> Value {
    let response = server.client.get(server.url(path)).send().await.unwrap();
    assert!(
        response.status().is_success(),
        "GET {} failed with {}",
        path,
        response.status()
    );
    response.json().await.unwrap()
}

fn check(json: &Value, schema_name: &str) {
    let schema = load_test_schema(schema_name);
    match validate_against_schema(json, &schema) {
        Ok(_) => println!("✓ {} schema validation passed", schema_name),
        Err(errors) => {
            eprintln!("✗ {} schema validation failed:", schema_name);
            for error in &errors {
                eprintln!("  - {}", error);
            }
            eprintln!(
                "\nActual response:\n{}",
                serde_json::to_string_pretty(json).unwrap()
            );
            panic!("Schema validation failed with {} errors", errors.len());
        }
    }
}

#[tokio::test]
async fn test_actor_schema_by_username_and_id() {
    let server = TestServer::new().await;
    let actor = server.create_actor("alice").await;

    check(&get_json(&server, "/users/alice").await, "actor");
    check(&get_json(&server, &actor.actor_url()).await, "actor");
}

#[tokio::test]
async fn test_actor_schema_after_profile_update() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let body = json!({ "display_name": "Alice", "actor_type": "Service" }).to_string();
    let response = server
        .signed(Method::PATCH, "/users/alice/", "alice", &body)
        .await
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let json = get_json(&server, "/users/alice").await;
    check(&json, "actor");
    assert_eq!(json["type"], "Service");
}

#[tokio::test]
async fn test_outbox_schema_with_object_activities() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let object = server
        .state
        .objects
        .create("alice", Some("Article"), "<b>draft</b>")
        .await
        .unwrap();
    server
        .state
        .objects
        .delete("alice", &object.id)
        .await
        .unwrap();

    let json = get_json(&server, "/users/alice/outbox").await;
    check(&json, "outbox");
    assert_eq!(json["orderedItems"][0]["object"]["type"], "Tombstone");
}

#[tokio::test]
async fn test_object_schema() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let object = server
        .state
        .objects
        .create("alice", None, "hello")
        .await
        .unwrap();

    let json = get_json(&server, &object.object_url()).await;
    check(&json, "object");
    assert_eq!(json["type"], "Note");
}

#[tokio::test]
async fn test_webfinger_schema() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let json = get_json(
        &server,
        "/.well-known/webfinger?resource=acct:alice@test.example.com",
    )
    .await;
    check(&json, "webfinger");
}
