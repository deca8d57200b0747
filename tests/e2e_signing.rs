//! E2E tests for request verification and response signing

mod common;

use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use socialize::federation::verify_payload;

#[tokio::test]
async fn test_unsigned_request_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.create_actor("alice").await;

    let response = server
        .client
        .post(server.url("/users/alice/inbox/"))
        .header("Content-Type", "application/json")
        .body(r#"{"type":"Like"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json, json!({ "error": "Invalid signature" }));

    assert!(
        server
            .state
            .db
            .get_activities_for_actor(&alice.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_signature_without_username_is_rejected() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let body = r#"{"type":"Like"}"#;
    let signature = server.sign_as("alice", body).await;
    let response = server
        .client
        .post(server.url("/users/alice/inbox/"))
        .header("Signature", signature)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signature_over_different_body_is_rejected() {
    let server = TestServer::new().await;
    let alice = server.create_actor("alice").await;

    let signature = server.sign_as("alice", r#"{"type":"Like"}"#).await;
    let response = server
        .client
        .post(server.url("/users/alice/inbox/"))
        .header("Username", "alice")
        .header("Signature", signature)
        .body(r#"{"type":"Delete"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "Invalid signature");
    assert!(
        server
            .state
            .db
            .get_activities_for_actor(&alice.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_signature_claimed_for_another_actor_is_rejected() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;
    server.create_actor("mallory").await;

    let body = r#"{"type":"Like"}"#;
    let signature = server.sign_as("mallory", body).await;
    let response = server
        .client
        .post(server.url("/users/alice/inbox/"))
        .header("Username", "alice")
        .header("Signature", signature)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signature_from_unknown_actor_is_rejected() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let response = server
        .client
        .post(server.url("/users/alice/inbox/"))
        .header("Username", "ghost")
        .header("Signature", "c2lnbmF0dXJl")
        .body(r#"{"type":"Like"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_response_is_signed_by_request_signer() {
    let server = TestServer::new().await;
    let alice = server.create_actor("alice").await;

    let response = server
        .signed(Method::POST, "/users/alice/inbox/", "alice", r#"{"type":"Like"}"#)
        .await
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let headers = response.headers().clone();
    assert_eq!(headers.get("username").unwrap(), "alice");
    let signature = headers
        .get("signature")
        .expect("response carries a signature")
        .to_str()
        .unwrap()
        .to_string();

    let body = response.bytes().await.unwrap();
    assert!(verify_payload(&alice.public_key, &signature, &body));
    assert!(!verify_payload(&alice.public_key, &signature, b"tampered"));
}

#[tokio::test]
async fn test_error_responses_are_signed_too() {
    let server = TestServer::new().await;
    let alice = server.create_actor("alice").await;

    let response = server
        .signed(Method::POST, "/users/alice/inbox/", "alice", "{broken")
        .await
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let signature = response
        .headers()
        .get("signature")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = response.bytes().await.unwrap();
    assert!(verify_payload(&alice.public_key, &signature, &body));
}

#[tokio::test]
async fn test_response_signing_can_be_disabled() {
    let server = TestServer::with_config(|config| {
        config.federation.sign_responses = false;
    })
    .await;
    server.create_actor("alice").await;

    let response = server
        .signed(Method::POST, "/users/alice/inbox/", "alice", r#"{"type":"Like"}"#)
        .await
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().get("signature").is_none());
}

#[tokio::test]
async fn test_safe_methods_skip_signing() {
    let server = TestServer::new().await;
    server.create_actor("alice").await;

    let response = server
        .client
        .get(server.url("/users/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("signature").is_none());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = TestServer::with_config(|config| {
        config.server.max_body_bytes = 1024;
    })
    .await;
    let alice = server.create_actor("alice").await;

    let body = json!({ "type": "Note", "content": "x".repeat(4096) }).to_string();
    let response = server
        .signed(Method::POST, "/users/alice/inbox/", "alice", &body)
        .await
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    assert!(
        server
            .state
            .db
            .get_activities_for_actor(&alice.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_response_larger_than_request_limit_is_signed() {
    let server = TestServer::new().await;
    let alice = server.create_actor("alice").await;

    // Escaping grows "&" to "&amp;", so the stored content outgrows the
    // 64 KiB request cap while the request itself stays under it.
    let body = json!({ "type": "Note", "content": "&".repeat(20_000) }).to_string();
    assert!(body.len() < server.state.config.server.max_body_bytes);

    let response = server
        .signed(Method::POST, "/users/alice/objects/", "alice", &body)
        .await
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let signature = response
        .headers()
        .get("signature")
        .expect("large response is still signed")
        .to_str()
        .unwrap()
        .to_string();
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.len() > server.state.config.server.max_body_bytes);
    assert!(verify_payload(&alice.public_key, &signature, &bytes));

    let created: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(created["content"].as_str().unwrap().starts_with("&amp;&amp;"));

    let activities = server
        .state
        .db
        .get_activities_for_actor(&alice.id)
        .await
        .unwrap();
    assert_eq!(activities.len(), 1);
}
