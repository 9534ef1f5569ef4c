//! End-to-end tests for the account lifecycle
//!
//! Registration with field-scoped validation, email verification, login
//! with distinguished failure codes and token refresh.

mod common;

use common::{
    TestClient, TestServer, TEST_PASS, TEST_USER, UNVERIFIED_PASS, UNVERIFIED_USER,
};
use reqwest::StatusCode;
use waxlog_server::user::AccountStore;

#[tokio::test]
async fn register_creates_unverified_account() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register("carol", "carol@example.com", "carol-password-1", "carol-password-1")
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "carol");
    assert_eq!(body["verified"], false);

    // A verification mail went out
    assert!(server.mailer.last_token_for("carol@example.com").is_some());
}

#[tokio::test]
async fn register_rejects_password_mismatch_field_scoped() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register("carol", "carol@example.com", "carol-password-1", "different")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["confirm_password"]);

    // No account was created and no mail was sent
    assert!(server
        .user_store
        .get_account_by_username("carol")
        .unwrap()
        .is_none());
    assert!(server.mailer.sent().is_empty());
}

#[tokio::test]
async fn register_rejects_taken_username() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register(TEST_USER, "new@example.com", "carol-password-1", "carol-password-1")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "username");
}

#[tokio::test]
async fn verify_resolves_exactly_once_then_reports_already_verified() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    client
        .register("carol", "carol@example.com", "carol-password-1", "carol-password-1")
        .await;
    let token = server.mailer.last_token_for("carol@example.com").unwrap();

    let response = client.verify(&token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");

    // Idempotent for an already-verified account
    let response = client.verify(&token).await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "already_verified");

    let response = client.verify("made-up-token").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "invalid");
}

#[tokio::test]
async fn login_with_valid_credentials_returns_token_pair() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(client.access_token().is_some());
    assert!(client.refresh_token().is_some());
}

#[tokio::test]
async fn login_with_wrong_password_reports_invalid_credentials() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, "definitely-wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_credentials");
}

#[tokio::test]
async fn login_with_unverified_account_is_distinguished() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // Correct password, unverified account
    let response = client.login(UNVERIFIED_USER, UNVERIFIED_PASS).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "email_not_verified");

    // Wrong password on an unverified account reports the same code
    let response = client.login(UNVERIFIED_USER, "wrong-password").await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "email_not_verified");
}

#[tokio::test]
async fn me_returns_the_authenticated_account() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.me().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], TEST_USER);
    assert!(body["id"].is_number());
}

#[tokio::test]
async fn refresh_returns_a_working_access_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let refresh_token = client.refresh_token().unwrap();
    let response = client.refresh(&refresh_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    let new_access = body["access_token"].as_str().unwrap().to_string();

    client.set_access_token(Some(new_access));
    let response = client.me().await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_garbage_and_access_tokens() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.refresh("not-a-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // An access token must not be usable as a refresh token
    let access_token = client.access_token().unwrap();
    let response = client.refresh(&access_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "token_invalid");
}

#[tokio::test]
async fn full_registration_scenario() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // register -> verify -> login -> me
    let response = client
        .register("dana", "dana@example.com", "dana-password-1", "dana-password-1")
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let token = server.mailer.last_token_for("dana@example.com").unwrap();
    let response = client.verify(&token).await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");

    let response = client.login("dana", "dana-password-1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.me().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "dana");
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.me().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "token_invalid");
}
