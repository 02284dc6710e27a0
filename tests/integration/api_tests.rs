//! API tests against a running server

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3001/api";

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .subsec_nanos();
    format!("{}_{}", prefix, nanos)
}

/// Sign up a fresh patron and return (user id, token)
async fn signup_patron(client: &Client) -> (i64, String) {
    let username = unique("patron");
    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse"
        }))
        .send()
        .await
        .expect("Failed to send signup request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse signup response");
    (
        body["user"]["id"].as_i64().expect("No user id in response"),
        body["token"].as_str().expect("No token in response").to_string(),
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_signup_and_login() {
    let client = Client::new();
    let username = unique("login");

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["role"], "patron");
    assert!(body["user"].get("password_hash").is_none());

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "usernameOrEmail": format!("{}@example.com", username),
            "password": "correct horse"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token in response");

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["username"], username.as_str());
}

#[tokio::test]
#[ignore]
async fn test_login_wrong_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "usernameOrEmail": "nobody_here",
            "password": "wrong password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_patron_cannot_create_book() {
    let client = Client::new();
    let (_, token) = signup_patron(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "title": "Kindred", "author": "Octavia E. Butler", "copies": 1 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_checkout_unknown_book() {
    let client = Client::new();
    let (_, token) = signup_patron(&client).await;

    let response = client
        .post(format!("{}/patron/checkout", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "bookId": 2_000_000_000 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_own_checkouts_start_empty() {
    let client = Client::new();
    let (user_id, token) = signup_patron(&client).await;

    let response = client
        .get(format!("{}/patron/checkouts/{}", BASE_URL, user_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}
