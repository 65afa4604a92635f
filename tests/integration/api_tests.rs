//! API integration tests
//!
//! These run against a live server with an `admin` superuser whose password
//! is `admin` (set `CATALOG_AUTH__ADMIN_PASSWORD=admin` on first start).

use chrono::{Duration, Local};
use reqwest::{header::COOKIE, header::SET_COOKIE, Client};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in and return the bearer header value
async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    format!("Bearer {}", body["token"].as_str().expect("No token in response"))
}

async fn get_auth_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

async fn create(client: &Client, token: &str, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .header("Authorization", token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201, "creating {}", path);
    response.json().await.expect("Failed to parse response")
}

async fn delete(client: &Client, token: &str, path: &str) {
    let response = client
        .delete(format!("{}{}", BASE_URL, path))
        .header("Authorization", token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204, "deleting {}", path);
}

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, &Uuid::new_v4().simple().to_string()[..8])
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
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"]["password"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_home_counts_visits() {
    let client = Client::new();

    let first = client
        .get(format!("{}/home", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());
    let cookie = first
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("No session cookie")
        .to_string();
    let body: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(body["number_of_visits"], 0);
    assert!(body["number_of_books"].is_i64());

    let second: Value = client
        .get(format!("{}/home", BASE_URL))
        .header(COOKIE, cookie)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["number_of_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_list_authors_paginated() {
    let client = Client::new();

    let response = client
        .get(format!("{}/authors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    assert!(body["items"].as_array().expect("items").len() <= 10);

    let response = client
        .get(format!("{}/authors?page=100000", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_my_books_requires_login() {
    let client = Client::new();

    let response = client
        .get(format!("{}/mybooks", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_genre_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let name = unique("Genre");
    let genre = create(&client, &token, "/genres", json!({ "name": name })).await;

    let response = client
        .post(format!("{}/genres", BASE_URL))
        .header("Authorization", &token)
        .json(&json!({ "name": name.to_uppercase() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Genre already exists");

    delete(&client, &token, &format!("/genres/{}", genre["id"])).await;
}

#[tokio::test]
#[ignore]
async fn test_loan_and_renewal_flow() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", &token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let genre = create(&client, &token, "/genres", json!({ "name": unique("Genre") })).await;
    let author = create(
        &client,
        &token,
        "/authors",
        json!({ "first_name": "John", "last_name": unique("Smith") }),
    )
    .await;
    let isbn = format!("{:013}", Local::now().timestamp_micros() % 10_000_000_000_000);
    let book = create(
        &client,
        &token,
        "/books",
        json!({
            "title": "Book Title",
            "summary": "My book summary",
            "isbn": isbn,
            "author_ids": [author["id"]],
            "genre_ids": [genre["id"]]
        }),
    )
    .await;
    assert_eq!(book["display_genre"], genre["name"]);

    let today = Local::now().date_naive();
    let copy = create(
        &client,
        &token,
        "/bookinstances",
        json!({
            "book_id": book["id"],
            "due_back": (today - Duration::days(5)).to_string(),
            "status": "o",
            "borrower_id": me["id"]
        }),
    )
    .await;
    assert_eq!(copy["is_overdue"], true);
    let copy_path = format!("/bookinstances/{}", copy["id"].as_str().expect("copy id"));

    let mine: Value = client
        .get(format!("{}/mybooks", BASE_URL))
        .header("Authorization", &token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(mine["items"]
        .as_array()
        .expect("items")
        .iter()
        .any(|item| item["id"] == copy["id"]));

    let form: Value = client
        .get(format!("{}{}/renew", BASE_URL, copy_path))
        .header("Authorization", &token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(
        form["proposed_renewal_date"],
        (today + Duration::weeks(3)).to_string()
    );

    for (date, message) in [
        (today - Duration::days(1), "Invalid date - renewal in past"),
        (
            today + Duration::weeks(4) + Duration::days(1),
            "Invalid date - renewal more than 4 weeks ahead",
        ),
    ] {
        let response = client
            .post(format!("{}{}/renew", BASE_URL, copy_path))
            .header("Authorization", &token)
            .json(&json!({ "renewal_date": date.to_string() }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["message"], message);
    }

    let renewed_until = today + Duration::weeks(2);
    let response = client
        .post(format!("{}{}/renew", BASE_URL, copy_path))
        .header("Authorization", &token)
        .json(&json!({ "renewal_date": renewed_until.to_string() }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let renewed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(renewed["due_back"], renewed_until.to_string());
    assert_eq!(renewed["is_overdue"], false);

    // A book with copies cannot be deleted
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book["id"]))
        .header("Authorization", &token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    delete(&client, &token, &copy_path).await;
    delete(&client, &token, &format!("/books/{}", book["id"])).await;
    delete(&client, &token, &format!("/authors/{}", author["id"])).await;
    delete(&client, &token, &format!("/genres/{}", genre["id"])).await;
}

#[tokio::test]
#[ignore]
async fn test_permission_required_for_catalog_edits() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let username = unique("reader").replace(' ', "_");
    let user = create(
        &client,
        &token,
        "/users",
        json!({ "username": username, "password": "1X<ISRUkw+tuK" }),
    )
    .await;

    let reader = login(&client, &username, "1X<ISRUkw+tuK").await;
    let response = client
        .post(format!("{}/genres", BASE_URL))
        .header("Authorization", &reader)
        .json(&json!({ "name": unique("Genre") }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/borrowed", BASE_URL))
        .header("Authorization", &reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/mybooks", BASE_URL))
        .header("Authorization", &reader)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    delete(&client, &token, &format!("/users/{}", user["id"])).await;
}

async fn get_json(client: &Client, token: &str, path: &str) -> (u16, Value) {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .header("Authorization", token)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn create_user(client: &Client, token: &str, permissions: Value) -> (Value, String) {
    let username = unique("reader").replace(' ', "_");
    let user = create(
        client,
        token,
        "/users",
        json!({ "username": username, "password": "1X<ISRUkw+tuK", "permissions": permissions }),
    )
    .await;
    let user_token = login(client, &username, "1X<ISRUkw+tuK").await;
    (user, user_token)
}

/// Due dates are non-decreasing and copies without one come last
fn assert_due_back_order(items: &[Value]) {
    let dates: Vec<Option<&str>> = items.iter().map(|item| item["due_back"].as_str()).collect();
    for pair in dates.windows(2) {
        match (pair[0], pair[1]) {
            (Some(a), Some(b)) => assert!(a <= b, "{} listed before {}", a, b),
            (None, Some(b)) => panic!("undated copy listed before {}", b),
            _ => {}
        }
    }
}

#[tokio::test]
#[ignore]
async fn test_author_form_and_genre_validation() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let (status, form) = get_json(&client, &token, "/author-form").await;
    assert_eq!(status, 200);
    assert_eq!(form["date_of_death"], "2016-12-10");

    let response = client
        .post(format!("{}/genres", BASE_URL))
        .header("Authorization", &token)
        .json(&json!({ "name": "" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_genres_conflict() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let name = unique("Genre");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            let token = token.clone();
            let name = if i % 2 == 0 { name.to_uppercase() } else { name.to_lowercase() };
            tokio::spawn(async move {
                let response = client
                    .post(format!("{}/genres", BASE_URL))
                    .header("Authorization", &token)
                    .json(&json!({ "name": name }))
                    .send()
                    .await
                    .expect("Failed to send request");
                let status = response.status().as_u16();
                let body: Value = response.json().await.expect("Failed to parse response");
                (status, body)
            })
        })
        .collect();

    let mut created = Vec::new();
    for handle in handles {
        let (status, body) = handle.await.expect("request task panicked");
        match status {
            201 => created.push(body),
            409 => assert_eq!(body["message"], "Genre already exists"),
            other => panic!("unexpected status {}: {}", other, body),
        }
    }
    assert_eq!(created.len(), 1);

    delete(&client, &token, &format!("/genres/{}", created[0]["id"])).await;
}

#[tokio::test]
#[ignore]
async fn test_revoked_permission_applies_immediately() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (user, librarian) = create_user(&client, &token, json!(["can_mark_returned"])).await;

    let genre = create(&client, &librarian, "/genres", json!({ "name": unique("Genre") })).await;
    delete(&client, &librarian, &format!("/genres/{}", genre["id"])).await;

    let response = client
        .put(format!("{}/users/{}/permissions", BASE_URL, user["id"]))
        .header("Authorization", &token)
        .json(&json!({ "permissions": [] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/genres", BASE_URL))
        .header("Authorization", &librarian)
        .json(&json!({ "name": unique("Genre") }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    delete(&client, &token, &format!("/users/{}", user["id"])).await;

    let (status, _) = get_json(&client, &librarian, "/mybooks").await;
    assert_eq!(status, 401);
}

#[tokio::test]
#[ignore]
async fn test_borrowed_lists_only_loans_ordered_by_due_back() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let (reader, reader_token) = create_user(&client, &token, json!([])).await;
    let (other, _) = create_user(&client, &token, json!([])).await;

    let genre = create(&client, &token, "/genres", json!({ "name": unique("Genre") })).await;
    let author = create(
        &client,
        &token,
        "/authors",
        json!({ "first_name": "John", "last_name": unique("Smith") }),
    )
    .await;
    let isbn = format!("{:013}", Local::now().timestamp_micros() % 10_000_000_000_000);
    let book = create(
        &client,
        &token,
        "/books",
        json!({
            "title": "Book Title",
            "summary": "My book summary",
            "isbn": isbn,
            "author_ids": [author["id"]],
            "genre_ids": [genre["id"]]
        }),
    )
    .await;

    let today = Local::now().date_naive();
    let mut copies = Vec::new();
    let lend = |due_back: Option<i64>, status: &str, borrower: &Value| {
        json!({
            "book_id": book["id"],
            "due_back": due_back.map(|days| (today + Duration::days(days)).to_string()),
            "status": status,
            "borrower_id": borrower["id"]
        })
    };

    // The reader's loans, created out of due-date order
    let mut expected = Vec::new();
    for body in [
        lend(Some(3), "o", &reader),
        lend(None, "o", &reader),
        lend(Some(1), "o", &reader),
    ] {
        let copy = create(&client, &token, "/bookinstances", body).await;
        expected.push(copy["id"].clone());
        copies.push(copy);
    }
    // Held by the reader but not on loan, and on loan to someone else
    copies.push(create(&client, &token, "/bookinstances", lend(Some(2), "m", &reader)).await);
    for days in 0..10 {
        copies.push(create(&client, &token, "/bookinstances", lend(Some(days), "o", &other)).await);
    }

    let (status, mine) = get_json(&client, &reader_token, "/mybooks").await;
    assert_eq!(status, 200);
    let ids: Vec<Value> = mine["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["id"].clone())
        .collect();
    assert_eq!(ids, vec![expected[2].clone(), expected[0].clone(), expected[1].clone()]);
    assert!(mine["items"]
        .as_array()
        .expect("items")
        .iter()
        .all(|item| item["status"] == "o" && item["borrower_id"] == reader["id"]));
    assert_eq!(mine["is_paginated"], false);

    let (status, _) = get_json(&client, &reader_token, "/mybooks?page=2").await;
    assert_eq!(status, 404);

    // Thirteen loans at least: the full list spans two pages
    let (status, first) = get_json(&client, &token, "/borrowed").await;
    assert_eq!(status, 200);
    assert_eq!(first["items"].as_array().expect("items").len(), 10);
    assert!(first["num_pages"].as_i64().expect("num_pages") >= 2);
    assert_due_back_order(first["items"].as_array().expect("items"));

    let (status, second) = get_json(&client, &token, "/borrowed?page=2").await;
    assert_eq!(status, 200);
    assert_eq!(second["page"], 2);
    let second_items = second["items"].as_array().expect("items");
    assert!(!second_items.is_empty());
    assert!(second_items.iter().all(|item| item["status"] == "o"));
    assert_due_back_order(second_items);

    for copy in &copies {
        delete(&client, &token, &format!("/bookinstances/{}", copy["id"].as_str().expect("copy id"))).await;
    }
    delete(&client, &token, &format!("/books/{}", book["id"])).await;
    delete(&client, &token, &format!("/authors/{}", author["id"])).await;
    delete(&client, &token, &format!("/genres/{}", genre["id"])).await;
    delete(&client, &token, &format!("/users/{}", reader["id"])).await;
    delete(&client, &token, &format!("/users/{}", other["id"])).await;
}
