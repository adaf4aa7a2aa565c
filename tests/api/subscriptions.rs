use std::time::Duration;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, body_json, header as header_eq, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{stored_row, TestApp};

/// Any request reaching the store fails the test when the mock server is dropped.
async fn expect_no_store_calls(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&app.store_server)
        .await;
}

#[tokio::test]
async fn subscribe_with_email_ok() -> Result<()> {
    let app = TestApp::spawn().await?;
    let row = stored_row(Some("a@b.com"), None, "email");

    Mock::given(method("POST"))
        .and(path("/rest/v1/subscriptions"))
        .and(header_eq("Prefer", "return=representation"))
        .and(body_json(json!({
            "email": "a@b.com",
            "subscription_type": "email",
            "is_active": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_subscribe(&json!({"email": "a@b.com", "subscription_type": "email"}))
        .await?;

    assert_eq!(
        res.status(),
        StatusCode::OK,
        "Wrong response StatusCode: {}",
        res.status()
    );
    let body: Value = res.json().await?;
    assert_eq!(Some(&json!(true)), body.get("success"));
    assert_eq!(Some(&json!("Successfully subscribed")), body.get("message"));
    assert_eq!(Some(&json!([row])), body.get("data"));
    assert_eq!(Some(&json!(true)), body["data"][0].get("is_active"));

    Ok(())
}

#[tokio::test]
async fn subscribe_with_phone_only_omits_email() -> Result<()> {
    let app = TestApp::spawn().await?;
    let row = stored_row(None, Some("+1 (555) 123-4567"), "sms");

    Mock::given(method("POST"))
        .and(path("/rest/v1/subscriptions"))
        .and(body_json(json!({
            "phone_number": "+1 (555) 123-4567",
            "subscription_type": "sms",
            "is_active": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_subscribe(&json!({
            "email": null,
            "phone_number": "+1 (555) 123-4567",
            "subscription_type": "sms"
        }))
        .await?;

    assert_eq!(StatusCode::OK, res.status());

    Ok(())
}

#[tokio::test]
async fn subscribe_without_contact_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_store_calls(&app).await;

    let cases = [
        (json!({"subscription_type": "email"}), "No contact"),
        (
            json!({"email": "", "phone_number": "", "subscription_type": "both"}),
            "Empty contacts",
        ),
        (json!({"email": null, "subscription_type": "sms"}), "Null email"),
        (json!({}), "Empty json"),
    ];

    for (body, description) in cases {
        let res = app.post_subscribe(&body).await?;
        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "Wrong response for request with: {description}"
        );
        let body: Value = res.json().await?;
        assert_eq!(
            json!({"success": false, "message": "Email or phone number is required"}),
            body,
            "Wrong body for request with: {description}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_with_invalid_subscription_type_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_store_calls(&app).await;

    let cases = [
        (json!({"email": "a@b.com"}), "Missing type"),
        (json!({"email": "a@b.com", "subscription_type": null}), "Null type"),
        (json!({"email": "a@b.com", "subscription_type": "fax"}), "Unknown type"),
        (json!({"phone_number": "555", "subscription_type": "SMS"}), "Uppercase type"),
    ];

    for (body, description) in cases {
        let res = app.post_subscribe(&body).await?;
        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "Wrong response for request with: {description}"
        );
        let body: Value = res.json().await?;
        assert_eq!(Some(&json!("Invalid subscription type")), body.get("message"));
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_with_invalid_formats_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_store_calls(&app).await;

    let cases = [
        (
            json!({"email": "not-an-email", "subscription_type": "email"}),
            "Invalid email format",
        ),
        (
            json!({"email": "not-an-email", "phone_number": "5551234567", "subscription_type": "both"}),
            "Invalid email format",
        ),
        (
            json!({"phone_number": "abc", "subscription_type": "sms"}),
            "Invalid phone number format",
        ),
        (
            json!({"email": "a@b.com", "phone_number": "abc", "subscription_type": "both"}),
            "Invalid phone number format",
        ),
    ];

    for (body, expected_message) in cases {
        let res = app.post_subscribe(&body).await?;
        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "{body}");
        let res_body: Value = res.json().await?;
        assert_eq!(
            json!({"success": false, "message": expected_message}),
            res_body,
            "{body}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_with_malformed_body_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_store_calls(&app).await;

    let malformed_json = app
        .http_client
        .post(app.url("/subscribe"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{\"email\": ")
        .send()
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, malformed_json.status());

    let wrong_type = app
        .post_subscribe(&json!({"email": 42, "subscription_type": "email"}))
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, wrong_type.status());
    let body: Value = wrong_type.json().await?;
    assert_eq!(Some(&json!(false)), body.get("success"));
    assert_eq!(Some(&json!("Invalid request body")), body.get("message"));
    assert!(body.get("details").is_some_and(Value::is_string));

    let no_content_type = app
        .http_client
        .post(app.url("/subscribe"))
        .body(r#"{"email": "a@b.com", "subscription_type": "email"}"#)
        .send()
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, no_content_type.status());

    Ok(())
}

#[tokio::test]
async fn subscribe_duplicate_is_409() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/rest/v1/subscriptions"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (email)=(a@b.com) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"subscriptions_email_key\""
        })))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_subscribe(&json!({"email": "a@b.com", "subscription_type": "email"}))
        .await?;

    assert_eq!(StatusCode::CONFLICT, res.status());
    let body: Value = res.json().await?;
    assert_eq!(
        json!({
            "success": false,
            "message": "This email or phone number is already subscribed"
        }),
        body
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_store_error_is_500_with_details() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/rest/v1/subscriptions"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "42P01",
            "details": null,
            "hint": null,
            "message": "relation \"public.subscriptions\" does not exist"
        })))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_subscribe(&json!({"email": "a@b.com", "subscription_type": "email"}))
        .await?;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: Value = res.json().await?;
    assert_eq!(
        json!({
            "success": false,
            "message": "Database error",
            "details": "relation \"public.subscriptions\" does not exist"
        }),
        body
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_unreachable_store_is_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    // Longer than the store client's timeout.
    let response = ResponseTemplate::new(201)
        .set_body_json(json!([]))
        .set_delay(Duration::from_secs(180));

    Mock::given(any())
        .respond_with(response)
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_subscribe(&json!({"phone_number": "5551234567", "subscription_type": "sms"}))
        .await?;

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());
    let body: Value = res.json().await?;
    assert_eq!(
        json!({"success": false, "message": "Unexpected server error"}),
        body
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_twice_inserts_twice() -> Result<()> {
    let app = TestApp::spawn().await?;
    let row = stored_row(Some("a@b.com"), None, "email");

    Mock::given(path("/rest/v1/subscriptions"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .expect(2)
        .mount(&app.store_server)
        .await;

    let body = json!({"email": "a@b.com", "subscription_type": "email"});
    for _ in 0..2 {
        let res = app.post_subscribe(&body).await?;
        assert_eq!(StatusCode::OK, res.status());
    }

    Ok(())
}

#[tokio::test]
async fn error_responses_keep_request_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_store_calls(&app).await;

    let res = app
        .post_subscribe(&json!({"subscription_type": "email"}))
        .await?;

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    assert!(res.headers().contains_key("x-request-id"));

    Ok(())
}
