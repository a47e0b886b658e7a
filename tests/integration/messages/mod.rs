//! Message send integration tests

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{assertions::assert_error_code, authed_request, parse_body, MessagingTestApp};

async fn post_message(app: &MessagingTestApp, jwt: &str, body: Value) -> (StatusCode, Value) {
    let req = authed_request(Method::POST, "/v1/messages", jwt, Some(body));
    let resp = app.test_router().oneshot(req).await.unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

#[tokio::test]
async fn test_send_returns_joined_message() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    let listing = app.create_property(&landlord, "Garden studio");

    let (status, body) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({
            "receiver_id": landlord.id(),
            "property_id": listing.id,
            "content": "  Is the garden shared?  ",
            "phone_number": "+1 555 0100"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "Is the garden shared?");
    assert_eq!(body["sender_id"], student.id().to_string());
    assert_eq!(body["receiver"]["id"], landlord.id().to_string());
    assert_eq!(body["property"]["title"], "Garden studio");
    assert_eq!(body["phone_number"], "+1 555 0100");
    assert_eq!(body["read"], false);
    assert_eq!(body["is_outgoing"], true);
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_sent_message_appears_in_both_inboxes() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");

    let (status, _) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"receiver_id": landlord.id(), "content": "General question"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for (viewer, counterpart) in [(&student, &landlord), (&landlord, &student)] {
        let req = authed_request(Method::GET, "/v1/inbox", &app.jwt_for(viewer), None);
        let body = parse_body(app.test_router().oneshot(req).await.unwrap()).await;
        assert_eq!(
            body["conversations"][0]["id"],
            format!("no-property_{}", counterpart.id())
        );
    }
}

#[tokio::test]
async fn test_whitespace_only_content_rejected() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");

    let (status, body) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"receiver_id": landlord.id(), "content": "   \n  "}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_code(&body, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_empty_and_oversized_content_rejected() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    let jwt = app.jwt_for(&student);

    for content in [String::new(), "x".repeat(5001)] {
        let (status, _) = post_message(
            &app,
            &jwt,
            json!({"receiver_id": landlord.id(), "content": content}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_padded_content_at_limit_accepted() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");

    let padded = format!("   {}   ", "x".repeat(5000));
    let (status, body) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"receiver_id": landlord.id(), "content": padded}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"].as_str().unwrap().chars().count(), 5000);
}

#[tokio::test]
async fn test_message_to_self_rejected() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");

    let (status, body) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"receiver_id": student.id(), "content": "memo"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("yourself"));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");

    let (status, body) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"content": "missing receiver"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_code(&body, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_store_outage_keeps_nothing() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    app.store.set_offline(true);

    let (status, _) = post_message(
        &app,
        &app.jwt_for(&student),
        json!({"receiver_id": landlord.id(), "content": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.store.set_offline(false);
    let req = authed_request(Method::GET, "/v1/inbox", &app.jwt_for(&student), None);
    let body = parse_body(app.test_router().oneshot(req).await.unwrap()).await;
    assert!(body["conversations"].as_array().unwrap().is_empty());
}
