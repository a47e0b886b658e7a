//! Inbox handler integration tests

use axum::http::{Method, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{assertions::assert_error_code, authed_request, parse_body, MessagingTestApp};

async fn get_json(app: &MessagingTestApp, uri: &str, jwt: &str) -> (StatusCode, Value) {
    let req = authed_request(Method::GET, uri, jwt, None);
    let resp = app.test_router().oneshot(req).await.unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_get_inbox {
    use super::*;

    #[tokio::test]
    async fn test_groups_by_property_and_counterpart() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let landlord = app.create_landlord("Lee");
        let other = app.create_landlord("Lou");
        let listing = app.create_property(&landlord, "Two-bed near campus");

        app.seed_message(&student, &landlord, Some(&listing), "Is it free?", 10);
        app.seed_message(&landlord, &student, Some(&listing), "Yes", 20);
        app.seed_message(&student, &other, None, "Any rooms?", 15);

        let jwt = app.jwt_for(&student);
        let (status, body) = get_json(&app, "/v1/inbox", &jwt).await;
        assert_eq!(status, StatusCode::OK);

        let conversations = body["conversations"].as_array().unwrap();
        assert_eq!(conversations.len(), 2);

        assert_eq!(
            conversations[0]["id"],
            format!("{}_{}", listing.id, landlord.id())
        );
        assert_eq!(conversations[0]["title"], "Two-bed near campus");
        assert_eq!(conversations[0]["counterpart_name"], "Lee");
        assert_eq!(conversations[0]["message_count"], 2);
        assert_eq!(conversations[0]["unread_count"], 1);
        assert_eq!(conversations[0]["last_message"]["content"], "Yes");
        assert_eq!(conversations[0]["last_message"]["is_outgoing"], false);

        assert_eq!(
            conversations[1]["id"],
            format!("no-property_{}", other.id())
        );
        assert_eq!(conversations[1]["title"], "General Inquiry");
        assert_eq!(conversations[1]["last_message"]["is_outgoing"], true);

        assert_eq!(body["unread_total"], 1);
    }

    #[tokio::test]
    async fn test_both_sides_see_the_same_thread() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let landlord = app.create_landlord("Lee");
        let listing = app.create_property(&landlord, "Loft");
        app.seed_message(&student, &landlord, Some(&listing), "Hello", 1);

        let (_, body) = get_json(&app, "/v1/inbox", &app.jwt_for(&landlord)).await;
        let conversations = body["conversations"].as_array().unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(
            conversations[0]["id"],
            format!("{}_{}", listing.id, student.id())
        );
        assert_eq!(conversations[0]["counterpart"]["id"], student.id().to_string());
        assert_eq!(body["unread_total"], 1);
    }

    #[tokio::test]
    async fn test_messages_with_missing_counterpart_are_dropped() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let landlord = app.create_landlord("Lee");
        app.seed_message(&landlord, &student, None, "kept", 1);

        // Sender profile was never created
        let ghost = Uuid::new_v4();
        let new_message =
            campusnest_messaging::NewMessage::new(ghost, student.id(), None, "orphan", None)
                .unwrap();
        app.store.insert_at(&new_message, crate::common::at(2));

        let (_, body) = get_json(&app, "/v1/inbox", &app.jwt_for(&student)).await;
        let conversations = body["conversations"].as_array().unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0]["message_count"], 1);
    }

    #[tokio::test]
    async fn test_empty_inbox() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");

        let (status, body) = get_json(&app, "/v1/inbox", &app.jwt_for(&student)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["conversations"].as_array().unwrap().is_empty());
        assert_eq!(body["unread_total"], 0);
    }

    #[tokio::test]
    async fn test_store_outage_is_503() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        app.store.set_offline(true);

        let (status, body) = get_json(&app, "/v1/inbox", &app.jwt_for(&student)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_error_code(&body, "SERVICE_UNAVAILABLE");
    }
}

mod test_get_conversation {
    use super::*;

    #[tokio::test]
    async fn test_messages_ascending() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let landlord = app.create_landlord("Lee");
        let listing = app.create_property(&landlord, "Loft");
        app.seed_message(&landlord, &student, Some(&listing), "third", 30);
        app.seed_message(&student, &landlord, Some(&listing), "first", 10);
        app.seed_message(&landlord, &student, Some(&listing), "second", 20);
        // Same counterpart, different listing context
        app.seed_message(&landlord, &student, None, "elsewhere", 25);

        let key = format!("{}_{}", listing.id, landlord.id());
        let (status, body) = get_json(
            &app,
            &format!("/v1/inbox/conversations/{}", key),
            &app.jwt_for(&student),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], key);

        let contents: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_malformed_key_is_400() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");

        let (status, body) = get_json(
            &app,
            "/v1/inbox/conversations/not-a-key",
            &app.jwt_for(&student),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_code(&body, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_key_is_404() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");

        let (status, body) = get_json(
            &app,
            &format!("/v1/inbox/conversations/no-property_{}", Uuid::new_v4()),
            &app.jwt_for(&student),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_error_code(&body, "NOT_FOUND");
    }
}

mod test_mark_read {
    use super::*;

    #[tokio::test]
    async fn test_marks_only_incoming_unread() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let landlord = app.create_landlord("Lee");
        app.seed_message(&landlord, &student, None, "one", 1);
        app.seed_message(&landlord, &student, None, "two", 2);
        app.seed_message(&student, &landlord, None, "mine", 3);

        let jwt = app.jwt_for(&student);
        let uri = format!("/v1/inbox/conversations/no-property_{}/read", landlord.id());

        let req = authed_request(Method::POST, &uri, &jwt, None);
        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await["marked"], 2);

        let (_, unread) = get_json(&app, "/v1/inbox/unread", &jwt).await;
        assert_eq!(unread["unread"], 0);

        // The landlord's own unread message is untouched
        let (_, unread) = get_json(&app, "/v1/inbox/unread", &app.jwt_for(&landlord)).await;
        assert_eq!(unread["unread"], 1);

        // Idempotent
        let req = authed_request(Method::POST, &uri, &jwt, None);
        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(parse_body(resp).await["marked"], 0);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_404() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let uri = format!("/v1/inbox/conversations/no-property_{}/read", Uuid::new_v4());

        let req = authed_request(Method::POST, &uri, &app.jwt_for(&student), None);
        let resp = app.test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

mod test_unread {
    use super::*;

    #[tokio::test]
    async fn test_counts_across_conversations() {
        let app = MessagingTestApp::new();
        let student = app.create_student("Una");
        let a = app.create_landlord("Ari");
        let b = app.create_landlord("Bo");
        let listing = app.create_property(&a, "Flat");
        app.seed_message(&a, &student, Some(&listing), "x", 1);
        app.seed_message(&a, &student, None, "y", 2);
        app.seed_message(&b, &student, None, "z", 3);
        app.seed_message(&student, &b, None, "reply", 4);

        let (status, body) = get_json(&app, "/v1/inbox/unread", &app.jwt_for(&student)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unread"], 3);
    }
}
