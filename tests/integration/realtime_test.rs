//! Realtime inbox integration tests
//!
//! Drives inbox sessions through the HTTP API and the in-memory change feed:
//! a message posted by one user reaches the other user's open inbox and
//! overlay without a manual refresh.

#![allow(dead_code)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use campusnest_messaging::{
    ConversationKey, InboxSession, MessagingOverlay, OverlayBus, OverlayEvent, RealtimeRefresh,
    RefreshOutcome, SendOutcome,
};
use serde_json::json;
use tokio::time::timeout;
use tokio_test::assert_ok;
use tower::ServiceExt;

use common::{authed_request, MessagingTestApp};

const WAIT: Duration = Duration::from_secs(2);

#[test_log::test(tokio::test)]
async fn test_posted_message_reaches_open_inbox() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    let listing = app.create_property(&landlord, "Studio");

    let session = Arc::new(InboxSession::new(student.id(), app.store.clone()));
    assert!(session.refresh().await.is_applied());
    let mut versions = session.subscribe();
    let handle = RealtimeRefresh::spawn(session.clone(), app.store.feed());

    let req = authed_request(
        Method::POST,
        "/v1/messages",
        &app.jwt_for(&landlord),
        Some(json!({
            "receiver_id": student.id(),
            "property_id": listing.id,
            "content": "Viewing tomorrow at 10?"
        })),
    );
    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    timeout(WAIT, versions.changed()).await.unwrap().unwrap();
    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.active,
        Some(ConversationKey::new(Some(listing.id), landlord.id()))
    );
    assert_eq!(snapshot.active_messages[0].content, "Viewing tomorrow at 10?");
    assert_eq!(snapshot.unread_total, 1);

    handle.shutdown().await;
}

#[test_log::test(tokio::test)]
async fn test_reply_from_session_reaches_other_side() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    app.seed_message(&landlord, &student, None, "Still looking?", 1);

    let student_inbox = Arc::new(InboxSession::new(student.id(), app.store.clone()));
    let landlord_inbox = Arc::new(InboxSession::new(landlord.id(), app.store.clone()));
    student_inbox.refresh().await;
    landlord_inbox.refresh().await;

    let mut landlord_versions = landlord_inbox.subscribe();
    let _handle = RealtimeRefresh::spawn(landlord_inbox.clone(), app.store.feed());

    student_inbox.set_draft("Yes, is it still free?");
    let outcome = assert_ok!(student_inbox.send().await);
    assert!(matches!(outcome, SendOutcome::Sent(_)));
    assert!(student_inbox.snapshot().draft.is_empty());

    timeout(WAIT, landlord_versions.changed())
        .await
        .unwrap()
        .unwrap();
    let snapshot = landlord_inbox.snapshot();
    assert_eq!(snapshot.active_messages.len(), 2);
    assert_eq!(snapshot.unread_total, 1);
}

#[test_log::test(tokio::test)]
async fn test_mark_read_over_http_clears_session_badge() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    app.seed_message(&landlord, &student, None, "ping", 1);

    let session = Arc::new(InboxSession::new(student.id(), app.store.clone()));
    session.refresh().await;
    assert_eq!(session.unread_total(), 1);

    let mut versions = session.subscribe();
    let _handle = RealtimeRefresh::spawn(session.clone(), app.store.feed());

    let uri = format!("/v1/inbox/conversations/no-property_{}/read", landlord.id());
    let req = authed_request(Method::POST, &uri, &app.jwt_for(&student), None);
    let resp = app.test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    timeout(WAIT, versions.changed()).await.unwrap().unwrap();
    assert_eq!(session.unread_total(), 0);
}

#[test_log::test(tokio::test)]
async fn test_overlay_opened_from_listing_page() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    let listing = app.create_property(&landlord, "Studio");
    app.seed_message(&landlord, &student, None, "Welcome", 1);

    let page = Arc::new(InboxSession::new(student.id(), app.store.clone()));
    let bus = OverlayBus::new();
    let mut overlay = MessagingOverlay::new(
        &bus,
        Arc::new(InboxSession::new(student.id(), app.store.clone())),
    );

    // Listing page: contact the landlord, then pop the overlay open
    let outcome = assert_ok!(
        page.start_inquiry(listing.id, landlord.id(), "Is parking included?", None)
            .await
    );
    assert!(matches!(outcome, SendOutcome::Sent(_)));
    bus.publish(OverlayEvent::Open);

    let state = timeout(WAIT, overlay.next_event()).await.unwrap().unwrap();
    assert!(state.is_expanded());

    // Both presentations group the same store contents identically
    page.refresh().await;
    assert_eq!(
        page.snapshot().conversations,
        overlay.session().snapshot().conversations
    );
    assert_eq!(overlay.session().snapshot().conversations.len(), 2);
    assert_eq!(overlay.badge(), 1);
}

#[test_log::test(tokio::test)]
async fn test_outage_keeps_last_good_inbox() {
    let app = MessagingTestApp::new();
    let student = app.create_student("Una");
    let landlord = app.create_landlord("Lee");
    app.seed_message(&landlord, &student, None, "hello", 1);

    let session = InboxSession::new(student.id(), app.store.clone());
    session.refresh().await;
    let before = session.snapshot();

    app.store.set_offline(true);
    assert!(matches!(
        session.refresh().await,
        RefreshOutcome::Failed { .. }
    ));
    assert_eq!(session.snapshot(), before);

    app.store.set_offline(false);
    assert!(session.refresh().await.is_applied());
}
