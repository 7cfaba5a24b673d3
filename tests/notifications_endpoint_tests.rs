//! Notifications endpoint integration tests
//!
//! Covers the inbox surface (list, count, mark-read) and the dispatch
//! surface (direct messages, broadcasts) including permission gating.

use axum::http::StatusCode;

use apotheca::models::staff_role::StaffRole;

mod common;
use common::{build_app, create_staff, create_test_db, login, request_json};

#[tokio::test]
async fn test_direct_message_reaches_recipient_inbox() {
    let db = create_test_db().await;
    create_staff(&db, "mgr", "central", StaffRole::Manager).await;
    let alice = create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    let (app, _) = build_app(db);

    let mgr_token = login(&app, "mgr").await;
    let (status, sent) = request_json(
        &app,
        "POST",
        "/api/notifications/message",
        Some(&mgr_token),
        Some(serde_json::json!({
            "recipient_id": alice.id,
            "title": "Schedule change",
            "message": "You open on Saturday",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["kind"], "direct_message");

    let alice_token = login(&app, "alice").await;
    let (_, inbox) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(inbox["unread"], 1);
    assert_eq!(inbox["notifications"][0]["title"], "Schedule change");
}

#[tokio::test]
async fn test_direct_message_requires_send_permission() {
    let db = create_test_db().await;
    let alice = create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    create_staff(&db, "bob", "central", StaffRole::PharmacyTech).await;
    let (app, _) = build_app(db);

    let bob_token = login(&app, "bob").await;
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/notifications/message",
        Some(&bob_token),
        Some(serde_json::json!({
            "recipient_id": alice.id,
            "title": "hi",
            "message": "hello",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_direct_message_cross_org_recipient_not_found() {
    let db = create_test_db().await;
    create_staff(&db, "mgr", "central", StaffRole::Manager).await;
    let outsider = create_staff(&db, "carol", "west-side", StaffRole::Pharmacist).await;
    let (app, _) = build_app(db);

    let mgr_token = login(&app, "mgr").await;
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/notifications/message",
        Some(&mgr_token),
        Some(serde_json::json!({
            "recipient_id": outsider.id,
            "title": "hi",
            "message": "hello",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_broadcast_all_staff_counts_and_excludes_sender() {
    let db = create_test_db().await;
    create_staff(&db, "admin", "central", StaffRole::Administrator).await;
    create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    create_staff(&db, "bob", "central", StaffRole::PharmacyTech).await;
    create_staff(&db, "carol", "west-side", StaffRole::Pharmacist).await;
    let (app, _) = build_app(db);

    let admin_token = login(&app, "admin").await;
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/notifications/broadcast",
        Some(&admin_token),
        Some(serde_json::json!({
            "title": "Inventory count",
            "message": "Tonight at 8pm",
            "recipients": "all_staff",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 2);

    // Sender's own inbox stays empty
    let (_, count) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox/count",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 0);

    // Cross-organization staff are not reached
    let carol_token = login(&app, "carol").await;
    let (_, count) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox/count",
        Some(&carol_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_broadcast_explicit_set_and_empty_set() {
    let db = create_test_db().await;
    create_staff(&db, "admin", "central", StaffRole::Administrator).await;
    let alice = create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    create_staff(&db, "bob", "central", StaffRole::PharmacyTech).await;
    let (app, _) = build_app(db);

    let admin_token = login(&app, "admin").await;

    // Explicit subset reaches only the named staff
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/notifications/broadcast",
        Some(&admin_token),
        Some(serde_json::json!({
            "title": "Team note",
            "message": "Just for you",
            "recipients": { "explicit": [alice.id] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 1);

    // Empty explicit set is a validation error and writes nothing
    let (status, _) = request_json(
        &app,
        "POST",
        "/api/notifications/broadcast",
        Some(&admin_token),
        Some(serde_json::json!({
            "title": "Nobody",
            "message": "Nothing",
            "recipients": { "explicit": [] },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bob_token = login(&app, "bob").await;
    let (_, count) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox/count",
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_mark_read_and_read_all() {
    let db = create_test_db().await;
    create_staff(&db, "mgr", "central", StaffRole::Manager).await;
    let alice = create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    let (app, _) = build_app(db);

    let mgr_token = login(&app, "mgr").await;
    for i in 0..3 {
        request_json(
            &app,
            "POST",
            "/api/notifications/message",
            Some(&mgr_token),
            Some(serde_json::json!({
                "recipient_id": alice.id,
                "title": format!("note {}", i),
                "message": "m",
            })),
        )
        .await;
    }

    let alice_token = login(&app, "alice").await;
    let (_, inbox) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(inbox["unread"], 3);
    let first_id = inbox["notifications"][0]["id"].as_i64().unwrap();

    let (status, _) = request_json(
        &app,
        "POST",
        &format!("/api/notifications/inbox/{}/read", first_id),
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, count) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox/count",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 2);

    let (status, _) = request_json(
        &app,
        "POST",
        "/api/notifications/inbox/read-all",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, count) = request_json(
        &app,
        "GET",
        "/api/notifications/inbox/count",
        Some(&alice_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_cannot_read_someone_elses_notification() {
    let db = create_test_db().await;
    create_staff(&db, "mgr", "central", StaffRole::Manager).await;
    let alice = create_staff(&db, "alice", "central", StaffRole::Pharmacist).await;
    create_staff(&db, "bob", "central", StaffRole::PharmacyTech).await;
    let (app, _) = build_app(db);

    let mgr_token = login(&app, "mgr").await;
    let (_, sent) = request_json(
        &app,
        "POST",
        "/api/notifications/message",
        Some(&mgr_token),
        Some(serde_json::json!({
            "recipient_id": alice.id,
            "title": "private",
            "message": "for alice only",
        })),
    )
    .await;
    let note_id = sent["id"].as_i64().unwrap();

    let bob_token = login(&app, "bob").await;
    let (status, _) = request_json(
        &app,
        "POST",
        &format!("/api/notifications/inbox/{}/read", note_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
