//! HTTP backend tests against an in-process server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use roomkey_core::{CardUid, EventTimestamp, ReaderId, RoomId};
use roomkey_network::{
    Backend, BackendError, BackendOperation, CardReadEvent, ConfirmWriteRequest, HttpBackend,
    HttpBackendConfig, InspectionReport,
};
use serde_json::{Value, json};

/// Requests seen by the test server, as (path, body).
type Seen = Arc<Mutex<Vec<(String, Value)>>>;

async fn start(app: Router) -> HttpBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpBackend::new(HttpBackendConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_millis(300),
    })
    .unwrap()
}

fn room(id: &str) -> RoomId {
    RoomId::new(id).unwrap()
}

fn uid() -> CardUid {
    CardUid::from_bytes(&[0x04, 0xAB, 0xCD, 0xEF])
}

#[tokio::test]
async fn test_reader_room_trims_and_filters_blank() {
    let app = Router::new().route(
        "/api/nfc/reader-config/:id",
        get(|Path(id): Path<String>| async move {
            match id.as_str() {
                "reader-1" => Json(json!({"roomId": " 204 "})),
                _ => Json(json!({"roomId": ""})),
            }
        }),
    );
    let backend = start(app).await;

    let assigned = backend
        .reader_room(&ReaderId::new("reader-1").unwrap())
        .await
        .unwrap();
    assert_eq!(assigned, Some(room("204")));

    let blank = backend
        .reader_room(&ReaderId::new("reader-2").unwrap())
        .await
        .unwrap();
    assert_eq!(blank, None);
}

#[tokio::test]
async fn test_pending_inspection_missing_field_is_parse_error() {
    let app = Router::new().route(
        "/api/nfc/inspect-card/pending",
        get(|| async { Json(json!({"requested": true})) }),
    );
    let backend = start(app).await;

    let err = backend.pending_inspection().await.unwrap_err();
    assert!(err.is_parse());
    assert_eq!(err.operation(), Some(BackendOperation::PendingInspection));
}

#[tokio::test]
async fn test_pending_inspection_not_json_is_parse_error() {
    let app = Router::new().route(
        "/api/nfc/inspect-card/pending",
        get(|| async { "<html>maintenance</html>" }),
    );
    let backend = start(app).await;

    assert!(backend.pending_inspection().await.unwrap_err().is_parse());
}

#[tokio::test]
async fn test_submit_card_read_body_and_verdict() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/api/nfc/read",
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(("/api/nfc/read".into(), body));
                Json(json!({"doorAllowed": true, "message": "welcome"}))
            }),
        )
        .with_state(seen.clone());
    let backend = start(app).await;

    let event = CardReadEvent {
        room: room("101"),
        uid: uid(),
        timestamp: EventTimestamp::epoch(),
    };
    assert!(backend.submit_card_read(&event).await.unwrap());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].1,
        json!({"room_id": "101", "card_uid": "04abcdef", "timestamp": "1970-01-01T00:00:00Z"})
    );
}

#[tokio::test]
async fn test_submit_card_read_missing_verdict_denies() {
    let app = Router::new().route("/api/nfc/read", post(|| async { Json(json!({})) }));
    let backend = start(app).await;

    let event = CardReadEvent {
        room: room("101"),
        uid: uid(),
        timestamp: EventTimestamp::epoch(),
    };
    assert!(!backend.submit_card_read(&event).await.unwrap());
}

#[tokio::test]
async fn test_error_status() {
    let app = Router::new().route(
        "/api/nfc/any-pending-write",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let backend = start(app).await;

    let err = backend.any_pending_write().await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Status {
            operation: BackendOperation::AnyPendingWrite,
            status: 503,
        }
    );
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_unknown_route_is_status_error() {
    let backend = start(Router::new()).await;
    let err = backend.pending_write(&room("101")).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_timeout() {
    let app = Router::new().route(
        "/api/nfc/inspect-card/pending",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"pending": true}))
        }),
    );
    let backend = start(app).await;

    let err = backend.pending_inspection().await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Timeout {
            operation: BackendOperation::PendingInspection,
            timeout_ms: 300,
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(HttpBackendConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_millis(300),
    })
    .unwrap();

    let err = backend.pending_inspection().await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_parse());
}

#[tokio::test]
async fn test_pending_write_room_in_path() {
    let app = Router::new().route(
        "/api/nfc/pending-write/:room",
        get(|Path(room): Path<String>| async move { Json(json!({"pending": room == "suite 9"})) }),
    );
    let backend = start(app).await;

    assert!(backend.pending_write(&room("suite 9")).await.unwrap());
    assert!(!backend.pending_write(&room("101")).await.unwrap());
}

#[tokio::test]
async fn test_any_pending_write() {
    let app = Router::new().route(
        "/api/nfc/any-pending-write",
        get(|| async { Json(json!({"pending": true, "roomId": "305"})) }),
    );
    let backend = start(app).await;

    let pending = backend.any_pending_write().await.unwrap();
    assert_eq!(pending.claimable_room(), Some(&room("305")));
}

#[tokio::test]
async fn test_confirmations_post_expected_bodies() {
    let seen: Seen = Arc::default();
    let record = |path: &'static str| {
        post(move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
            seen.lock().unwrap().push((path.to_string(), body));
            StatusCode::OK
        })
    };
    let app = Router::new()
        .route("/api/nfc/confirm-write", record("/api/nfc/confirm-write"))
        .route(
            "/api/nfc/inspect-card/confirm",
            record("/api/nfc/inspect-card/confirm"),
        )
        .with_state(seen.clone());
    let backend = start(app).await;

    backend
        .confirm_write(&ConfirmWriteRequest {
            room: room("305"),
            success: false,
        })
        .await
        .unwrap();
    backend
        .confirm_inspection(&InspectionReport::found(room("101"), uid()))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (
                "/api/nfc/confirm-write".to_string(),
                json!({"roomId": "305", "success": false})
            ),
            (
                "/api/nfc/inspect-card/confirm".to_string(),
                json!({"success": true, "roomId": "101", "cardUid": "04abcdef"})
            ),
        ]
    );
}
