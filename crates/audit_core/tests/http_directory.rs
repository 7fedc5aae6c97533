use std::sync::Arc;

use audit_core::{
    AuditTable, DirectoryError, HttpUserDirectory, TableEvent, TableOptions, UserDirectory,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use shared::{
    domain::{UserId, UserRecord},
    error::{ApiError, ErrorCode},
};
use tokio::{net::TcpListener, sync::Mutex};

const TOKEN: &str = "audit-token";

#[derive(Clone)]
struct ServerState {
    users: Arc<Mutex<Vec<UserRecord>>>,
    require_token: bool,
}

fn user(id: &str, role: &str, first: &str, last: &str) -> UserRecord {
    UserRecord {
        id: UserId::from(id),
        role: role.to_string(),
        created_date: "2023-01-01T09:30:00Z".to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

fn authorized(state: &ServerState, headers: &HeaderMap) -> bool {
    if !state.require_token {
        return true;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new(ErrorCode::Unauthorized, "session expired")),
    )
        .into_response()
}

async fn list_users(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(state.users.lock().await.clone()).into_response()
}

async fn delete_user(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id == "LOCKED" {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiError::new(ErrorCode::Forbidden, "admins only")),
        )
            .into_response();
    }
    let mut users = state.users.lock().await;
    let before = users.len();
    users.retain(|user| user.id.as_str() != id);
    if users.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, format!("user {id} not found"))),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_directory_server(require_token: bool) -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        users: Arc::new(Mutex::new(vec![
            user("A1", "admin", "Ann", "Lee"),
            user("B2", "user", "Bob", "Ng"),
            user("LOCKED", "admin", "Root", "Account"),
        ])),
        require_token,
    };
    let app = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/:id", delete(delete_user))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

#[tokio::test]
async fn fetches_users_with_bearer_token() {
    let (url, _) = spawn_directory_server(true).await.expect("spawn server");
    let directory = HttpUserDirectory::new(&url)
        .expect("directory")
        .with_auth_token(TOKEN);

    let users = directory.fetch_all().await.expect("fetch");
    let ids: Vec<&str> = users.iter().map(|user| user.id.as_str()).collect();
    assert_eq!(ids, ["A1", "B2", "LOCKED"]);
    assert_eq!(users[1].first_name, "Bob");
}

#[tokio::test]
async fn missing_token_surfaces_server_message() {
    let (url, _) = spawn_directory_server(true).await.expect("spawn server");
    let directory = HttpUserDirectory::new(&url).expect("directory");

    let err = directory.fetch_all().await.expect_err("unauthorized");
    assert_eq!(err.to_string(), "session expired");
    match err.downcast_ref::<DirectoryError>() {
        Some(DirectoryError::Status { status, .. }) => assert_eq!(*status, 401),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_removes_user_and_reports_failures() {
    let (url, state) = spawn_directory_server(false).await.expect("spawn server");
    let directory = HttpUserDirectory::new(&url).expect("directory");

    directory
        .delete_by_id(&UserId::from("B2"))
        .await
        .expect("delete B2");
    assert_eq!(state.users.lock().await.len(), 2);

    let err = directory
        .delete_by_id(&UserId::from("LOCKED"))
        .await
        .expect_err("locked");
    assert_eq!(err.to_string(), "admins only");

    let err = directory
        .delete_by_id(&UserId::from("B2"))
        .await
        .expect_err("already gone");
    assert_eq!(err.to_string(), "user B2 not found");
}

#[tokio::test]
async fn table_drives_http_directory_end_to_end() {
    let (url, state) = spawn_directory_server(false).await.expect("spawn server");
    let directory = Arc::new(HttpUserDirectory::new(&url).expect("directory"));
    let table = AuditTable::new(directory, TableOptions::default());
    let mut events = table.subscribe_events();

    assert!(table.initialize().await);
    assert_eq!(
        events.recv().await.expect("loaded"),
        TableEvent::Loaded { count: 3 }
    );

    table.set_search("a").await;
    assert_eq!(table.total_matched().await, 2);

    let locked = UserId::from("LOCKED");
    let handle = table.request_delete(&locked).await.expect("present");
    handle.await.expect("delete task");
    assert_eq!(
        events.recv().await.expect("delete failed"),
        TableEvent::DeleteFailed {
            id: locked.clone(),
            reason: "admins only".into()
        }
    );
    let rows = table.visible_rows().await;
    let row = rows
        .iter()
        .find(|row| row.record.id == locked)
        .expect("locked row stays");
    assert_eq!(row.status.delete_error.as_deref(), Some("admins only"));

    let a1 = UserId::from("A1");
    let handle = table.request_delete(&a1).await.expect("present");
    handle.await.expect("delete task");
    assert_eq!(
        events.recv().await.expect("deleted"),
        TableEvent::Deleted { id: a1.clone() }
    );
    assert!(state.users.lock().await.iter().all(|user| user.id != a1));

    table.refresh().await;
    let snapshot = table.snapshot().await;
    assert_eq!(snapshot.total_matched, 1);
    assert_eq!(snapshot.rows[0].status.delete_error, None);
}

#[tokio::test]
async fn unreachable_directory_records_fetch_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let directory = Arc::new(HttpUserDirectory::new(&format!("http://{addr}")).expect("directory"));
    let table = AuditTable::new(directory, TableOptions::default());
    table.initialize().await;

    let snapshot = table.snapshot().await;
    assert!(snapshot.error.is_some());
    assert!(snapshot.rows.is_empty());
    assert!(!snapshot.loading);
}
