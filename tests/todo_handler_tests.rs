//! Microsoft To Do tool tests against a local Graph stub
mod common;

use bridge_mcp::todo::{IdentityProvider, TodoConfig, TodoHandler};
use common::FakeProvider;
use common::http::StubServer;
use tempfile::TempDir;

const LISTS: &str = "/v1.0/me/todo/lists";
const TASKS: &str = "/v1.0/me/todo/lists/L1/tasks";
const TASK: &str = "/v1.0/me/todo/lists/L1/tasks/T1";
const CHECKLIST: &str = "/v1.0/me/todo/lists/L1/tasks/T1/checklistItems";

const TASK_JSON: &str = r#"{
    "id": "T1",
    "title": "Buy milk",
    "status": "notStarted",
    "importance": "high",
    "isReminderOn": false,
    "createdDateTime": "2024-03-01T09:00:00Z",
    "lastModifiedDateTime": "2024-03-02T18:30:00Z",
    "body": {"content": "From the corner shop", "contentType": "text"}
}"#;

/// Handler pointed at `server` that signs in through a fake device flow
fn handler(server: &StubServer, dir: &TempDir) -> TodoHandler {
    let config = TodoConfig {
        graph_base_url: format!("{}/v1.0", server.url()),
        ..TodoConfig::default()
    }
    .with_cache_path(dir.path().join("cache.json"));

    TodoHandler::with_provider(config, |_| {
        let provider: Box<dyn IdentityProvider> = Box::new(FakeProvider::new());
        Ok(provider)
    })
    .unwrap()
}

#[tokio::test]
async fn test_task_lists_follow_next_link() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(
        LISTS,
        200,
        format!(
            r#"{{"value":[{{"id":"L1","displayName":"Tasks"}},{{"id":"L2","displayName":"Groceries"}}],
                "@odata.nextLink":"{}{}?$skiptoken=page2"}}"#,
            server.url(),
            LISTS
        ),
    );
    server.respond(LISTS, 200, r#"{"value":[{"id":"L3","displayName":"Work"}]}"#);

    let result = handler(&server, &dir).handle_get_task_lists().await;

    assert_eq!(
        result,
        "- Tasks (id: L1)\n- Groceries (id: L2)\n- Work (id: L3)"
    );
    let requests = server.requests_to(LISTS);
    assert_eq!(requests.len(), 2);
    assert!(requests[1].target.ends_with("$skiptoken=page2"));
}

#[tokio::test]
async fn test_requests_carry_the_bearer_token() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(LISTS, 200, r#"{"value":[]}"#);

    let result = handler(&server, &dir).handle_get_task_lists().await;

    assert_eq!(result, "No task lists found.");
    let request = &server.requests_to(LISTS)[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.header("authorization"), Some("Bearer interactive-token"));
}

#[tokio::test]
async fn test_missing_list_is_reported_with_status() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    let body = r#"{"error":{"code":"ErrorItemNotFound","message":"The specified object was not found in the store."}}"#;
    server.respond(TASKS, 404, body);

    let result = handler(&server, &dir)
        .handle_get_tasks("L1".to_string(), false)
        .await;

    assert_eq!(result, format!("Error fetching tasks: HTTP 404: {}", body));
}

#[tokio::test]
async fn test_tasks_across_pages_hide_completed() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(
        TASKS,
        200,
        format!(
            r#"{{"value":[{{"id":"T1","title":"Buy milk","status":"notStarted"}}],
                "@odata.nextLink":"{}{}?$skip=1"}}"#,
            server.url(),
            TASKS
        ),
    );
    server.respond(
        TASKS,
        200,
        r#"{"value":[{"id":"T2","title":"File taxes","status":"completed"}]}"#,
    );

    let handler = handler(&server, &dir);
    assert_eq!(
        handler.handle_get_tasks("L1".to_string(), false).await,
        "- Buy milk [notStarted] (id: T1)"
    );
}

#[tokio::test]
async fn test_task_detail_with_checklist() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(TASK, 200, TASK_JSON);
    server.respond(
        CHECKLIST,
        200,
        r#"{"value":[
            {"id":"C1","displayName":"Whole milk","isChecked":true},
            {"id":"C2","displayName":"Oat milk","isChecked":false}
        ]}"#,
    );

    let result = handler(&server, &dir)
        .handle_get_task_detail("L1".to_string(), "T1".to_string())
        .await;

    assert!(result.starts_with("# Buy milk\nStatus: notStarted\nImportance: high"));
    assert!(result.ends_with(
        "From the corner shop\n\nChecklist:\n  [x] Whole milk\n  [ ] Oat milk"
    ));
}

#[tokio::test]
async fn test_task_detail_survives_checklist_failure() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(TASK, 200, TASK_JSON);
    server.respond(CHECKLIST, 404, r#"{"error":{"code":"ErrorItemNotFound"}}"#);

    let result = handler(&server, &dir)
        .handle_get_task_detail("L1".to_string(), "T1".to_string())
        .await;

    assert_eq!(
        result,
        "# Buy milk\n\
         Status: notStarted\n\
         Importance: high\n\
         Reminder: off\n\
         Created: 2024-03-01T09:00:00Z\n\
         Modified: 2024-03-02T18:30:00Z\n\
         \n\
         From the corner shop"
    );
    assert_eq!(server.requests_to(CHECKLIST).len(), 1);
}

#[tokio::test]
async fn test_task_endpoint_failure_is_reported() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    let body = r#"{"error":{"code":"InternalServerError"}}"#;
    server.respond(TASK, 500, body);
    server.respond(CHECKLIST, 200, r#"{"value":[]}"#);

    let result = handler(&server, &dir)
        .handle_get_task_detail("L1".to_string(), "T1".to_string())
        .await;

    assert_eq!(result, format!("Error fetching task: HTTP 500: {}", body));
    assert!(server.requests_to(CHECKLIST).is_empty());
}

#[tokio::test]
async fn test_signed_in_session_is_reused_across_tools() {
    let server = StubServer::start().await;
    let dir = TempDir::new().unwrap();
    server.respond(LISTS, 200, r#"{"value":[{"id":"L1","displayName":"Tasks"}]}"#);
    server.respond(TASKS, 200, r#"{"value":[]}"#);

    let handler = handler(&server, &dir);
    handler.handle_get_task_lists().await;
    assert_eq!(
        handler.handle_get_tasks("L1".to_string(), true).await,
        "No tasks found."
    );

    assert!(dir.path().join("cache.json").exists());
    for request in server.requests() {
        assert_eq!(request.header("authorization"), Some("Bearer interactive-token"));
    }
}
