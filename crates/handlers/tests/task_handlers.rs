mod common;

use common::{parts, request, TestApp, TASKS_TABLE};
use handlers::task::{create_task, delete_task, update_task};
use infrastructure::{GatewayOperation, TableGateway, TableKey};
use serde_json::json;

fn task_key(task_id: &str, list_id: &str) -> TableKey {
    TableKey::partition("id", task_id).with_sort("listId", list_id)
}

#[tokio::test]
async fn test_delete_task_removes_it() {
    let app = TestApp::new();
    app.seed_list("L1", "Groceries").await;
    app.seed_task("T1", "L1", "Milk").await;

    let response = delete_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L1"}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "data": {}, "message": "Task successfully deleted" })
    );
    let stored = app
        .gateway
        .get_item(TASKS_TABLE, &task_key("T1", "L1"))
        .await
        .unwrap();
    assert_eq!(stored, None);
}

#[tokio::test]
async fn test_delete_task_twice_is_consistently_not_found() {
    let app = TestApp::new();
    app.seed_task("T1", "L1", "Milk").await;
    let body = r#"{"taskId":"T1","listId":"L1"}"#;

    let (first, _) = parts(&delete_task(app.ctx.clone(), request(body)).await);
    let (second, second_body) = parts(&delete_task(app.ctx.clone(), request(body)).await);
    let (third, third_body) = parts(&delete_task(app.ctx.clone(), request(body)).await);

    assert_eq!(first, 200);
    assert_eq!(second, 404);
    assert_eq!(third, 404);
    assert_eq!(second_body, third_body);
    assert_eq!(second_body["message"], "Task not found");
}

#[tokio::test]
async fn test_delete_task_under_wrong_list_is_not_found() {
    let app = TestApp::new();
    app.seed_task("T1", "L1", "Milk").await;

    let response = delete_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L2"}"#),
    )
    .await;
    let (status, _) = parts(&response);

    assert_eq!(status, 404);
    assert_eq!(app.gateway.item_count(TASKS_TABLE).await, 1);
}

#[tokio::test]
async fn test_delete_task_missing_fields() {
    let app = TestApp::new();

    let response = delete_task(app.ctx.clone(), request(r#"{"listId":"L1"}"#)).await;
    let (status, body) = parts(&response);

    assert_eq!(status, 400);
    assert_eq!(
        body["data"]["validation"]["taskId"],
        json!(["Task id can't be blank"])
    );
    assert!(body["data"]["validation"].get("listId").is_none());
}

#[tokio::test]
async fn test_delete_task_storage_failure() {
    let app = TestApp::new();
    app.seed_task("T1", "L1", "Milk").await;
    app.gateway.fail_on(GatewayOperation::DeleteItem).await;

    let response = delete_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L1"}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 500);
    assert_eq!(
        body,
        json!({ "data": {}, "message": "Task could not be deleted" })
    );
}

#[tokio::test]
async fn test_create_task_in_existing_list() {
    let app = TestApp::new();
    app.seed_list("L1", "Groceries").await;

    let response = create_task(
        app.ctx.clone(),
        request(r#"{"listId":"L1","description":"Buy milk"}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 201);
    assert_eq!(body["message"], "Task successfully created");
    assert_eq!(body["data"]["listId"], "L1");
    assert_eq!(body["data"]["description"], "Buy milk");
    assert_eq!(body["data"]["completed"], false);

    let task_id = body["data"]["id"].as_str().unwrap();
    assert!(app
        .gateway
        .get_item(TASKS_TABLE, &task_key(task_id, "L1"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_create_task_requires_existing_list() {
    let app = TestApp::new();

    let response = create_task(
        app.ctx.clone(),
        request(r#"{"listId":"L404","description":"Buy milk"}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 404);
    assert_eq!(body["message"], "List not found");
    assert_eq!(app.gateway.item_count(TASKS_TABLE).await, 0);
}

#[tokio::test]
async fn test_update_task_returns_only_changed_attributes() {
    let app = TestApp::new();
    let task = app.seed_task("T1", "L1", "Milk").await;

    let response = update_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L1","completed":true}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Task successfully updated");
    let data = body["data"].as_object().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data["completed"], true);
    assert!(data["updatedAt"].as_i64().unwrap() >= task.updated_at);
    assert!(data.get("description").is_none());

    let stored = app
        .gateway
        .get_item(TASKS_TABLE, &task_key("T1", "L1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["description"], "Milk");
    assert_eq!(stored["completed"], true);
}

#[tokio::test]
async fn test_update_task_description() {
    let app = TestApp::new();
    app.seed_task("T1", "L1", "Milk").await;

    let response = update_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L1","description":" Oat milk "}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 200);
    assert_eq!(body["data"]["description"], "Oat milk");
}

#[tokio::test]
async fn test_update_missing_task_performs_no_write() {
    let app = TestApp::new();

    let response = update_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T404","listId":"L1","completed":true}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 404);
    assert_eq!(body["message"], "Task not found");
    assert_eq!(app.gateway.write_count(), 0);
}

#[tokio::test]
async fn test_update_task_rejects_wrong_types() {
    let app = TestApp::new();
    app.seed_task("T1", "L1", "Milk").await;

    let response = update_task(
        app.ctx.clone(),
        request(r#"{"taskId":"T1","listId":"L1","completed":"yes"}"#),
    )
    .await;
    let (status, body) = parts(&response);

    assert_eq!(status, 400);
    assert_eq!(
        body["data"]["validation"]["completed"],
        json!(["Completed must be of type boolean"])
    );
}
