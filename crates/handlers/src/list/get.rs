use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use infrastructure::{Item, ID_ATTRIBUTE, LIST_INDEX};
use serde_json::{json, Value};
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{list_id, parse_payload, require_item, respond, validate_payload, HandlerResult};

pub const OPERATION: &str = "get-list";

/// リスト詳細に埋め込むタスクの属性（listId は含めない）
const TASK_SUMMARY_ATTRIBUTES: [&str; 5] =
    ["id", "description", "completed", "createdAt", "updatedAt"];

/// リストと、そのリストに属するタスクの一覧を返す
pub async fn get_list(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::GetListFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.get_list)?;
    let list_id = list_id(&payload)?;

    let list = ctx
        .gateway
        .get_item(&ctx.tables.list.name, &ctx.tables.list_key(&list_id))
        .await?;
    let mut list = require_item(list, ResponseMessage::ListNotFound)?;

    let mut items = ctx
        .gateway
        .query(
            &ctx.tables.tasks.name,
            Some(LIST_INDEX),
            &ctx.tables.tasks_by_list(&list_id),
        )
        .await?;

    items.sort_by(|a, b| {
        created_at(a)
            .cmp(&created_at(b))
            .then_with(|| item_id(a).cmp(item_id(b)))
    });
    let tasks: Vec<Value> = items.iter().map(task_summary).collect();

    info!(list_id = %list_id, task_count = tasks.len(), "リストを取得しました");

    list.insert("taskCount".to_string(), json!(tasks.len()));
    list.insert("tasks".to_string(), Value::Array(tasks));

    Ok(ResponseEnvelope::ok(
        Value::Object(list),
        ResponseMessage::GetListSuccess,
    ))
}

/// 保存済みのタスク項目から要約を射影する。欠けている属性は省略する
fn task_summary(item: &Item) -> Value {
    let summary = TASK_SUMMARY_ATTRIBUTES
        .iter()
        .filter_map(|&attribute| {
            item.get(attribute)
                .map(|value| (attribute.to_string(), value.clone()))
        })
        .collect();
    Value::Object(summary)
}

fn created_at(item: &Item) -> Option<i64> {
    item.get("createdAt").and_then(Value::as_i64)
}

fn item_id(item: &Item) -> &str {
    item.get(ID_ATTRIBUTE).and_then(Value::as_str).unwrap_or_default()
}
