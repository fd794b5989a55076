use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use infrastructure::LIST_INDEX;
use serde_json::json;
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{list_id, parse_payload, require_item, respond, validate_payload, HandlerResult};

pub const OPERATION: &str = "delete-list";

/// リストと、そのリストに属するすべてのタスクを削除する
pub async fn delete_list(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::DeleteListFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.delete_list)?;
    let list_id = list_id(&payload)?;

    let list_key = ctx.tables.list_key(&list_id);
    let list = ctx.gateway.get_item(&ctx.tables.list.name, &list_key).await?;
    require_item(list, ResponseMessage::ListNotFound)?;

    let tasks = ctx
        .gateway
        .query(
            &ctx.tables.tasks.name,
            Some(LIST_INDEX),
            &ctx.tables.tasks_by_list(&list_id),
        )
        .await?;
    let task_keys = tasks
        .iter()
        .map(|task| ctx.tables.tasks.key_of(task))
        .collect::<Result<Vec<_>, _>>()?;

    // タスクを先に消し、途中で失敗してもリストは残るようにする
    if !task_keys.is_empty() {
        ctx.gateway
            .batch_delete(&ctx.tables.tasks.name, &task_keys)
            .await?;
    }
    ctx.gateway.delete_item(&ctx.tables.list.name, &list_key).await?;

    info!(list_id = %list_id, deleted_tasks = task_keys.len(), "リストを削除しました");
    Ok(ResponseEnvelope::ok(
        json!({ "deletedTasks": task_keys.len() }),
        ResponseMessage::DeleteListSuccess,
    ))
}
