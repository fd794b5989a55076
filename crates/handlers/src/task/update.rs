use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::{current_timestamp, normalize_task_description};
use infrastructure::UpdateExpression;
use serde_json::Value;
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{
    list_id, parse_payload, require_item, respond, task_id, validate_payload, HandlerResult,
};

pub const OPERATION: &str = "update-task";

/// 説明・完了状態のうち指定された項目と `updatedAt` を更新する
pub async fn update_task(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::UpdateTaskFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.update_task)?;
    let task_id = task_id(&payload)?;
    let list_id = list_id(&payload)?;

    let key = ctx.tables.task_key(&task_id, &list_id);
    let task = ctx.gateway.get_item(&ctx.tables.tasks.name, &key).await?;
    require_item(task, ResponseMessage::TaskNotFound)?;

    let mut update = UpdateExpression::new();
    if let Some(description) = payload.get("description").and_then(Value::as_str) {
        update = update.set("description", normalize_task_description(description)?);
    }
    if let Some(completed) = payload.get("completed").and_then(Value::as_bool) {
        update = update.set("completed", completed);
    }
    let update = update.set("updatedAt", current_timestamp());

    let updated = ctx
        .gateway
        .update_item(&ctx.tables.tasks.name, &key, &update)
        .await?;

    info!(task_id = %task_id, list_id = %list_id, "タスクを更新しました");
    Ok(ResponseEnvelope::ok(
        Value::Object(updated),
        ResponseMessage::UpdateTaskSuccess,
    ))
}
