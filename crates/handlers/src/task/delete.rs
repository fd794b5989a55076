use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use serde_json::json;
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{
    list_id, parse_payload, require_item, respond, task_id, validate_payload, HandlerResult,
};

pub const OPERATION: &str = "delete-task";

/// 存在を確認してからタスクを削除する。2回目以降の削除は404になる
pub async fn delete_task(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::DeleteTaskFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.delete_task)?;
    let task_id = task_id(&payload)?;
    let list_id = list_id(&payload)?;

    let key = ctx.tables.task_key(&task_id, &list_id);
    let task = ctx.gateway.get_item(&ctx.tables.tasks.name, &key).await?;
    require_item(task, ResponseMessage::TaskNotFound)?;

    ctx.gateway.delete_item(&ctx.tables.tasks.name, &key).await?;

    info!(task_id = %task_id, list_id = %list_id, "タスクを削除しました");
    Ok(ResponseEnvelope::ok(json!({}), ResponseMessage::DeleteTaskSuccess))
}
