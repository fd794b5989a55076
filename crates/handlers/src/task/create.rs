use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::Task;
use infrastructure::entity_to_item;
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{
    list_id, parse_payload, require_item, respond, string_field, to_data, validate_payload,
    HandlerResult,
};

pub const OPERATION: &str = "create-task";

/// 既存のリストに未完了のタスクを追加する
pub async fn create_task(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::CreateTaskFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.create_task)?;
    let list_id = list_id(&payload)?;

    let list = ctx
        .gateway
        .get_item(&ctx.tables.list.name, &ctx.tables.list_key(&list_id))
        .await?;
    require_item(list, ResponseMessage::ListNotFound)?;

    let task = Task::new(list_id, string_field(&payload, "description")?)?;
    ctx.gateway
        .put_item(&ctx.tables.tasks.name, entity_to_item(&task)?)
        .await?;

    info!(task_id = %task.id, list_id = %task.list_id, "タスクを作成しました");
    Ok(ResponseEnvelope::created(
        to_data(&task)?,
        ResponseMessage::CreateTaskSuccess,
    ))
}
