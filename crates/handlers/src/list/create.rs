use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::List;
use infrastructure::entity_to_item;
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{parse_payload, respond, string_field, to_data, validate_payload, HandlerResult};

pub const OPERATION: &str = "create-list";

pub async fn create_list(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::CreateListFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.create_list)?;

    let list = List::new(string_field(&payload, "name")?)?;
    ctx.gateway
        .put_item(&ctx.tables.list.name, entity_to_item(&list)?)
        .await?;

    info!(list_id = %list.id, "リストを作成しました");
    Ok(ResponseEnvelope::created(
        to_data(&list)?,
        ResponseMessage::CreateListSuccess,
    ))
}
