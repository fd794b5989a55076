use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::{current_timestamp, normalize_list_name, ListId};
use infrastructure::{Item, StorageError, UpdateExpression};
use serde_json::Value;
use shared::{Payload, ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{
    list_id, parse_payload, require_item, respond, string_field, validate_payload, HandlerResult,
};

pub const OPERATION: &str = "update-list";

/// リスト名を変更し、更新された属性（`name`, `updatedAt`）のみを返す
pub async fn update_list(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::UpdateListFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;

    // 検証と存在確認を並行して実行し、検証エラーを優先する
    let (validation, existing) = tokio::join!(
        async { validate_payload(&payload, &ctx.constraints.update_list) },
        find_list(ctx, &payload),
    );
    validation?;
    require_item(existing?, ResponseMessage::ListNotFound)?;

    let list_id = list_id(&payload)?;
    let name = normalize_list_name(string_field(&payload, "name")?)?;
    let update = UpdateExpression::new()
        .set("name", name)
        .set("updatedAt", current_timestamp());

    let updated = ctx
        .gateway
        .update_item(&ctx.tables.list.name, &ctx.tables.list_key(&list_id), &update)
        .await?;

    info!(list_id = %list_id, "リストを更新しました");
    Ok(ResponseEnvelope::ok(
        Value::Object(updated),
        ResponseMessage::UpdateListSuccess,
    ))
}

/// 検証前のペイロードから listId を拾って存在確認する
async fn find_list(ctx: &HandlerContext, payload: &Payload) -> Result<Option<Item>, StorageError> {
    let list_id = match payload
        .get("listId")
        .and_then(Value::as_str)
        .map(ListId::from_string)
    {
        Some(Ok(list_id)) => list_id,
        // 検証側で失敗するので読み取りは行わない
        _ => return Ok(None),
    };

    ctx.gateway
        .get_item(&ctx.tables.list.name, &ctx.tables.list_key(&list_id))
        .await
}
