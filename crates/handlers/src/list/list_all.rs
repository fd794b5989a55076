use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::ListId;
use infrastructure::{ScanRequest, ID_ATTRIBUTE};
use serde_json::{json, Value};
use shared::{ResponseEnvelope, ResponseMessage};
use std::sync::Arc;
use tracing::info;

use crate::context::HandlerContext;
use crate::pipeline::{parse_payload, respond, validate_payload, HandlerResult};

pub const OPERATION: &str = "list-lists";

pub const DEFAULT_PAGE_SIZE: i32 = 20;

/// List テーブルをページ単位でスキャンする
///
/// `nextKey` を次のリクエストの `startKey` に渡すと続きを取得できる。
pub async fn list_lists(
    ctx: Arc<HandlerContext>,
    request: ApiGatewayProxyRequest,
) -> ApiGatewayProxyResponse {
    let result = execute(&ctx, request.body.as_deref()).await;
    respond(result, ResponseMessage::GetListsFail, OPERATION)
}

async fn execute(ctx: &HandlerContext, body: Option<&str>) -> HandlerResult {
    let payload = parse_payload(body)?;
    validate_payload(&payload, &ctx.constraints.list_lists)?;

    // 検証済みの整数値（`5.0` 表記を含む）
    let limit = payload
        .get("limit")
        .and_then(Value::as_f64)
        .map(|limit| limit as i32)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let exclusive_start_key = match payload.get("startKey").and_then(Value::as_str) {
        Some(start) => Some(ctx.tables.list_key(&ListId::from_string(start)?).to_item()),
        None => None,
    };

    let page = ctx
        .gateway
        .scan(
            &ctx.tables.list.name,
            &ScanRequest {
                limit: Some(limit),
                exclusive_start_key,
            },
        )
        .await?;

    let next_key = page
        .last_evaluated_key
        .as_ref()
        .and_then(|key| key.get(ID_ATTRIBUTE).cloned())
        .unwrap_or(Value::Null);

    info!(count = page.items.len(), has_more = !next_key.is_null(), "リスト一覧を取得しました");

    let count = page.items.len();
    let lists: Vec<Value> = page.items.into_iter().map(Value::Object).collect();
    Ok(ResponseEnvelope::ok(
        json!({
            "lists": lists,
            "count": count,
            "nextKey": next_key,
        }),
        ResponseMessage::GetListsSuccess,
    ))
}
