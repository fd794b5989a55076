//! Parsing → Validating → Executing → Responding の共通部品

use aws_lambda_events::event::apigw::ApiGatewayProxyResponse;
use domain::{DomainError, ListId, TaskId};
use infrastructure::{Item, StorageError};
use serde::Serialize;
use serde_json::Value;
use shared::{AppError, ConstraintSchema, Payload, ResponseEnvelope, ResponseMessage};
use tracing::{info, warn};

/// 処理途中の失敗
///
/// `Formatted` はそのまま返すエンベロープ、`Unformatted` は最終段で
/// 操作ごとの汎用エラーメッセージに置き換えられる。
#[derive(Debug)]
pub enum HandlerFailure {
    Formatted(ResponseEnvelope),
    Unformatted(AppError),
}

impl From<ResponseEnvelope> for HandlerFailure {
    fn from(envelope: ResponseEnvelope) -> Self {
        HandlerFailure::Formatted(envelope)
    }
}

impl From<AppError> for HandlerFailure {
    fn from(error: AppError) -> Self {
        HandlerFailure::Unformatted(error)
    }
}

impl From<StorageError> for HandlerFailure {
    fn from(error: StorageError) -> Self {
        HandlerFailure::Unformatted(error.into())
    }
}

impl From<DomainError> for HandlerFailure {
    fn from(error: DomainError) -> Self {
        HandlerFailure::Unformatted(error.into())
    }
}

pub type HandlerResult = Result<ResponseEnvelope, HandlerFailure>;

/// リクエストボディをペイロードに変換
///
/// 空のボディは空のペイロードとして扱い、必須項目の検証で弾く。
pub fn parse_payload(body: Option<&str>) -> Result<Payload, HandlerFailure> {
    let body = match body.map(str::trim) {
        None | Some("") => return Ok(Payload::new()),
        Some(body) => body,
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(payload)) => Ok(payload),
        Ok(_) => Err(invalid_body("body is not a JSON object")),
        Err(e) => Err(invalid_body(&e.to_string())),
    }
}

fn invalid_body(reason: &str) -> HandlerFailure {
    warn!(reason = reason, "リクエストボディを解析できません");
    ResponseEnvelope::bad_request(serde_json::json!({}), ResponseMessage::InvalidBody).into()
}

pub fn validate_payload(payload: &Payload, schema: &ConstraintSchema) -> Result<(), HandlerFailure> {
    schema.validate(payload).map_err(|failure| {
        info!(schema = schema.name(), failure = %failure, "検証エラー");
        ResponseEnvelope::validation_failure(&failure).into()
    })
}

/// 存在確認。無ければ404のエンベロープで打ち切る
pub fn require_item(item: Option<Item>, not_found: ResponseMessage) -> Result<Item, HandlerFailure> {
    item.ok_or_else(|| ResponseEnvelope::not_found(serde_json::json!({}), not_found).into())
}

/// 検証済みペイロードから文字列フィールドを取り出す
pub fn string_field<'a>(payload: &'a Payload, field: &str) -> Result<&'a str, HandlerFailure> {
    payload.get(field).and_then(Value::as_str).ok_or_else(|| {
        HandlerFailure::Unformatted(AppError::Validation(format!(
            "`{field}` is not a string after validation"
        )))
    })
}

pub fn list_id(payload: &Payload) -> Result<ListId, HandlerFailure> {
    Ok(ListId::from_string(string_field(payload, "listId")?)?)
}

pub fn task_id(payload: &Payload) -> Result<TaskId, HandlerFailure> {
    Ok(TaskId::from_string(string_field(payload, "taskId")?)?)
}

/// エンティティをレスポンスの data に変換
pub fn to_data<T: Serialize>(value: &T) -> Result<Value, HandlerFailure> {
    serde_json::to_value(value).map_err(|e| HandlerFailure::Unformatted(e.into()))
}

/// 最終段：結果を1つのエンベロープにまとめて変換する
pub fn respond(
    result: HandlerResult,
    failure_message: ResponseMessage,
    operation: &str,
) -> ApiGatewayProxyResponse {
    let envelope = match result {
        Ok(envelope) => envelope,
        Err(HandlerFailure::Formatted(envelope)) => envelope,
        Err(HandlerFailure::Unformatted(error)) => {
            error.log(operation);
            ResponseEnvelope::error(failure_message)
        }
    };

    info!(
        operation = operation,
        status_code = envelope.status_code().as_u16(),
        "レスポンス送信"
    );
    envelope.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_lambda_events::encodings::Body;
    use serde_json::json;
    use shared::Field;

    fn expect_formatted(failure: HandlerFailure) -> ResponseEnvelope {
        match failure {
            HandlerFailure::Formatted(envelope) => envelope,
            HandlerFailure::Unformatted(error) => panic!("unexpected unformatted failure: {error}"),
        }
    }

    #[test]
    fn test_parse_blank_body_is_empty_payload() {
        assert!(parse_payload(None).unwrap().is_empty());
        assert!(parse_payload(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_object_body() {
        let payload = parse_payload(Some(r#"{"listId":"L1"}"#)).unwrap();
        assert_eq!(payload.get("listId"), Some(&json!("L1")));
    }

    #[test]
    fn test_parse_malformed_body_is_bad_request() {
        let envelope = expect_formatted(parse_payload(Some("{listId:")).unwrap_err());
        assert_eq!(envelope.status_code().as_u16(), 400);
        assert_eq!(envelope.message(), "request body is not valid JSON");

        let envelope = expect_formatted(parse_payload(Some("[1,2]")).unwrap_err());
        assert_eq!(envelope.status_code().as_u16(), 400);
    }

    #[test]
    fn test_validation_failure_is_formatted() {
        let schema = ConstraintSchema::builder("test")
            .field(Field::new("listId").required())
            .build()
            .unwrap();

        let envelope = expect_formatted(validate_payload(&Payload::new(), &schema).unwrap_err());
        assert_eq!(envelope.status_code().as_u16(), 400);
        assert_eq!(
            envelope.data()["validation"]["listId"][0],
            "List id can't be blank"
        );
    }

    #[test]
    fn test_require_item_missing_is_not_found() {
        let envelope =
            expect_formatted(require_item(None, ResponseMessage::ListNotFound).unwrap_err());
        assert_eq!(envelope.status_code().as_u16(), 404);
        assert_eq!(envelope.message(), "List not found");
    }

    #[test]
    fn test_respond_passes_formatted_failure_through() {
        let formatted = ResponseEnvelope::not_found(json!({}), ResponseMessage::TaskNotFound);
        let response = respond(
            Err(formatted.into()),
            ResponseMessage::DeleteTaskFail,
            "delete-task",
        );

        assert_eq!(response.status_code, 404);
    }

    #[test]
    fn test_respond_hides_unformatted_detail() {
        let response = respond(
            Err(StorageError::Backend("ProvisionedThroughputExceeded".to_string()).into()),
            ResponseMessage::GetListFail,
            "get-list",
        );

        assert_eq!(response.status_code, 500);
        let Some(Body::Text(body)) = response.body else {
            panic!("missing body");
        };
        assert!(!body.contains("ProvisionedThroughputExceeded"));
        assert!(body.contains("List could not be retrieved"));
    }
}
