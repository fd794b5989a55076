use crate::validation::ValidationFailure;
use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::ApiGatewayProxyResponse;
use aws_lambda_events::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::{json, Value};

/// 操作ごとの固定メッセージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMessage {
    CreateListSuccess,
    CreateListFail,
    GetListSuccess,
    GetListFail,
    GetListsSuccess,
    GetListsFail,
    UpdateListSuccess,
    UpdateListFail,
    DeleteListSuccess,
    DeleteListFail,
    CreateTaskSuccess,
    CreateTaskFail,
    UpdateTaskSuccess,
    UpdateTaskFail,
    DeleteTaskSuccess,
    DeleteTaskFail,
    ListNotFound,
    TaskNotFound,
    MissingFields,
    InvalidBody,
}

impl ResponseMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMessage::CreateListSuccess => "List successfully created",
            ResponseMessage::CreateListFail => "List could not be created",
            ResponseMessage::GetListSuccess => "List successfully retrieved",
            ResponseMessage::GetListFail => "List could not be retrieved",
            ResponseMessage::GetListsSuccess => "Lists successfully retrieved",
            ResponseMessage::GetListsFail => "Lists could not be retrieved",
            ResponseMessage::UpdateListSuccess => "List successfully updated",
            ResponseMessage::UpdateListFail => "List could not be updated",
            ResponseMessage::DeleteListSuccess => "List successfully deleted",
            ResponseMessage::DeleteListFail => "List could not be deleted",
            ResponseMessage::CreateTaskSuccess => "Task successfully created",
            ResponseMessage::CreateTaskFail => "Task could not be created",
            ResponseMessage::UpdateTaskSuccess => "Task successfully updated",
            ResponseMessage::UpdateTaskFail => "Task could not be updated",
            ResponseMessage::DeleteTaskSuccess => "Task successfully deleted",
            ResponseMessage::DeleteTaskFail => "Task could not be deleted",
            ResponseMessage::ListNotFound => "List not found",
            ResponseMessage::TaskNotFound => "Task not found",
            ResponseMessage::MissingFields => "required fields are missing",
            ResponseMessage::InvalidBody => "request body is not valid JSON",
        }
    }
}

/// 成功・失敗共通のレスポンスエンベロープ
///
/// どのハンドラーも最後にちょうど1つのエンベロープを作り `generate` を呼ぶ。
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    data: Value,
    status_code: StatusCode,
    message: String,
}

impl ResponseEnvelope {
    pub fn new(data: Value, status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            data,
            status_code,
            message: message.into(),
        }
    }

    pub fn ok(data: Value, message: ResponseMessage) -> Self {
        Self::new(data, StatusCode::OK, message.as_str())
    }

    pub fn created(data: Value, message: ResponseMessage) -> Self {
        Self::new(data, StatusCode::CREATED, message.as_str())
    }

    pub fn not_found(data: Value, message: ResponseMessage) -> Self {
        Self::new(data, StatusCode::NOT_FOUND, message.as_str())
    }

    pub fn bad_request(data: Value, message: ResponseMessage) -> Self {
        Self::new(data, StatusCode::BAD_REQUEST, message.as_str())
    }

    /// 検証失敗を400のエンベロープに変換
    pub fn validation_failure(failure: &ValidationFailure) -> Self {
        Self::bad_request(
            json!({ "validation": failure.to_value() }),
            ResponseMessage::MissingFields,
        )
    }

    /// 詳細を含まない汎用エラー
    pub fn error(message: ResponseMessage) -> Self {
        Self::new(json!({}), StatusCode::INTERNAL_SERVER_ERROR, message.as_str())
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// トランスポート形式に変換（何度呼んでも同じ結果になる）
    pub fn generate(&self) -> ApiGatewayProxyResponse {
        let body = json!({
            "data": self.data,
            "message": self.message,
        });

        ApiGatewayProxyResponse {
            status_code: i64::from(self.status_code.as_u16()),
            headers: default_headers(),
            multi_value_headers: HeaderMap::new(),
            body: Some(Body::Text(body.to_string())),
            is_base64_encoded: false,
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers
}
