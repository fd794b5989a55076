use crate::config::ConfigError;
use aws_lambda_events::http::StatusCode;
use thiserror::Error;

/// ハンドラー全体で使用されるエラー型
///
/// 利用者に見せるメッセージは操作ごとの固定文言に置き換えられるため、
/// ここに含まれる詳細はログにのみ出力される。
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// クライアントエラー（4xx相当）
    Client,
    /// サーバーエラー（5xx相当）
    Server,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Domain(_)
            | AppError::Validation(_)
            | AppError::Deserialization(_)
            | AppError::NotFound(_) => ErrorCategory::Client,
            AppError::Storage(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                ErrorCategory::Server
            }
        }
    }

    /// HTTPステータスコードを取得
    pub fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Domain(_) | AppError::Validation(_) | AppError::Deserialization(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Storage(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// エラーをログに記録
    pub fn log(&self, operation: &str) {
        match self.category() {
            ErrorCategory::Server => {
                tracing::error!(
                    error = %self,
                    operation = operation,
                    status_code = self.http_status_code().as_u16(),
                    "Request failed"
                );
            }
            ErrorCategory::Client => {
                tracing::warn!(
                    error = %self,
                    operation = operation,
                    status_code = self.http_status_code().as_u16(),
                    "Request rejected"
                );
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Deserialization(error.to_string())
    }
}
