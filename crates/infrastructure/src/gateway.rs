use async_trait::async_trait;
use shared::AppError;
use std::fmt;
use thiserror::Error;

use crate::models::{Item, KeyCondition, ScanPage, ScanRequest, TableKey, UpdateExpression};

/// BatchWriteItem 1回あたりの上限件数
pub const BATCH_WRITE_LIMIT: usize = 25;

/// ストレージ操作のエラー型
///
/// 呼び出し側はすべて「バックエンド利用不可」として一律に扱い、リトライはしない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Unknown index `{index}` on table `{table}`")]
    UnknownIndex { table: String, index: String },

    #[error("Invalid key for table `{table}`: {reason}")]
    InvalidKey { table: String, reason: String },

    #[error("Update expression for table `{0}` has no assignments")]
    EmptyUpdate(String),

    #[error("Unprocessed items remain after batch write on table `{0}`")]
    Unprocessed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("DynamoDB error: {0}")]
    Backend(String),
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Storage(error.to_string())
    }
}

/// ゲートウェイ操作の種類（ログと障害注入に使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    GetItem,
    Query,
    UpdateItem,
    DeleteItem,
    PutItem,
    BatchDelete,
    Scan,
}

impl GatewayOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayOperation::GetItem => "GetItem",
            GatewayOperation::Query => "Query",
            GatewayOperation::UpdateItem => "UpdateItem",
            GatewayOperation::DeleteItem => "DeleteItem",
            GatewayOperation::PutItem => "PutItem",
            GatewayOperation::BatchDelete => "BatchDelete",
            GatewayOperation::Scan => "Scan",
        }
    }
}

impl fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// テーブルストアへの共通インターフェース
///
/// 具体的なバックエンド（DynamoDB、インメモリ等）を差し替えても
/// ハンドラー側のロジックは変わらない。
#[async_trait]
pub trait TableGateway: Send + Sync {
    /// 完全なキーによる1件取得。存在しない場合は `Ok(None)`
    async fn get_item(&self, table: &str, key: &TableKey) -> Result<Option<Item>, StorageError>;

    /// 事前に宣言されたインデックス（または基本テーブル）へのクエリ。
    /// ページングは最後まで辿る。
    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        condition: &KeyCondition,
    ) -> Result<Vec<Item>, StorageError>;

    /// 部分更新。変更された属性の新しい値のみを返す（項目全体ではない）
    async fn update_item(
        &self,
        table: &str,
        key: &TableKey,
        update: &UpdateExpression,
    ) -> Result<Item, StorageError>;

    /// 削除。存在しないキーの削除はエラーにならない
    async fn delete_item(&self, table: &str, key: &TableKey) -> Result<(), StorageError>;

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError>;

    /// 25件ごとに分割して一括削除
    async fn batch_delete(&self, table: &str, keys: &[TableKey]) -> Result<(), StorageError>;

    /// 1ページ分のスキャン
    async fn scan(&self, table: &str, request: &ScanRequest) -> Result<ScanPage, StorageError>;
}

/// 配列を指定サイズごとに分割
pub fn create_chunks<T: Clone>(data: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    data.chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_chunks_splits_evenly() {
        let data: Vec<u32> = (0..60).collect();
        let chunks = create_chunks(&data, BATCH_WRITE_LIMIT);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 25);
        assert_eq!(chunks[1].len(), 25);
        assert_eq!(chunks[2].len(), 10);
        assert_eq!(chunks[2][9], 59);
    }

    #[test]
    fn test_create_chunks_empty_input() {
        let chunks = create_chunks::<u32>(&[], BATCH_WRITE_LIMIT);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_create_chunks_zero_size_does_not_panic() {
        let chunks = create_chunks(&[1, 2], 0);
        assert_eq!(chunks, vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_storage_error_maps_to_app_error() {
        let error: AppError = StorageError::Backend("ThrottlingException".to_string()).into();
        assert!(matches!(error, AppError::Storage(_)));
    }
}
