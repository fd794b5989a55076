use crate::errors::DomainError;
use crate::list::ListId;
use crate::timestamp::{current_timestamp, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// タスク説明の最大文字数
pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidTaskId("空のIDは使用できません".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// タスク
///
/// 識別子は `(id, list_id)` の複合キー。`list_id` は既存のリストを指す必要があるが、
/// ストレージ側の外部キーではなくハンドラーの存在確認で担保する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub list_id: ListId,
    pub description: String,
    pub completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// 未完了のタスクを新規作成
    pub fn new(list_id: ListId, description: &str) -> Result<Self, DomainError> {
        let description = normalize_task_description(description)?;
        let now = current_timestamp();

        Ok(Self {
            id: TaskId::new(),
            list_id,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }
}

pub fn normalize_task_description(description: &str) -> Result<String, DomainError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidTaskDescription(
            "タスクの説明は必須です".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_TASK_DESCRIPTION_LENGTH {
        return Err(DomainError::InvalidTaskDescription(format!(
            "タスクの説明は{MAX_TASK_DESCRIPTION_LENGTH}文字以内で入力してください"
        )));
    }
    Ok(trimmed.to_string())
}
