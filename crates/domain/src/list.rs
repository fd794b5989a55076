use crate::errors::DomainError;
use crate::timestamp::{current_timestamp, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// リスト名の最大文字数
pub const MAX_LIST_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    /// ULIDで新しいIDを採番
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// 既存のIDをそのまま扱う（IDは不透明な文字列）
    pub fn from_string(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidListId("空のIDは使用できません".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// リスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl List {
    /// 新しいリストを作成
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let name = normalize_list_name(name)?;
        let now = current_timestamp();

        Ok(Self {
            id: ListId::new(),
            name,
            created_at: now,
            updated_at: now,
        })
    }
}

/// リスト名を正規化して検証
pub fn normalize_list_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidListName("リスト名は必須です".to_string()));
    }
    if trimmed.chars().count() > MAX_LIST_NAME_LENGTH {
        return Err(DomainError::InvalidListName(format!(
            "リスト名は{MAX_LIST_NAME_LENGTH}文字以内で入力してください"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_new_sets_equal_timestamps() {
        let list = List::new("  Groceries ").unwrap();

        assert_eq!(list.name, "Groceries");
        assert_eq!(list.created_at, list.updated_at);
        assert_eq!(list.id.as_str().len(), 26);
    }

    #[test]
    fn test_list_new_rejects_blank_name() {
        let result = List::new("   ");
        assert!(matches!(result, Err(DomainError::InvalidListName(_))));
    }

    #[test]
    fn test_list_id_rejects_empty() {
        assert!(ListId::from_string("").is_err());
        assert_eq!(ListId::from_string("L1").unwrap().as_str(), "L1");
    }

    #[test]
    fn test_list_serializes_camel_case() {
        let list = List {
            id: ListId::from_string("L1").unwrap(),
            name: "Groceries".to_string(),
            created_at: 1,
            updated_at: 2,
        };

        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["id"], "L1");
        assert_eq!(value["createdAt"], 1);
        assert_eq!(value["updatedAt"], 2);
    }
}
