use domain::{ListId, TaskId};
use shared::Config;

use crate::gateway::StorageError;
use crate::models::{Item, KeyCondition, TableKey};

/// Taskテーブルの listId 逆引きインデックス（全属性を射影）
pub const LIST_INDEX: &str = "list_index";

pub const ID_ATTRIBUTE: &str = "id";
pub const LIST_ID_ATTRIBUTE: &str = "listId";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: String,
}

/// テーブル定義。ゲートウェイはこの定義に無いインデックスへのクエリを拒否する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    pub fn index(&self, name: &str) -> Result<&IndexSchema, StorageError> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| StorageError::UnknownIndex {
                table: self.name.clone(),
                index: name.to_string(),
            })
    }

    /// 項目から主キーを取り出す
    pub fn key_of(&self, item: &Item) -> Result<TableKey, StorageError> {
        let partition = self.string_attribute(item, &self.partition_key)?;
        let mut key = TableKey::partition(&self.partition_key, partition);
        if let Some(sort_key) = &self.sort_key {
            let sort = self.string_attribute(item, sort_key)?;
            key = key.with_sort(sort_key, sort);
        }
        Ok(key)
    }

    /// キーがこのテーブルの定義と一致するか確認
    pub fn check_key(&self, key: &TableKey) -> Result<(), StorageError> {
        if key.partition.name != self.partition_key {
            return Err(self.invalid_key(format!(
                "expected partition key `{}`, got `{}`",
                self.partition_key, key.partition.name
            )));
        }
        match (&self.sort_key, &key.sort) {
            (Some(expected), Some(actual)) if *expected == actual.name => Ok(()),
            (None, None) => Ok(()),
            (Some(expected), _) => Err(self.invalid_key(format!("missing sort key `{expected}`"))),
            (None, Some(actual)) => Err(self.invalid_key(format!(
                "table has no sort key but `{}` was given",
                actual.name
            ))),
        }
    }

    fn string_attribute<'a>(&self, item: &'a Item, name: &str) -> Result<&'a str, StorageError> {
        item.get(name)
            .and_then(|value| value.as_str())
            .ok_or_else(|| self.invalid_key(format!("attribute `{name}` is missing or not a string")))
    }

    fn invalid_key(&self, reason: String) -> StorageError {
        StorageError::InvalidKey {
            table: self.name.clone(),
            reason,
        }
    }
}

/// List / Task の2テーブル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub list: TableSchema,
    pub tasks: TableSchema,
}

impl Tables {
    pub fn new(list_table: impl Into<String>, tasks_table: impl Into<String>) -> Self {
        Self {
            list: TableSchema {
                name: list_table.into(),
                partition_key: ID_ATTRIBUTE.to_string(),
                sort_key: None,
                indexes: Vec::new(),
            },
            tasks: TableSchema {
                name: tasks_table.into(),
                partition_key: ID_ATTRIBUTE.to_string(),
                sort_key: Some(LIST_ID_ATTRIBUTE.to_string()),
                indexes: vec![IndexSchema {
                    name: LIST_INDEX.to_string(),
                    partition_key: LIST_ID_ATTRIBUTE.to_string(),
                }],
            },
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.list_table.clone(), config.tasks_table.clone())
    }

    pub fn list_key(&self, list_id: &ListId) -> TableKey {
        TableKey::partition(ID_ATTRIBUTE, list_id.as_str())
    }

    pub fn task_key(&self, task_id: &TaskId, list_id: &ListId) -> TableKey {
        TableKey::partition(ID_ATTRIBUTE, task_id.as_str())
            .with_sort(LIST_ID_ATTRIBUTE, list_id.as_str())
    }

    pub fn tasks_by_list(&self, list_id: &ListId) -> KeyCondition {
        KeyCondition::equals(LIST_ID_ATTRIBUTE, list_id.as_str())
    }

    pub fn schemas(&self) -> [&TableSchema; 2] {
        [&self.list, &self.tasks]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables() -> Tables {
        Tables::new("List-dev", "Tasks-dev")
    }

    #[test]
    fn test_task_key_has_sort_key() {
        let tables = tables();
        let key = tables.task_key(
            &TaskId::from_string("T1").unwrap(),
            &ListId::from_string("L1").unwrap(),
        );

        assert_eq!(key.partition.value, "T1");
        assert_eq!(key.sort.as_ref().map(|s| s.value.as_str()), Some("L1"));
        assert!(tables.tasks.check_key(&key).is_ok());
        assert!(tables.list.check_key(&key).is_err());
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let tables = tables();

        assert!(tables.tasks.index(LIST_INDEX).is_ok());
        assert_eq!(
            tables.list.index(LIST_INDEX),
            Err(StorageError::UnknownIndex {
                table: "List-dev".to_string(),
                index: LIST_INDEX.to_string(),
            })
        );
    }

    #[test]
    fn test_key_of_extracts_composite_key() {
        let tables = tables();
        let mut item = Item::new();
        item.insert("id".to_string(), json!("T1"));
        item.insert("listId".to_string(), json!("L1"));
        item.insert("description".to_string(), json!("Milk"));

        let key = tables.tasks.key_of(&item).unwrap();
        assert_eq!(key, TableKey::partition("id", "T1").with_sort("listId", "L1"));

        item.remove("listId");
        assert!(matches!(
            tables.tasks.key_of(&item),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_from_config_uses_table_names() {
        let config = Config {
            list_table: "List-prod".to_string(),
            tasks_table: "Tasks-prod".to_string(),
            environment: "prod".to_string(),
            aws_region: "ap-northeast-1".to_string(),
            dynamodb_endpoint: None,
        };
        let tables = Tables::from_config(&config);

        assert_eq!(tables.list.name, "List-prod");
        assert_eq!(tables.tasks.name, "Tasks-prod");
    }
}
