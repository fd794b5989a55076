use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::gateway::StorageError;

/// テーブル上の1項目（属性名 → JSON値）
pub type Item = Map<String, Value>;

/// キー属性（名前と文字列値）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyAttribute {
    pub name: String,
    pub value: String,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 主キー。ソートキーを持たないテーブルにも対応する
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub partition: KeyAttribute,
    pub sort: Option<KeyAttribute>,
}

impl TableKey {
    pub fn partition(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition: KeyAttribute::new(name, value),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sort = Some(KeyAttribute::new(name, value));
        self
    }

    /// キー属性だけを持つ項目に変換
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            self.partition.name.clone(),
            Value::String(self.partition.value.clone()),
        );
        if let Some(sort) = &self.sort {
            item.insert(sort.name.clone(), Value::String(sort.value.clone()));
        }
        item
    }

    pub fn to_attribute_map(&self) -> HashMap<String, AttributeValue> {
        let mut key = HashMap::new();
        key.insert(
            self.partition.name.clone(),
            AttributeValue::S(self.partition.value.clone()),
        );
        if let Some(sort) = &self.sort {
            key.insert(sort.name.clone(), AttributeValue::S(sort.value.clone()));
        }
        key
    }
}

/// 等価条件のみのキー条件（`attr = :value`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub attribute: String,
    pub value: String,
}

impl KeyCondition {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.attribute).and_then(Value::as_str) == Some(self.value.as_str())
    }
}

/// SET 句だけで構成される部分更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    assignments: Vec<(String, Value)>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同じ属性を再設定した場合は後勝ち
    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        let attribute = attribute.into();
        let value = value.into();
        match self.assignments.iter_mut().find(|(name, _)| *name == attribute) {
            Some(existing) => existing.1 = value,
            None => self.assignments.push((attribute, value)),
        }
        self
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// `SET #a0 = :v0, #a1 = :v1` と属性名・値のプレースホルダーを生成
    ///
    /// 属性名は常にプレースホルダー経由にするため予約語（`name` など）と衝突しない。
    pub fn to_dynamodb(
        &self,
    ) -> (
        String,
        HashMap<String, String>,
        HashMap<String, AttributeValue>,
    ) {
        let mut clauses = Vec::with_capacity(self.assignments.len());
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        for (index, (attribute, value)) in self.assignments.iter().enumerate() {
            let name_placeholder = format!("#a{index}");
            let value_placeholder = format!(":v{index}");
            clauses.push(format!("{name_placeholder} = {value_placeholder}"));
            names.insert(name_placeholder, attribute.clone());
            values.insert(value_placeholder, value_to_attribute(value));
        }

        (format!("SET {}", clauses.join(", ")), names, values)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub limit: Option<i32>,
    pub exclusive_start_key: Option<Item>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

pub fn value_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(value_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(item_to_attributes(map)),
    }
}

pub fn attribute_to_value(attribute: &AttributeValue) -> Value {
    match attribute {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(values.iter().map(attribute_to_value).collect()),
        AttributeValue::M(map) => Value::Object(attributes_to_item(map)),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| parse_number(n)).collect()),
        _ => Value::Null,
    }
}

fn parse_number(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

pub fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), value_to_attribute(value)))
        .collect()
}

pub fn attributes_to_item(attributes: &HashMap<String, AttributeValue>) -> Item {
    attributes
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_value(value)))
        .collect()
}

/// serde でエンティティを項目に変換
pub fn entity_to_item<T: Serialize>(entity: &T) -> Result<Item, StorageError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(item)) => Ok(item),
        Ok(other) => Err(StorageError::Serialization(format!(
            "entity did not serialize to an object: {other}"
        ))),
        Err(e) => Err(StorageError::Serialization(e.to_string())),
    }
}

pub fn entity_from_item<T: DeserializeOwned>(item: Item) -> Result<T, StorageError> {
    serde_json::from_value(Value::Object(item))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{List, Task};
    use serde_json::json;

    #[test]
    fn test_table_key_to_item() {
        let key = TableKey::partition("id", "T1").with_sort("listId", "L1");
        let item = key.to_item();

        assert_eq!(item.get("id"), Some(&json!("T1")));
        assert_eq!(item.get("listId"), Some(&json!("L1")));
        assert_eq!(key.to_attribute_map().len(), 2);
    }

    #[test]
    fn test_update_expression_uses_placeholders() {
        let update = UpdateExpression::new()
            .set("name", "Groceries")
            .set("updatedAt", 1_700_000_000_000_i64);
        let (expression, names, values) = update.to_dynamodb();

        assert_eq!(expression, "SET #a0 = :v0, #a1 = :v1");
        assert_eq!(names.get("#a0").map(String::as_str), Some("name"));
        assert_eq!(
            values.get(":v1"),
            Some(&AttributeValue::N("1700000000000".to_string()))
        );
    }

    #[test]
    fn test_update_expression_last_assignment_wins() {
        let update = UpdateExpression::new()
            .set("completed", false)
            .set("completed", true);

        assert_eq!(update.assignments().len(), 1);
        assert_eq!(update.assignments()[0].1, json!(true));
    }

    #[test]
    fn test_attribute_conversion_preserves_nested_values() {
        let item = json!({
            "id": "L1",
            "count": 3,
            "ratio": 0.5,
            "done": false,
            "tags": ["a", "b"],
            "meta": { "owner": null }
        });
        let Value::Object(item) = item else {
            unreachable!()
        };

        let restored = attributes_to_item(&item_to_attributes(&item));
        assert_eq!(restored, item);
    }

    #[test]
    fn test_string_sets_become_arrays() {
        let value = attribute_to_value(&AttributeValue::Ss(vec!["x".to_string()]));
        assert_eq!(value, json!(["x"]));
    }

    #[test]
    fn test_entity_item_conversion() {
        let list = List::new("Groceries").unwrap();
        let item = entity_to_item(&list).unwrap();

        assert_eq!(item.get("name"), Some(&json!("Groceries")));
        assert!(item.contains_key("createdAt"));

        let restored: List = entity_from_item(item).unwrap();
        assert_eq!(restored, list);
    }

    #[test]
    fn test_entity_from_item_reports_missing_fields() {
        let mut item = Item::new();
        item.insert("id".to_string(), json!("T1"));

        let result = entity_from_item::<Task>(item);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
