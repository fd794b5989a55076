use domain::{MAX_LIST_NAME_LENGTH, MAX_TASK_DESCRIPTION_LENGTH};
use shared::{ConstraintSchema, Field, SchemaError};

/// ULID および手動で付与されたIDの両方を受け付ける
const ID_PATTERN: &str = r"^[A-Za-z0-9_-]+$";
const MAX_ID_LENGTH: usize = 64;
/// 空白のみの文字列を拒否
const NOT_BLANK_PATTERN: &str = r"\S";

/// 1回の一覧取得で返す最大件数
pub const MAX_PAGE_SIZE: f64 = 100.0;

fn id_field(name: &'static str) -> Field {
    Field::new(name)
        .required()
        .string()
        .length(Some(1), Some(MAX_ID_LENGTH))
        .format(ID_PATTERN)
}

fn list_name_field() -> Field {
    Field::new("name")
        .required()
        .string()
        .length(Some(1), Some(MAX_LIST_NAME_LENGTH))
        .format(NOT_BLANK_PATTERN)
}

fn description_field() -> Field {
    Field::new("description")
        .string()
        .length(Some(1), Some(MAX_TASK_DESCRIPTION_LENGTH))
        .format(NOT_BLANK_PATTERN)
}

/// 全操作の制約スキーマ
///
/// プロセス起動時に一度だけ構築され、以降は読み取り専用で共有される。
#[derive(Debug, Clone)]
pub struct Constraints {
    pub create_list: ConstraintSchema,
    pub get_list: ConstraintSchema,
    pub list_lists: ConstraintSchema,
    pub update_list: ConstraintSchema,
    pub delete_list: ConstraintSchema,
    pub create_task: ConstraintSchema,
    pub update_task: ConstraintSchema,
    pub delete_task: ConstraintSchema,
}

impl Constraints {
    pub fn load() -> Result<Self, SchemaError> {
        Ok(Self {
            create_list: ConstraintSchema::builder("create-list")
                .field(list_name_field())
                .build()?,
            get_list: ConstraintSchema::builder("get-list")
                .field(id_field("listId"))
                .build()?,
            list_lists: ConstraintSchema::builder("list-lists")
                .field(
                    Field::new("limit")
                        .integer()
                        .numericality(Some(1.0), Some(MAX_PAGE_SIZE)),
                )
                .field(
                    Field::new("startKey")
                        .string()
                        .length(Some(1), Some(MAX_ID_LENGTH))
                        .format(ID_PATTERN),
                )
                .build()?,
            update_list: ConstraintSchema::builder("update-list")
                .field(id_field("listId"))
                .field(list_name_field())
                .build()?,
            delete_list: ConstraintSchema::builder("delete-list")
                .field(id_field("listId"))
                .build()?,
            create_task: ConstraintSchema::builder("create-task")
                .field(id_field("listId"))
                .field(description_field().required())
                .build()?,
            update_task: ConstraintSchema::builder("update-task")
                .field(id_field("taskId"))
                .field(id_field("listId"))
                .field(description_field())
                .field(Field::new("completed").boolean())
                .build()?,
            delete_task: ConstraintSchema::builder("delete-task")
                .field(id_field("taskId"))
                .field(id_field("listId"))
                .build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Payload, RuleKind};
    use serde_json::{json, Value};

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_all_schemas_load() {
        let constraints = Constraints::load().unwrap();
        assert_eq!(constraints.get_list.name(), "get-list");
        assert_eq!(
            constraints.delete_task.field_names().collect::<Vec<_>>(),
            vec!["taskId", "listId"]
        );
    }

    #[test]
    fn test_get_list_requires_list_id() {
        let constraints = Constraints::load().unwrap();
        let failure = constraints
            .get_list
            .validate(&payload(json!({})))
            .unwrap_err();

        assert!(failure.has_violation("listId", RuleKind::Missing));
    }

    #[test]
    fn test_extra_fields_pass() {
        let constraints = Constraints::load().unwrap();
        let result = constraints
            .update_list
            .validate(&payload(json!({ "listId": "L1", "name": "Groceries", "color": "red" })));

        assert!(result.is_ok());
    }

    #[test]
    fn test_id_format_rejects_separators() {
        let constraints = Constraints::load().unwrap();
        let failure = constraints
            .delete_task
            .validate(&payload(json!({ "taskId": "T1#x", "listId": "L1" })))
            .unwrap_err();

        assert!(failure.has_violation("taskId", RuleKind::Format));
        assert!(failure.violations("listId").is_empty());
    }

    #[test]
    fn test_update_task_optional_fields_are_type_checked() {
        let constraints = Constraints::load().unwrap();

        assert!(constraints
            .update_task
            .validate(&payload(json!({ "taskId": "T1", "listId": "L1" })))
            .is_ok());

        let failure = constraints
            .update_task
            .validate(&payload(json!({ "taskId": "T1", "listId": "L1", "completed": "yes" })))
            .unwrap_err();
        assert!(failure.has_violation("completed", RuleKind::Type));
    }

    #[test]
    fn test_whitespace_description_is_invalid() {
        let constraints = Constraints::load().unwrap();
        let failure = constraints
            .update_task
            .validate(&payload(json!({ "taskId": "T1", "listId": "L1", "description": "   " })))
            .unwrap_err();

        assert!(failure.has_violation("description", RuleKind::Format));
    }

    #[test]
    fn test_list_lists_limit_bounds() {
        let constraints = Constraints::load().unwrap();
        let failure = constraints
            .list_lists
            .validate(&payload(json!({ "limit": 0 })))
            .unwrap_err();

        assert!(failure.has_violation("limit", RuleKind::Numericality));
        assert!(constraints.list_lists.validate(&Payload::new()).is_ok());
    }
}
