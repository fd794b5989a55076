//! リクエストペイロードの制約検証
//!
//! スキーマは検査項目のホワイトリストであり、スキーマに無いフィールドは
//! 検査されずにそのまま通過する。スキーマは読み込み時に一度だけ検証される。

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// パース済みのリクエストボディ
pub type Payload = Map<String, Value>;

/// 値の型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    Array,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            FieldType::Number => value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

/// 検証済みのルール
#[derive(Debug, Clone)]
pub enum Rule {
    Presence { allow_empty: bool },
    Type(FieldType),
    Format(Regex),
    Length { min: Option<usize>, max: Option<usize> },
    Numericality { min: Option<f64>, max: Option<f64> },
}

/// 違反したルールの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Missing,
    Type,
    Format,
    Length,
    Numericality,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Duplicate field `{field}` in schema `{schema}`")]
    DuplicateField {
        schema: &'static str,
        field: &'static str,
    },

    #[error("Invalid pattern for `{field}` in schema `{schema}`: {source}")]
    InvalidPattern {
        schema: &'static str,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid bounds for `{field}` in schema `{schema}`: min is greater than max")]
    InvalidBounds {
        schema: &'static str,
        field: &'static str,
    },
}

/// 宣言段階のルール（パターンは未コンパイル）
#[derive(Debug, Clone)]
enum RuleSpec {
    Presence { allow_empty: bool },
    Type(FieldType),
    Format(&'static str),
    Length { min: Option<usize>, max: Option<usize> },
    Numericality { min: Option<f64>, max: Option<f64> },
}

/// 1フィールド分の制約宣言
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    rules: Vec<RuleSpec>,
}

impl Field {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    /// 必須かつ空文字不可
    pub fn required(mut self) -> Self {
        self.rules.push(RuleSpec::Presence { allow_empty: false });
        self
    }

    /// 必須だが空文字は許可
    pub fn required_allow_empty(mut self) -> Self {
        self.rules.push(RuleSpec::Presence { allow_empty: true });
        self
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.rules.push(RuleSpec::Type(field_type));
        self
    }

    pub fn string(self) -> Self {
        self.of_type(FieldType::String)
    }

    pub fn boolean(self) -> Self {
        self.of_type(FieldType::Boolean)
    }

    pub fn integer(self) -> Self {
        self.of_type(FieldType::Integer)
    }

    pub fn format(mut self, pattern: &'static str) -> Self {
        self.rules.push(RuleSpec::Format(pattern));
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.rules.push(RuleSpec::Length { min, max });
        self
    }

    pub fn numericality(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rules.push(RuleSpec::Numericality { min, max });
        self
    }
}

#[derive(Debug, Clone)]
struct FieldConstraint {
    name: &'static str,
    rules: Vec<Rule>,
}

/// 1操作分の制約スキーマ（不変・リクエスト間で共有）
#[derive(Debug, Clone)]
pub struct ConstraintSchema {
    name: &'static str,
    fields: Vec<FieldConstraint>,
}

pub struct ConstraintSchemaBuilder {
    name: &'static str,
    fields: Vec<Field>,
}

impl ConstraintSchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// パターンのコンパイルと境界値の検査を行い、スキーマを確定する
    pub fn build(self) -> Result<ConstraintSchema, SchemaError> {
        let schema = self.name;
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for field in self.fields {
            if !seen.insert(field.name) {
                return Err(SchemaError::DuplicateField {
                    schema,
                    field: field.name,
                });
            }

            let mut rules = Vec::with_capacity(field.rules.len());
            for spec in field.rules {
                let rule = match spec {
                    RuleSpec::Presence { allow_empty } => Rule::Presence { allow_empty },
                    RuleSpec::Type(field_type) => Rule::Type(field_type),
                    RuleSpec::Format(pattern) => {
                        let regex = Regex::new(pattern).map_err(|source| {
                            SchemaError::InvalidPattern {
                                schema,
                                field: field.name,
                                source,
                            }
                        })?;
                        Rule::Format(regex)
                    }
                    RuleSpec::Length { min, max } => {
                        if matches!((min, max), (Some(lo), Some(hi)) if lo > hi) {
                            return Err(SchemaError::InvalidBounds {
                                schema,
                                field: field.name,
                            });
                        }
                        Rule::Length { min, max }
                    }
                    RuleSpec::Numericality { min, max } => {
                        if matches!((min, max), (Some(lo), Some(hi)) if lo > hi) {
                            return Err(SchemaError::InvalidBounds {
                                schema,
                                field: field.name,
                            });
                        }
                        Rule::Numericality { min, max }
                    }
                };
                rules.push(rule);
            }

            fields.push(FieldConstraint {
                name: field.name,
                rules,
            });
        }

        Ok(ConstraintSchema {
            name: self.name,
            fields,
        })
    }
}

impl ConstraintSchema {
    pub fn builder(name: &'static str) -> ConstraintSchemaBuilder {
        ConstraintSchemaBuilder {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    pub fn validate(&self, payload: &Payload) -> Result<(), ValidationFailure> {
        validate(payload, self)
    }
}

/// 1件の違反
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub rule: RuleKind,
    pub message: String,
}

/// フィールドごとの違反一覧
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationFailure {
    errors: BTreeMap<String, Vec<Violation>>,
}

impl ValidationFailure {
    fn push(&mut self, field: &str, rule: RuleKind, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(Violation { rule, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn violations(&self, field: &str) -> &[Violation] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_violation(&self, field: &str, rule: RuleKind) -> bool {
        self.violations(field).iter().any(|v| v.rule == rule)
    }

    /// `{ "listId": ["List id can't be blank"] }` 形式に変換
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .errors
            .iter()
            .map(|(field, violations)| {
                let messages = violations
                    .iter()
                    .map(|v| Value::String(v.message.clone()))
                    .collect();
                (field.clone(), Value::Array(messages))
            })
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .errors
            .values()
            .flatten()
            .map(|v| v.message.as_str())
            .collect();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ValidationFailure {}

/// ペイロードをスキーマに照らして検証する（副作用なし）
pub fn validate(payload: &Payload, schema: &ConstraintSchema) -> Result<(), ValidationFailure> {
    let mut failure = ValidationFailure::default();

    for field in &schema.fields {
        let value = payload.get(field.name).filter(|v| !v.is_null());
        let label = humanize(field.name);

        for rule in &field.rules {
            match (rule, value) {
                (Rule::Presence { allow_empty }, value) => {
                    let missing = match value {
                        None => true,
                        Some(v) => !allow_empty && is_empty_value(v),
                    };
                    if missing {
                        failure.push(field.name, RuleKind::Missing, format!("{label} can't be blank"));
                    }
                }
                // 値が無い場合、存在チェック以外のルールは評価しない
                (_, None) => {}
                (Rule::Type(field_type), Some(v)) => {
                    if !field_type.matches(v) {
                        failure.push(
                            field.name,
                            RuleKind::Type,
                            format!("{label} must be of type {}", field_type.as_str()),
                        );
                    }
                }
                (Rule::Format(regex), Some(Value::String(s))) => {
                    if !regex.is_match(s) {
                        failure.push(field.name, RuleKind::Format, format!("{label} is invalid"));
                    }
                }
                (Rule::Length { min, max }, Some(Value::String(s))) => {
                    let length = s.chars().count();
                    if let Some(min) = min.filter(|min| length < *min) {
                        failure.push(
                            field.name,
                            RuleKind::Length,
                            format!("{label} is too short (minimum is {min} characters)"),
                        );
                    }
                    if let Some(max) = max.filter(|max| length > *max) {
                        failure.push(
                            field.name,
                            RuleKind::Length,
                            format!("{label} is too long (maximum is {max} characters)"),
                        );
                    }
                }
                // 文字列以外への書式・長さチェックは型ルールに任せる
                (Rule::Format(_), Some(_)) | (Rule::Length { .. }, Some(_)) => {}
                (Rule::Numericality { min, max }, Some(v)) => match v.as_f64() {
                    Some(n) => {
                        if let Some(min) = min.filter(|min| n < *min) {
                            failure.push(
                                field.name,
                                RuleKind::Numericality,
                                format!("{label} must be greater than or equal to {min}"),
                            );
                        }
                        if let Some(max) = max.filter(|max| n > *max) {
                            failure.push(
                                field.name,
                                RuleKind::Numericality,
                                format!("{label} must be less than or equal to {max}"),
                            );
                        }
                    }
                    None => failure.push(
                        field.name,
                        RuleKind::Numericality,
                        format!("{label} is not a number"),
                    ),
                },
            }
        }
    }

    if failure.is_empty() {
        Ok(())
    } else {
        Err(failure)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// `listId` → `List id`
fn humanize(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c == '_' || c == '-' {
            words.push(' ');
        } else if c.is_uppercase() && i > 0 {
            words.push(' ');
            words.extend(c.to_lowercase());
        } else if i == 0 {
            words.extend(c.to_uppercase());
        } else {
            words.push(c);
        }
    }
    words
}
