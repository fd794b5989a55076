use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, ReturnValue, WriteRequest};
use aws_sdk_dynamodb::Client;
use shared::Config;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::gateway::{create_chunks, GatewayOperation, StorageError, TableGateway, BATCH_WRITE_LIMIT};
use crate::models::{
    attributes_to_item, item_to_attributes, Item, KeyCondition, ScanPage, ScanRequest, TableKey,
    UpdateExpression,
};
use crate::tables::{TableSchema, Tables};

/// DynamoDB をバックエンドとするゲートウェイ
#[derive(Clone)]
pub struct DynamoDbGateway {
    client: Client,
    schemas: Vec<TableSchema>,
}

impl DynamoDbGateway {
    pub async fn new(config: &Config, tables: &Tables) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let aws_config = loader.load().await;

        Self::from_client(Client::new(&aws_config), tables)
    }

    pub fn from_client(client: Client, tables: &Tables) -> Self {
        Self {
            client,
            schemas: tables.schemas().into_iter().cloned().collect(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, StorageError> {
        self.schemas
            .iter()
            .find(|schema| schema.name == table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    fn convert_error<E>(
        &self,
        operation: GatewayOperation,
        table: &str,
        e: aws_sdk_dynamodb::error::SdkError<E>,
    ) -> StorageError
    where
        E: std::error::Error + 'static,
    {
        let message = DisplayErrorContext(&e).to_string();
        error!(
            operation = operation.as_str(),
            table = table,
            error = %message,
            "DynamoDB操作エラー"
        );
        StorageError::Backend(message)
    }
}

#[async_trait]
impl TableGateway for DynamoDbGateway {
    async fn get_item(&self, table: &str, key: &TableKey) -> Result<Option<Item>, StorageError> {
        self.schema(table)?.check_key(key)?;
        debug!(operation = "GetItem", table = table, "DynamoDB呼び出し");

        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key.to_attribute_map()))
            .send()
            .await
            .map_err(|e| self.convert_error(GatewayOperation::GetItem, table, e))?;

        Ok(output.item.as_ref().map(attributes_to_item))
    }

    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        condition: &KeyCondition,
    ) -> Result<Vec<Item>, StorageError> {
        let schema = self.schema(table)?;
        if let Some(index) = index {
            schema.index(index)?;
        }
        debug!(
            operation = "Query",
            table = table,
            index = index.unwrap_or("-"),
            "DynamoDB呼び出し"
        );

        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(table)
                .set_index_name(index.map(str::to_string))
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", &condition.attribute)
                .expression_attribute_values(":v", AttributeValue::S(condition.value.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| self.convert_error(GatewayOperation::Query, table, e))?;

            items.extend(output.items.unwrap_or_default().iter().map(attributes_to_item));

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(table = table, count = items.len(), "Query完了");
        Ok(items)
    }

    async fn update_item(
        &self,
        table: &str,
        key: &TableKey,
        update: &UpdateExpression,
    ) -> Result<Item, StorageError> {
        self.schema(table)?.check_key(key)?;
        if update.is_empty() {
            return Err(StorageError::EmptyUpdate(table.to_string()));
        }
        debug!(operation = "UpdateItem", table = table, "DynamoDB呼び出し");

        let (expression, names, values) = update.to_dynamodb();
        let output = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(key.to_attribute_map()))
            .update_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| self.convert_error(GatewayOperation::UpdateItem, table, e))?;

        Ok(output
            .attributes
            .as_ref()
            .map(attributes_to_item)
            .unwrap_or_default())
    }

    async fn delete_item(&self, table: &str, key: &TableKey) -> Result<(), StorageError> {
        self.schema(table)?.check_key(key)?;
        debug!(operation = "DeleteItem", table = table, "DynamoDB呼び出し");

        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key.to_attribute_map()))
            .send()
            .await
            .map_err(|e| self.convert_error(GatewayOperation::DeleteItem, table, e))?;

        Ok(())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError> {
        self.schema(table)?.key_of(&item)?;
        debug!(operation = "PutItem", table = table, "DynamoDB呼び出し");

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item_to_attributes(&item)))
            .send()
            .await
            .map_err(|e| self.convert_error(GatewayOperation::PutItem, table, e))?;

        Ok(())
    }

    async fn batch_delete(&self, table: &str, keys: &[TableKey]) -> Result<(), StorageError> {
        let schema = self.schema(table)?;
        for key in keys {
            schema.check_key(key)?;
        }

        for chunk in create_chunks(keys, BATCH_WRITE_LIMIT) {
            debug!(
                operation = "BatchWriteItem",
                table = table,
                count = chunk.len(),
                "DynamoDB呼び出し"
            );

            let mut requests = Vec::with_capacity(chunk.len());
            for key in &chunk {
                let delete_request = DeleteRequest::builder()
                    .set_key(Some(key.to_attribute_map()))
                    .build()
                    .map_err(|e| StorageError::InvalidKey {
                        table: table.to_string(),
                        reason: e.to_string(),
                    })?;
                requests.push(WriteRequest::builder().delete_request(delete_request).build());
            }

            let output = self
                .client
                .batch_write_item()
                .request_items(table, requests)
                .send()
                .await
                .map_err(|e| self.convert_error(GatewayOperation::BatchDelete, table, e))?;

            let unprocessed = output
                .unprocessed_items
                .as_ref()
                .and_then(|items| items.get(table))
                .map(Vec::len)
                .unwrap_or(0);
            if unprocessed > 0 {
                error!(table = table, unprocessed = unprocessed, "未処理の削除リクエストが残りました");
                return Err(StorageError::Unprocessed(table.to_string()));
            }
        }

        Ok(())
    }

    async fn scan(&self, table: &str, request: &ScanRequest) -> Result<ScanPage, StorageError> {
        self.schema(table)?;
        debug!(operation = "Scan", table = table, limit = ?request.limit, "DynamoDB呼び出し");

        let output = self
            .client
            .scan()
            .table_name(table)
            .set_limit(request.limit)
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(item_to_attributes))
            .send()
            .await
            .map_err(|e| self.convert_error(GatewayOperation::Scan, table, e))?;

        Ok(ScanPage {
            items: output
                .items
                .unwrap_or_default()
                .iter()
                .map(attributes_to_item)
                .collect(),
            last_evaluated_key: output
                .last_evaluated_key
                .filter(|key| !key.is_empty())
                .as_ref()
                .map(attributes_to_item),
        })
    }
}
