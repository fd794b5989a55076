use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::gateway::{create_chunks, GatewayOperation, StorageError, TableGateway, BATCH_WRITE_LIMIT};
use crate::models::{Item, KeyCondition, ScanPage, ScanRequest, TableKey, UpdateExpression};
use crate::tables::{TableSchema, Tables};

type StoredKey = (String, Option<String>);

struct MemoryTable {
    schema: TableSchema,
    items: BTreeMap<StoredKey, Item>,
}

fn stored_key(key: &TableKey) -> StoredKey {
    (
        key.partition.value.clone(),
        key.sort.as_ref().map(|sort| sort.value.clone()),
    )
}

/// プロセス内メモリ上のゲートウェイ（テスト・ローカル実行用）
///
/// DynamoDB と同じく、存在しないキーへの更新は項目を作成し、
/// 存在しないキーの削除はエラーにしない。
pub struct InMemoryGateway {
    tables: RwLock<HashMap<String, MemoryTable>>,
    writes: AtomicUsize,
    failing: RwLock<HashSet<GatewayOperation>>,
}

impl InMemoryGateway {
    pub fn new(tables: &Tables) -> Self {
        let tables = tables
            .schemas()
            .into_iter()
            .map(|schema| {
                (
                    schema.name.clone(),
                    MemoryTable {
                        schema: schema.clone(),
                        items: BTreeMap::new(),
                    },
                )
            })
            .collect();

        Self {
            tables: RwLock::new(tables),
            writes: AtomicUsize::new(0),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// 指定した操作を常に失敗させる
    pub async fn fail_on(&self, operation: GatewayOperation) {
        self.failing.write().await.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.items.len())
            .unwrap_or(0)
    }

    /// 成功した書き込み操作（put/update/delete/batch_delete）の回数
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn check(&self, operation: GatewayOperation, table: &str) -> Result<(), StorageError> {
        debug!(operation = operation.as_str(), table = table, "InMemory呼び出し");
        if self.failing.read().await.contains(&operation) {
            return Err(StorageError::Backend(format!(
                "injected failure for {operation} on {table}"
            )));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, MemoryTable>,
    table: &str,
) -> Result<&'a mut MemoryTable, StorageError> {
    tables
        .get_mut(table)
        .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
}

fn table_ref<'a>(
    tables: &'a HashMap<String, MemoryTable>,
    table: &str,
) -> Result<&'a MemoryTable, StorageError> {
    tables
        .get(table)
        .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
}

#[async_trait]
impl TableGateway for InMemoryGateway {
    async fn get_item(&self, table: &str, key: &TableKey) -> Result<Option<Item>, StorageError> {
        self.check(GatewayOperation::GetItem, table).await?;
        let tables = self.tables.read().await;
        let memory = table_ref(&tables, table)?;
        memory.schema.check_key(key)?;

        Ok(memory.items.get(&stored_key(key)).cloned())
    }

    async fn query(
        &self,
        table: &str,
        index: Option<&str>,
        condition: &KeyCondition,
    ) -> Result<Vec<Item>, StorageError> {
        self.check(GatewayOperation::Query, table).await?;
        let tables = self.tables.read().await;
        let memory = table_ref(&tables, table)?;

        let expected = match index {
            Some(name) => &memory.schema.index(name)?.partition_key,
            None => &memory.schema.partition_key,
        };
        if *expected != condition.attribute {
            return Err(StorageError::InvalidKey {
                table: table.to_string(),
                reason: format!(
                    "query on `{}` but key attribute is `{expected}`",
                    condition.attribute
                ),
            });
        }

        Ok(memory
            .items
            .values()
            .filter(|item| condition.matches(item))
            .cloned()
            .collect())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &TableKey,
        update: &UpdateExpression,
    ) -> Result<Item, StorageError> {
        self.check(GatewayOperation::UpdateItem, table).await?;
        if update.is_empty() {
            return Err(StorageError::EmptyUpdate(table.to_string()));
        }

        let mut tables = self.tables.write().await;
        let memory = table_mut(&mut tables, table)?;
        memory.schema.check_key(key)?;

        let stored = memory
            .items
            .entry(stored_key(key))
            .or_insert_with(|| key.to_item());

        let mut updated = Item::new();
        for (attribute, value) in update.assignments() {
            stored.insert(attribute.clone(), value.clone());
            updated.insert(attribute.clone(), value.clone());
        }

        self.record_write();
        Ok(updated)
    }

    async fn delete_item(&self, table: &str, key: &TableKey) -> Result<(), StorageError> {
        self.check(GatewayOperation::DeleteItem, table).await?;
        let mut tables = self.tables.write().await;
        let memory = table_mut(&mut tables, table)?;
        memory.schema.check_key(key)?;

        memory.items.remove(&stored_key(key));
        self.record_write();
        Ok(())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError> {
        self.check(GatewayOperation::PutItem, table).await?;
        let mut tables = self.tables.write().await;
        let memory = table_mut(&mut tables, table)?;
        let key = memory.schema.key_of(&item)?;

        memory.items.insert(stored_key(&key), item);
        self.record_write();
        Ok(())
    }

    async fn batch_delete(&self, table: &str, keys: &[TableKey]) -> Result<(), StorageError> {
        self.check(GatewayOperation::BatchDelete, table).await?;
        let mut tables = self.tables.write().await;
        let memory = table_mut(&mut tables, table)?;
        for key in keys {
            memory.schema.check_key(key)?;
        }

        for chunk in create_chunks(keys, BATCH_WRITE_LIMIT) {
            for key in &chunk {
                memory.items.remove(&stored_key(key));
            }
            self.record_write();
        }
        Ok(())
    }

    async fn scan(&self, table: &str, request: &ScanRequest) -> Result<ScanPage, StorageError> {
        self.check(GatewayOperation::Scan, table).await?;
        let tables = self.tables.read().await;
        let memory = table_ref(&tables, table)?;

        let start = match &request.exclusive_start_key {
            Some(item) => Some(stored_key(&memory.schema.key_of(item)?)),
            None => None,
        };
        let limit = request
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| *limit > 0);

        let mut remaining = memory
            .items
            .iter()
            .filter(|(key, _)| start.as_ref().map_or(true, |start| *key > start));

        let mut items = Vec::new();
        for (_, item) in remaining.by_ref() {
            items.push(item.clone());
            if limit == Some(items.len()) {
                break;
            }
        }

        // 続きが無ければ最終ページ
        let last_evaluated_key = match items.last() {
            Some(last) if limit == Some(items.len()) && remaining.next().is_some() => {
                Some(memory.schema.key_of(last)?.to_item())
            }
            _ => None,
        };

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }
}
