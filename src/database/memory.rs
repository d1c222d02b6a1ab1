//! 内存存储实现，用于测试和嵌入式场景

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::database::store::MessageUserStore;
use crate::error::StoreError;
use crate::models::user::{Page, PageRequest, UserRecord, UserStatus};

/// 基于 `BTreeMap` 的消息用户存储，列表按ID升序返回
#[derive(Debug, Default)]
pub struct MemoryMessageUserStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl MemoryMessageUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用已有记录初始化
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let users = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// 不经过目录直接读取，测试中用来核对存储内容
    pub fn snapshot(&self, id: &str) -> Option<UserRecord> {
        self.users.read().get(id).cloned()
    }
}

#[async_trait]
impl MessageUserStore for MemoryMessageUserStore {
    async fn find_by_status_not(
        &self,
        status: UserStatus,
    ) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .values()
            .filter(|record| record.status != status)
            .cloned()
            .collect())
    }

    async fn save(&self, record: &UserRecord) -> Result<UserRecord, StoreError> {
        self.users.write().insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn find_one(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<UserRecord>, StoreError> {
        let users = self.users.read();
        let offset = usize::try_from(page.offset()).map_err(StoreError::backend)?;
        let items = users
            .values()
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, page, users.len() as u64))
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.users.read().contains_key(id))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.users.write().remove(id);
        Ok(())
    }
}
