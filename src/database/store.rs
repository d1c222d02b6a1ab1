//! 持久化存储抽象

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::user::{Page, PageRequest, UserRecord, UserStatus};

/// 消息用户持久化存储，所有用户的数据源
///
/// 目录只依赖这几个操作，SQL 和连接细节由实现负责。
#[async_trait]
pub trait MessageUserStore: Send + Sync {
    /// 查询状态不等于 `status` 的全部用户
    async fn find_by_status_not(&self, status: UserStatus)
    -> Result<Vec<UserRecord>, StoreError>;

    /// 插入或更新，返回持久化后的记录
    async fn save(&self, record: &UserRecord) -> Result<UserRecord, StoreError>;

    async fn find_one(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_all(&self, page: &PageRequest) -> Result<Page<UserRecord>, StoreError>;

    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// 删除用户，不存在时不报错
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: MessageUserStore + ?Sized> MessageUserStore for Arc<S> {
    async fn find_by_status_not(
        &self,
        status: UserStatus,
    ) -> Result<Vec<UserRecord>, StoreError> {
        (**self).find_by_status_not(status).await
    }

    async fn save(&self, record: &UserRecord) -> Result<UserRecord, StoreError> {
        (**self).save(record).await
    }

    async fn find_one(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_one(id).await
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<UserRecord>, StoreError> {
        (**self).find_all(page).await
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        (**self).exists(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
