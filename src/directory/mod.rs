//! 带活跃用户缓存的消息用户目录
//!
//! 读操作先查缓存，单个ID未命中时回落到存储；写操作先写存储，
//! 成功后再让缓存与之保持一致。缓存只保存状态不是 DISABLED 的用户。

mod locks;

use std::collections::HashSet;

use crate::cache::models::user::CacheStats;
use crate::cache::operations::user::ActiveUserCache;
use crate::database::store::MessageUserStore;
use crate::error::{DirectoryError, DirectoryResult};
use crate::models::user::{Page, PageRequest, UserRecord, UserStatus};

use self::locks::WriteLocks;

/// 默认缓存容量
pub const DEFAULT_CACHE_CAPACITY: usize = 60;

/// 单个ID查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// 缓存命中
    Cached(UserRecord),
    /// 缓存未命中，存储中找到
    Stored(UserRecord),
    Missing,
}

impl Lookup {
    pub fn into_record(self) -> Option<UserRecord> {
        match self {
            Lookup::Cached(record) | Lookup::Stored(record) => Some(record),
            Lookup::Missing => None,
        }
    }
}

pub struct MessageUserDirectory<S> {
    cache: ActiveUserCache,
    store: S,
    writes: WriteLocks,
}

impl<S: MessageUserStore> MessageUserDirectory<S> {
    /// 创建目录并从存储预热缓存
    pub async fn load(store: S) -> DirectoryResult<Self> {
        Self::with_capacity(store, DEFAULT_CACHE_CAPACITY).await
    }

    pub async fn with_capacity(store: S, capacity: usize) -> DirectoryResult<Self> {
        let active = store.find_by_status_not(UserStatus::Disabled).await?;
        let cache = ActiveUserCache::with_capacity(capacity.max(active.len()));
        cache.replace_all(active);
        tracing::info!("Warmed message user cache with {} active users", cache.len());

        Ok(Self {
            cache,
            store,
            writes: WriteLocks::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 缓存优先，未命中时查询存储；存储结果不回写缓存
    pub async fn lookup(&self, id: &str) -> DirectoryResult<Lookup> {
        require_id(id)?;

        if let Some(record) = self.cache.get(id) {
            tracing::debug!("Message user cache hit: {}", id);
            return Ok(Lookup::Cached(record));
        }

        tracing::debug!("Message user cache miss: {}", id);
        Ok(match self.store.find_one(id).await? {
            Some(record) => Lookup::Stored(record),
            None => Lookup::Missing,
        })
    }

    pub async fn get(&self, id: &str) -> DirectoryResult<Option<UserRecord>> {
        Ok(self.lookup(id).await?.into_record())
    }

    pub async fn exist(&self, id: &str) -> DirectoryResult<bool> {
        require_id(id)?;

        if self.cache.contains(id) {
            return Ok(true);
        }
        Ok(self.store.exists(id).await?)
    }

    /// 新建用户，ID已存在（缓存或存储）时返回 `AlreadyExists`
    ///
    /// 同一进程内对同一ID的写操作串行执行，检查、写存储和同步缓存之间不会穿插其他写入。
    pub async fn create(&self, mut record: UserRecord) -> DirectoryResult<UserRecord> {
        require_id(&record.id)?;

        let _write = self.writes.lock(&record.id).await;
        if self.exist(&record.id).await? {
            return Err(DirectoryError::AlreadyExists(record.id));
        }

        record.refresh_usable();
        let saved = self.persist(&record).await?;
        self.sync_cache(&saved);
        tracing::info!("Created message user: {} ({})", saved.id, saved.status);

        Ok(saved)
    }

    /// 更新已有用户，不存在时返回 `NotFound`
    pub async fn save(&self, mut record: UserRecord) -> DirectoryResult<UserRecord> {
        require_id(&record.id)?;

        let _write = self.writes.lock(&record.id).await;
        if let Lookup::Missing = self.lookup(&record.id).await? {
            return Err(DirectoryError::NotFound(record.id));
        }

        record.refresh_usable();
        let saved = self.persist(&record).await?;
        self.sync_cache(&saved);
        tracing::info!("Updated message user: {} ({})", saved.id, saved.status);

        Ok(saved)
    }

    /// 先移出缓存再从存储删除，不存在时不报错
    pub async fn remove(&self, id: &str) -> DirectoryResult<()> {
        require_id(id)?;

        let _write = self.writes.lock(id).await;
        self.cache.remove(id);
        if let Err(e) = self.store.delete(id).await {
            tracing::warn!("Failed to delete message user {}: {}", id, e);
            return Err(e.into());
        }
        tracing::info!("Removed message user: {}", id);

        Ok(())
    }

    /// 直接查询存储，不经过缓存
    pub async fn find_by_status_not(&self, status: UserStatus) -> DirectoryResult<Vec<UserRecord>> {
        Ok(self.store.find_by_status_not(status).await?)
    }

    /// 缓存中全部活跃用户的快照，顺序不确定
    pub fn find_all(&self) -> Vec<UserRecord> {
        self.cache.values()
    }

    /// 只从缓存中取，未缓存的ID直接忽略
    pub fn find_all_by_ids(&self, ids: &HashSet<String>) -> Vec<UserRecord> {
        self.cache.select(ids)
    }

    pub async fn find_by_page(&self, page: &PageRequest) -> DirectoryResult<Page<UserRecord>> {
        page.validate()?;
        Ok(self.store.find_all(page).await?)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.contains(id)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn persist(&self, record: &UserRecord) -> DirectoryResult<UserRecord> {
        match self.store.save(record).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                tracing::warn!("Failed to persist message user {}: {}", record.id, e);
                Err(e.into())
            }
        }
    }

    /// 禁用的用户移出缓存，其余的覆盖写入
    fn sync_cache(&self, saved: &UserRecord) {
        if saved.is_active() {
            self.cache.insert(saved.clone());
        } else if self.cache.remove(&saved.id) {
            tracing::debug!("Evicted disabled message user: {}", saved.id);
        }
    }
}

fn require_id(id: &str) -> DirectoryResult<()> {
    if id.trim().is_empty() {
        return Err(DirectoryError::invalid("id is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::memory::MemoryMessageUserStore;

    async fn directory() -> MessageUserDirectory<Arc<MemoryMessageUserStore>> {
        let store = Arc::new(MemoryMessageUserStore::from_records([
            UserRecord::new("u1", "alice", UserStatus::Active),
            UserRecord::new("u2", "bob", UserStatus::Disabled),
            UserRecord::new("u3", "carol", UserStatus::Suspended),
        ]));
        MessageUserDirectory::load(store).await.unwrap()
    }

    #[tokio::test]
    async fn lookup_reports_source() {
        let dir = directory().await;

        assert!(matches!(dir.lookup("u1").await.unwrap(), Lookup::Cached(_)));
        assert!(matches!(dir.lookup("u2").await.unwrap(), Lookup::Stored(_)));
        assert_eq!(dir.lookup("u9").await.unwrap(), Lookup::Missing);
    }

    #[tokio::test]
    async fn store_hit_is_not_cached() {
        let dir = directory().await;

        let record = dir.get("u2").await.unwrap().unwrap();
        assert_eq!(record.status, UserStatus::Disabled);
        assert!(!dir.is_cached("u2"));
    }

    #[tokio::test]
    async fn empty_ids_are_rejected() {
        let dir = directory().await;

        assert!(matches!(dir.get("").await, Err(DirectoryError::InvalidArgument(_))));
        assert!(matches!(dir.exist("  ").await, Err(DirectoryError::InvalidArgument(_))));
        assert!(matches!(dir.remove("").await, Err(DirectoryError::InvalidArgument(_))));

        let blank = UserRecord::new("", "nobody", UserStatus::Active);
        assert!(matches!(
            dir.create(blank.clone()).await,
            Err(DirectoryError::InvalidArgument(_))
        ));
        assert!(matches!(dir.save(blank).await, Err(DirectoryError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn save_disabled_evicts() {
        let dir = directory().await;

        let mut record = dir.get("u1").await.unwrap().unwrap();
        record.status = UserStatus::Disabled;
        let saved = dir.save(record).await.unwrap();

        assert!(!saved.usable);
        assert!(!dir.is_cached("u1"));
        assert_eq!(
            dir.store().snapshot("u1").unwrap().status,
            UserStatus::Disabled
        );
    }

    #[tokio::test]
    async fn save_reactivates_into_cache() {
        let dir = directory().await;

        let mut record = dir.get("u2").await.unwrap().unwrap();
        record.status = UserStatus::Active;
        dir.save(record).await.unwrap();

        let cached = dir.find_all_by_ids(&HashSet::from(["u2".to_string()]));
        assert_eq!(cached.len(), 1);
        assert!(cached[0].usable);
    }

    #[tokio::test]
    async fn create_disabled_is_stored_only() {
        let dir = directory().await;

        dir.create(UserRecord::new("u4", "dave", UserStatus::Disabled))
            .await
            .unwrap();

        assert!(!dir.is_cached("u4"));
        assert!(dir.exist("u4").await.unwrap());
    }

    #[tokio::test]
    async fn page_size_is_validated() {
        let dir = directory().await;

        assert!(matches!(
            dir.find_by_page(&PageRequest::new(0, 0)).await,
            Err(DirectoryError::InvalidArgument(_))
        ));
        let page = dir.find_by_page(&PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }
}
