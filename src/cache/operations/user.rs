use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::cache::models::user::CacheStats;
use crate::models::user::UserRecord;

/// 活跃用户缓存：用户ID -> 用户记录
///
/// 单个条目的替换在写锁内完成，读者不会看到写了一半的记录。
/// 锁只在同步代码里持有，不跨越 `.await`。
#[derive(Debug, Default)]
pub struct ActiveUserCache {
    users: RwLock<HashMap<String, UserRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ActiveUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            users: RwLock::new(HashMap::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// 按ID读取，同时记录命中统计
    pub fn get(&self, id: &str) -> Option<UserRecord> {
        let found = self.users.read().get(id).cloned();
        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn contains(&self, id: &str) -> bool {
        self.users.read().contains_key(id)
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.id.clone(), record);
    }

    /// 移除条目，返回是否存在
    pub fn remove(&self, id: &str) -> bool {
        self.users.write().remove(id).is_some()
    }

    /// 用给定记录整体替换缓存内容
    pub fn replace_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let mut users = self.users.write();
        users.clear();
        users.extend(records.into_iter().map(|record| (record.id.clone(), record)));
    }

    /// 当前所有缓存值的快照
    pub fn values(&self) -> Vec<UserRecord> {
        self.users.read().values().cloned().collect()
    }

    /// 只返回已缓存且ID在集合中的记录
    pub fn select(&self, ids: &HashSet<String>) -> Vec<UserRecord> {
        let users = self.users.read();
        if ids.len() < users.len() {
            ids.iter().filter_map(|id| users.get(id).cloned()).collect()
        } else {
            users
                .iter()
                .filter(|(id, _)| ids.contains(*id))
                .map(|(_, record)| record.clone())
                .collect()
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
