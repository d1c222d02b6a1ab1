use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tokio::sync::{Mutex, MutexGuard};

const STRIPES: usize = 64;

/// 按ID分段的写锁
///
/// 同一ID的“写存储 + 同步缓存”必须串行，否则先提交的写入可能在缓存中覆盖后提交的写入。
/// 不同ID可能落在同一段上，只会多等一会儿。
#[derive(Debug)]
pub(crate) struct WriteLocks {
    stripes: Vec<Mutex<()>>,
}

impl WriteLocks {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub(crate) async fn lock(&self, id: &str) -> MutexGuard<'_, ()> {
        self.stripes[stripe_of(id)].lock().await
    }
}

fn stripe_of(id: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    (hasher.finish() % STRIPES as u64) as usize
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn same_id_same_stripe() {
        assert_eq!(stripe_of("u1"), stripe_of("u1"));
        assert!(stripe_of("anything") < STRIPES);
    }

    #[tokio::test]
    async fn same_id_waits_for_holder() {
        let locks = WriteLocks::new();
        let guard = locks.lock("u1").await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.lock("u1")).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(20), locks.lock("u1")).await;
        assert!(acquired.is_ok());
    }
}
