use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, Row};

use crate::config::Config;
use crate::database::models::user::MessageUserEntity;
use crate::database::store::MessageUserStore;
use crate::error::StoreError;
use crate::models::user::{Page, PageRequest, UserRecord, UserStatus};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS message_users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    user_status TEXT NOT NULL,
    usable BOOLEAN NOT NULL DEFAULT FALSE,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const FIND_BY_STATUS_NOT: &str = r#"
SELECT id, name, user_status, usable, updated_at
FROM message_users
WHERE user_status <> $1
ORDER BY id
"#;

const FIND_ONE: &str = r#"
SELECT id, name, user_status, usable, updated_at
FROM message_users
WHERE id = $1
"#;

const FIND_PAGE: &str = r#"
SELECT id, name, user_status, usable, updated_at
FROM message_users
ORDER BY id
LIMIT $1 OFFSET $2
"#;

const COUNT_ALL: &str = "SELECT COUNT(*) AS total FROM message_users";

const PAGE_SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

const UPSERT: &str = r#"
INSERT INTO message_users (id, name, user_status, usable, updated_at)
VALUES ($1, $2, $3, $4, NOW())
ON CONFLICT (id) DO UPDATE
SET name = EXCLUDED.name,
    user_status = EXCLUDED.user_status,
    usable = EXCLUDED.usable,
    updated_at = NOW()
RETURNING id, name, user_status, usable, updated_at
"#;

/// PostgreSQL 消息用户存储
#[derive(Clone)]
pub struct PgMessageUserStore {
    pool: PgPool,
}

impl PgMessageUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按配置创建连接池
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let application_name = config.database_application_name.clone();
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .after_connect(move |conn, _meta| {
                let statement = format!(
                    "SET application_name = '{}';",
                    application_name.replace('\'', "''")
                );
                Box::pin(async move {
                    conn.execute(statement.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 表不存在时创建
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::info!("message_users schema ready");
        Ok(())
    }
}

#[async_trait]
impl MessageUserStore for PgMessageUserStore {
    async fn find_by_status_not(
        &self,
        status: UserStatus,
    ) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MessageUserEntity>(FIND_BY_STATUS_NOT)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn save(&self, record: &UserRecord) -> Result<UserRecord, StoreError> {
        let saved = sqlx::query_as::<_, MessageUserEntity>(UPSERT)
            .bind(&record.id)
            .bind(&record.name)
            .bind(record.status.as_str())
            .bind(record.usable)
            .fetch_one(&self.pool)
            .await;

        match saved {
            Ok(entity) => {
                tracing::debug!("Persisted message user: {}", entity.id);
                UserRecord::try_from(entity)
            }
            Err(e) => {
                tracing::error!("Failed to persist message user {}: {:?}", record.id, e);
                Err(e.into())
            }
        }
    }

    async fn find_one(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, MessageUserEntity>(FIND_ONE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<UserRecord>, StoreError> {
        let offset = i64::try_from(page.offset()).map_err(StoreError::backend)?;

        // 同一快照内读取当前页和总数
        let mut tx = self.pool.begin().await?;
        sqlx::query(PAGE_SNAPSHOT).execute(&mut *tx).await?;

        let rows = sqlx::query_as::<_, MessageUserEntity>(FIND_PAGE)
            .bind(i64::from(page.size))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        let total: i64 = sqlx::query(COUNT_ALL)
            .fetch_one(&mut *tx)
            .await?
            .try_get("total")?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page, total.max(0) as u64))
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM message_users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM message_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Delete of absent message user ignored: {}", id);
        }
        Ok(())
    }
}
