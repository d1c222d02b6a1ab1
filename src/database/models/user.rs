use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::StoreError;
use crate::models::user::{UserRecord, UserStatus};

/// 消息用户数据库实体，对应 `message_users` 表
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageUserEntity {
    pub id: String,
    pub name: String,
    /// ACTIVE / SUSPENDED / DISABLED
    pub user_status: String,
    pub usable: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MessageUserEntity> for UserRecord {
    type Error = StoreError;

    fn try_from(entity: MessageUserEntity) -> Result<Self, Self::Error> {
        let status: UserStatus = entity.user_status.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "message user {} has unknown status {}",
                entity.id, entity.user_status
            ))
        })?;

        Ok(UserRecord {
            id: entity.id,
            name: entity.name,
            status,
            usable: entity.usable,
            updated_at: Some(entity.updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(status: &str) -> MessageUserEntity {
        MessageUserEntity {
            id: "u1".into(),
            name: "alice".into(),
            user_status: status.into(),
            usable: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn converts_known_status() {
        let record = UserRecord::try_from(entity("SUSPENDED")).unwrap();
        assert_eq!(record.status, UserStatus::Suspended);
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn rejects_unknown_status() {
        let err = UserRecord::try_from(entity("BANNED")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
