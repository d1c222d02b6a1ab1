use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// 消息用户状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// 正常
    Active,
    /// 暂停使用，仍保留在活跃缓存中
    Suspended,
    /// 禁用，不进入缓存
    Disabled,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [Self::Active, Self::Suspended, Self::Disabled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Disabled => "DISABLED",
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DirectoryError::invalid(format!("unknown user status: {s}")))
    }
}

/// 消息用户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 用户ID，创建后不可修改
    pub id: String,
    /// 显示名称
    pub name: String,
    pub status: UserStatus,
    /// 是否可用，每次保存前由 `refresh_usable` 重新计算
    pub usable: bool,
    /// 最后持久化时间，由存储层填写
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: UserStatus) -> Self {
        let mut record = Self {
            id: id.into(),
            name: name.into(),
            status,
            usable: false,
            updated_at: None,
        };
        record.refresh_usable();
        record
    }

    /// 根据当前状态重新计算 `usable`
    pub fn refresh_usable(&mut self) -> bool {
        self.usable = self.status == UserStatus::Active;
        self.usable
    }

    /// 活跃用户：状态不是 DISABLED
    pub fn is_active(&self) -> bool {
        !self.status.is_disabled()
    }
}

/// 分页请求，页码从0开始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const MAX_SIZE: u32 = 1000;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.size == 0 || self.size > Self::MAX_SIZE {
            return Err(DirectoryError::invalid(format!(
                "page size must be between 1 and {}, got {}",
                Self::MAX_SIZE,
                self.size
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    /// 总记录数
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }
}
