//! 消息用户目录
//!
//! 在持久化存储之上维护一份进程内的活跃用户缓存（cache-aside）。
//! 启动时从存储预热所有未禁用的用户，之后只通过目录自身的写操作与存储保持同步。

pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod models;

pub use config::Config;
pub use database::{MemoryMessageUserStore, MessageUserStore, PgMessageUserStore};
pub use directory::{Lookup, MessageUserDirectory};
pub use error::{ConfigError, DirectoryError, DirectoryResult, StoreError};
pub use models::{Page, PageRequest, UserRecord, UserStatus};
