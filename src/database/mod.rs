// 数据库模块
// 包含存储抽象、数据库实体定义和存储实现

pub mod memory; // 内存存储
pub mod models; // 数据库实体定义
pub mod repositories; // PostgreSQL 存储实现
pub mod store; // 存储抽象

// 重新导出常用类型，方便其他模块使用
pub use memory::MemoryMessageUserStore;
pub use models::user::MessageUserEntity;
pub use repositories::user::PgMessageUserStore;
pub use store::MessageUserStore;
