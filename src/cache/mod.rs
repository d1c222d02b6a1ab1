// 缓存模块
// 进程内的活跃用户缓存及其统计

pub mod models;
pub mod operations;

pub use models::user::CacheStats;
pub use operations::user::ActiveUserCache;
