/// 缓存操作
pub mod user;

pub use user::ActiveUserCache;
