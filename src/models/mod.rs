pub mod user;

pub use user::{Page, PageRequest, UserRecord, UserStatus};
