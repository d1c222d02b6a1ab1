use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_APPLICATION_NAME: &str = "message_user_directory";
const DEFAULT_CACHE_CAPACITY: usize = 60;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// 连接建立后写入 `application_name`
    pub database_application_name: String,
    /// 活跃用户缓存的初始容量
    pub cache_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 通过 `lookup` 读取变量，`from_env` 传入进程环境变量
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            database_application_name: lookup("DATABASE_APPLICATION_NAME")
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.into()),
            cache_capacity: parse_or(&lookup, "DIRECTORY_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
        })
    }

    /// 用给定的数据库地址和默认值构造配置
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Config {
            database_url: database_url.into(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            database_application_name: DEFAULT_APPLICATION_NAME.into(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => parse_value(name, &value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
