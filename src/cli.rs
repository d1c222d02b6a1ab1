//! 命令行管理工具
//!
//! 每个命令都会先从数据库预热一个目录，再通过目录的操作完成读写，
//! 因此命令行与服务进程遵守同样的缓存规则。
//!
//! ```bash
//! message-user-directory init
//! message-user-directory create u1 --name alice
//! message-user-directory list --format json
//! message-user-directory disable u1
//! message-user-directory page --page 0 --size 50
//! ```

use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::database::repositories::user::PgMessageUserStore;
use crate::database::store::MessageUserStore;
use crate::directory::MessageUserDirectory;
use crate::error::{ConfigError, DirectoryError};
use crate::models::user::{PageRequest, UserRecord, UserStatus};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "message-user-directory",
    version,
    about = "Manage message users"
)]
pub struct DirectoryArgs {
    /// 数据库地址，默认读取 DATABASE_URL
    #[arg(short, long, env = "DATABASE_URL", global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: DirectoryCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DirectoryCommand {
    /// Create the message_users table.
    Init,

    /// List active users from the cache, or every non-disabled user with --all.
    List {
        #[arg(long)]
        all: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show a single user.
    Get { id: String },

    /// Create a new user.
    Create {
        id: String,

        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "ACTIVE", value_parser = parse_status)]
        status: UserStatus,
    },

    /// Update the name or status of an existing user.
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long, value_parser = parse_status)]
        status: Option<UserStatus>,
    },

    /// Disable a user and evict it from the active cache.
    Disable { id: String },

    /// Remove a user.
    Remove { id: String },

    /// Page through every stored user.
    Page {
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(short, long, default_value_t = 20)]
        size: u32,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

fn parse_status(s: &str) -> Result<UserStatus, String> {
    s.parse().map_err(|e: DirectoryError| e.to_string())
}

/// 命令行入口
pub async fn run(args: DirectoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = resolve_config(args.database, |name| std::env::var(name).ok())?;

    let store = PgMessageUserStore::connect(&config).await?;
    if let DirectoryCommand::Init = args.command {
        store.ensure_schema().await?;
        println!("message_users schema initialized.");
        return Ok(());
    }

    let directory = MessageUserDirectory::with_capacity(store, config.cache_capacity).await?;
    let mut stdout = std::io::stdout().lock();
    execute(&directory, args.command, &mut stdout).await
}

/// `--database` 只替换 DATABASE_URL，其余变量的解析错误照常返回
fn resolve_config<F>(database: Option<String>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Config::from_lookup(|name| match (&database, name) {
        (Some(url), "DATABASE_URL") => Some(url.clone()),
        _ => lookup(name),
    })
}

/// 在给定目录上执行一条命令，输出写入 `out`
pub async fn execute<S, W>(
    directory: &MessageUserDirectory<S>,
    command: DirectoryCommand,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: MessageUserStore,
    W: Write,
{
    match command {
        // `run` 在构建目录之前处理 init；目录本身不负责建表
        DirectoryCommand::Init => {
            return Err("init runs against the database directly, not through a directory".into());
        }
        DirectoryCommand::List { all, format } => {
            let mut users = if all {
                directory.find_by_status_not(UserStatus::Disabled).await?
            } else {
                directory.find_all()
            };
            users.sort_by(|a, b| a.id.cmp(&b.id));
            render(out, &users, format)?;
        }
        DirectoryCommand::Get { id } => match directory.get(&id).await? {
            Some(user) => render(out, std::slice::from_ref(&user), OutputFormat::Json)?,
            None => return Err(DirectoryError::NotFound(id).into()),
        },
        DirectoryCommand::Create { id, name, status } => {
            let user = directory.create(UserRecord::new(id, name, status)).await?;
            writeln!(out, "Created {} ({})", user.id, user.status)?;
        }
        DirectoryCommand::Update { id, name, status } => {
            let user = update(directory, &id, name, status).await?;
            writeln!(out, "Updated {} ({})", user.id, user.status)?;
        }
        DirectoryCommand::Disable { id } => {
            let user = update(directory, &id, None, Some(UserStatus::Disabled)).await?;
            writeln!(out, "Disabled {}", user.id)?;
        }
        DirectoryCommand::Remove { id } => {
            directory.remove(&id).await?;
            writeln!(out, "Removed {id}")?;
        }
        DirectoryCommand::Page { page, size, format } => {
            let request = PageRequest::new(page, size);
            let result = directory.find_by_page(&request).await?;
            render(out, &result.items, format)?;
            if format == OutputFormat::Table {
                writeln!(
                    out,
                    "page {}/{} ({} users)",
                    result.page + 1,
                    result.total_pages().max(1),
                    result.total
                )?;
            }
        }
    }
    Ok(())
}

async fn update<S: MessageUserStore>(
    directory: &MessageUserDirectory<S>,
    id: &str,
    name: Option<String>,
    status: Option<UserStatus>,
) -> Result<UserRecord, DirectoryError> {
    let mut user = directory
        .get(id)
        .await?
        .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;

    if let Some(name) = name {
        user.name = name;
    }
    if let Some(status) = status {
        user.status = status;
    }
    directory.save(user).await
}

fn render<W: Write>(
    out: &mut W,
    users: &[UserRecord],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, users)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            writeln!(out, "{:<24} {:<24} {:<10} {:<6}", "ID", "NAME", "STATUS", "USABLE")?;
            for user in users {
                writeln!(
                    out,
                    "{:<24} {:<24} {:<10} {:<6}",
                    user.id, user.name, user.status, user.usable
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::memory::MemoryMessageUserStore;

    async fn directory() -> MessageUserDirectory<Arc<MemoryMessageUserStore>> {
        let store = Arc::new(MemoryMessageUserStore::from_records([
            UserRecord::new("u1", "alice", UserStatus::Active),
            UserRecord::new("u2", "bob", UserStatus::Disabled),
        ]));
        MessageUserDirectory::load(store).await.unwrap()
    }

    async fn output(
        directory: &MessageUserDirectory<Arc<MemoryMessageUserStore>>,
        command: DirectoryCommand,
    ) -> String {
        let mut out = Vec::new();
        execute(directory, command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_subcommands() {
        let args = DirectoryArgs::try_parse_from([
            "message-user-directory",
            "--database",
            "postgres://localhost/sms",
            "create",
            "u7",
            "--status",
            "suspended",
        ])
        .unwrap();

        assert_eq!(args.database.as_deref(), Some("postgres://localhost/sms"));
        match args.command {
            DirectoryCommand::Create { id, status, .. } => {
                assert_eq!(id, "u7");
                assert_eq!(status, UserStatus::Suspended);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_status() {
        let parsed = DirectoryArgs::try_parse_from([
            "message-user-directory",
            "update",
            "u1",
            "--status",
            "archived",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn list_shows_cached_users_only() {
        let dir = directory().await;

        let table = output(
            &dir,
            DirectoryCommand::List {
                all: false,
                format: OutputFormat::Table,
            },
        )
        .await;
        assert!(table.contains("alice"));
        assert!(!table.contains("bob"));
    }

    #[tokio::test]
    async fn disable_evicts_from_cache() {
        let dir = directory().await;

        let text = output(&dir, DirectoryCommand::Disable { id: "u1".into() }).await;
        assert_eq!(text.trim(), "Disabled u1");
        assert!(!dir.is_cached("u1"));

        let json = output(
            &dir,
            DirectoryCommand::Page {
                page: 0,
                size: 10,
                format: OutputFormat::Json,
            },
        )
        .await;
        let users: Vec<UserRecord> = serde_json::from_str(&json).unwrap();
        assert!(users.iter().all(|u| u.status == UserStatus::Disabled));
    }

    #[test]
    fn database_flag_overrides_url_only() {
        let config = resolve_config(Some("postgres://flag/sms".into()), |name| match name {
            "DATABASE_URL" => Some("postgres://env/sms".into()),
            "DATABASE_MAX_CONNECTIONS" => Some("4".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.database_url, "postgres://flag/sms");
        assert_eq!(config.database_max_connections, 4);

        let config = resolve_config(Some("postgres://flag/sms".into()), |_| None).unwrap();
        assert_eq!(config.database_url, "postgres://flag/sms");
    }

    #[test]
    fn database_flag_keeps_invalid_settings_fatal() {
        let err = resolve_config(Some("postgres://flag/sms".into()), |name| match name {
            "DIRECTORY_CACHE_CAPACITY" => Some("lots".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "DIRECTORY_CACHE_CAPACITY", .. }
        ));
    }

    #[tokio::test]
    async fn init_is_not_a_directory_command() {
        let dir = directory().await;
        let mut out = Vec::new();

        assert!(execute(&dir, DirectoryCommand::Init, &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn update_unknown_user_fails() {
        let dir = directory().await;
        let mut out = Vec::new();

        let err = execute(
            &dir,
            DirectoryCommand::Update {
                id: "u9".into(),
                name: Some("ghost".into()),
                status: None,
            },
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("u9"));
    }
}
