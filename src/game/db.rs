//! SQLite 数据库工具：统一创建连接池并执行 sqlx 迁移
//!
//! 约定：本 crate 根目录下存在 `migrations/` 目录，存放所有迁移 SQL 文件。
//! 通过 `sqlx::migrate!()` 自动管理 schema 升级。

use crate::game::config::GameConfig;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

/// 创建 SQLite 连接池并执行所有未执行的迁移
///
/// 连接统一开启外键、WAL 日志和写锁等待，保证并发事务串行化而不是直接报 busy。
pub async fn create_sqlite_pool_with_migration(config: &GameConfig) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(&config.db_url)
        .with_context(|| format!("无效的数据库地址: {}", config.db_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("连接SQLite数据库失败: {}", config.db_url))?;

    // 从 `migrations/` 目录读取迁移并执行
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("执行数据库迁移失败")?;

    info!("[DB] 数据库就绪: {}", config.db_url);
    Ok(pool)
}
