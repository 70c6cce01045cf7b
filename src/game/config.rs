//! 运行配置

use std::time::Duration;

/// 默认数据库地址（不存在时自动创建）
pub const DEFAULT_DB_URL: &str = "sqlite://poketrade.db?mode=rwc";

/// 核心服务配置
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// 数据库路径（SQLite），可以是：
    /// - 完整URL：如 "sqlite://poketrade.db?mode=rwc"
    /// - 内存库：仅建议单连接测试使用
    pub db_url: String,
    /// 连接池最大连接数
    pub max_connections: u32,
    /// SQLite 写锁等待时长
    pub busy_timeout: Duration,
    /// 单次请求（一次服务调用）的超时时间，由上层传输层决定
    pub request_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl GameConfig {
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
