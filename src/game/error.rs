//! 统一错误类型
//!
//! 所有服务操作都返回 `GameResult<T>`，由上层（CLI / 传输层）翻译成调用方可见的结果，
//! 任何错误都不会导致进程退出。

use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 参数缺失或非法，无状态变更
    Validation,
    /// 引用的实体不存在，无状态变更
    NotFound,
    /// 重复关系、已处理的交易等冲突，无状态变更
    Conflict,
    /// 调用方不是资源的相关方
    Authorization,
    /// 事务或提交失败，部分写入已回滚
    Storage,
}

#[derive(Error, Debug)]
pub enum GameError {
    // === Validation ===
    #[error("缺少参数: {0}")]
    MissingParameter(&'static str),

    #[error("无效的目标玩家: {0}")]
    InvalidTarget(String),

    #[error("无效的参数: {0}")]
    InvalidParameter(String),

    // === NotFound ===
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("精灵不存在: {0}")]
    CreatureNotFound(String),

    // === Conflict ===
    #[error("与玩家 {0} 的好友关系已存在")]
    DuplicateRelationship(String),

    #[error("交易 {0} 已处理")]
    AlreadyDecided(String),

    #[error("精灵 {creature_id} 已不属于玩家 {expected_owner}")]
    OwnershipMismatch {
        creature_id: String,
        expected_owner: String,
    },

    // === Authorization ===
    #[error("无权操作: {0}")]
    Forbidden(String),

    // === Storage ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据损坏: {0}")]
    Corrupted(String),

    #[error("请求超时（{0:?}）")]
    Timeout(std::time::Duration),
}

impl GameError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::MissingParameter(_)
            | GameError::InvalidTarget(_)
            | GameError::InvalidParameter(_) => ErrorKind::Validation,
            GameError::NotFound { .. } | GameError::CreatureNotFound(_) => ErrorKind::NotFound,
            GameError::DuplicateRelationship(_)
            | GameError::AlreadyDecided(_)
            | GameError::OwnershipMismatch { .. } => ErrorKind::Conflict,
            GameError::Forbidden(_) => ErrorKind::Authorization,
            GameError::Database(_) | GameError::Corrupted(_) | GameError::Timeout(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// 返回给调用方的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            GameError::MissingParameter(_) => "MISSING_PARAMETER",
            GameError::InvalidTarget(_) => "INVALID_TARGET",
            GameError::InvalidParameter(_) => "INVALID_PARAMETER",
            GameError::NotFound { .. } => "NOT_FOUND",
            GameError::CreatureNotFound(_) => "CREATURE_NOT_FOUND",
            GameError::DuplicateRelationship(_) => "DUPLICATE_RELATIONSHIP",
            GameError::AlreadyDecided(_) => "ALREADY_DECIDED",
            GameError::OwnershipMismatch { .. } => "OWNERSHIP_MISMATCH",
            GameError::Forbidden(_) => "FORBIDDEN",
            GameError::Database(_) => "DATABASE_ERROR",
            GameError::Corrupted(_) => "DATA_CORRUPTED",
            GameError::Timeout(_) => "TIMEOUT",
        }
    }

    /// HTTP 状态码建议
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Authorization => 403,
            ErrorKind::Storage => match self {
                GameError::Timeout(_) => 504,
                _ => 500,
            },
        }
    }
}

/// 在请求级超时内执行一次存储操作；超时后事务随 future 一起被丢弃并回滚
///
/// 写操作都放在事务内：已发出的语句即使在超时后执行完，也会在提交前被回滚。
/// 唯一的窗口是 COMMIT 已经发出、结果尚未返回时超时，此时写入可能已生效。
pub(crate) async fn with_timeout<T, F>(timeout: std::time::Duration, fut: F) -> GameResult<T>
where
    F: std::future::Future<Output = GameResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("[Store] 请求超时: {:?}", timeout);
            Err(GameError::Timeout(timeout))
        }
    }
}
