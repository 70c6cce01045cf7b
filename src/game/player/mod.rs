//! 玩家模块
//!
//! 注册与认证由外部服务负责，这里只提供按 ID 查询玩家的能力（以及测试/CLI 用的写入）。

pub mod dao;
pub mod models;

use crate::game::error::GameResult;
use async_trait::async_trait;

pub use dao::PlayerDao;
pub use models::Player;

/// 玩家查询接口
#[async_trait]
pub trait PlayerLookup: Send + Sync {
    async fn find_player(&self, player_id: &str) -> GameResult<Option<Player>>;

    async fn exists(&self, player_id: &str) -> GameResult<bool> {
        Ok(self.find_player(player_id).await?.is_some())
    }
}
