//! 玩家数据访问层（DAO）

use crate::game::error::GameResult;
use crate::game::player::models::Player;
use crate::game::player::PlayerLookup;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

/// 玩家 DAO（基于 sqlx）
#[derive(Clone)]
pub struct PlayerDao {
    db: Pool<Sqlite>,
}

impl PlayerDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 写入玩家（注册流程之外的种子数据入口）
    pub async fn insert_player(&self, id: &str, username: &str, email: &str) -> GameResult<Player> {
        let player = Player {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO players (id, username, email, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&player.id)
        .bind(&player.username)
        .bind(&player.email)
        .bind(player.created_at)
        .execute(&self.db)
        .await?;

        info!("[PlayerDAO] 新增玩家: {} ({})", player.id, player.username);
        Ok(player)
    }
}

#[async_trait]
impl PlayerLookup for PlayerDao {
    async fn find_player(&self, player_id: &str) -> GameResult<Option<Player>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, created_at
            FROM players
            WHERE id = ?
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.db)
        .await?;

        debug!(
            "[PlayerDAO] 查询玩家 {}: {}",
            player_id,
            if row.is_some() { "存在" } else { "不存在" }
        );

        Ok(row.map(|m| Player {
            id: m.get("id"),
            username: m.get("username"),
            email: m.get("email"),
            created_at: m.get("created_at"),
        }))
    }
}
