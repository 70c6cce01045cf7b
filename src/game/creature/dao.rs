//! 精灵数据访问层（DAO）
//!
//! 读写接口分两类：基于连接池的普通查询，以及接收 `&mut SqliteConnection`
//! 的事务内操作，由调用方显式传入事务句柄。

use crate::game::creature::models::{NewCreature, OwnedCreature};
use crate::game::error::GameResult;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info};

/// 精灵 DAO（基于 sqlx）
#[derive(Clone)]
pub struct CreatureDao {
    db: Pool<Sqlite>,
}

impl CreatureDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 写入一只精灵（捕获流程之外的种子数据入口）
    pub async fn insert_creature(&self, new: &NewCreature) -> GameResult<OwnedCreature> {
        let creature = OwnedCreature {
            id: new.id.clone(),
            player_id: new.player_id.clone(),
            species: new.species,
            in_team: new.in_team,
            obtained_at: Utc::now(),
            nickname: new.nickname.clone(),
        };

        sqlx::query(
            r#"
            INSERT INTO owned_creatures (id, player_id, species, in_team, obtained_at, nickname)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&creature.id)
        .bind(&creature.player_id)
        .bind(creature.species)
        .bind(if creature.in_team { 1 } else { 0 })
        .bind(creature.obtained_at)
        .bind(&creature.nickname)
        .execute(&self.db)
        .await?;

        info!(
            "[CreatureDAO] 新增精灵: {} (物种 {}) -> 玩家 {}",
            creature.id, creature.species, creature.player_id
        );
        Ok(creature)
    }

    pub async fn get_creature(&self, creature_id: &str) -> GameResult<Option<OwnedCreature>> {
        let mut conn = self.db.acquire().await?;
        Self::get_creature_in(&mut conn, creature_id).await
    }

    /// 事务内查询精灵
    pub async fn get_creature_in(
        conn: &mut SqliteConnection,
        creature_id: &str,
    ) -> GameResult<Option<OwnedCreature>> {
        let row = sqlx::query(
            r#"
            SELECT id, player_id, species, in_team, obtained_at, nickname
            FROM owned_creatures
            WHERE id = ?
            "#,
        )
        .bind(creature_id)
        .fetch_optional(&mut *conn)
        .await?;

        debug!(
            "[CreatureDAO] 查询精灵 {}: {}",
            creature_id,
            if row.is_some() { "存在" } else { "不存在" }
        );
        Ok(row.map(|m| Self::row_to_creature(&m)))
    }

    /// 事务内转移持有人：仅当当前持有人等于 `from_player` 时生效
    ///
    /// 返回是否有行被更新；转移后精灵离开原队伍。
    pub async fn reassign_owner(
        conn: &mut SqliteConnection,
        creature_id: &str,
        from_player: &str,
        to_player: &str,
    ) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE owned_creatures
            SET player_id = ?, in_team = 0
            WHERE id = ? AND player_id = ?
            "#,
        )
        .bind(to_player)
        .bind(creature_id)
        .bind(from_player)
        .execute(&mut *conn)
        .await?;

        let updated = result.rows_affected() == 1;
        debug!(
            "[CreatureDAO] 转移精灵 {}: {} -> {}，结果: {}",
            creature_id, from_player, to_player, updated
        );
        Ok(updated)
    }

    fn row_to_creature(m: &SqliteRow) -> OwnedCreature {
        let in_team: i64 = m.get("in_team");
        OwnedCreature {
            id: m.get("id"),
            player_id: m.get("player_id"),
            species: m.get("species"),
            in_team: in_team != 0,
            obtained_at: m.get("obtained_at"),
            nickname: m.get("nickname"),
        }
    }
}
