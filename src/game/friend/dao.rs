//! 好友数据访问层（DAO）
//!
//! 负责所有好友相关的数据库操作，将数据访问逻辑与业务逻辑分离。
//! 所有按玩家对的查询都走规范化后的 (id_min, id_max)，由唯一索引保证每对玩家只有一行。

use crate::game::error::{GameError, GameResult};
use crate::game::friend::models::{CanonicalPair, FriendLink, FriendSummary, IncomingRequest};
use sqlx::{Pool, Row, Sqlite, SqliteConnection, Transaction};
use tracing::{debug, info};

/// 好友 DAO（基于 sqlx）
#[derive(Clone)]
pub struct FriendDao {
    db: Pool<Sqlite>,
}

impl FriendDao {
    /// 创建新的好友 DAO
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 开启请求级事务，写操作都在事务内执行
    pub async fn begin(&self) -> GameResult<Transaction<'static, Sqlite>> {
        Ok(self.db.begin().await?)
    }

    /// 插入好友请求；玩家对已有任何关系（待处理或已通过）时返回 `DuplicateRelationship`
    pub async fn insert_request(conn: &mut SqliteConnection, link: &FriendLink) -> GameResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO friends (id1, id2, id_min, id_max, petitioner, approved, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id1)
        .bind(&link.id2)
        .bind(&link.id_min)
        .bind(&link.id_max)
        .bind(&link.petitioner)
        .bind(if link.approved { 1 } else { 0 })
        .bind(link.created_at)
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => {
                info!(
                    "[FriendDAO] 新增好友请求: {} -> {}",
                    link.petitioner, link.id2
                );
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(
                    "[FriendDAO] 玩家对 ({}, {}) 已存在关系",
                    link.id_min, link.id_max
                );
                Err(GameError::DuplicateRelationship(link.id2.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 查询发给某玩家、尚未处理的好友请求
    pub async fn get_incoming_requests(&self, player_id: &str) -> GameResult<Vec<IncomingRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT
                f.id_min,
                f.id_max,
                f.petitioner,
                p.username AS petitioner_name,
                f.approved,
                f.created_at
            FROM friends f
            JOIN players p ON p.id = f.petitioner
            WHERE (f.id1 = ? OR f.id2 = ?)
              AND f.petitioner <> ?
              AND f.approved = 0
            ORDER BY f.created_at
            "#,
        )
        .bind(player_id)
        .bind(player_id)
        .bind(player_id)
        .fetch_all(&self.db)
        .await?;

        let requests: Vec<IncomingRequest> = rows
            .into_iter()
            .map(|m| {
                let approved: i64 = m.get("approved");
                IncomingRequest {
                    id_min: m.get("id_min"),
                    id_max: m.get("id_max"),
                    petitioner: m.get("petitioner"),
                    petitioner_name: m.get("petitioner_name"),
                    approved: approved != 0,
                    created_at: m.get("created_at"),
                }
            })
            .collect();

        debug!(
            "[FriendDAO] 玩家 {} 待处理的好友请求共 {} 条",
            player_id,
            requests.len()
        );
        Ok(requests)
    }

    /// 通过待处理请求；发起人不能通过自己的请求。返回受影响行数
    pub async fn approve_request(
        conn: &mut SqliteConnection,
        pair: &CanonicalPair,
        approver_id: &str,
    ) -> GameResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE friends
            SET approved = 1
            WHERE id_min = ? AND id_max = ?
              AND approved = 0
              AND petitioner <> ?
            "#,
        )
        .bind(&pair.id_min)
        .bind(&pair.id_max)
        .bind(approver_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// 删除待处理请求（仅匹配玩家对且 approved = 0）。返回受影响行数
    pub async fn delete_pending(conn: &mut SqliteConnection, pair: &CanonicalPair) -> GameResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM friends
            WHERE (id_min = ? AND id_max = ?) AND approved = 0
            "#,
        )
        .bind(&pair.id_min)
        .bind(&pair.id_max)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// 删除已通过的好友关系。返回受影响行数
    pub async fn delete_approved(conn: &mut SqliteConnection, pair: &CanonicalPair) -> GameResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM friends
            WHERE (id_min = ? AND id_max = ?) AND approved = 1
            "#,
        )
        .bind(&pair.id_min)
        .bind(&pair.id_max)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// 从数据库获取某玩家的所有好友（解析每行中的另一方）
    pub async fn get_friends(&self, player_id: &str) -> GameResult<Vec<FriendSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.username
            FROM friends f
            JOIN players p
              ON p.id = CASE WHEN f.id_min = ? THEN f.id_max ELSE f.id_min END
            WHERE (f.id_min = ? OR f.id_max = ?)
              AND f.approved = 1
            ORDER BY p.username
            "#,
        )
        .bind(player_id)
        .bind(player_id)
        .bind(player_id)
        .fetch_all(&self.db)
        .await?;

        let friends: Vec<FriendSummary> = rows
            .into_iter()
            .map(|m| FriendSummary {
                id: m.get("id"),
                username: m.get("username"),
            })
            .collect();

        debug!(
            "[FriendDAO] 获取玩家 {} 的好友列表，共 {} 个好友",
            player_id,
            friends.len()
        );
        Ok(friends)
    }

    /// 查询玩家对之间的关系行
    pub async fn get_link(&self, pair: &CanonicalPair) -> GameResult<Option<FriendLink>> {
        let row = sqlx::query(
            r#"
            SELECT id1, id2, id_min, id_max, petitioner, approved, created_at
            FROM friends
            WHERE id_min = ? AND id_max = ?
            "#,
        )
        .bind(&pair.id_min)
        .bind(&pair.id_max)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|m| {
            let approved: i64 = m.get("approved");
            FriendLink {
                id1: m.get("id1"),
                id2: m.get("id2"),
                id_min: m.get("id_min"),
                id_max: m.get("id_max"),
                petitioner: m.get("petitioner"),
                approved: approved != 0,
                created_at: m.get("created_at"),
            }
        }))
    }
}
