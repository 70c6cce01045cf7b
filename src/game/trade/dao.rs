//! 交易数据访问层（DAO）
//!
//! 状态更新全部采用带条件的原子更新（CAS）：只有当前状态仍为 pending 时才写入，
//! 并发的确认/拒绝请求中只有一个能命中。

use crate::game::error::{GameError, GameResult};
use crate::game::trade::models::{Trade, TradeStatus};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection, Transaction};
use tracing::{debug, info};

const TRADE_COLUMNS: &str = r#"
    id, requester_id, receiver_id, requester_creature_id, receiver_creature_id,
    status, created_at, decided_at
"#;

/// 交易 DAO（基于 sqlx）
#[derive(Clone)]
pub struct TradeDao {
    db: Pool<Sqlite>,
}

impl TradeDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 开启请求级事务
    pub async fn begin(&self) -> GameResult<Transaction<'static, Sqlite>> {
        Ok(self.db.begin().await?)
    }

    /// 插入新交易
    pub async fn insert_trade(conn: &mut SqliteConnection, trade: &Trade) -> GameResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, requester_id, receiver_id, requester_creature_id, receiver_creature_id,
                status, created_at, decided_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.requester_id)
        .bind(&trade.receiver_id)
        .bind(&trade.requester_creature_id)
        .bind(&trade.receiver_creature_id)
        .bind(trade.status.as_str())
        .bind(trade.created_at)
        .bind(trade.decided_at)
        .execute(&mut *conn)
        .await?;

        info!(
            "[TradeDAO] 新增交易 {}: {}({}) <-> {}({})",
            trade.id,
            trade.requester_id,
            trade.requester_creature_id,
            trade.receiver_id,
            trade.receiver_creature_id
        );
        Ok(())
    }

    pub async fn get_trade(&self, trade_id: &str) -> GameResult<Option<Trade>> {
        let mut conn = self.db.acquire().await?;
        Self::get_trade_in(&mut conn, trade_id).await
    }

    /// 事务内查询交易
    pub async fn get_trade_in(
        conn: &mut SqliteConnection,
        trade_id: &str,
    ) -> GameResult<Option<Trade>> {
        let sql = format!("SELECT {} FROM trades WHERE id = ?", TRADE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(trade_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(|m| Self::row_to_trade(&m)).transpose()
    }

    /// 事务内 CAS：仅当交易属于该接收方且仍为 pending 时写入终态
    ///
    /// 返回是否命中；未命中时由调用方再查询以区分具体原因。
    pub async fn decide_if_pending(
        conn: &mut SqliteConnection,
        trade_id: &str,
        receiver_id: &str,
        new_status: TradeStatus,
        decided_at: DateTime<Utc>,
    ) -> GameResult<bool> {
        if !TradeStatus::Pending.can_transition_to(new_status) {
            return Err(GameError::InvalidParameter(format!(
                "非法的状态变更: pending -> {}",
                new_status
            )));
        }

        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = ?, decided_at = ?
            WHERE id = ? AND receiver_id = ? AND status = 'pending'
            "#,
        )
        .bind(new_status.as_str())
        .bind(decided_at)
        .bind(trade_id)
        .bind(receiver_id)
        .execute(&mut *conn)
        .await?;

        let hit = result.rows_affected() == 1;
        debug!(
            "[TradeDAO] 交易 {} pending -> {}，结果: {}",
            trade_id, new_status, hit
        );
        Ok(hit)
    }

    /// 两名玩家之间（任意方向）所有待处理的交易
    pub async fn get_pending_between(&self, player_a: &str, player_b: &str) -> GameResult<Vec<Trade>> {
        let sql = format!(
            r#"
            SELECT {} FROM trades
            WHERE status = 'pending'
              AND ((requester_id = ? AND receiver_id = ?)
                OR (requester_id = ? AND receiver_id = ?))
            ORDER BY created_at DESC, rowid DESC
            "#,
            TRADE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(player_a)
            .bind(player_b)
            .bind(player_b)
            .bind(player_a)
            .fetch_all(&self.db)
            .await?;

        let trades = rows
            .iter()
            .map(Self::row_to_trade)
            .collect::<GameResult<Vec<_>>>()?;
        debug!(
            "[TradeDAO] {} 与 {} 之间待处理交易共 {} 笔",
            player_a,
            player_b,
            trades.len()
        );
        Ok(trades)
    }

    /// 玩家参与过的全部交易
    pub async fn get_trades_for_player(&self, player_id: &str) -> GameResult<Vec<Trade>> {
        let sql = format!(
            r#"
            SELECT {} FROM trades
            WHERE requester_id = ? OR receiver_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
            TRADE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(player_id)
            .bind(player_id)
            .fetch_all(&self.db)
            .await?;

        rows.iter().map(Self::row_to_trade).collect()
    }

    fn row_to_trade(m: &SqliteRow) -> GameResult<Trade> {
        let status: String = m.get("status");
        let status = status.parse::<TradeStatus>().map_err(GameError::Corrupted)?;
        Ok(Trade {
            id: m.get("id"),
            requester_id: m.get("requester_id"),
            receiver_id: m.get("receiver_id"),
            requester_creature_id: m.get("requester_creature_id"),
            receiver_creature_id: m.get("receiver_creature_id"),
            status,
            created_at: m.get("created_at"),
            decided_at: m.get("decided_at"),
        })
    }
}
