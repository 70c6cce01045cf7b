//! 交易服务层
//!
//! 交易状态机：pending → accepted / rejected（终态）。
//! 确认交易时，交易状态与两只精灵的持有人在同一个事务中提交；
//! 任一步失败都会丢弃事务，三行数据保持原样。

use crate::game::config::GameConfig;
use crate::game::creature::CreatureDao;
use crate::game::error::{with_timeout, GameError, GameResult};
use crate::game::player::{PlayerDao, PlayerLookup};
use crate::game::trade::dao::TradeDao;
use crate::game::trade::listener::{EmptyTradeListener, TradeListener};
use crate::game::trade::models::{Trade, TradeProposal, TradeStatus};
use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 交易服务
pub struct TradeService {
    config: GameConfig,
    trade_dao: TradeDao,
    players: Arc<dyn PlayerLookup>,
    listener: Arc<dyn TradeListener>,
}

impl TradeService {
    /// 创建新的交易服务（使用默认空监听器）
    pub fn new(db: Pool<Sqlite>, config: GameConfig) -> Self {
        Self::with_listener(db, config, Arc::new(EmptyTradeListener))
    }

    /// 创建新的交易服务（带自定义监听器，共享连接池）
    pub fn with_listener(
        db: Pool<Sqlite>,
        config: GameConfig,
        listener: Arc<dyn TradeListener>,
    ) -> Self {
        Self {
            trade_dao: TradeDao::new(db.clone()),
            players: Arc::new(PlayerDao::new(db)),
            listener,
            config,
        }
    }

    /// 替换玩家查询实现
    pub fn with_player_lookup(mut self, players: Arc<dyn PlayerLookup>) -> Self {
        self.players = players;
        self
    }

    /// 两名玩家之间待处理的交易；没有时返回 `NotFound`
    pub async fn list_pending_between(&self, caller_id: &str, other_id: &str) -> GameResult<Vec<Trade>> {
        with_timeout(self.config.request_timeout, async {
            let trades = self.trade_dao.get_pending_between(caller_id, other_id).await?;
            if trades.is_empty() {
                return Err(GameError::not_found("pending trade", other_id));
            }
            Ok(trades)
        })
        .await
    }

    /// 发起交易提议
    ///
    /// 此时不校验精灵归属，归属在确认交易时才强制检查。
    pub async fn propose_trade(&self, requester_id: &str, proposal: TradeProposal) -> GameResult<Trade> {
        let receiver_id = required(proposal.receiver_id, "receiver_id")?;
        let requester_creature_id =
            required(proposal.requester_creature_id, "requester_creature_id")?;
        let receiver_creature_id =
            required(proposal.receiver_creature_id, "receiver_creature_id")?;

        if receiver_id == requester_id {
            warn!("[TradeService] 玩家 {} 尝试与自己交易", requester_id);
            return Err(GameError::InvalidTarget(receiver_id));
        }
        if requester_creature_id == receiver_creature_id {
            return Err(GameError::InvalidParameter(format!(
                "交易双方的精灵相同: {}",
                requester_creature_id
            )));
        }

        let trade = Trade {
            id: Uuid::new_v4().to_string(),
            requester_id: requester_id.to_string(),
            receiver_id,
            requester_creature_id,
            receiver_creature_id,
            status: TradeStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
        };

        with_timeout(self.config.request_timeout, async {
            if !self.players.exists(&trade.receiver_id).await? {
                warn!("[TradeService] 交易目标玩家不存在: {}", trade.receiver_id);
                return Err(GameError::InvalidTarget(trade.receiver_id.clone()));
            }
            let mut tx = self.trade_dao.begin().await?;
            TradeDao::insert_trade(&mut tx, &trade).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!(
            "[TradeService] 📡 {} 向 {} 发起交易 {}",
            trade.requester_id, trade.receiver_id, trade.id
        );
        if let Ok(json) = serde_json::to_string(&trade) {
            self.listener.on_trade_proposed(json).await;
        }
        Ok(trade)
    }

    /// 确认交易：交换两只精灵的持有人并将交易置为 accepted
    pub async fn confirm_trade(&self, caller_id: &str, trade_id: &str) -> GameResult<Trade> {
        let trade = with_timeout(self.config.request_timeout, async {
            let mut tx = self.trade_dao.begin().await?;
            let decided_at = Utc::now();

            // 第一条语句即为写操作，事务一开始就持有写锁
            if !TradeDao::decide_if_pending(
                &mut tx,
                trade_id,
                caller_id,
                TradeStatus::Accepted,
                decided_at,
            )
            .await?
            {
                return Err(Self::explain_undecided(&mut tx, caller_id, trade_id).await?);
            }

            let trade = TradeDao::get_trade_in(&mut tx, trade_id)
                .await?
                .ok_or_else(|| GameError::not_found("trade", trade_id))?;

            for creature_id in [&trade.requester_creature_id, &trade.receiver_creature_id] {
                if CreatureDao::get_creature_in(&mut tx, creature_id)
                    .await?
                    .is_none()
                {
                    warn!(
                        "[TradeService] 交易 {} 引用的精灵 {} 已不存在，回滚",
                        trade_id, creature_id
                    );
                    return Err(GameError::CreatureNotFound(creature_id.clone()));
                }
            }

            Self::swap_owner(
                &mut tx,
                &trade.requester_creature_id,
                &trade.requester_id,
                &trade.receiver_id,
            )
            .await?;
            Self::swap_owner(
                &mut tx,
                &trade.receiver_creature_id,
                &trade.receiver_id,
                &trade.requester_id,
            )
            .await?;

            tx.commit().await.map_err(|e| {
                error!("[TradeService] 交易 {} 提交失败: {:?}", trade_id, e);
                GameError::from(e)
            })?;
            Ok(trade)
        })
        .await?;

        info!(
            "[TradeService] ✅ 交易 {} 已确认: {} -> {}, {} -> {}",
            trade.id,
            trade.requester_creature_id,
            trade.receiver_id,
            trade.receiver_creature_id,
            trade.requester_id
        );
        if let Ok(json) = serde_json::to_string(&trade) {
            self.listener.on_trade_decided(json).await;
        }
        Ok(trade)
    }

    /// 拒绝交易，不涉及精灵归属
    pub async fn deny_trade(&self, caller_id: &str, trade_id: &str) -> GameResult<Trade> {
        let trade = with_timeout(self.config.request_timeout, async {
            let mut tx = self.trade_dao.begin().await?;

            if !TradeDao::decide_if_pending(
                &mut tx,
                trade_id,
                caller_id,
                TradeStatus::Rejected,
                Utc::now(),
            )
            .await?
            {
                return Err(Self::explain_undecided(&mut tx, caller_id, trade_id).await?);
            }

            let trade = TradeDao::get_trade_in(&mut tx, trade_id)
                .await?
                .ok_or_else(|| GameError::not_found("trade", trade_id))?;
            tx.commit().await?;
            Ok(trade)
        })
        .await?;

        info!("[TradeService] {} 拒绝了交易 {}", caller_id, trade.id);
        if let Ok(json) = serde_json::to_string(&trade) {
            self.listener.on_trade_decided(json).await;
        }
        Ok(trade)
    }

    /// 查看单笔交易，仅交易双方可见
    pub async fn get_trade(&self, caller_id: &str, trade_id: &str) -> GameResult<Trade> {
        with_timeout(self.config.request_timeout, async {
            let trade = self
                .trade_dao
                .get_trade(trade_id)
                .await?
                .ok_or_else(|| GameError::not_found("trade", trade_id))?;
            if !trade.involves(caller_id) {
                return Err(GameError::Forbidden(format!(
                    "{} 不是交易 {} 的参与方",
                    caller_id, trade_id
                )));
            }
            Ok(trade)
        })
        .await
    }

    /// 玩家参与过的全部交易（可能为空）
    pub async fn list_trade_history(&self, caller_id: &str) -> GameResult<Vec<Trade>> {
        with_timeout(
            self.config.request_timeout,
            self.trade_dao.get_trades_for_player(caller_id),
        )
        .await
    }

    /// CAS 未命中时区分原因：不存在 / 非接收方 / 已处理
    async fn explain_undecided(
        conn: &mut SqliteConnection,
        caller_id: &str,
        trade_id: &str,
    ) -> GameResult<GameError> {
        let err = match TradeDao::get_trade_in(conn, trade_id).await? {
            None => GameError::not_found("trade", trade_id),
            Some(trade) if trade.receiver_id != caller_id => GameError::Forbidden(format!(
                "只有接收方可以处理交易 {}",
                trade_id
            )),
            Some(trade) if trade.status.is_terminal() => {
                GameError::AlreadyDecided(trade_id.to_string())
            }
            Some(trade) => GameError::Corrupted(format!(
                "交易 {} 状态为 {} 但未能更新",
                trade_id, trade.status
            )),
        };
        debug!("[TradeService] 交易 {} 未处理: {}", trade_id, err);
        Ok(err)
    }

    async fn swap_owner(
        conn: &mut SqliteConnection,
        creature_id: &str,
        from_player: &str,
        to_player: &str,
    ) -> GameResult<()> {
        if !CreatureDao::reassign_owner(conn, creature_id, from_player, to_player).await? {
            warn!(
                "[TradeService] 精灵 {} 已不属于 {}，回滚",
                creature_id, from_player
            );
            return Err(GameError::OwnershipMismatch {
                creature_id: creature_id.to_string(),
                expected_owner: from_player.to_string(),
            });
        }
        Ok(())
    }
}

fn required(value: Option<String>, name: &'static str) -> GameResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GameError::MissingParameter(name)),
    }
}
