//! 好友服务层
//!
//! 好友关系是对称的：一对玩家只对应一行（规范化键 + 唯一索引），
//! 请求、通过、拒绝、删除都基于这一行进行。

use crate::game::config::GameConfig;
use crate::game::error::{with_timeout, GameError, GameResult};
use crate::game::friend::dao::FriendDao;
use crate::game::friend::listener::{EmptyFriendListener, FriendListener};
use crate::game::friend::models::{CanonicalPair, FriendLink, FriendSummary, IncomingRequest};
use crate::game::player::{PlayerDao, PlayerLookup};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 好友服务
pub struct FriendService {
    config: GameConfig,
    /// 好友 DAO
    friend_dao: FriendDao,
    /// 玩家查询
    players: Arc<dyn PlayerLookup>,
    /// 好友监听器
    listener: Arc<dyn FriendListener>,
}

impl FriendService {
    /// 创建新的好友服务（使用默认空监听器）
    pub fn new(db: Pool<Sqlite>, config: GameConfig) -> Self {
        Self::with_listener(db, config, Arc::new(EmptyFriendListener))
    }

    /// 创建新的好友服务（带自定义监听器，共享连接池）
    pub fn with_listener(
        db: Pool<Sqlite>,
        config: GameConfig,
        listener: Arc<dyn FriendListener>,
    ) -> Self {
        Self {
            friend_dao: FriendDao::new(db.clone()),
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

    /// 查看收到的好友请求；没有请求时返回 `NotFound`
    pub async fn list_incoming_requests(&self, caller_id: &str) -> GameResult<Vec<IncomingRequest>> {
        with_timeout(self.config.request_timeout, async {
            let requests = self.friend_dao.get_incoming_requests(caller_id).await?;
            if requests.is_empty() {
                debug!("[FriendService] 玩家 {} 没有待处理的好友请求", caller_id);
                return Err(GameError::not_found("friend request", caller_id));
            }
            Ok(requests)
        })
        .await
    }

    /// 发送好友请求
    pub async fn send_request(&self, sender_id: &str, receiver_id: &str) -> GameResult<FriendLink> {
        if receiver_id.is_empty() {
            return Err(GameError::MissingParameter("receiver_id"));
        }
        if receiver_id == sender_id {
            warn!("[FriendService] 玩家 {} 尝试向自己发送好友请求", sender_id);
            return Err(GameError::InvalidTarget(receiver_id.to_string()));
        }

        let link = with_timeout(self.config.request_timeout, async {
            if !self.players.exists(receiver_id).await? {
                warn!("[FriendService] 目标玩家不存在: {}", receiver_id);
                return Err(GameError::InvalidTarget(receiver_id.to_string()));
            }

            // 重复关系由唯一索引拦截，不做预检查
            let link = FriendLink::pending(sender_id, receiver_id);
            let mut tx = self.friend_dao.begin().await?;
            FriendDao::insert_request(&mut tx, &link).await?;
            tx.commit().await?;
            Ok(link)
        })
        .await?;

        info!(
            "[FriendService] 已发送好友请求: {} -> {}",
            sender_id, receiver_id
        );
        if let Ok(json) = serde_json::to_string(&link) {
            self.listener.on_friend_request_received(json).await;
        }
        Ok(link)
    }

    /// 通过好友请求，返回新好友信息
    ///
    /// 只有请求的接收方可以通过；发起人通过自己的请求视为没有可处理的请求。
    /// 新好友的信息在写入之前查出，写入失败或超时都不会留下已通过的关系。
    pub async fn accept_request(&self, caller_id: &str, friend_id: &str) -> GameResult<FriendSummary> {
        if friend_id.is_empty() {
            return Err(GameError::MissingParameter("friend_id"));
        }
        let pair = CanonicalPair::new(caller_id, friend_id);

        let friend = with_timeout(self.config.request_timeout, async {
            // 不存在的玩家不可能有请求
            let player = self
                .players
                .find_player(friend_id)
                .await?
                .ok_or_else(|| GameError::not_found("friend request", friend_id))?;

            let mut tx = self.friend_dao.begin().await?;
            let affected = FriendDao::approve_request(&mut tx, &pair, caller_id).await?;
            if affected == 0 {
                warn!(
                    "[FriendService] 没有来自 {} 发给 {} 的待处理请求",
                    friend_id, caller_id
                );
                return Err(GameError::not_found("friend request", friend_id));
            }
            tx.commit().await?;

            Ok(FriendSummary {
                id: player.id,
                username: player.username,
            })
        })
        .await?;

        info!(
            "[FriendService] ✅ {} 通过了 {} ({}) 的好友请求",
            caller_id, friend.id, friend.username
        );
        if let Ok(json) = serde_json::to_string(&friend) {
            self.listener.on_friend_added(json).await;
        }
        Ok(friend)
    }

    /// 拒绝（或撤回）待处理的好友请求，不会影响已通过的好友关系
    pub async fn deny_request(&self, caller_id: &str, friend_id: &str) -> GameResult<()> {
        if friend_id.is_empty() {
            return Err(GameError::MissingParameter("friend_id"));
        }
        let pair = CanonicalPair::new(caller_id, friend_id);

        with_timeout(self.config.request_timeout, async {
            let mut tx = self.friend_dao.begin().await?;
            let affected = FriendDao::delete_pending(&mut tx, &pair).await?;
            if affected == 0 {
                warn!(
                    "[FriendService] {} 与 {} 之间没有待处理的请求",
                    caller_id, friend_id
                );
                return Err(GameError::not_found("friend request", friend_id));
            }
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!("[FriendService] {} 拒绝了与 {} 的好友请求", caller_id, friend_id);
        self.listener
            .on_friend_removed(caller_id.to_string(), friend_id.to_string())
            .await;
        Ok(())
    }

    /// 好友列表（可能为空）
    pub async fn list_friends(&self, caller_id: &str) -> GameResult<Vec<FriendSummary>> {
        with_timeout(
            self.config.request_timeout,
            self.friend_dao.get_friends(caller_id),
        )
        .await
    }

    /// 删除好友，双方的好友列表同时失去该关系
    pub async fn remove_friend(&self, caller_id: &str, friend_id: &str) -> GameResult<()> {
        if friend_id.is_empty() {
            return Err(GameError::MissingParameter("friend_id"));
        }
        let pair = CanonicalPair::new(caller_id, friend_id);

        with_timeout(self.config.request_timeout, async {
            let mut tx = self.friend_dao.begin().await?;
            let affected = FriendDao::delete_approved(&mut tx, &pair).await?;
            if affected == 0 {
                warn!(
                    "[FriendService] {} 与 {} 不是好友，无法删除",
                    caller_id, friend_id
                );
                return Err(GameError::not_found("friendship", friend_id));
            }
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!("[FriendService] {} 删除了好友 {}", caller_id, friend_id);
        self.listener
            .on_friend_removed(caller_id.to_string(), friend_id.to_string())
            .await;
        Ok(())
    }

    /// 查询与某玩家之间的关系行（待处理或已通过）
    pub async fn get_relationship(&self, caller_id: &str, other_id: &str) -> GameResult<FriendLink> {
        let pair = CanonicalPair::new(caller_id, other_id);
        with_timeout(self.config.request_timeout, async {
            self.friend_dao
                .get_link(&pair)
                .await?
                .ok_or_else(|| GameError::not_found("friendship", other_id))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::error::ErrorKind;
    use crate::game::testing::{seed_player, TestDb};
    use async_trait::async_trait;
    use crate::game::player::Player;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn setup() -> (TestDb, FriendService) {
        let db = TestDb::new().await;
        for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
            seed_player(&db.pool, id, name).await;
        }
        let service = FriendService::new(db.pool.clone(), db.config.clone());
        (db, service)
    }

    #[tokio::test]
    async fn test_duplicate_request_rejected_in_both_directions() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        let again = service.send_request("alice", "bob").await.unwrap_err();
        assert!(matches!(again, GameError::DuplicateRelationship(_)));
        assert_eq!(again.kind(), ErrorKind::Conflict);

        let reverse = service.send_request("bob", "alice").await.unwrap_err();
        assert!(matches!(reverse, GameError::DuplicateRelationship(_)));
    }

    #[tokio::test]
    async fn test_duplicate_after_approval() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();
        service.accept_request("bob", "alice").await.unwrap();

        let err = service.send_request("bob", "alice").await.unwrap_err();
        assert!(matches!(err, GameError::DuplicateRelationship(_)));
    }

    #[tokio::test]
    async fn test_send_to_unknown_or_self() {
        let (_db, service) = setup().await;
        let err = service.send_request("alice", "nobody").await.unwrap_err();
        assert!(matches!(err, GameError::InvalidTarget(_)));

        let err = service.send_request("alice", "alice").await.unwrap_err();
        assert!(matches!(err, GameError::InvalidTarget(_)));

        let err = service.send_request("alice", "").await.unwrap_err();
        assert!(matches!(err, GameError::MissingParameter("receiver_id")));
    }

    #[tokio::test]
    async fn test_incoming_requests() {
        let (_db, service) = setup().await;
        let err = service.list_incoming_requests("bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        service.send_request("alice", "bob").await.unwrap();
        service.send_request("carol", "bob").await.unwrap();

        let incoming = service.list_incoming_requests("bob").await.unwrap();
        let names: Vec<_> = incoming.iter().map(|r| r.petitioner_name.as_str()).collect();
        assert_eq!(incoming.len(), 2);
        assert!(names.contains(&"Alice"));
        assert!(names.contains(&"Carol"));
        assert!(incoming.iter().all(|r| !r.approved));

        // 发起人自己看不到
        let err = service.list_incoming_requests("alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_accept_makes_friendship_symmetric() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        let friend = service.accept_request("bob", "alice").await.unwrap();
        assert_eq!(
            friend,
            FriendSummary {
                id: "alice".into(),
                username: "Alice".into()
            }
        );

        let alice_friends = service.list_friends("alice").await.unwrap();
        assert_eq!(alice_friends.len(), 1);
        assert_eq!(alice_friends[0].id, "bob");
        assert_eq!(alice_friends[0].username, "Bob");

        let bob_friends = service.list_friends("bob").await.unwrap();
        assert_eq!(bob_friends.len(), 1);
        assert_eq!(bob_friends[0].id, "alice");

        assert!(service.list_friends("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_petitioner_cannot_accept_own_request() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        let err = service.accept_request("alice", "bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let link = service.get_relationship("bob", "alice").await.unwrap();
        assert!(!link.approved);
        assert_eq!(link.petitioner, "alice");
    }

    #[tokio::test]
    async fn test_accept_without_request() {
        let (_db, service) = setup().await;
        let err = service.accept_request("bob", "carol").await.unwrap_err();
        assert!(matches!(err, GameError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_deny_only_touches_pending() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();
        service.deny_request("bob", "alice").await.unwrap();
        assert_eq!(
            service.get_relationship("alice", "bob").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // 第二次拒绝没有可删除的行
        let err = service.deny_request("bob", "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // 已通过的好友关系不受拒绝影响
        service.send_request("alice", "carol").await.unwrap();
        service.accept_request("carol", "alice").await.unwrap();
        let err = service.deny_request("carol", "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(service.list_friends("alice").await.unwrap().len(), 1);

        // 拒绝后可以重新发起
        service.send_request("bob", "alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_petitioner_can_cancel_request() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        service.deny_request("alice", "bob").await.unwrap();
        assert_eq!(
            service.get_relationship("bob", "alice").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service.list_incoming_requests("bob").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // 撤回后同方向可以重新发起
        let link = service.send_request("alice", "bob").await.unwrap();
        assert_eq!(link.petitioner, "alice");
        assert!(!link.approved);
    }

    #[tokio::test]
    async fn test_remove_friend_both_directions() {
        let (_db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        // 待处理的请求不能当作好友删除
        let err = service.remove_friend("alice", "bob").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        service.accept_request("bob", "alice").await.unwrap();
        service.remove_friend("alice", "bob").await.unwrap();

        assert!(service.list_friends("alice").await.unwrap().is_empty());
        assert!(service.list_friends("bob").await.unwrap().is_empty());

        let err = service.remove_friend("bob", "alice").await.unwrap_err();
        assert!(matches!(err, GameError::NotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_send_creates_single_row() {
        let (_db, service) = setup().await;
        let (a, b) = tokio::join!(
            service.send_request("alice", "bob"),
            service.send_request("bob", "alice")
        );
        assert!(a.is_ok() ^ b.is_ok());
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, GameError::DuplicateRelationship(_)));
    }

    struct SlowLookup;

    #[async_trait]
    impl PlayerLookup for SlowLookup {
        async fn find_player(&self, _player_id: &str) -> GameResult<Option<Player>> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_accept_timeout_leaves_request_pending() {
        let (db, service) = setup().await;
        service.send_request("alice", "bob").await.unwrap();

        let config = db
            .config
            .clone()
            .with_request_timeout(Duration::from_millis(50));
        let slow = FriendService::new(db.pool.clone(), config)
            .with_player_lookup(Arc::new(SlowLookup));

        let err = slow.accept_request("bob", "alice").await.unwrap_err();
        assert!(matches!(err, GameError::Timeout(_)));

        let link = service.get_relationship("alice", "bob").await.unwrap();
        assert!(!link.approved);
        assert!(service.list_friends("alice").await.unwrap().is_empty());
        assert!(service.list_friends("bob").await.unwrap().is_empty());

        // 重试仍然可以通过
        let friend = service.accept_request("bob", "alice").await.unwrap();
        assert_eq!(friend.id, "alice");
        assert_eq!(service.list_friends("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_accept_unknown_player() {
        let (_db, service) = setup().await;
        let err = service.accept_request("bob", "nobody").await.unwrap_err();
        assert!(matches!(err, GameError::NotFound { .. }));
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FriendListener for RecordingListener {
        async fn on_friend_request_received(&self, _request_json: String) {
            self.events.lock().unwrap().push("request".into());
        }
        async fn on_friend_added(&self, friend_json: String) {
            self.events.lock().unwrap().push(format!("added:{}", friend_json));
        }
        async fn on_friend_removed(&self, player_id: String, friend_id: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("removed:{}:{}", player_id, friend_id));
        }
    }

    #[tokio::test]
    async fn test_listener_notified_after_commit() {
        let db = TestDb::new().await;
        seed_player(&db.pool, "alice", "Alice").await;
        seed_player(&db.pool, "bob", "Bob").await;
        let listener = Arc::new(RecordingListener::default());
        let service =
            FriendService::with_listener(db.pool.clone(), db.config.clone(), listener.clone());

        service.send_request("alice", "bob").await.unwrap();
        service.send_request("alice", "bob").await.unwrap_err();
        service.accept_request("bob", "alice").await.unwrap();
        service.remove_friend("bob", "alice").await.unwrap();

        let events = listener.events.lock().unwrap().clone();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], "request");
        assert!(events[1].starts_with("added:"));
        assert!(events[1].contains("\"alice\""));
        assert_eq!(events[2], "removed:bob:alice");
    }
}
