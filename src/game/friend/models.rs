//! 好友关系模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 规范化的玩家对：无论请求方向如何，同一对玩家总是得到同一个键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPair {
    pub id_min: String,
    pub id_max: String,
}

impl CanonicalPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                id_min: a.to_string(),
                id_max: b.to_string(),
            }
        } else {
            Self {
                id_min: b.to_string(),
                id_max: a.to_string(),
            }
        }
    }

    /// 给定一方，返回另一方
    pub fn other(&self, player_id: &str) -> &str {
        if self.id_min == player_id {
            &self.id_max
        } else {
            &self.id_min
        }
    }
}

/// 好友关系行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendLink {
    pub id1: String,
    pub id2: String,
    pub id_min: String,
    pub id_max: String,
    /// 发起请求的一方，必为 id1 或 id2
    pub petitioner: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl FriendLink {
    /// 新建待处理的好友请求
    pub fn pending(sender_id: &str, receiver_id: &str) -> Self {
        let pair = CanonicalPair::new(sender_id, receiver_id);
        Self {
            id1: sender_id.to_string(),
            id2: receiver_id.to_string(),
            id_min: pair.id_min,
            id_max: pair.id_max,
            petitioner: sender_id.to_string(),
            approved: false,
            created_at: Utc::now(),
        }
    }
}

/// 收到的好友请求（附带发起人昵称）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequest {
    pub id_min: String,
    pub id_max: String,
    pub petitioner: String,
    pub petitioner_name: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// 好友摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendSummary {
    pub id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_is_order_independent() {
        assert_eq!(CanonicalPair::new("alice", "bob"), CanonicalPair::new("bob", "alice"));

        let pair = CanonicalPair::new("bob", "alice");
        assert_eq!(pair.id_min, "alice");
        assert_eq!(pair.id_max, "bob");
        assert_eq!(pair.other("alice"), "bob");
        assert_eq!(pair.other("bob"), "alice");
    }

    #[test]
    fn test_pending_link_keeps_raw_ids() {
        let link = FriendLink::pending("zed", "amy");
        assert_eq!(link.id1, "zed");
        assert_eq!(link.id2, "amy");
        assert_eq!(link.id_min, "amy");
        assert_eq!(link.id_max, "zed");
        assert_eq!(link.petitioner, "zed");
        assert!(!link.approved);
    }
}
