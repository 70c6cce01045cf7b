//! 交易模型与状态定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 交易状态
///
/// 只允许 pending → accepted 或 pending → rejected，终态不可再变更。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl TradeStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Accepted | TradeStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        matches!(
            (self, next),
            (TradeStatus::Pending, TradeStatus::Accepted)
                | (TradeStatus::Pending, TradeStatus::Rejected)
        )
    }

    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TradeStatus::Pending),
            "accepted" => Ok(TradeStatus::Accepted),
            "rejected" => Ok(TradeStatus::Rejected),
            other => Err(format!("未知的交易状态: {}", other)),
        }
    }
}

/// 交易记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub requester_id: String,
    pub receiver_id: String,
    pub requester_creature_id: String,
    pub receiver_creature_id: String,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn involves(&self, player_id: &str) -> bool {
        self.requester_id == player_id || self.receiver_id == player_id
    }
}

/// 交易提议（字段可能缺失，由服务层校验）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeProposal {
    pub receiver_id: Option<String>,
    pub requester_creature_id: Option<String>,
    pub receiver_creature_id: Option<String>,
}

impl TradeProposal {
    pub fn new(
        receiver_id: impl Into<String>,
        requester_creature_id: impl Into<String>,
        receiver_creature_id: impl Into<String>,
    ) -> Self {
        Self {
            receiver_id: Some(receiver_id.into()),
            requester_creature_id: Some(requester_creature_id.into()),
            receiver_creature_id: Some(receiver_creature_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TradeStatus::Accepted.is_terminal());
        assert!(TradeStatus::Rejected.is_terminal());
        assert!(!TradeStatus::Pending.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(TradeStatus::Pending.can_transition_to(TradeStatus::Accepted));
        assert!(TradeStatus::Pending.can_transition_to(TradeStatus::Rejected));
        assert!(!TradeStatus::Pending.can_transition_to(TradeStatus::Pending));
        assert!(!TradeStatus::Accepted.can_transition_to(TradeStatus::Rejected));
        assert!(!TradeStatus::Rejected.can_transition_to(TradeStatus::Accepted));
        assert!(!TradeStatus::Accepted.can_transition_to(TradeStatus::Pending));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("accepted".parse::<TradeStatus>(), Ok(TradeStatus::Accepted));
        assert!("ACCEPTED".parse::<TradeStatus>().is_err());
        assert_eq!(TradeStatus::Rejected.to_string(), "rejected");
        assert_eq!(
            serde_json::to_string(&TradeStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_proposal_from_json_with_missing_fields() {
        let p: TradeProposal =
            serde_json::from_str(r#"{"receiverId":"bob","requesterCreatureId":"c1"}"#).unwrap();
        assert_eq!(p.receiver_id.as_deref(), Some("bob"));
        assert!(p.receiver_creature_id.is_none());
    }
}
