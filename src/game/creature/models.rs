use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 玩家持有的精灵实例（区别于图鉴中的物种）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCreature {
    pub id: String,
    pub player_id: String,
    /// 图鉴编号
    pub species: i32,
    pub in_team: bool,
    pub obtained_at: DateTime<Utc>,
    pub nickname: Option<String>,
}

/// 写入精灵实例所需的字段
#[derive(Debug, Clone)]
pub struct NewCreature {
    pub id: String,
    pub player_id: String,
    pub species: i32,
    pub in_team: bool,
    pub nickname: Option<String>,
}
