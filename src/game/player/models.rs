use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 玩家（凭据不在本模块中保存）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
