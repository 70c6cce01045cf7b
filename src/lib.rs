pub mod game;

// 重新导出常用类型和函数，方便外部使用
pub use game::{
    config::GameConfig,
    db::create_sqlite_pool_with_migration,
    error::{ErrorKind, GameError, GameResult},
    friend::{FriendService, FriendSummary, IncomingRequest},
    trade::{Trade, TradeProposal, TradeService, TradeStatus},
};
