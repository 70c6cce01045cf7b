//! 交易模块
//!
//! 实现交易提议、确认（原子交换精灵持有人）、拒绝以及待处理交易查询

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型
pub use dao::TradeDao;
pub use listener::{EmptyTradeListener, TradeListener};
pub use models::{Trade, TradeProposal, TradeStatus};
pub use service::TradeService;
