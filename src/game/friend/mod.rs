//! 好友模块
//!
//! 实现好友请求、通过、拒绝、删除以及好友列表查询

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型
pub use dao::FriendDao;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::{CanonicalPair, FriendLink, FriendSummary, IncomingRequest};
pub use service::FriendService;
