//! 精灵持有记录（OwnershipStore）
//!
//! 捕获与列表查询不在本模块范围内；交易确认通过事务句柄读写持有人。

pub mod dao;
pub mod models;

pub use dao::CreatureDao;
pub use models::{NewCreature, OwnedCreature};
