pub mod config;
pub mod creature;
pub mod db;
pub mod error;
pub mod friend;
pub mod player;
pub mod trade;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出常用类型
pub use config::GameConfig;
pub use error::{ErrorKind, GameError, GameResult};
