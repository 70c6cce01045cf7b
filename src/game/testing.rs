//! 单测公共工具：临时 SQLite 文件 + 日志初始化

use crate::game::config::GameConfig;
use crate::game::creature::{CreatureDao, NewCreature, OwnedCreature};
use crate::game::db::create_sqlite_pool_with_migration;
use crate::game::player::{Player, PlayerDao};
use sqlx::{Pool, Sqlite};
use std::sync::Once;
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        // 测试中默认打开当前 crate 的 debug，sqlx 只保留 warn
        let filter_layer = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,poketrade_core=debug,sqlx=warn"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true) // 包含文件名
            .with_line_number(true) // 包含行号
            .with_target(false)
            .with_test_writer();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// 每个用例独立的数据库文件，随 `TestDb` 一起删除
pub(crate) struct TestDb {
    pub pool: Pool<Sqlite>,
    pub config: GameConfig,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        init_test_logger();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poketrade_test.db");
        let config = GameConfig::new(format!("sqlite://{}?mode=rwc", path.display()));
        let pool = create_sqlite_pool_with_migration(&config).await.unwrap();
        Self {
            pool,
            config,
            _dir: dir,
        }
    }
}

pub(crate) async fn seed_player(pool: &Pool<Sqlite>, id: &str, username: &str) -> Player {
    PlayerDao::new(pool.clone())
        .insert_player(id, username, &format!("{}@example.com", id))
        .await
        .unwrap()
}

pub(crate) async fn seed_creature(
    pool: &Pool<Sqlite>,
    id: &str,
    player_id: &str,
    species: i32,
) -> OwnedCreature {
    CreatureDao::new(pool.clone())
        .insert_creature(&NewCreature {
            id: id.to_string(),
            player_id: player_id.to_string(),
            species,
            in_team: true,
            nickname: None,
        })
        .await
        .unwrap()
}
