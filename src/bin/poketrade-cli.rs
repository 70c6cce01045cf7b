//! 精灵交易 CLI
//!
//! 非交互式 CLI，直接操作本地 SQLite 数据库，用于测试和展示好友/交易功能。
//! 调用方身份通过 `--as` 指定，视为已经通过外部认证。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use poketrade_core::game::creature::{CreatureDao, NewCreature};
use poketrade_core::game::friend::{FriendListener, FriendService};
use poketrade_core::game::player::PlayerDao;
use poketrade_core::game::trade::{TradeListener, TradeProposal, TradeService};
use poketrade_core::{create_sqlite_pool_with_migration, GameConfig, GameError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 精灵交易 CLI
#[derive(Parser, Debug)]
#[command(name = "poketrade-cli")]
#[command(about = "精灵交易 CLI - 用于测试好友与交易功能", long_about = None)]
struct Args {
    /// 数据库地址
    #[arg(long, env = "POKETRADE_DB_URL", default_value = poketrade_core::game::config::DEFAULT_DB_URL)]
    db: String,

    /// 调用方玩家 ID（已认证身份）
    #[arg(long = "as", default_value = "")]
    caller: String,

    /// 单次请求超时（秒）
    #[arg(long, env = "POKETRADE_REQUEST_TIMEOUT_SECS", default_value = "10")]
    timeout: u64,

    /// 日志级别（默认: info,poketrade_core=debug）
    #[arg(long, default_value = "info,poketrade_core=debug")]
    log_level: String,

    /// 日志文件
    #[arg(long, default_value = "poketrade.log")]
    log_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 玩家
    #[command(subcommand)]
    Player(PlayerCommand),
    /// 精灵
    #[command(subcommand)]
    Creature(CreatureCommand),
    /// 好友
    #[command(subcommand)]
    Friend(FriendCommand),
    /// 交易
    #[command(subcommand)]
    Trade(TradeCommand),
}

#[derive(Subcommand, Debug)]
enum PlayerCommand {
    Add {
        id: String,
        username: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[derive(Subcommand, Debug)]
enum CreatureCommand {
    Add {
        id: String,
        species: i32,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        in_team: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FriendCommand {
    Send { receiver_id: String },
    Accept { friend_id: String },
    Deny { friend_id: String },
    Requests,
    List,
    Remove { friend_id: String },
}

#[derive(Subcommand, Debug)]
enum TradeCommand {
    Propose {
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        give: Option<String>,
        #[arg(long)]
        take: Option<String>,
    },
    Confirm { trade_id: String },
    Deny { trade_id: String },
    Pending { other_id: String },
    History,
    Show { trade_id: String },
}

/// 初始化日志（同时输出到控制台和文件）
fn init_logger(log_level: &str, log_path: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("无法创建日志文件 {}", log_path))?;

    // 日志走 stderr，stdout 只输出结果 JSON
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(())
}

struct CliFriendListener;

#[async_trait::async_trait]
impl FriendListener for CliFriendListener {
    async fn on_friend_request_received(&self, request_json: String) {
        info!("[CLI/Friend] 📝 新的好友请求: {}", request_json);
    }

    async fn on_friend_added(&self, friend_json: String) {
        info!("[CLI/Friend] 👥 新好友: {}", friend_json);
    }

    async fn on_friend_removed(&self, player_id: String, friend_id: String) {
        info!("[CLI/Friend] 🗑️ {} 与 {} 的关系已移除", player_id, friend_id);
    }
}

struct CliTradeListener;

#[async_trait::async_trait]
impl TradeListener for CliTradeListener {
    async fn on_trade_proposed(&self, trade_json: String) {
        info!("[CLI/Trade] 📨 新的交易提议: {}", trade_json);
    }

    async fn on_trade_decided(&self, trade_json: String) {
        info!("[CLI/Trade] 🔄 交易已处理: {}", trade_json);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    use std::io::Write;
    let text = serde_json::to_string_pretty(value).context("序列化输出失败")?;
    writeln!(std::io::stdout(), "{}", text).context("写入标准输出失败")?;
    Ok(())
}

fn require_caller(caller: &str) -> Result<(), GameError> {
    if caller.is_empty() {
        return Err(GameError::MissingParameter("--as"));
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let Args {
        db,
        caller,
        timeout,
        command,
        ..
    } = args;
    let config = GameConfig::new(db).with_request_timeout(Duration::from_secs(timeout));
    let pool = create_sqlite_pool_with_migration(&config).await?;

    let friends =
        FriendService::with_listener(pool.clone(), config.clone(), Arc::new(CliFriendListener));
    let trades =
        TradeService::with_listener(pool.clone(), config.clone(), Arc::new(CliTradeListener));
    let caller = caller.as_str();

    let outcome: Result<serde_json::Result<serde_json::Value>, GameError> = async {
        let value = match command {
            Command::Player(PlayerCommand::Add {
                id,
                username,
                email,
            }) => {
                let player = PlayerDao::new(pool.clone())
                    .insert_player(&id, &username, &email)
                    .await?;
                serde_json::to_value(player)
            }
            Command::Creature(CreatureCommand::Add {
                id,
                species,
                nickname,
                in_team,
            }) => {
                require_caller(caller)?;
                let creature = CreatureDao::new(pool.clone())
                    .insert_creature(&NewCreature {
                        id,
                        player_id: caller.to_string(),
                        species,
                        in_team,
                        nickname,
                    })
                    .await?;
                serde_json::to_value(creature)
            }
            Command::Friend(cmd) => {
                require_caller(caller)?;
                match cmd {
                    FriendCommand::Send { receiver_id } => {
                        serde_json::to_value(friends.send_request(caller, &receiver_id).await?)
                    }
                    FriendCommand::Accept { friend_id } => {
                        let friend = friends.accept_request(caller, &friend_id).await?;
                        Ok(serde_json::json!({
                            "message": format!("Friend request with {} accepted", friend.username),
                            "friend": friend,
                        }))
                    }
                    FriendCommand::Deny { friend_id } => {
                        friends.deny_request(caller, &friend_id).await?;
                        Ok(serde_json::json!({ "message": "Friend request denied" }))
                    }
                    FriendCommand::Requests => {
                        serde_json::to_value(friends.list_incoming_requests(caller).await?)
                    }
                    FriendCommand::List => {
                        let list = friends.list_friends(caller).await?;
                        Ok(serde_json::json!({ "friends": list }))
                    }
                    FriendCommand::Remove { friend_id } => {
                        friends.remove_friend(caller, &friend_id).await?;
                        Ok(serde_json::json!({
                            "message": format!("Friendship with {} removed", friend_id)
                        }))
                    }
                }
            }
            Command::Trade(cmd) => {
                require_caller(caller)?;
                match cmd {
                    TradeCommand::Propose { to, give, take } => {
                        let proposal = TradeProposal {
                            receiver_id: to,
                            requester_creature_id: give,
                            receiver_creature_id: take,
                        };
                        serde_json::to_value(trades.propose_trade(caller, proposal).await?)
                    }
                    TradeCommand::Confirm { trade_id } => {
                        serde_json::to_value(trades.confirm_trade(caller, &trade_id).await?)
                    }
                    TradeCommand::Deny { trade_id } => {
                        serde_json::to_value(trades.deny_trade(caller, &trade_id).await?)
                    }
                    TradeCommand::Pending { other_id } => {
                        let list = trades.list_pending_between(caller, &other_id).await?;
                        Ok(serde_json::json!({ "trades": list }))
                    }
                    TradeCommand::History => {
                        let list = trades.list_trade_history(caller).await?;
                        Ok(serde_json::json!({ "trades": list }))
                    }
                    TradeCommand::Show { trade_id } => {
                        serde_json::to_value(trades.get_trade(caller, &trade_id).await?)
                    }
                }
            }
        };
        Ok(value)
    }
    .await;

    pool.close().await;

    match outcome {
        // 输出失败属于 CLI 自身的错误，不是业务错误
        Ok(value) => print_json(&value.context("序列化结果失败")?),
        Err(e) => {
            error!("[CLI] ❌ {} ({}): {}", e.code(), e.http_status(), e);
            print_json(&serde_json::json!({
                "code": e.code(),
                "status": e.http_status(),
                "message": e.to_string(),
            }))?;
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level, &args.log_file)?;

    info!("[CLI] 🚀 精灵交易 CLI");
    info!("[CLI] 🗄️  数据库: {}", args.db);
    if !args.caller.is_empty() {
        info!("[CLI] 👤 调用方: {}", args.caller);
    }

    run(args).await
}
