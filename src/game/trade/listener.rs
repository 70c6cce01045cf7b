//! 交易监听器回调接口

use async_trait::async_trait;

/// 交易监听器，事务提交后触发，参数为交易的 JSON 字符串
#[async_trait]
pub trait TradeListener: Send + Sync {
    /// 新的交易提议
    async fn on_trade_proposed(&self, trade_json: String);

    /// 交易被确认或拒绝
    async fn on_trade_decided(&self, trade_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyTradeListener;

#[async_trait]
impl TradeListener for EmptyTradeListener {
    async fn on_trade_proposed(&self, _trade_json: String) {}

    async fn on_trade_decided(&self, _trade_json: String) {}
}
