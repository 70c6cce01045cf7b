//! 好友监听器回调接口

use async_trait::async_trait;

/// 好友监听器回调接口，事务提交后触发，参数为 JSON 字符串
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// 有新的好友请求
    async fn on_friend_request_received(&self, request_json: String);

    /// 好友请求被接受
    async fn on_friend_added(&self, friend_json: String);

    /// 好友请求被拒绝或好友被删除，参数为对方 ID
    async fn on_friend_removed(&self, player_id: String, friend_id: String);
}

/// 默认空实现（无操作）
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friend_request_received(&self, _request_json: String) {
        // 默认不做任何处理
    }

    async fn on_friend_added(&self, _friend_json: String) {
        // 默认不做任何处理
    }

    async fn on_friend_removed(&self, _player_id: String, _friend_id: String) {
        // 默认不做任何处理
    }
}
