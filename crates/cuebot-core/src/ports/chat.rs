//! ChatSink port - チャットへの通知（fire-and-forget）

use async_trait::async_trait;

/// ChatSink はチャットにメッセージを送る
///
/// 送信の失敗は呼び出し側に返しません。実装側でログに残してください。
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, text: &str);
}
