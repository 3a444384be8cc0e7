//! TracingChat - チャット送信をログに書き出す ChatSink

use tracing::info;

use crate::ports::ChatSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChat;

#[async_trait::async_trait]
impl ChatSink for TracingChat {
    async fn send_message(&self, text: &str) {
        info!(target: "cuebot::chat", message = text, "chat message");
    }
}
