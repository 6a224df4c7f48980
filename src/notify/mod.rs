use anyhow::Result;
use async_trait::async_trait;

pub mod telegram;

/// One-way "send a preformatted text summary" boundary. Transport and retry
/// policy belong to the implementation; the monitor only logs a failed send.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, text: &str) -> Result<()>;
}

/// Escapes the characters Telegram's HTML parse mode requires escaping.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
