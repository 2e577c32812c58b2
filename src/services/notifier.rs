//! Contact form notifications
//!
//! Messages from the public contact form are forwarded to a Telegram chat
//! through the Bot API.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TelegramConfig;
use crate::models::ContactMessageInput;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &ContactMessageInput) -> Result<()>;
}

pub type DynNotifier = Arc<dyn Notifier>;

/// Escape the characters Telegram's HTML parse mode treats as markup
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Render a contact message as Telegram HTML
pub fn format_message(message: &ContactMessageInput) -> String {
    [
        "📩 <b>Portfolio: New message</b>".to_string(),
        String::new(),
        format!("<b>Name:</b> {}", escape_html(&message.name)),
        format!("<b>Email:</b> {}", escape_html(&message.email)),
        String::new(),
        "<b>Message:</b>".to_string(),
        escape_html(&message.message),
    ]
    .join("\n")
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages with `sendMessage` to a fixed chat
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// `None` when the bot token or chat id is missing
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>> {
        let (Some(bot_token), Some(chat_id)) = (&config.bot_token, &config.chat_id) else {
            return Ok(None);
        };
        if bot_token.is_empty() || chat_id.is_empty() {
            return Ok(None);
        }
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Some(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.clone(),
            chat_id: chat_id.clone(),
        }))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &ContactMessageInput) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": format_message(message),
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Telegram timeout")
                } else {
                    anyhow!("Telegram request failed: {}", e.without_url())
                }
            })?;

        let body: TelegramResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Invalid Telegram response: {}", e.without_url()))?;
        if !body.ok {
            bail!(
                "{}",
                body.description.unwrap_or_else(|| "Telegram API error".to_string())
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ContactMessageInput {
        ContactMessageInput {
            name: "Eve <script>".into(),
            email: "eve@example.com".into(),
            message: "Tom & Jerry > all".into(),
        }
    }

    fn config(api_base: &str) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123:abc".into()),
            chat_id: Some("42".into()),
            api_base: api_base.to_string(),
            timeout_ms: 2000,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_message_escapes_user_input() {
        let text = format_message(&message());
        assert!(text.contains("<b>Name:</b> Eve &lt;script&gt;"));
        assert!(text.contains("Tom &amp; Jerry &gt; all"));
        assert!(text.starts_with("📩 <b>Portfolio: New message</b>\n\n"));
    }

    #[test]
    fn test_unconfigured_is_none() {
        let mut cfg = config("http://localhost");
        cfg.chat_id = None;
        assert!(TelegramNotifier::from_config(&cfg).unwrap().is_none());

        cfg.chat_id = Some(String::new());
        assert!(TelegramNotifier::from_config(&cfg).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sends_html_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "42",
                "parse_mode": "HTML",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::from_config(&config(&server.uri()))
            .unwrap()
            .unwrap();
        notifier.notify(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Bad Request: chat not found",
            })))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::from_config(&config(&server.uri()))
            .unwrap()
            .unwrap();
        let err = notifier.notify(&message()).await.unwrap_err();
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_connection_error_hides_bot_token() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = TelegramNotifier::from_config(&config(&format!("http://{}", addr)))
            .unwrap()
            .unwrap();
        let err = notifier.notify(&message()).await.unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.starts_with("Telegram"));
        assert!(!text.contains("123:abc"));
        assert!(!text.contains("/bot"));
    }

    #[tokio::test]
    async fn test_invalid_response_hides_bot_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::from_config(&config(&server.uri()))
            .unwrap()
            .unwrap();
        let err = notifier.notify(&message()).await.unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.contains("Invalid Telegram response"));
        assert!(!text.contains("123:abc"));
    }
}
