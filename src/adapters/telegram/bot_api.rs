//! Telegram Bot HTTP API client.
//!
//! Implements `BotGateway` and `UpdateSource` over plain JSON POSTs to
//! `{api_url}/bot{token}/{method}`. Rate limits surface as `FloodWait` and
//! blocked recipients as `Blocked`; retrying is left to the caller.

use super::keyboards::reply_markup;
use super::mapper::update_to_domain;
use super::types::{ApiResponse, SentMessage, Update};
use crate::domain::{DomainError, Keyboard};
use crate::ports::{BotGateway, PolledUpdate, UpdateSource};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Extra time on top of the long-poll timeout before the HTTP request is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct BotApiClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl BotApiClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        timeout: Option<Duration>,
    ) -> Result<T, DomainError> {
        let mut req = self.client.post(self.method_url(method)).json(&body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| DomainError::Gateway(format!("{}: {}", method, e.without_url())))?;
        let status = resp.status();
        let parsed: ApiResponse<T> = resp.json().await.map_err(|e| {
            DomainError::Gateway(format!("{}: HTTP {} with unreadable body: {}", method, status, e))
        })?;

        if parsed.ok {
            return parsed
                .result
                .ok_or_else(|| DomainError::Gateway(format!("{}: ok response without result", method)));
        }

        let code = parsed.error_code.unwrap_or(status.as_u16());
        let description = parsed.description.unwrap_or_default();
        match code {
            429 => {
                let seconds = parsed
                    .parameters
                    .and_then(|p| p.retry_after)
                    .unwrap_or(1);
                warn!(method, seconds, "rate limited");
                Err(DomainError::FloodWait { seconds })
            }
            403 => {
                debug!(method, %description, "recipient unavailable");
                Err(DomainError::Blocked)
            }
            _ => Err(DomainError::Gateway(format!(
                "{}: {} {}",
                method, code, description
            ))),
        }
    }
}

fn with_markup(mut body: Value, keyboard: Option<&Keyboard>) -> Value {
    if let Some(kb) = keyboard {
        body["reply_markup"] = reply_markup(kb);
    }
    body
}

#[async_trait::async_trait]
impl BotGateway for BotApiClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64, DomainError> {
        let body = with_markup(json!({ "chat_id": chat_id, "text": text }), keyboard);
        let sent: SentMessage = self.call("sendMessage", body, None).await?;
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DomainError> {
        let body = with_markup(
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            keyboard,
        );
        // Result is the edited Message, or `true` for inline messages.
        match self.call::<Value>("editMessageText", body, None).await {
            Ok(_) => Ok(()),
            Err(DomainError::Gateway(msg)) if msg.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), DomainError> {
        let mut body = json!({ "callback_query_id": callback_id, "show_alert": show_alert });
        if let Some(t) = text {
            body["text"] = json!(t);
        }
        self.call::<bool>("answerCallbackQuery", body, None).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UpdateSource for BotApiClient {
    async fn poll_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<PolledUpdate>, DomainError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                body,
                Some(Duration::from_secs(timeout_secs) + POLL_GRACE),
            )
            .await?;
        Ok(updates.iter().map(update_to_domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Incoming;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:abc";

    async fn server_with(route: &str, status: u16, body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/{}", TOKEN, route)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn send_message_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendMessage", TOKEN)))
            .and(body_partial_json(json!({
                "chat_id": 42,
                "text": "مرحبا",
                "reply_markup": { "remove_keyboard": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 555, "chat": { "id": 42 }, "date": 0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BotApiClient::new(server.uri(), TOKEN);
        let id = client
            .send_message(42, "مرحبا", Some(&Keyboard::Remove))
            .await
            .unwrap();
        assert_eq!(id, 555);
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_flood_wait() {
        let server = server_with(
            "sendMessage",
            429,
            json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 7",
                "parameters": { "retry_after": 7 }
            }),
        )
        .await;
        let client = BotApiClient::new(server.uri(), TOKEN);
        let err = client.send_message(1, "x", None).await.unwrap_err();
        assert_eq!(err, DomainError::FloodWait { seconds: 7 });
    }

    #[tokio::test]
    async fn forbidden_maps_to_blocked() {
        let server = server_with(
            "sendMessage",
            403,
            json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            }),
        )
        .await;
        let client = BotApiClient::new(server.uri(), TOKEN);
        let err = client.send_message(1, "x", None).await.unwrap_err();
        assert_eq!(err, DomainError::Blocked);
    }

    #[tokio::test]
    async fn other_errors_map_to_gateway() {
        let server = server_with(
            "sendMessage",
            400,
            json!({ "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }),
        )
        .await;
        let client = BotApiClient::new(server.uri(), TOKEN);
        match client.send_message(1, "x", None).await {
            Err(DomainError::Gateway(msg)) => assert!(msg.contains("chat not found")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unchanged_edit_is_not_an_error() {
        let server = server_with(
            "editMessageText",
            400,
            json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message is not modified"
            }),
        )
        .await;
        let client = BotApiClient::new(server.uri(), TOKEN);
        client.edit_message_text(1, 2, "same", None).await.unwrap();
    }

    #[tokio::test]
    async fn poll_updates_maps_messages_and_callbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/getUpdates", TOKEN)))
            .and(body_partial_json(json!({ "offset": 100, "timeout": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    { "update_id": 100, "message": {
                        "message_id": 1, "from": { "id": 5, "is_bot": false, "first_name": "S" },
                        "chat": { "id": 5 }, "text": "/help" } },
                    { "update_id": 101, "callback_query": {
                        "id": "q", "from": { "id": 6, "is_bot": false, "first_name": "A" },
                        "data": "delete_3" } },
                    { "update_id": 102, "my_chat_member": {} }
                ]
            })))
            .mount(&server)
            .await;

        let client = BotApiClient::new(format!("{}/", server.uri()), TOKEN);
        let updates = client.poll_updates(100, 0).await.unwrap();
        assert_eq!(updates.len(), 3);
        assert!(matches!(updates[0].incoming, Some(Incoming::Message(_))));
        assert!(matches!(updates[1].incoming, Some(Incoming::Callback(_))));
        assert!(updates[2].incoming.is_none());
        assert_eq!(updates[2].update_id, 102);
    }

    #[tokio::test]
    async fn answer_callback_sends_alert_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/answerCallbackQuery", TOKEN)))
            .and(body_partial_json(json!({
                "callback_query_id": "cb",
                "text": "تم",
                "show_alert": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client = BotApiClient::new(server.uri(), TOKEN);
        client.answer_callback("cb", Some("تم"), true).await.unwrap();
    }
}
