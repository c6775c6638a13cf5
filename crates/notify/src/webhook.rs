//! HTTP webhook transport.
//!
//! Posts each reminder as a JSON payload to a push gateway endpoint. The
//! gateway is responsible for fanning out to the broadcast topic.

use std::collections::BTreeMap;

use crate::traits::{NotifyError, ReminderMessage, Transport};

/// Delivers reminders as JSON over HTTP to a configured endpoint.
///
/// Environment variable references (`${VAR_NAME}`) in the URL and header
/// values are resolved at construction time.
#[derive(Debug)]
pub struct WebhookTransport {
    /// Target URL (env vars already resolved).
    url: String,
    /// Custom headers to include on every request.
    headers: BTreeMap<String, String>,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookTransport {
    /// Create a new webhook transport.
    ///
    /// Missing env vars referenced by `url` or header values produce a
    /// [`NotifyError::Config`] error.
    pub fn new(url: &str, headers: &BTreeMap<String, String>) -> Result<Self, NotifyError> {
        let resolved_url = resolve_env_vars(url)?;
        if !(resolved_url.starts_with("http://") || resolved_url.starts_with("https://")) {
            return Err(NotifyError::Config(format!(
                "webhook url must be http(s): {resolved_url}"
            )));
        }

        let mut resolved_headers = BTreeMap::new();
        for (key, value) in headers {
            resolved_headers.insert(key.clone(), resolve_env_vars(value)?);
        }

        Ok(Self {
            url: resolved_url,
            headers: resolved_headers,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Transport for WebhookTransport {
    async fn send(&self, message: &ReminderMessage) -> Result<String, NotifyError> {
        let mut request = self.client.post(&self.url).json(message);
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if !status.is_success() {
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let message_id = extract_message_id(&body_text).unwrap_or_else(|| status.to_string());
        tracing::debug!(url = %self.url, %status, message_id = %message_id, "webhook accepted reminder");
        Ok(message_id)
    }

    fn transport_name(&self) -> &str {
        "webhook"
    }
}

/// Pull a message id out of a gateway response such as
/// `{"name": "projects/x/messages/123"}` or `{"id": "abc"}`.
fn extract_message_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["name", "id", "message_id"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()).map(str::to_string))
}

/// Resolve `${VAR_NAME}` patterns in a string using `std::env::var`.
///
/// Returns an error if a referenced variable is not set.
fn resolve_env_vars(input: &str) -> Result<String, NotifyError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if !closed {
                return Err(NotifyError::Config(format!(
                    "unclosed env var reference in: {input}"
                )));
            }
            let value = std::env::var(&var_name).map_err(|_| {
                NotifyError::Config(format!("env var not found: {var_name}"))
            })?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("DUEBELL_WEBHOOK_TEST_HOST", "push.example.com");
        let result = resolve_env_vars("https://${DUEBELL_WEBHOOK_TEST_HOST}/send").unwrap();
        assert_eq!(result, "https://push.example.com/send");
        std::env::remove_var("DUEBELL_WEBHOOK_TEST_HOST");
    }

    #[test]
    fn resolve_env_vars_missing() {
        match resolve_env_vars("https://${DUEBELL_ABSOLUTELY_NOT_SET_12345}/hook") {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("DUEBELL_ABSOLUTELY_NOT_SET_12345")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_env_vars_unclosed() {
        match resolve_env_vars("https://${UNCLOSED/hook") {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("unclosed")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn headers_are_resolved() {
        std::env::set_var("DUEBELL_WT_API_KEY", "secret-key-123");
        let headers = BTreeMap::from([
            ("Authorization".to_string(), "Bearer ${DUEBELL_WT_API_KEY}".to_string()),
            ("X-Static".to_string(), "fixed".to_string()),
        ]);
        let transport = WebhookTransport::new("https://push.example.com/send", &headers).unwrap();
        assert_eq!(transport.headers["Authorization"], "Bearer secret-key-123");
        assert_eq!(transport.headers["X-Static"], "fixed");
        assert_eq!(transport.transport_name(), "webhook");
        std::env::remove_var("DUEBELL_WT_API_KEY");
    }

    #[test]
    fn non_http_url_rejected() {
        assert!(WebhookTransport::new("ftp://push.example.com", &BTreeMap::new()).is_err());
    }

    #[test]
    fn message_id_extraction() {
        assert_eq!(
            extract_message_id(r#"{"name":"projects/p/messages/9"}"#).as_deref(),
            Some("projects/p/messages/9")
        );
        assert_eq!(extract_message_id(r#"{"id":"abc"}"#).as_deref(), Some("abc"));
        assert_eq!(extract_message_id("OK"), None);
    }
}
