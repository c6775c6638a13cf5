use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::window::{DEFAULT_DUE_WINDOW_SECS, MAX_DUE_WINDOW_SECS};

/// Default broadcast topic reminders are addressed to.
pub const DEFAULT_CHANNEL: &str = "ToDos";
/// Default notification title template.
pub const DEFAULT_TITLE_TEMPLATE: &str = "⏰ Task Reminder";
/// Default notification body template.
pub const DEFAULT_BODY_TEMPLATE: &str = "Time to: {{ task.title }}";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_i64(profile: &str, key: &str, default: i64) -> i64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub dispatch: DispatchConfig,
    pub transport: TransportConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DUEBELL_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DUEBELL_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
            dispatch: DispatchConfig::from_env_profiled(p),
            transport: TransportConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check cross-field requirements that env parsing alone cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.transport.kind.as_str() {
            "log" => {}
            "webhook" => {
                if self.transport.webhook_url.is_none() {
                    return Err(CoreError::Config(
                        "DUEBELL_TRANSPORT=webhook requires DUEBELL_WEBHOOK_URL".to_string(),
                    ));
                }
            }
            other => {
                return Err(CoreError::InvalidValue {
                    key: "DUEBELL_TRANSPORT".to_string(),
                    value: other.to_string(),
                })
            }
        }
        if !(0..=MAX_DUE_WINDOW_SECS).contains(&self.dispatch.due_window_secs) {
            return Err(CoreError::InvalidValue {
                key: "DUEBELL_DUE_WINDOW_SECS".to_string(),
                value: self.dispatch.due_window_secs.to_string(),
            });
        }
        if self.dispatch.tick_interval_secs == 0 {
            return Err(CoreError::InvalidValue {
                key: "DUEBELL_TICK_INTERVAL_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.dispatch.channel.trim().is_empty() {
            return Err(CoreError::Config("broadcast channel must not be empty".to_string()));
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!("  store:      tasks_file={}", self.store.tasks_file.display());
        tracing::info!(
            "  dispatch:   window={}s, tick={}s, send_timeout={}, channel={}",
            self.dispatch.due_window_secs,
            self.dispatch.tick_interval_secs,
            self.dispatch
                .send_timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "(none)".to_string()),
            self.dispatch.channel
        );
        tracing::info!(
            "  transport:  kind={}, webhook={}",
            self.transport.kind,
            if self.transport.webhook_url.is_some() { "(set)" } else { "(none)" }
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "store": { "tasks_file": self.store.tasks_file },
            "dispatch": {
                "due_window_secs": self.dispatch.due_window_secs,
                "tick_interval_secs": self.dispatch.tick_interval_secs,
                "send_timeout_secs": self.dispatch.send_timeout_secs,
                "channel": self.dispatch.channel,
            },
            "transport": {
                "kind": self.transport.kind,
                "webhook_configured": self.transport.webhook_url.is_some(),
                "webhook_header_names": self.transport.webhook_headers.keys().collect::<Vec<_>>(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Task store ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub tasks_file: PathBuf,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            tasks_file: PathBuf::from(profiled_env_or(p, "DUEBELL_TASKS_FILE", "data/tasks.json")),
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Tolerance after the reminder instant during which a task is still sent.
    pub due_window_secs: i64,
    /// Period of the background trigger.
    pub tick_interval_secs: u64,
    /// Per-send timeout. `None` waits as long as the transport does.
    pub send_timeout_secs: Option<u64>,
    /// Broadcast topic reminders are addressed to.
    pub channel: String,
    pub title_template: String,
    pub body_template: String,
}

impl DispatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            due_window_secs: profiled_env_i64(p, "DUEBELL_DUE_WINDOW_SECS", DEFAULT_DUE_WINDOW_SECS),
            tick_interval_secs: profiled_env_u64(p, "DUEBELL_TICK_INTERVAL_SECS", 60),
            send_timeout_secs: profiled_env_opt(p, "DUEBELL_SEND_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&s: &u64| s > 0),
            channel: profiled_env_or(p, "DUEBELL_CHANNEL", DEFAULT_CHANNEL),
            title_template: profiled_env_or(p, "DUEBELL_TITLE_TEMPLATE", DEFAULT_TITLE_TEMPLATE),
            body_template: profiled_env_or(p, "DUEBELL_BODY_TEMPLATE", DEFAULT_BODY_TEMPLATE),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            due_window_secs: DEFAULT_DUE_WINDOW_SECS,
            tick_interval_secs: 60,
            send_timeout_secs: None,
            channel: DEFAULT_CHANNEL.to_string(),
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }
}

// ── Transport ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// "log" or "webhook".
    pub kind: String,
    pub webhook_url: Option<String>,
    /// Extra request headers; values may reference `${VAR}`.
    pub webhook_headers: BTreeMap<String, String>,
}

impl TransportConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            kind: profiled_env_or(p, "DUEBELL_TRANSPORT", "log").to_lowercase(),
            webhook_url: profiled_env_opt(p, "DUEBELL_WEBHOOK_URL"),
            webhook_headers: profiled_env_opt(p, "DUEBELL_WEBHOOK_HEADERS")
                .map(|raw| parse_header_list(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Parse `Key=Value;Key2=Value2`. Entries without `=` are dropped.
pub fn parse_header_list(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            profile: String::new(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
                cors_origin: "*".to_string(),
            },
            store: StoreConfig {
                tasks_file: PathBuf::from("data/tasks.json"),
            },
            dispatch: DispatchConfig::default(),
            transport: TransportConfig {
                kind: "log".to_string(),
                webhook_url: None,
                webhook_headers: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn header_list_parsing() {
        let headers = parse_header_list("Authorization=Bearer ${TOKEN}; X-Env = prod;junk;=x");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Authorization"], "Bearer ${TOKEN}");
        assert_eq!(headers["X-Env"], "prod");
    }

    #[test]
    fn log_transport_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn webhook_without_url_is_rejected() {
        let mut cfg = base();
        cfg.transport.kind = "webhook".to_string();
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));

        cfg.transport.webhook_url = Some("https://push.example.com/send".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let mut cfg = base();
        cfg.transport.kind = "carrier-pigeon".to_string();
        match cfg.validate() {
            Err(CoreError::InvalidValue { key, value }) => {
                assert_eq!(key, "DUEBELL_TRANSPORT");
                assert_eq!(value, "carrier-pigeon");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn zero_tick_is_rejected() {
        let mut cfg = base();
        cfg.dispatch.tick_interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_window_is_rejected() {
        for secs in [-1, MAX_DUE_WINDOW_SECS + 1, 10_000_000_000_000_000] {
            let mut cfg = base();
            cfg.dispatch.due_window_secs = secs;
            match cfg.validate() {
                Err(CoreError::InvalidValue { key, value }) => {
                    assert_eq!(key, "DUEBELL_DUE_WINDOW_SECS");
                    assert_eq!(value, secs.to_string());
                }
                other => panic!("expected InvalidValue for {secs}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_window_from_env_fails_validation() {
        std::env::set_var("DUEBELLWIN_DUEBELL_DUE_WINDOW_SECS", "10000000000000000");
        let cfg = Config::for_profile("duebellwin");
        std::env::remove_var("DUEBELLWIN_DUEBELL_DUE_WINDOW_SECS");
        assert_eq!(cfg.dispatch.due_window_secs, 10_000_000_000_000_000);
        let mut cfg = cfg;
        cfg.transport.kind = "log".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidValue { ref key, .. }) if key == "DUEBELL_DUE_WINDOW_SECS"
        ));
    }

    #[test]
    fn redacted_summary_hides_webhook_url() {
        let mut cfg = base();
        cfg.transport.kind = "webhook".to_string();
        cfg.transport.webhook_url = Some("https://secret.example.com/hook?key=abc".to_string());
        let summary = cfg.redacted_summary().to_string();
        assert!(!summary.contains("secret.example.com"));
        assert!(summary.contains("\"webhook_configured\":true"));
        assert_eq!(cfg.profile_label(), "default");
    }
}
