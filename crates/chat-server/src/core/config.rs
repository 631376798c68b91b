//! Chat server configuration

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use realtime::{BrokerConfig, Publisher};
use tracing::warn;

use crate::chat::ChatService;
use crate::connections::ConnectionManager;
use crate::presence::PresenceService;
use crate::store::ChatStore;

const DEV_SECRET: &str = "development-secret";

/// Configuration for the chat server, read from the environment.
#[derive(Clone, Debug)]
pub struct ChatServerConfig {
    /// SQLite database URL
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Real-time broker endpoint and API key
    pub broker: BrokerConfig,
    /// Secret used to sign broker connection tokens
    pub hmac_secret: String,
    /// Lifetime of broker connection tokens
    pub token_ttl: chrono::Duration,
    /// Secret used to verify bearer tokens on incoming requests
    pub auth_secret: String,
}

impl Default for ChatServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://chat.sqlite".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            broker: BrokerConfig::default(),
            hmac_secret: DEV_SECRET.to_string(),
            token_ttl: chrono::Duration::hours(1),
            auth_secret: DEV_SECRET.to_string(),
        }
    }
}

impl ChatServerConfig {
    /// Build the config from `DATABASE_URL`, `BIND_ADDR`, `CENTRIFUGO_URL`,
    /// `CENTRIFUGO_API_KEY`, `CENTRIFUGO_HMAC_SECRET_KEY`,
    /// `CONNECTION_TOKEN_TTL` and `AUTH_SECRET`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid BIND_ADDR: {}", addr))?;
        }
        if let Some(url) = lookup("CENTRIFUGO_URL") {
            config.broker.url = url;
        }
        if let Some(key) = lookup("CENTRIFUGO_API_KEY") {
            config.broker.api_key = key;
        }
        if let Some(ttl) = lookup("CONNECTION_TOKEN_TTL") {
            config.token_ttl = realtime::parse_ttl(&ttl)
                .with_context(|| format!("Invalid CONNECTION_TOKEN_TTL: {}", ttl))?;
        }

        match lookup("CENTRIFUGO_HMAC_SECRET_KEY") {
            Some(secret) if !secret.is_empty() => config.hmac_secret = secret,
            _ => warn!("CENTRIFUGO_HMAC_SECRET_KEY not set, using development secret"),
        }
        config.auth_secret = match lookup("AUTH_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => config.hmac_secret.clone(),
        };

        Ok(config)
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ChatServerConfig,
    pub chat: Arc<ChatService>,
    pub connections: Arc<ConnectionManager>,
    pub presence: Arc<PresenceService>,
}

impl AppState {
    pub fn new(config: ChatServerConfig, store: ChatStore, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            config,
            chat: Arc::new(ChatService::new(store.clone(), publisher.clone())),
            connections: Arc::new(ConnectionManager::new(store.clone())),
            presence: Arc::new(PresenceService::new(store, publisher)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ChatServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://chat.sqlite");
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.broker.url, "http://localhost:8000");
        assert_eq!(config.token_ttl, chrono::Duration::hours(1));
        assert_eq!(config.auth_secret, config.hmac_secret);
    }

    #[test]
    fn test_overrides() {
        let config = ChatServerConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("CENTRIFUGO_URL", "http://broker:8000"),
            ("CENTRIFUGO_API_KEY", "key"),
            ("CENTRIFUGO_HMAC_SECRET_KEY", "hmac"),
            ("CONNECTION_TOKEN_TTL", "30m"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.broker.api_key, "key");
        assert_eq!(config.hmac_secret, "hmac");
        assert_eq!(config.auth_secret, "hmac");
        assert_eq!(config.token_ttl, chrono::Duration::minutes(30));
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(ChatServerConfig::from_lookup(lookup(&[("BIND_ADDR", "nope")])).is_err());
        assert!(
            ChatServerConfig::from_lookup(lookup(&[("CONNECTION_TOKEN_TTL", "soon")])).is_err()
        );
    }
}
