//! Endpoint configuration for the client core.
//! The API base is a plain http(s) URL; the realtime URL is derived from it
//! by scheme swap plus the websocket path, with the bearer token carried as a
//! query parameter (the reference deployment proxies `/ws`).

use reqwest::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const DEFAULT_WS_PATH: &str = "/ws";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: Url,
    pub ws_path: String,
}

impl ClientConfig {
    pub fn new(base: &str) -> ClientResult<Self> {
        let api_base = Url::parse(base)
            .map_err(|e| ClientError::internal(format!("invalid API base URL '{}': {}", base, e)))?;
        Ok(Self { api_base, ws_path: DEFAULT_WS_PATH.to_string() })
    }

    /// Reads `UNILINK_API_BASE` / `UNILINK_WS_PATH`, falling back to the dev
    /// defaults when unset or unparseable.
    pub fn from_env() -> Self {
        let base = std::env::var("UNILINK_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let ws_path = std::env::var("UNILINK_WS_PATH").unwrap_or_else(|_| DEFAULT_WS_PATH.to_string());
        let api_base = Url::parse(&base).unwrap_or_else(|_| Url::parse(DEFAULT_API_BASE).unwrap());
        Self { api_base, ws_path }
    }

    pub fn with_ws_path<S: Into<String>>(mut self, path: S) -> Self {
        self.ws_path = path.into();
        self
    }

    /// Convert http(s)://host[:port] -> ws(s)://host[:port]/<ws_path>?token=...
    pub fn ws_url(&self, token: &str) -> ClientResult<Url> {
        let mut ws = self.api_base.clone();
        let scheme = ws.scheme().to_string();
        if scheme == "https" { ws.set_scheme("wss").ok(); } else { ws.set_scheme("ws").ok(); }
        let mut ws = ws
            .join(&self.ws_path)
            .map_err(|e| ClientError::internal(format!("invalid ws path '{}': {}", self.ws_path, e)))?;
        ws.set_query(Some(&format!("token={}", urlencoding::encode(token))));
        Ok(ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_scheme_and_carries_token() {
        let cfg = ClientConfig::new("http://localhost:8080").unwrap();
        let url = cfg.ws_url("abc").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/ws?token=abc");

        let cfg = ClientConfig::new("https://unilink.example").unwrap();
        let url = cfg.ws_url("abc").unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn ws_token_is_url_encoded() {
        let cfg = ClientConfig::new("http://localhost:8080").unwrap();
        let url = cfg.ws_url("a b+c/d").unwrap();
        assert_eq!(url.query(), Some("token=a%20b%2Bc%2Fd"));
    }

    #[test]
    fn bad_base_is_rejected() {
        assert!(ClientConfig::new("not a url").is_err());
    }
}
