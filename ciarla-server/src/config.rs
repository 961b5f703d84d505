//! Configurazione del server, letta solo da variabili d'ambiente.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// `HOST`, default 0.0.0.0
    pub host: IpAddr,
    /// `PORT`, default 3000. 0 = porta scelta dal sistema.
    pub port: u16,
    /// `PUBLIC_DIR`: file statici serviti su tutte le altre rotte.
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Come `from_env` ma con una sorgente qualsiasi. Valori vuoti valgono come non impostati.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("PORT") {
            config.port = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value: value.clone(), source })?;
        }
        if let Some(value) = get("HOST") {
            config.host = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidHost { value: value.clone(), source })?;
        }
        if let Some(value) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(value);
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn port_from_env() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn empty_port_falls_back_to_default() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[("PORT", "  ")])).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == "http"));

        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "70000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn host_and_public_dir() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "0"),
            ("PUBLIC_DIR", "/srv/chat"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr().to_string(), "127.0.0.1:0");
        assert_eq!(cfg.public_dir, PathBuf::from("/srv/chat"));
    }

    #[test]
    fn invalid_host_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("HOST", "localhost")])).unwrap_err();
        assert!(err.to_string().contains("invalid HOST"));
    }
}
