//! Configuration validation
//!
//! Checks the settings the adapter cannot start without.

use anyhow::Result;
use tokio::sync::Semaphore;

use super::types::{BackendMode, Config};

impl Config {
    /// Validate configuration for correctness
    ///
    /// Exactly one of proxy and url must be set, a url needs a token, and a
    /// listen address is required. Pool sizes must allow at least one
    /// connection without overflowing the permit count. Direct ingestion
    /// needs non-zero batching settings.
    pub fn validate(&self) -> Result<()> {
        if let BackendMode::Direct { .. } = self.backend_mode()? {
            self.validate_sender()?;
        }
        self.listen_addr()?;

        let capacity = self
            .pool
            .max_idle
            .checked_add(self.pool.max_overflow)
            .filter(|capacity| *capacity <= Semaphore::MAX_PERMITS)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Pool size too large (max_idle {} + max_overflow {})",
                    self.pool.max_idle,
                    self.pool.max_overflow
                )
            })?;

        if capacity == 0 {
            return Err(anyhow::anyhow!(
                "Pool must allow at least one connection (max_idle + max_overflow > 0)"
            ));
        }
        Ok(())
    }

    fn validate_sender(&self) -> Result<()> {
        let backend = &self.backend;
        if backend.batch_size == 0 || backend.buffer_size == 0 {
            return Err(anyhow::anyhow!(
                "batch_size and buffer_size must be greater than 0"
            ));
        }
        if backend.flush_interval_secs == 0 {
            return Err(anyhow::anyhow!("flush_interval_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Resolve the delivery mode from the backend settings
    pub fn backend_mode(&self) -> Result<BackendMode> {
        let backend = &self.backend;
        let proxy = backend.proxy.as_deref().filter(|s| !s.is_empty());
        let url = backend.url.as_deref().filter(|s| !s.is_empty());

        match (proxy, url) {
            (None, None) => Err(anyhow::anyhow!(
                "Proxy address or ingestion URL must be specified"
            )),
            (Some(_), Some(_)) => Err(anyhow::anyhow!(
                "Proxy address and ingestion URL are mutually exclusive"
            )),
            (Some(host), None) => Ok(BackendMode::Proxy {
                address: format!("{}:{}", host, backend.proxy_port),
            }),
            (None, Some(url)) => {
                let token = backend
                    .token
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!("API token must be specified for direct ingestion")
                    })?;
                Ok(BackendMode::Direct {
                    url: url.to_string(),
                    token: token.to_string(),
                })
            }
        }
    }

    /// Listen address with a bare port expanded to all interfaces
    pub fn listen_addr(&self) -> Result<String> {
        let listen = self
            .listen
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Listen address must be specified"))?;

        if listen.contains(':') {
            Ok(listen.to_string())
        } else {
            Ok(format!("0.0.0.0:{}", listen))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_config() -> Config {
        let mut config = Config {
            listen: Some("1234".to_string()),
            ..Config::default()
        };
        config.backend.proxy = Some("wavefront-proxy".to_string());
        config
    }

    #[test]
    fn test_proxy_mode() {
        let config = proxy_config();
        config.validate().unwrap();
        assert_eq!(
            config.backend_mode().unwrap(),
            BackendMode::Proxy {
                address: "wavefront-proxy:2878".to_string()
            }
        );
    }

    #[test]
    fn test_requires_a_backend() {
        let mut config = proxy_config();
        config.backend.proxy = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be specified"));
    }

    #[test]
    fn test_proxy_and_url_are_exclusive() {
        let mut config = proxy_config();
        config.backend.url = Some("https://example.wavefront.com".to_string());
        config.backend.token = Some("token".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_url_requires_token() {
        let mut config = proxy_config();
        config.backend.proxy = None;
        config.backend.url = Some("https://example.wavefront.com".to_string());
        assert!(config.validate().is_err());

        config.backend.token = Some("secret".to_string());
        assert_eq!(
            config.backend_mode().unwrap(),
            BackendMode::Direct {
                url: "https://example.wavefront.com".to_string(),
                token: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_sender_batching_must_be_positive() {
        let mut config = proxy_config();
        config.backend.proxy = None;
        config.backend.url = Some("https://example.wavefront.com".to_string());
        config.backend.token = Some("secret".to_string());
        config.validate().unwrap();

        config.backend.batch_size = 0;
        assert!(config.validate().is_err());

        config.backend.batch_size = 100;
        config.backend.flush_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("flush_interval_secs"));
    }

    #[test]
    fn test_listen_addr() {
        let mut config = proxy_config();
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:1234");

        config.listen = Some("127.0.0.1:9201".to_string());
        assert_eq!(config.listen_addr().unwrap(), "127.0.0.1:9201");

        config.listen = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_pool_rejected() {
        let mut config = proxy_config();
        config.pool.max_idle = usize::MAX;
        config.pool.max_overflow = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("too large"));

        config.pool.max_idle = Semaphore::MAX_PERMITS;
        config.pool.max_overflow = 1;
        assert!(config.validate().is_err());

        config.pool.max_idle = Semaphore::MAX_PERMITS;
        config.pool.max_overflow = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = proxy_config();
        config.pool.max_idle = 0;
        config.pool.max_overflow = 0;
        assert!(config.validate().is_err());
    }
}
