use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio::time;

use crate::errors::SourceError;

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_available(&self) -> bool;
}

/// Treats the network as available when the data store accepts a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new<S: Into<String>>(host: S, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probes the host and default port of `url`.
    pub fn for_url(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let url = Url::parse(url).map_err(|e| SourceError::Malformed(format!("{url}: {e}")))?;

        let host = url
            .host_str()
            .ok_or_else(|| SourceError::Malformed(format!("{url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SourceError::Malformed(format!("{url} has no known port")))?;

        Ok(Self::new(host, port, timeout))
    }

    pub fn target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn is_available(&self) -> bool {
        match time::timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("probe {}:{} failed: {}", self.host, self.port, e);
                false
            }
            Err(_) => {
                tracing::debug!("probe {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}
