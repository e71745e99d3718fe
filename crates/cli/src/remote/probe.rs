// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity probe: the remote counts as reachable when a TCP connection
//! to its host and port completes within the timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use outbox_sync::ConnectivitySource;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::http::Uri;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Builds a probe for the host and port of a `ws://` or `wss://` url.
    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidRemoteUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = url.parse().map_err(|_| invalid("not a url"))?;
        let default_port = match uri.scheme_str() {
            Some("ws") => 80,
            Some("wss") => 443,
            Some(_) => return Err(invalid("scheme must be ws or wss")),
            None => return Err(invalid("missing scheme")),
        };
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?;

        Ok(TcpProbe {
            // IPv6 literals come back bracketed
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port: uri.port_u16().unwrap_or(default_port),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Attempts one connection.
    pub async fn reachable(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(host = %self.host, port = self.port, error = %e, "probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(host = %self.host, port = self.port, "probe timed out");
                false
            }
        }
    }
}

impl ConnectivitySource for TcpProbe {
    fn probe(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(self.reachable())
    }
}
