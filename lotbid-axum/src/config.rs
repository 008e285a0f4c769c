//! Configuration for the HTTP server.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Configuration for the Axum HTTP server.
///
/// ```
/// use lotbid_axum::config::AxumConfig;
///
/// let config = AxumConfig {
///     bind_address: "127.0.0.1:3000".parse().unwrap(),
///     ..Default::default()
/// };
/// assert_eq!(config.allocation_depth, 3);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AxumConfig {
    /// The address to bind the server to
    pub bind_address: SocketAddr,

    /// The largest page a listing endpoint returns
    pub page_limit: usize,

    /// How many ranked offers per line an allocation reports unless the
    /// request asks for a different depth
    pub allocation_depth: usize,
}

impl Default for AxumConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            page_limit: 100,
            allocation_depth: 3,
        }
    }
}
