//! Immutable relay configuration and textual address parsing.
//!
//! The configuration is built once at startup and shared read-only with
//! every relay session; nothing mutates it afterwards.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use thiserror::Error;

/// Errors produced while turning a textual address into a socket address.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The address lacks the `host:port` separator.
    #[error("address {input:?} is missing a ':port' suffix")]
    MissingPort {
        /// The address text as given.
        input: String,
    },
    /// The host part is not an IPv4 literal.
    #[error("host {host:?} is not an IPv4 literal")]
    InvalidHost {
        /// The host part as given.
        host: String,
    },
    /// The port part is not a valid TCP port number.
    #[error("port {port:?} is not a valid port number")]
    InvalidPort {
        /// The port part as given.
        port: String,
    },
}

/// Process-wide relay configuration, immutable after startup.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Address the listener binds.
    pub listen: SocketAddr,
    /// Destination every accepted connection is relayed to.
    pub destination: SocketAddr,
    /// Hex-dump forwarded chunks to the diagnostic log.
    pub verbose: bool,
}

/// Parse an `a.b.c.d:port` address with an IPv4 literal host.
///
/// DNS names and IPv6 literals are rejected; the relay deliberately speaks
/// IPv4 only and performs no resolution.
///
/// # Examples
///
/// ```
/// use framegate::config::parse_addr;
///
/// let addr = parse_addr("127.0.0.1:3260").expect("valid address");
/// assert_eq!(addr.port(), 3260);
/// ```
///
/// # Errors
///
/// Returns a [`ConfigError`] naming the part of the address that failed to
/// parse.
pub fn parse_addr(input: &str) -> Result<SocketAddr, ConfigError> {
    let (host, port) = input
        .split_once(':')
        .ok_or_else(|| ConfigError::MissingPort {
            input: input.to_owned(),
        })?;
    let host: Ipv4Addr = host.parse().map_err(|_| ConfigError::InvalidHost {
        host: host.to_owned(),
    })?;
    let port: u16 = port.parse().map_err(|_| ConfigError::InvalidPort {
        port: port.to_owned(),
    })?;
    Ok(SocketAddr::V4(SocketAddrV4::new(host, port)))
}
