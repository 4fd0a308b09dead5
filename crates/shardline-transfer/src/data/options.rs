use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Minimum byte delta between non-final progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 256 * 1024;

/// Scratch buffer size used when feeding an upload body to the HTTP engine.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Proxy protocol applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyVersion {
    Http,
    Socks4,
    Socks4a,
    Socks5,
    Socks5h,
}

impl ProxyVersion {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyVersion::Http => "http",
            ProxyVersion::Socks4 => "socks4",
            ProxyVersion::Socks4a => "socks4a",
            ProxyVersion::Socks5 => "socks5",
            ProxyVersion::Socks5h => "socks5h",
        }
    }
}

impl fmt::Display for ProxyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.scheme()) }
}

impl FromStr for ProxyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyVersion::Http),
            "socks4" => Ok(ProxyVersion::Socks4),
            "socks4a" => Ok(ProxyVersion::Socks4a),
            "socks5" => Ok(ProxyVersion::Socks5),
            "socks5h" => Ok(ProxyVersion::Socks5h),
            other => Err(Error::Config(format!("unsupported proxy protocol: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    pub version: ProxyVersion,
    pub host:    String,
    pub port:    u16,
}

impl ProxyConfig {
    pub fn new(version: ProxyVersion, host: impl Into<String>, port: u16) -> Self {
        Self {
            version,
            host: host.into(),
            port,
        }
    }

    pub fn url(&self) -> String { format!("{}://{}:{}", self.version, self.host, self.port) }
}

/// Parses `scheme://host:port`.
impl FromStr for ProxyConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("invalid proxy address: {s}"));

        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let (host, port) = rest.trim_end_matches('/').rsplit_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse().map_err(|_| invalid())?;

        Ok(Self::new(scheme.parse()?, host, port))
    }
}

/// Settings shared by every shard request.
///
/// # Examples
///
/// ```
/// use shardline_transfer::{HttpOptions, ProxyConfig, ProxyVersion};
/// use std::time::Duration;
///
/// let options = HttpOptions::default()
///     .user_agent("shardline/0.1")
///     .proxy(ProxyConfig::new(ProxyVersion::Socks5, "127.0.0.1", 9050))
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpOptions {
    pub user_agent: Option<String>,

    pub proxy: Option<ProxyConfig>,

    #[serde(rename = "connect_timeout_secs", deserialize_with = "secs::deserialize")]
    pub connect_timeout: Option<Duration>,

    #[serde(rename = "request_timeout_secs", deserialize_with = "secs::deserialize")]
    pub request_timeout: Option<Duration>,

    /// Default: 256 KiB
    pub progress_interval: u64,

    /// Default: 16 KiB
    pub chunk_size: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent:        None,
            proxy:             None,
            connect_timeout:   None,
            request_timeout:   None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            chunk_size:        DEFAULT_CHUNK_SIZE,
        }
    }
}

impl HttpOptions {
    /// Parse options from a TOML document; missing keys keep their defaults.
    ///
    /// ```
    /// use shardline_transfer::HttpOptions;
    ///
    /// let options = HttpOptions::from_toml_str(r#"
    ///     user_agent = "shardline"
    ///     progress_interval = 1024
    ///
    ///     [proxy]
    ///     version = "socks5"
    ///     host = "localhost"
    ///     port = 9050
    /// "#).unwrap();
    /// assert_eq!(options.progress_interval, 1024);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> { Ok(toml::from_str(s)?) }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, bytes: u64) -> Self {
        self.progress_interval = bytes;
        self
    }

    /// Zero is clamped to one byte.
    #[must_use]
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
