//! Per-network configuration.
//!
//! [`NetworkConfig`] is the validated value set the engine runs on.
//! [`RawNetworkConfig`] is what a config file deserializes into; converting
//! it reports the first missing required field so the operator can fix that
//! network while the others start.

use std::path::Path;

use tracing::warn;

use crate::error::ConfigError;

/// Charset used when none is configured.
pub const DEFAULT_CHARSET: &str = "iso-8859-1";

/// Version string sent in USER and CTCP VERSION replies.
pub const VERSION: &str = concat!("slirc-bot ", env!("CARGO_PKG_VERSION"));

/// Which stream a connection runs over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportKind {
    /// Plain TCP.
    #[default]
    Plain,
    /// TLS over TCP.
    Tls,
}

impl TransportKind {
    /// Resolve a socket driver name. Unknown names fall back to plain TCP.
    pub fn from_driver(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "plain" | "tcp" | "standardsocket" => TransportKind::Plain,
            "tls" | "ssl" | "securesocket" => TransportKind::Tls,
            other => {
                warn!(driver = other, "unknown socket driver, using plain TCP");
                TransportKind::Plain
            }
        }
    }
}

/// Certificate checking policy for TLS connections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TlsVerification {
    /// Verify the server certificate against the system roots.
    #[default]
    Verify,
    /// Accept any certificate. Insecure: anyone on the path can read and
    /// alter the session. Only for networks with self-signed certificates.
    AcceptInvalid,
}

/// A channel to join after registration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Channel name.
    pub name: String,
    /// Channel key, if any.
    pub key: Option<String>,
}

impl ChannelConfig {
    /// Parse `"#chan"` or `"#chan key"`.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let name = parts.next()?.to_string();
        let key = parts.next().map(str::to_string);
        Some(ChannelConfig { name, key })
    }
}

/// Validated settings for one network.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkConfig {
    /// Network name the bot expects (checked against 001 and ISUPPORT).
    pub network: String,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Preferred nick.
    pub nick: String,
    /// Ident sent in USER.
    pub ident: String,
    /// Real name sent in USER.
    pub realname: String,
    /// Server password.
    pub password: Option<String>,
    /// Wire charset label.
    pub charset: String,
    /// Channels to join, in order.
    pub channels: Vec<ChannelConfig>,
    /// Plain or TLS.
    pub transport: TransportKind,
    /// TLS certificate policy.
    pub tls_verification: TlsVerification,
    /// Connect when the bot starts.
    pub startup: bool,
    /// Module names to load from the registry.
    pub modules: Vec<String>,
    /// Default QUIT message.
    pub quit_message: String,
    /// CTCP VERSION reply.
    pub version: String,
}

impl NetworkConfig {
    /// Minimal config for tests and embedding.
    pub fn new(network: &str, host: &str, port: u16, nick: &str) -> Self {
        NetworkConfig {
            network: network.to_string(),
            host: host.to_string(),
            port,
            nick: nick.to_string(),
            ident: nick.to_ascii_lowercase(),
            realname: VERSION.to_string(),
            password: None,
            charset: DEFAULT_CHARSET.to_string(),
            channels: Vec::new(),
            transport: TransportKind::Plain,
            tls_verification: TlsVerification::Verify,
            startup: true,
            modules: Vec::new(),
            quit_message: VERSION.to_string(),
            version: VERSION.to_string(),
        }
    }

    /// Add a channel to join.
    pub fn with_channel(mut self, name: &str, key: Option<&str>) -> Self {
        self.channels.push(ChannelConfig {
            name: name.to_string(),
            key: key.map(str::to_string),
        });
        self
    }
}

/// A network block as written in a config file. Everything is optional here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RawNetworkConfig {
    pub network: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub nick: Option<String>,
    pub ident: Option<String>,
    pub realname: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    /// `"#chan"` or `"#chan key"` entries.
    pub channels: Vec<String>,
    /// Socket driver name: `plain`, `tls`, `StandardSocket`, `SecureSocket`.
    pub socket: Option<String>,
    /// Accept invalid TLS certificates. Insecure.
    pub accept_invalid_certs: bool,
    pub startup: Option<bool>,
    pub modules: Vec<String>,
    pub quit_message: Option<String>,
}

impl TryFrom<RawNetworkConfig> for NetworkConfig {
    type Error = ConfigError;

    fn try_from(raw: RawNetworkConfig) -> Result<Self, Self::Error> {
        let name = raw.network.clone().unwrap_or_else(|| "<unnamed>".to_string());
        let missing = |field| ConfigError::MissingField {
            network: name.clone(),
            field,
        };

        let network = raw.network.clone().ok_or_else(|| missing("network"))?;
        let host = raw.host.ok_or_else(|| missing("host"))?;
        let nick = raw.nick.ok_or_else(|| missing("nick"))?;

        let transport = raw
            .socket
            .as_deref()
            .map(TransportKind::from_driver)
            .unwrap_or_default();
        let port = match raw.port {
            Some(0) => return Err(ConfigError::InvalidPort(network)),
            Some(port) => port,
            None if transport == TransportKind::Tls => 6697,
            None => 6667,
        };
        let tls_verification = if raw.accept_invalid_certs {
            TlsVerification::AcceptInvalid
        } else {
            TlsVerification::Verify
        };

        Ok(NetworkConfig {
            ident: raw.ident.unwrap_or_else(|| nick.to_ascii_lowercase()),
            realname: raw.realname.unwrap_or_else(|| VERSION.to_string()),
            password: raw.password.filter(|p| !p.is_empty()),
            charset: raw.charset.unwrap_or_else(|| DEFAULT_CHARSET.to_string()),
            channels: raw
                .channels
                .iter()
                .filter_map(|c| ChannelConfig::parse(c))
                .collect(),
            transport,
            tls_verification,
            startup: raw.startup.unwrap_or(true),
            modules: raw.modules,
            quit_message: raw.quit_message.unwrap_or_else(|| VERSION.to_string()),
            version: VERSION.to_string(),
            network,
            host,
            port,
            nick,
        })
    }
}

/// The whole bot config file.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BotConfig {
    /// `[[networks]]` blocks.
    pub networks: Vec<RawNetworkConfig>,
}

#[cfg(feature = "toml")]
impl BotConfig {
    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl BotConfig {
    /// Validate every network block, splitting good from bad.
    pub fn validate(self) -> (Vec<NetworkConfig>, Vec<ConfigError>) {
        let mut good = Vec::new();
        let mut bad = Vec::new();
        for raw in self.networks {
            match NetworkConfig::try_from(raw) {
                Ok(cfg) => good.push(cfg),
                Err(e) => bad.push(e),
            }
        }
        (good, bad)
    }

    /// Paths a config file is looked up at when none is given.
    pub fn default_path() -> &'static Path {
        Path::new("slirc-bot.toml")
    }
}
