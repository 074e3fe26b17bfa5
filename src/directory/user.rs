use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A nick the bot has seen on the network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    /// Nick in display casing.
    pub nick: String,
    /// Ident (username), once known.
    pub ident: Option<String>,
    /// Host, once known.
    pub host: Option<String>,
    /// Real name from WHO/WHOIS.
    pub realname: Option<String>,
    /// User-mode letters, without sign.
    pub modes: String,
    /// Cached permission level.
    pub permission: i32,
    /// Whether `permission` came from the store.
    pub permission_fetched: bool,
    /// Seconds idle, from WHOIS.
    pub idle_secs: Option<u64>,
    /// Signon time, from WHOIS.
    pub signon: Option<DateTime<Utc>>,
    /// Away flag.
    pub away: bool,
    /// Away message.
    pub away_reason: Option<String>,
    /// IRC operator.
    pub oper: bool,
    /// Nick is registered with services.
    pub registered: bool,
    /// Connected over TLS.
    pub secure: bool,
    /// Messages from this user raise no events.
    pub ignored: bool,
    /// Server the user is connected to.
    pub server: Option<String>,
    /// Services account name.
    pub account: Option<String>,
    /// Raw channel list from WHOIS (319).
    pub whois_channels: Option<String>,
    /// Channel key → status symbols (`@`, `+`, ...).
    pub(crate) channels: BTreeMap<String, String>,
}

impl User {
    /// A user known only by nick.
    pub fn new(nick: &str) -> Self {
        User {
            nick: nick.to_string(),
            ..Default::default()
        }
    }

    /// `ident@host`, if both are known.
    pub fn hostmask(&self) -> Option<String> {
        match (&self.ident, &self.host) {
            (Some(ident), Some(host)) => Some(format!("{}@{}", ident, host)),
            _ => None,
        }
    }

    /// `nick!ident@host` with `*` for unknown parts.
    pub fn full_mask(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick,
            self.ident.as_deref().unwrap_or("*"),
            self.host.as_deref().unwrap_or("*")
        )
    }

    /// Whether enough is known to ask the permission store.
    pub fn can_get_permission(&self) -> bool {
        self.ident.is_some() && self.host.is_some()
    }

    /// Whether a permission value has been fetched.
    pub fn has_permission(&self) -> bool {
        self.permission_fetched
    }

    /// Forget the cached permission.
    pub fn reset_permission(&mut self) {
        self.permission = 0;
        self.permission_fetched = false;
    }

    /// Channel keys this user is in.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Number of channels this user is in.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Status symbols in a channel (`key` must be casemapped).
    pub fn status(&self, channel_key: &str) -> Option<&str> {
        self.channels.get(channel_key).map(String::as_str)
    }

    /// Whether the user holds `symbol` in a channel.
    pub fn has_status(&self, channel_key: &str, symbol: char) -> bool {
        self.status(channel_key).map_or(false, |s| s.contains(symbol))
    }

    pub(crate) fn add_status(&mut self, channel_key: &str, symbol: char) {
        if let Some(status) = self.channels.get_mut(channel_key) {
            if !status.contains(symbol) {
                status.push(symbol);
            }
        }
    }

    pub(crate) fn remove_status(&mut self, channel_key: &str, symbol: char) {
        if let Some(status) = self.channels.get_mut(channel_key) {
            status.retain(|c| c != symbol);
        }
    }
}
