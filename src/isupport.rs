//! RPL_ISUPPORT (005) interpretation.
//!
//! A server advertises its limits and mode semantics across one or more 005
//! lines. [`ServerCapabilities`] accumulates them: each call overwrites the
//! keys it mentions and leaves the rest, then re-derives the set of mode
//! letters that consume a MODE parameter.

mod tokens;

pub use self::tokens::{ChanModeClasses, MaxList, PrefixTable};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::casemap::Casemapping;
use crate::mode::ParamModes;

/// Value reported for a limit the server has not advertised.
pub const UNKNOWN_LIMIT: i32 = -1;

/// Numeric limits a server may advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Limit {
    /// `NICKLEN` / `MAXNICKLEN`.
    NickLength,
    /// `TOPICLEN`.
    TopicLength,
    /// `KICKLEN`.
    KickLength,
    /// `AWAYLEN`.
    AwayLength,
    /// `CHANNELLEN`.
    ChannelLength,
    /// `MAXCHANNELS`, or the largest `CHANLIMIT` count.
    MaxChannels,
    /// `MODES`: parameterized mode changes per MODE line.
    Modes,
    /// `MAXBANS`, or `b` in `MAXLIST`.
    Bans,
    /// `e` in `MAXLIST`.
    Exceptions,
    /// `I` in `MAXLIST`.
    Invites,
    /// `SILENCE`.
    Silence,
}

impl Limit {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "NICKLEN" | "MAXNICKLEN" => Limit::NickLength,
            "TOPICLEN" => Limit::TopicLength,
            "KICKLEN" => Limit::KickLength,
            "AWAYLEN" => Limit::AwayLength,
            "CHANNELLEN" => Limit::ChannelLength,
            "MAXCHANNELS" => Limit::MaxChannels,
            "MODES" => Limit::Modes,
            "MAXBANS" => Limit::Bans,
            "SILENCE" => Limit::Silence,
            _ => return None,
        })
    }
}

/// Legacy server information from RPL_MYINFO (004).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerInfo {
    /// Server name.
    pub server: String,
    /// Daemon family and version string.
    pub daemon: String,
    /// Supported user modes.
    pub user_modes: String,
    /// Supported channel modes.
    pub channel_modes: String,
}

impl ServerInfo {
    /// Build from the 004 parameters after the target nick.
    pub fn from_args(args: &[&str]) -> Option<Self> {
        match args {
            [server, daemon, user_modes, channel_modes, ..] => Some(ServerInfo {
                server: server.to_string(),
                daemon: daemon.to_string(),
                user_modes: user_modes.to_string(),
                channel_modes: channel_modes.to_string(),
            }),
            _ => None,
        }
    }
}

/// Everything learned from ISUPPORT for one connection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerCapabilities {
    limits: BTreeMap<Limit, u32>,
    chantypes: String,
    prefix: Option<PrefixTable>,
    chanmodes: Option<ChanModeClasses>,
    commands: Vec<String>,
    network: Option<String>,
    casemapping: Casemapping,
    entries: BTreeMap<String, Option<String>>,
    param_modes: ParamModes,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        ServerCapabilities {
            limits: BTreeMap::new(),
            chantypes: "#&".to_string(),
            prefix: None,
            chanmodes: None,
            commands: Vec::new(),
            network: None,
            casemapping: Casemapping::default(),
            entries: BTreeMap::new(),
            param_modes: ParamModes::legacy(),
        }
    }
}

impl ServerCapabilities {
    /// Empty table with legacy defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the parameters of one 005 line, including the leading target
    /// nick and the trailing "are supported by this server" text.
    pub fn apply_reply(&mut self, args: &[&str]) {
        let Some((_, mut tokens)) = args.split_first() else {
            return;
        };
        if let Some(last) = tokens.last() {
            if last.contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        self.apply_tokens(tokens);
    }

    /// Apply bare ISUPPORT tokens (`KEY`, `KEY=VALUE`, `-KEY`).
    pub fn apply_tokens(&mut self, tokens: &[&str]) {
        for token in tokens.iter().filter(|t| !t.is_empty()) {
            if let Some(negated) = token.strip_prefix('-') {
                self.negate(&negated.to_ascii_uppercase());
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k.to_ascii_uppercase(), Some(v)),
                None => (token.to_ascii_uppercase(), None),
            };
            if let Some(value) = value {
                self.apply_value(&key, value);
            }
            self.entries.insert(key, value.map(str::to_string));
        }
        self.recompute_param_modes();
    }

    fn apply_value(&mut self, key: &str, value: &str) {
        if let Some(limit) = Limit::from_key(key) {
            self.set_limit(limit, key, value);
            return;
        }
        match key {
            "CHANTYPES" => self.chantypes = value.to_string(),
            "CHANMODES" => self.chanmodes = Some(ChanModeClasses::parse(value)),
            "PREFIX" => match PrefixTable::parse(value) {
                Some(table) => self.prefix = Some(table),
                None => warn!(value, "unparseable PREFIX"),
            },
            "MAXLIST" => match MaxList::parse(value) {
                Some(list) => self.apply_maxlist(&list),
                None => warn!(value, "unparseable MAXLIST"),
            },
            "CHANLIMIT" => {
                let max = value
                    .split(',')
                    .filter_map(|part| part.split_once(':'))
                    .filter_map(|(_, n)| n.parse::<u32>().ok())
                    .max();
                if let Some(max) = max {
                    self.limits.insert(Limit::MaxChannels, max);
                }
            }
            "CMDS" => {
                for cmd in value.split(',').filter(|c| !c.is_empty()) {
                    let cmd = cmd.to_ascii_uppercase();
                    if !self.commands.contains(&cmd) {
                        self.commands.push(cmd);
                    }
                }
            }
            "NETWORK" => self.network = Some(value.to_string()),
            "CASEMAPPING" => match Casemapping::from_token(value) {
                Some(map) => self.casemapping = map,
                None => debug!(value, "unknown CASEMAPPING, keeping current"),
            },
            _ => {}
        }
    }

    fn set_limit(&mut self, limit: Limit, key: &str, value: &str) {
        match value.parse::<u32>() {
            Ok(n) => {
                self.limits.insert(limit, n);
            }
            Err(_) => warn!(key, value, "non-numeric ISUPPORT limit, keeping previous"),
        }
    }

    fn apply_maxlist(&mut self, list: &MaxList) {
        for (letter, n) in list.iter() {
            let limit = match letter {
                'b' => Limit::Bans,
                'e' => Limit::Exceptions,
                'I' => Limit::Invites,
                _ => continue,
            };
            self.limits.insert(limit, n);
        }
    }

    fn negate(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(limit) = Limit::from_key(key) {
            self.limits.remove(&limit);
            return;
        }
        match key {
            "CHANTYPES" => self.chantypes = ServerCapabilities::default().chantypes,
            "CHANMODES" => self.chanmodes = None,
            "PREFIX" => self.prefix = None,
            "NETWORK" => self.network = None,
            "CASEMAPPING" => self.casemapping = Casemapping::default(),
            "CMDS" => self.commands.clear(),
            _ => {}
        }
    }

    fn recompute_param_modes(&mut self) {
        let mut letters = String::new();
        if let Some(prefix) = &self.prefix {
            letters.push_str(prefix.letters());
        }
        if let Some(classes) = &self.chanmodes {
            letters.push_str(&classes.list);
            letters.push_str(&classes.always);
            letters.push_str(&classes.set_only);
        }
        self.param_modes = if letters.is_empty() {
            ParamModes::legacy()
        } else {
            letters.chars().collect()
        };
    }

    /// A numeric limit, or [`UNKNOWN_LIMIT`] if never advertised.
    pub fn limit(&self, limit: Limit) -> i32 {
        self.limits
            .get(&limit)
            .map(|n| i32::try_from(*n).unwrap_or(i32::MAX))
            .unwrap_or(UNKNOWN_LIMIT)
    }

    /// List-size limit for a list mode letter.
    pub fn list_limit(&self, letter: char) -> i32 {
        match letter {
            'b' => self.limit(Limit::Bans),
            'e' => self.limit(Limit::Exceptions),
            'I' => self.limit(Limit::Invites),
            _ => UNKNOWN_LIMIT,
        }
    }

    /// Channel-type prefix characters (default `#&`).
    pub fn chantypes(&self) -> &str {
        &self.chantypes
    }

    /// Whether `target` names a channel.
    pub fn is_channel(&self, target: &str) -> bool {
        target
            .chars()
            .next()
            .map_or(false, |c| self.chantypes.contains(c))
    }

    /// Status prefix table. Before PREFIX arrives this is `(ov)@+`.
    pub fn prefix(&self) -> PrefixTable {
        self.prefix
            .clone()
            .or_else(|| PrefixTable::parse("(ov)@+"))
            .unwrap_or_default()
    }

    /// Channel mode classes, if CHANMODES was advertised.
    pub fn chanmodes(&self) -> Option<&ChanModeClasses> {
        self.chanmodes.as_ref()
    }

    /// Whether `letter` is a list mode. Falls back to `b`, `e`, `I`.
    pub fn is_list_mode(&self, letter: char) -> bool {
        match &self.chanmodes {
            Some(classes) => classes.is_list(letter),
            None => matches!(letter, 'b' | 'e' | 'I'),
        }
    }

    /// Mode letters that consume a MODE parameter.
    pub fn param_modes(&self) -> &ParamModes {
        &self.param_modes
    }

    /// Commands advertised through `CMDS`.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Advertised network name.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Advertised case-mapping.
    pub fn casemapping(&self) -> Casemapping {
        self.casemapping
    }

    /// Raw token lookup: `None` if absent, `Some(None)` for a bare flag.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_deref())
    }

    /// Bare flags advertised without a value (e.g. `EXCEPTS`, `WHOX`).
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
    }
}
