//! Sans-IO protocol session.
//!
//! [`Session`] consumes raw inbound lines and produces [`Action`]s: lines to
//! send, events to raise, and lifecycle requests. It performs no I/O, so the
//! whole protocol engine can be driven and tested without a socket.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use slirc_bot::config::NetworkConfig;
//! use slirc_bot::permission::NoPermissions;
//! use slirc_bot::state::{Action, Session};
//!
//! let config = NetworkConfig::new("ExampleNet", "irc.example.com", 6667, "Bot")
//!     .with_channel("#rust", None);
//! let mut session = Session::new(config, Arc::new(NoPermissions));
//!
//! // PASS/NICK/USER
//! let actions = session.start();
//! assert!(matches!(&actions[0], Action::Send(line) if line == "NICK Bot"));
//!
//! // Every line is first echoed as a raw event, then answered.
//! let actions = session.handle_line("PING :abc123");
//! assert!(actions.contains(&Action::Send("PONG :abc123".into())));
//! ```
//!
//! Malformed lines never produce errors: they are logged and skipped.

mod commands;
mod numerics;

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::command::{Command, Verb};
use crate::config::NetworkConfig;
use crate::directory::Directory;
use crate::event::{Actor, Event};
use crate::isupport::{ServerCapabilities, ServerInfo};
use crate::message::MessageRef;
use crate::permission::{self, PermissionStore};

/// Registration progress of a connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport opening.
    Connecting,
    /// PASS/NICK/USER sent, awaiting 001.
    Registering,
    /// 001 received.
    Registered,
}

/// What the driver must do after feeding a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Write this line (without terminator).
    Send(String),
    /// Deliver this event to handlers.
    Emit(Event),
    /// Send QUIT with this reason and connect again.
    Reconnect(String),
    /// Close the transport without reconnecting.
    Disconnect(String),
}

impl Action {
    fn send(cmd: Command) -> Self {
        Action::Send(cmd.to_string())
    }
}

/// The bot's nick as preferred, currently requested, and confirmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NickState {
    /// Nick from configuration.
    pub preferred: String,
    /// Nick we last asked for.
    pub wanted: String,
    /// Nick the server last confirmed, if any.
    pub actual: Option<String>,
}

/// LUSERS counters (251-266).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerStats {
    /// Operators online (252).
    pub operators: Option<u32>,
    /// Unknown connections (253).
    pub unknown: Option<u32>,
    /// Channels formed (254).
    pub channels: Option<u32>,
    /// Local users, current and max (265).
    pub local_users: Option<(u32, u32)>,
    /// Global users, current and max (266).
    pub global_users: Option<(u32, u32)>,
}

/// Protocol state for one connection.
pub struct Session {
    config: NetworkConfig,
    permissions: Arc<dyn PermissionStore>,
    state: ConnectionState,
    nicks: NickState,
    network: Option<String>,
    directory: Directory,
    caps: ServerCapabilities,
    server_info: Option<ServerInfo>,
    own_modes: String,
    away: bool,
    motd: Vec<String>,
    server_time: Option<String>,
    stats: ServerStats,
}

impl Session {
    /// New session in the disconnected state.
    pub fn new(config: NetworkConfig, permissions: Arc<dyn PermissionStore>) -> Self {
        let nick = config.nick.clone();
        Session {
            config,
            permissions,
            state: ConnectionState::Disconnected,
            nicks: NickState {
                preferred: nick.clone(),
                wanted: nick,
                actual: None,
            },
            network: None,
            directory: Directory::new(),
            caps: ServerCapabilities::new(),
            server_info: None,
            own_modes: String::new(),
            away: false,
            motd: Vec::new(),
            server_time: None,
            stats: ServerStats::default(),
        }
    }

    /// Mark the transport as opening.
    pub fn connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Reset per-connection state and produce the registration lines.
    pub fn start(&mut self) -> Vec<Action> {
        self.reset();
        self.state = ConnectionState::Registering;
        self.nicks.wanted = self.nicks.preferred.clone();

        let mut out = Vec::with_capacity(3);
        if let Some(pass) = &self.config.password {
            out.push(Action::send(Command::PASS(pass.clone())));
        }
        out.push(Action::send(Command::NICK(self.nicks.wanted.clone())));
        out.push(Action::send(Command::USER(
            self.config.ident.clone(),
            self.config.realname.clone(),
        )));
        out
    }

    /// The transport ended. Clears the model and raises the disconnect event.
    pub fn connection_lost(&mut self, reason: &str) -> Vec<Action> {
        let was = self.state;
        self.reset();
        if was == ConnectionState::Disconnected {
            return Vec::new();
        }
        info!(network = %self.config.network, reason, "disconnected");
        vec![Action::Emit(Event::Disconnect {
            reason: reason.to_string(),
        })]
    }

    fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.nicks.actual = None;
        self.network = None;
        self.directory.purge();
        self.caps = ServerCapabilities::new();
        self.server_info = None;
        self.own_modes.clear();
        self.away = false;
        self.motd.clear();
        self.server_time = None;
        self.stats = ServerStats::default();
    }

    /// Feed one raw inbound line.
    pub fn handle_line(&mut self, line: &str) -> Vec<Action> {
        let msg = match MessageRef::parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, line, "skipping unparseable line");
                return Vec::new();
            }
        };
        trace!(network = %self.config.network, line = msg.raw(), "<<");

        let mut out = vec![Action::Emit(Event::Raw {
            line: msg.raw().to_string(),
        })];
        let verb = Verb::classify(msg.command);
        match verb {
            Verb::Numeric(code) => {
                self.on_numeric(code, &msg, &mut out);
                out.push(Action::Emit(Event::Numeric {
                    code,
                    params: msg.params.iter().map(|p| p.to_string()).collect(),
                }));
            }
            Verb::Ping => self.on_ping(&msg, &mut out),
            Verb::Pong => {}
            Verb::Error => self.on_error(&msg, &mut out),
            Verb::Join => self.on_join(&msg, &mut out),
            Verb::Part => self.on_part(&msg, &mut out),
            Verb::Kick => self.on_kick(&msg, &mut out),
            Verb::Quit => self.on_quit(&msg, &mut out),
            Verb::Nick => self.on_nick(&msg, &mut out),
            Verb::Mode => self.on_mode(&msg, &mut out),
            Verb::Topic => self.on_topic(&msg),
            Verb::Invite => self.on_invite(&msg, &mut out),
            Verb::Privmsg => self.on_privmsg(&msg, &mut out),
            Verb::Notice => self.on_notice(&msg, &mut out),
            Verb::Wallops => self.on_wallops(&msg, &mut out),
            Verb::Other => debug!(command = msg.command, "unhandled command"),
        }
        if matches!(
            verb,
            Verb::Join | Verb::Mode | Verb::Invite | Verb::Privmsg | Verb::Notice
        ) {
            self.release_stray(&msg);
        }
        out
    }

    // Accessors

    /// Current registration state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Nick bookkeeping.
    pub fn nicks(&self) -> &NickState {
        &self.nicks
    }

    /// Nick we last asked for.
    pub fn wanted_nick(&self) -> &str {
        &self.nicks.wanted
    }

    /// Nick the server last confirmed.
    pub fn actual_nick(&self) -> Option<&str> {
        self.nicks.actual.as_deref()
    }

    /// Network name, once the server confirmed the configured one.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Configuration this session runs on.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Channel and user model.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Mutable model, for ignores and permission resets.
    pub fn directory_mut(&mut self) -> &mut Directory {
        &mut self.directory
    }

    /// Capabilities learned from ISUPPORT.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.caps
    }

    /// 004 information.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Our own user modes.
    pub fn own_modes(&self) -> &str {
        &self.own_modes
    }

    /// Whether the server has us marked away.
    pub fn is_away(&self) -> bool {
        self.away
    }

    /// Accumulated MOTD lines.
    pub fn motd(&self) -> &[String] {
        &self.motd
    }

    /// Last RPL_TIME text.
    pub fn server_time(&self) -> Option<&str> {
        self.server_time.as_deref()
    }

    /// LUSERS counters.
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Record a nick change we are about to request.
    pub fn request_nick(&mut self, nick: &str) -> String {
        self.nicks.wanted = nick.to_string();
        Command::NICK(nick.to_string()).to_string()
    }

    // Helpers shared by handlers

    /// Our nick for self-detection: confirmed if known, else requested.
    fn current_nick(&self) -> &str {
        self.nicks.actual.as_deref().unwrap_or(&self.nicks.wanted)
    }

    fn is_self(&self, nick: &str) -> bool {
        self.directory
            .casemapping()
            .names_eq(nick, self.current_nick())
    }

    fn is_channel(&self, target: &str) -> bool {
        self.caps.is_channel(target)
    }

    /// Resolve the actor of a line: refresh what we know about them, fetch
    /// their permission if now possible, and snapshot the result.
    fn actor(&mut self, msg: &MessageRef<'_>) -> Actor {
        let Some(src) = msg.source else {
            return Actor::default();
        };
        let ident = src.ident.unwrap_or("");
        let host = src.host.unwrap_or("");
        let permission = if src.is_server() {
            0
        } else {
            self.touch_user(src.nick, ident, host)
        };
        Actor {
            nick: src.nick.to_string(),
            ident: ident.to_string(),
            hostmask: host.to_string(),
            permission,
        }
    }

    /// Forget a source we share no channel with once its line is handled.
    /// The emitted actor already carries its permission.
    fn release_stray(&mut self, msg: &MessageRef<'_>) {
        let Some(src) = msg.source else {
            return;
        };
        if src.is_server() || self.is_self(src.nick) {
            return;
        }
        if self.directory.release_user(src.nick) {
            trace!(nick = src.nick, "released user outside shared channels");
        }
    }

    /// Fill in ident/host where missing and fetch the permission once.
    /// Returns the cached level, or 0 for unknown users.
    fn touch_user(&mut self, nick: &str, ident: &str, host: &str) -> i32 {
        let store = Arc::clone(&self.permissions);
        let Some(user) = self.directory.user_mut(nick) else {
            return 0;
        };
        if !user.can_get_permission() {
            if !ident.is_empty() {
                user.ident = Some(ident.to_string());
            }
            if !host.is_empty() {
                user.host = Some(host.to_string());
            }
        }
        if user.can_get_permission() && !user.has_permission() {
            let (i, h) = (
                user.ident.clone().unwrap_or_default(),
                user.host.clone().unwrap_or_default(),
            );
            user.permission = permission::resolve(store.as_ref(), &user.nick, &i, &h);
            user.permission_fetched = true;
        }
        user.permission
    }

    /// Fetch a channel's permission once the network is confirmed.
    fn touch_channel(&mut self, name: &str) {
        let Some(network) = self.network.clone() else {
            return;
        };
        let store = Arc::clone(&self.permissions);
        if let Some(chan) = self.directory.channel_mut(name) {
            if chan.permission_fetched {
                return;
            }
            chan.permission = match store.fetch_channel_permission(&chan.name, &network) {
                Ok(level) => level,
                Err(e) => {
                    tracing::warn!(channel = name, error = %e, "channel permission lookup failed, using 0");
                    0
                }
            };
            chan.permission_fetched = true;
        }
    }

    /// Whether message-like events from this actor/target are suppressed.
    fn suppressed(&self, nick: &str, target: Option<&str>) -> bool {
        self.directory.is_user_ignored(nick)
            || target.map_or(false, |t| self.directory.is_channel_ignored(t))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("network", &self.config.network)
            .field("state", &self.state)
            .field("nicks", &self.nicks)
            .finish_non_exhaustive()
    }
}
