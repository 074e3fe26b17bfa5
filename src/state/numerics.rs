//! Handlers for numeric replies.
//!
//! Every reply is positional: argument 0 is our own nick, the rest follow the
//! reply's documented grammar. Short replies are logged and skipped.

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::directory::{Channel, User};
use crate::event::Event;
use crate::isupport::ServerInfo;
use crate::message::MessageRef;
use crate::mode::parse_modes;
use crate::response::Response;

use super::{Action, ConnectionState, Session};

/// MOTD text used when the server has none (422).
const MISSING_MOTD: &str = "MOTD File is missing";

fn timestamp(arg: &str) -> Option<DateTime<Utc>> {
    let secs = arg.parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

fn count(arg: Option<&str>) -> Option<u32> {
    arg?.parse().ok()
}

impl Session {
    pub(super) fn on_numeric(&mut self, code: u16, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let Some(response) = Response::from_code(code) else {
            debug!(code, "unhandled numeric");
            return;
        };
        match response {
            Response::RPL_WELCOME => self.on_welcome(msg, out),
            Response::RPL_MYINFO => {
                self.server_info = ServerInfo::from_args(msg.params.get(1..).unwrap_or_default());
                if self.server_info.is_none() {
                    warn!(line = msg.raw(), "short RPL_MYINFO");
                }
            }
            Response::RPL_ISUPPORT => self.on_isupport(msg),
            Response::RPL_UMODEIS => {
                if let Some(modes) = msg.arg(1) {
                    self.own_modes = modes.trim_start_matches('+').to_string();
                }
            }
            Response::RPL_LUSEROP => self.stats.operators = count(msg.arg(1)),
            Response::RPL_LUSERUNKNOWN => self.stats.unknown = count(msg.arg(1)),
            Response::RPL_LUSERCHANNELS => self.stats.channels = count(msg.arg(1)),
            Response::RPL_LOCALUSERS => {
                if let (Some(cur), Some(max)) = (count(msg.arg(1)), count(msg.arg(2))) {
                    self.stats.local_users = Some((cur, max));
                }
            }
            Response::RPL_GLOBALUSERS => {
                if let (Some(cur), Some(max)) = (count(msg.arg(1)), count(msg.arg(2))) {
                    self.stats.global_users = Some((cur, max));
                }
            }
            Response::RPL_AWAY => {
                let reason = msg.arg(2).map(str::to_string);
                if let Some(user) = self.whois_user(msg) {
                    user.away = true;
                    user.away_reason = reason;
                }
            }
            Response::RPL_USERHOST => self.on_userhost(msg),
            Response::RPL_ISON => self.on_ison(msg),
            Response::RPL_UNAWAY => self.away = false,
            Response::RPL_NOWAWAY => self.away = true,
            Response::RPL_WHOISREGNICK => {
                if let Some(user) = self.whois_user(msg) {
                    user.registered = true;
                }
            }
            Response::RPL_WHOISUSER => {
                let (ident, host, realname) = (msg.arg(2), msg.arg(3), msg.arg(5));
                if let Some(user) = self.whois_user(msg) {
                    user.ident = ident.map(str::to_string);
                    user.host = host.map(str::to_string);
                    user.realname = realname.map(str::to_string);
                }
            }
            Response::RPL_WHOISSERVER => {
                let server = msg.arg(2).map(str::to_string);
                if let Some(user) = self.whois_user(msg) {
                    user.server = server;
                }
            }
            Response::RPL_WHOISOPERATOR => {
                if let Some(user) = self.whois_user(msg) {
                    user.oper = true;
                }
            }
            Response::RPL_WHOISIDLE => {
                let idle = msg.arg(2).and_then(|a| a.parse().ok());
                let signon = msg.arg(3).and_then(timestamp);
                if let Some(user) = self.whois_user(msg) {
                    user.idle_secs = idle;
                    user.signon = signon;
                }
            }
            Response::RPL_WHOISCHANNELS => {
                let channels = msg.arg(2).map(str::to_string);
                if let Some(user) = self.whois_user(msg) {
                    user.whois_channels = channels;
                }
            }
            Response::RPL_WHOISACCOUNT => {
                let account = msg.arg(2).map(str::to_string);
                if let Some(user) = self.whois_user(msg) {
                    user.account = account;
                }
            }
            Response::RPL_WHOISMODES => {
                // "is using modes +iwx +snomask"
                let modes = msg
                    .last_arg()
                    .and_then(|t| t.split_whitespace().find(|w| w.starts_with('+')))
                    .map(|w| w.trim_start_matches('+').to_string());
                if let (Some(modes), Some(user)) = (modes, self.whois_user(msg)) {
                    user.modes = modes;
                }
            }
            Response::RPL_WHOISSECURE => {
                if let Some(user) = self.whois_user(msg) {
                    user.secure = true;
                }
            }
            Response::RPL_CHANNELMODEIS => self.on_channel_modes(msg),
            Response::RPL_CREATIONTIME => {
                let created = msg.arg(2).and_then(timestamp);
                if let Some(chan) = self.reply_channel(msg) {
                    chan.created = created;
                }
            }
            Response::RPL_NOTOPIC => {
                if let Some(chan) = self.reply_channel(msg) {
                    chan.topic.set("", None, None);
                }
            }
            Response::RPL_TOPIC => {
                let text = msg.arg(2).unwrap_or("");
                if let Some(chan) = self.reply_channel(msg) {
                    chan.topic.set(text, None, None);
                }
            }
            Response::RPL_TOPICWHOTIME => {
                let setter = msg.arg(2).map(str::to_string);
                let at = msg.arg(3).and_then(timestamp);
                if let Some(chan) = self.reply_channel(msg) {
                    chan.topic.setter = setter;
                    chan.topic.set_at = at;
                }
            }
            Response::RPL_INVITELIST => self.on_list_entry('I', msg),
            Response::RPL_EXCEPTLIST => self.on_list_entry('e', msg),
            Response::RPL_BANLIST => self.on_list_entry('b', msg),
            Response::RPL_WHOREPLY => self.on_who_reply(msg),
            Response::RPL_NAMREPLY => self.on_names_reply(msg),
            Response::RPL_MOTDSTART => self.motd.clear(),
            Response::RPL_MOTD => {
                let line = msg.last_arg().unwrap_or("");
                self.motd.push(line.strip_prefix("- ").unwrap_or(line).to_string());
            }
            Response::ERR_NOMOTD => self.motd = vec![MISSING_MOTD.to_string()],
            Response::RPL_TIME => self.server_time = msg.last_arg().map(str::to_string),
            Response::ERR_NOSUCHNICK => {
                if let Some(nick) = msg.arg(1) {
                    self.directory.lost_user(nick);
                }
            }
            Response::ERR_NICKNAMEINUSE => {
                let next = format!("{}2", self.nicks.wanted);
                info!(taken = %self.nicks.wanted, next = %next, "nick in use");
                let line = self.request_nick(&next);
                out.push(Action::Send(line));
            }
            _ => {}
        }
    }

    fn on_welcome(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let Some(nick) = msg.arg(0) else {
            warn!(line = msg.raw(), "RPL_WELCOME without nick");
            return;
        };
        self.nicks.actual = Some(nick.to_string());
        self.state = ConnectionState::Registered;

        // "Welcome to the <network> ..."
        let announced = msg.trailing().and_then(|t| t.split_whitespace().nth(3));
        match announced {
            Some(name) if name.eq_ignore_ascii_case(&self.config.network) => {
                self.network = Some(self.config.network.clone());
            }
            Some(name) => debug!(announced = name, expected = %self.config.network, "network name not confirmed"),
            None => {}
        }
        info!(network = %self.config.network, nick, "registered");

        out.push(Action::Emit(Event::Connect {
            nick: nick.to_string(),
        }));
        for chan in &self.config.channels {
            out.push(Action::send(Command::JOIN(chan.name.clone(), chan.key.clone())));
        }
    }

    fn on_isupport(&mut self, msg: &MessageRef<'_>) {
        let before = self.caps.casemapping();
        self.caps.apply_reply(&msg.params);
        let after = self.caps.casemapping();
        if after != before {
            debug!(?after, "casemapping changed");
            self.directory.rehash(after);
        }
        match self.caps.network() {
            Some(name) if name.eq_ignore_ascii_case(&self.config.network) => {
                self.network = Some(self.config.network.clone());
            }
            Some(name) => warn!(announced = name, expected = %self.config.network, "server reports a different network"),
            None => {}
        }
    }

    /// `<me> :nick[*]=[+-]ident@host nick2=...`
    fn on_userhost(&mut self, msg: &MessageRef<'_>) {
        let Some(replies) = msg.last_arg() else {
            return;
        };
        for reply in replies.split_whitespace() {
            let Some((name, rest)) = reply.split_once('=') else {
                debug!(reply, "malformed USERHOST entry");
                continue;
            };
            let (nick, oper) = match name.strip_suffix('*') {
                Some(nick) => (nick, true),
                None => (name, false),
            };
            let (away, mask) = match rest.strip_prefix('-') {
                Some(mask) => (true, mask),
                None => (false, rest.strip_prefix('+').unwrap_or(rest)),
            };
            let Some((ident, host)) = mask.split_once('@') else {
                debug!(reply, "USERHOST entry without host");
                continue;
            };
            if let Some(user) = self.directory.user_mut(nick) {
                user.oper = oper;
                user.away = away;
                user.ident = Some(ident.to_string());
                user.host = Some(host.to_string());
            }
        }
    }

    fn on_ison(&mut self, msg: &MessageRef<'_>) {
        let online: Vec<&str> = msg
            .last_arg()
            .map(|t| t.split_whitespace().collect())
            .unwrap_or_default();
        let tracked: Vec<String> = self.directory.tracked_users().map(str::to_string).collect();
        for key in &tracked {
            let casemap = self.directory.casemapping();
            if !online.iter().any(|n| casemap.names_eq(n, key)) {
                self.directory.lost_user(key);
            }
        }
        for nick in online {
            self.directory.found_user(nick);
        }
    }

    /// `<me> <channel> <modes> [params...]`
    fn on_channel_modes(&mut self, msg: &MessageRef<'_>) {
        let (Some(channel), Some(modestr)) = (msg.arg(1), msg.arg(2)) else {
            warn!(line = msg.raw(), "short RPL_CHANNELMODEIS");
            return;
        };
        let Some(chan) = self.directory.channel_mut(channel) else {
            return;
        };
        chan.modes.clear();
        let modes = parse_modes(modestr, &msg.params[3..], self.caps.param_modes());
        self.apply_channel_modes(channel, &modes);
    }

    /// `<me> <channel> <mask> [setter] [time]`
    fn on_list_entry(&mut self, letter: char, msg: &MessageRef<'_>) {
        let (Some(channel), Some(mask)) = (msg.arg(1), msg.arg(2)) else {
            warn!(line = msg.raw(), letter = %letter, "short list reply");
            return;
        };
        if let Some(chan) = self.directory.channel_mut(channel) {
            chan.list_mut(letter).add(mask);
        }
    }

    /// `<me> <channel> <ident> <host> <server> <nick> <flags> :<hops> <realname>`
    fn on_who_reply(&mut self, msg: &MessageRef<'_>) {
        let [_, channel, ident, host, server, nick, flags, rest @ ..] = msg.params.as_slice() else {
            warn!(line = msg.raw(), "short RPL_WHOREPLY");
            return;
        };
        let realname = rest
            .first()
            .and_then(|t| t.split_once(' '))
            .map(|(_, name)| name.to_string());
        let symbols: String = {
            let prefix = self.caps.prefix();
            flags.chars().filter(|c| prefix.letter_for(*c).is_some()).collect()
        };

        // Replies for channels we are not in only refresh users we know.
        let joined = self.directory.has_channel(channel);
        if !joined && !self.directory.has_user(nick) {
            return;
        }
        let user = self.directory.add_user_with_mask(nick, ident, host);
        user.server = Some(server.to_string());
        user.away = flags.starts_with('G');
        user.oper = flags.contains('*');
        if realname.is_some() {
            user.realname = realname;
        }
        if joined {
            self.directory.add_user_to_channel(nick, channel);
            self.directory.set_status(nick, channel, &symbols);
        }
        self.touch_user(nick, ident, host);
    }

    /// `<me> <type> <channel> :[@+]nick ...`
    fn on_names_reply(&mut self, msg: &MessageRef<'_>) {
        let (channel, names) = match msg.params.as_slice() {
            [_, _, channel, names, ..] => (*channel, *names),
            [_, channel, names] => (*channel, *names),
            _ => {
                warn!(line = msg.raw(), "short RPL_NAMREPLY");
                return;
            }
        };
        if !self.directory.has_channel(channel) {
            debug!(channel, "NAMES for a channel we are not in");
            return;
        }
        let prefix = self.caps.prefix();
        for name in names.split_whitespace() {
            let (symbols, nick) = prefix.strip(name);
            if nick.is_empty() {
                continue;
            }
            self.directory.add_user(nick);
            self.directory.add_user_to_channel(nick, channel);
            self.directory.set_status(nick, channel, symbols);
        }
    }

    /// The channel a reply is about (argument 1).
    fn reply_channel(&mut self, msg: &MessageRef<'_>) -> Option<&mut Channel> {
        let name = msg.arg(1)?;
        self.directory.channel_mut(name)
    }

    /// The known user a WHOIS-family reply is about (argument 1).
    fn whois_user(&mut self, msg: &MessageRef<'_>) -> Option<&mut User> {
        let Some(nick) = msg.arg(1) else {
            warn!(line = msg.raw(), "WHOIS reply without nick");
            return None;
        };
        self.directory.user_mut(nick)
    }
}
