//! Handlers for textual commands.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::ctcp::{Ctcp, CtcpKind};
use crate::event::Event;
use crate::message::MessageRef;
use crate::mode::{apply_modes, parse_modes, parse_user_modes, Mode};

use super::{Action, Session};

impl Session {
    pub(super) fn on_ping(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        match msg.last_arg() {
            Some(token) => out.push(Action::send(Command::PONG(Some(token.to_string())))),
            None => {
                warn!(line = msg.raw(), "PING without token");
                out.push(Action::send(Command::PONG(None)));
            }
        }
    }

    pub(super) fn on_error(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let reason = msg.last_arg().unwrap_or("ERROR");
        warn!(network = %self.config.network, reason, "server sent ERROR");
        out.push(Action::Reconnect(reason.to_string()));
    }

    pub(super) fn on_join(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let (Some(src), Some(channel)) = (msg.source, msg.arg(0)) else {
            debug!(line = msg.raw(), "JOIN without source or channel");
            return;
        };
        let ident = src.ident.unwrap_or("");
        let host = src.host.unwrap_or("");

        if self.is_self(src.nick) {
            info!(channel, "joined");
            self.directory.add_channel(channel);
            self.directory.add_user_with_mask(src.nick, ident, host);
            self.directory.add_user_to_channel(src.nick, channel);
            self.touch_channel(channel);
            out.push(Action::send(Command::WHO(channel.to_string())));
        } else {
            self.directory.add_user_with_mask(src.nick, ident, host);
            self.directory.add_user_to_channel(src.nick, channel);
        }

        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Join {
            actor,
            channel: channel.to_string(),
        }));
    }

    pub(super) fn on_part(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let Some(channel) = msg.arg(0) else {
            debug!(line = msg.raw(), "PART without channel");
            return;
        };
        let nick = msg.source_nick();
        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Part {
            actor,
            channel: channel.to_string(),
            reason: msg.arg(1).unwrap_or("").to_string(),
        }));

        if self.is_self(nick) {
            info!(channel, "left");
            self.directory.remove_channel(channel);
        } else {
            self.directory.remove_user_from_channel(nick, channel);
        }
    }

    pub(super) fn on_kick(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let (Some(channel), Some(kicked)) = (msg.arg(0), msg.arg(1)) else {
            debug!(line = msg.raw(), "short KICK");
            return;
        };
        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Kick {
            actor,
            channel: channel.to_string(),
            kicked: kicked.to_string(),
            reason: msg.arg(2).unwrap_or("").to_string(),
        }));

        if self.is_self(kicked) {
            info!(channel, by = msg.source_nick(), "kicked");
            self.directory.remove_channel(channel);
        } else {
            self.directory.remove_user_from_channel(kicked, channel);
        }
    }

    pub(super) fn on_quit(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let nick = msg.source_nick();
        let reason = msg.arg(0).unwrap_or("");
        if self.is_self(nick) {
            out.push(Action::Disconnect(reason.to_string()));
            return;
        }

        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Quit {
            actor,
            reason: reason.to_string(),
        }));
        self.directory.remove_user(nick);
        self.reclaim_nick(nick, out);
    }

    pub(super) fn on_nick(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let Some(new) = msg.arg(0) else {
            debug!(line = msg.raw(), "NICK without new nick");
            return;
        };
        let old = msg.source_nick();
        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Nick {
            actor,
            new_nick: new.to_string(),
        }));

        if self.is_self(old) {
            info!(old, new, "own nick changed");
            self.nicks.actual = Some(new.to_string());
            self.nicks.wanted = new.to_string();
            self.directory.rename_user(old, new);
            return;
        }
        self.directory.rename_user(old, new);
        if let Some(src) = msg.source {
            self.directory.update_user(new, src.ident, src.host);
        }
        self.reclaim_nick(old, out);
    }

    pub(super) fn on_mode(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let (Some(target), Some(modestr)) = (msg.arg(0), msg.arg(1)) else {
            debug!(line = msg.raw(), "short MODE");
            return;
        };
        self.ensure_user(msg);
        let actor = self.actor(msg);

        let modes = if self.is_self(target) {
            let modes = parse_user_modes(modestr);
            self.own_modes = apply_modes(&self.own_modes, &modes);
            modes
        } else if self.is_channel(target) {
            let args = &msg.params[2..];
            let modes = parse_modes(modestr, args, self.caps.param_modes());
            self.apply_channel_modes(target, &modes);
            modes
        } else {
            let modes = parse_user_modes(modestr);
            if let Some(user) = self.directory.user_mut(target) {
                user.modes = apply_modes(&user.modes, &modes);
            }
            modes
        };

        out.push(Action::Emit(Event::Mode {
            actor,
            target: target.to_string(),
            modes,
        }));
    }

    /// Route channel mode changes to status maps, lists and flags.
    pub(super) fn apply_channel_modes(&mut self, channel: &str, modes: &[Mode]) {
        let prefix = self.caps.prefix();
        let mut flags = Vec::new();
        for mode in modes {
            let letter = mode.letter();
            if let Some(symbol) = prefix.symbol_for(letter) {
                self.directory
                    .change_status(mode.arg(), channel, symbol, mode.is_plus());
                continue;
            }
            let Some(chan) = self.directory.channel_mut(channel) else {
                continue;
            };
            if self.caps.is_list_mode(letter) {
                let list = chan.list_mut(letter);
                if mode.is_plus() {
                    list.add(mode.arg());
                } else {
                    list.remove(mode.arg());
                }
                continue;
            }
            match (letter, mode.is_plus()) {
                ('k', true) => chan.key = Some(mode.arg().to_string()).filter(|k| !k.is_empty()),
                ('k', false) => chan.key = None,
                ('l', true) => chan.limit = mode.arg().parse().ok(),
                ('l', false) => chan.limit = None,
                _ => {}
            }
            flags.push(mode.clone());
        }
        if let Some(chan) = self.directory.channel_mut(channel) {
            chan.modes = apply_modes(&chan.modes, &flags);
        }
    }

    pub(super) fn on_topic(&mut self, msg: &MessageRef<'_>) {
        let Some(channel) = msg.arg(0) else {
            return;
        };
        let text = msg.arg(1).unwrap_or("");
        let setter = msg.source.map(|s| s.nick);
        if let Some(chan) = self.directory.channel_mut(channel) {
            chan.topic.set(text, setter, Some(Utc::now()));
        }
    }

    pub(super) fn on_invite(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let Some(channel) = msg.arg(1) else {
            debug!(line = msg.raw(), "INVITE without channel");
            return;
        };
        let channel = channel.trim_start_matches(':');
        self.ensure_user(msg);
        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Invite {
            actor,
            channel: channel.to_string(),
        }));
    }

    pub(super) fn on_privmsg(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let (Some(target), Some(text)) = (msg.arg(0), msg.arg(1)) else {
            debug!(line = msg.raw(), "PRIVMSG without target or text");
            return;
        };
        self.ensure_user(msg);
        let actor = self.actor(msg);
        let target = Some(target).filter(|t| self.is_channel(t));
        let muted = self.suppressed(&actor.nick, target);
        let target = target.map(str::to_string);

        let Some(ctcp) = Ctcp::parse(text) else {
            if !(self.away || muted) {
                out.push(Action::Emit(Event::Message {
                    actor,
                    target,
                    text: text.to_string(),
                }));
            }
            return;
        };

        match ctcp.kind {
            CtcpKind::Action => {
                if !(self.away || muted) {
                    out.push(Action::Emit(Event::Action {
                        actor,
                        target,
                        text: ctcp.params.unwrap_or("").to_string(),
                    }));
                }
            }
            CtcpKind::Dcc => debug!(from = %actor.nick, "ignoring DCC"),
            _ if muted => {}
            CtcpKind::Version => {
                out.push(Action::send(Command::CTCPREPLY(
                    actor.nick.clone(),
                    "VERSION".to_string(),
                    Some(self.config.version.clone()),
                )));
                out.push(Action::Emit(Event::VersionRequest { actor, target }));
            }
            kind => {
                if kind == CtcpKind::Ping {
                    out.push(Action::send(Command::CTCPREPLY(
                        actor.nick.clone(),
                        "PING".to_string(),
                        ctcp.params.map(str::to_string),
                    )));
                }
                out.push(Action::Emit(Event::Ctcp {
                    actor,
                    target,
                    verb: kind.as_str().to_string(),
                    extra: ctcp.params.unwrap_or("").to_string(),
                    reply: false,
                }));
            }
        }
    }

    pub(super) fn on_notice(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let (Some(target), Some(text)) = (msg.arg(0), msg.arg(1)) else {
            debug!(line = msg.raw(), "NOTICE without target or text");
            return;
        };
        self.ensure_user(msg);
        let actor = self.actor(msg);
        let target = Some(target).filter(|t| self.is_channel(t));
        if self.suppressed(&actor.nick, target) {
            return;
        }
        let target = target.map(str::to_string);

        let event = match Ctcp::parse(text) {
            Some(ctcp) => Event::Ctcp {
                actor,
                target,
                verb: ctcp.kind.as_str().to_string(),
                extra: ctcp.params.unwrap_or("").to_string(),
                reply: true,
            },
            None => Event::Notice {
                actor,
                target,
                text: text.to_string(),
            },
        };
        out.push(Action::Emit(event));
    }

    pub(super) fn on_wallops(&mut self, msg: &MessageRef<'_>, out: &mut Vec<Action>) {
        let actor = self.actor(msg);
        out.push(Action::Emit(Event::Wallops {
            actor,
            text: msg.last_arg().unwrap_or("").to_string(),
        }));
    }

    /// Create the source as a user if it is a person we have not seen.
    fn ensure_user(&mut self, msg: &MessageRef<'_>) {
        let Some(src) = msg.source else {
            return;
        };
        if src.is_server() || self.directory.has_user(src.nick) {
            return;
        }
        self.directory
            .add_user_with_mask(src.nick, src.ident.unwrap_or(""), src.host.unwrap_or(""));
    }

    /// Ask for the preferred nick back once whoever held it is gone.
    fn reclaim_nick(&mut self, freed: &str, out: &mut Vec<Action>) {
        let casemap = self.directory.casemapping();
        if !casemap.names_eq(freed, &self.nicks.preferred) {
            return;
        }
        let holding = self
            .nicks
            .actual
            .as_deref()
            .map_or(false, |n| casemap.names_eq(n, &self.nicks.preferred));
        if holding {
            return;
        }
        info!(nick = %self.nicks.preferred, "reclaiming preferred nick");
        let line = self.request_nick(&self.nicks.preferred.clone());
        out.push(Action::Send(line));
    }
}
