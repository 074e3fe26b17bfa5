//! Domain events raised to external collaborators.
//!
//! One [`Event`] is raised per protocol occurrence. Handlers receive them in
//! dispatch order through [`EventHandler::notify`].

use crate::mode::Mode;

/// Who caused an event, with their permission level at the time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    /// Nick, or server name.
    pub nick: String,
    /// Ident, if the line carried one.
    pub ident: String,
    /// Host, if the line carried one.
    pub hostmask: String,
    /// Permission level; 0 if unknown.
    pub permission: i32,
}

/// A protocol occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Event {
    /// Registration completed (001).
    Connect {
        /// Nick the server confirmed.
        nick: String,
    },
    /// The connection ended.
    Disconnect {
        /// Why, as far as we know.
        reason: String,
    },
    /// Another user quit.
    Quit {
        actor: Actor,
        reason: String,
    },
    /// Someone joined a channel.
    Join {
        actor: Actor,
        channel: String,
    },
    /// Someone left a channel.
    Part {
        actor: Actor,
        channel: String,
        reason: String,
    },
    /// Someone was kicked.
    Kick {
        actor: Actor,
        channel: String,
        kicked: String,
        reason: String,
    },
    /// Modes changed on a channel or user.
    Mode {
        actor: Actor,
        target: String,
        modes: Vec<Mode>,
    },
    /// We were invited.
    Invite {
        actor: Actor,
        channel: String,
    },
    /// Someone changed nick.
    Nick {
        actor: Actor,
        new_nick: String,
    },
    /// A PRIVMSG. `target` is the channel, or `None` for a private message.
    Message {
        actor: Actor,
        target: Option<String>,
        text: String,
    },
    /// A CTCP ACTION.
    Action {
        actor: Actor,
        target: Option<String>,
        text: String,
    },
    /// A NOTICE.
    Notice {
        actor: Actor,
        target: Option<String>,
        text: String,
    },
    /// A WALLOPS broadcast.
    Wallops {
        actor: Actor,
        text: String,
    },
    /// A CTCP other than ACTION and VERSION.
    Ctcp {
        actor: Actor,
        target: Option<String>,
        verb: String,
        extra: String,
        /// Whether this arrived as a NOTICE (a reply).
        reply: bool,
    },
    /// A CTCP VERSION request.
    VersionRequest {
        actor: Actor,
        target: Option<String>,
    },
    /// Any numeric reply, after the session handled it.
    Numeric {
        code: u16,
        params: Vec<String>,
    },
    /// Every inbound line, before dispatch.
    Raw {
        line: String,
    },
}

/// Discriminant of an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    Quit,
    Join,
    Part,
    Kick,
    Mode,
    Invite,
    Nick,
    Message,
    Action,
    Notice,
    Wallops,
    Ctcp,
    VersionRequest,
    Numeric,
    Raw,
}

impl EventKind {
    /// Stable name, as handed to scripting collaborators.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Disconnect => "disconnect",
            EventKind::Quit => "quit",
            EventKind::Join => "join",
            EventKind::Part => "part",
            EventKind::Kick => "kick",
            EventKind::Mode => "mode",
            EventKind::Invite => "invite",
            EventKind::Nick => "nick",
            EventKind::Message => "message",
            EventKind::Action => "action",
            EventKind::Notice => "notice",
            EventKind::Wallops => "wallops",
            EventKind::Ctcp => "ctcp",
            EventKind::VersionRequest => "version",
            EventKind::Numeric => "numeric",
            EventKind::Raw => "raw",
        }
    }
}

impl Event {
    /// The event's kind.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Connect { .. } => EventKind::Connect,
            Event::Disconnect { .. } => EventKind::Disconnect,
            Event::Quit { .. } => EventKind::Quit,
            Event::Join { .. } => EventKind::Join,
            Event::Part { .. } => EventKind::Part,
            Event::Kick { .. } => EventKind::Kick,
            Event::Mode { .. } => EventKind::Mode,
            Event::Invite { .. } => EventKind::Invite,
            Event::Nick { .. } => EventKind::Nick,
            Event::Message { .. } => EventKind::Message,
            Event::Action { .. } => EventKind::Action,
            Event::Notice { .. } => EventKind::Notice,
            Event::Wallops { .. } => EventKind::Wallops,
            Event::Ctcp { .. } => EventKind::Ctcp,
            Event::VersionRequest { .. } => EventKind::VersionRequest,
            Event::Numeric { .. } => EventKind::Numeric,
            Event::Raw { .. } => EventKind::Raw,
        }
    }

    /// The actor, for events that have one.
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Event::Quit { actor, .. }
            | Event::Join { actor, .. }
            | Event::Part { actor, .. }
            | Event::Kick { actor, .. }
            | Event::Mode { actor, .. }
            | Event::Invite { actor, .. }
            | Event::Nick { actor, .. }
            | Event::Message { actor, .. }
            | Event::Action { actor, .. }
            | Event::Notice { actor, .. }
            | Event::Wallops { actor, .. }
            | Event::Ctcp { actor, .. }
            | Event::VersionRequest { actor, .. } => Some(actor),
            Event::Connect { .. }
            | Event::Disconnect { .. }
            | Event::Numeric { .. }
            | Event::Raw { .. } => None,
        }
    }
}

/// Receiver of domain events. Implemented by modules and script bridges.
pub trait EventHandler: Send + Sync {
    /// Called once per event, on the connection's reader task.
    fn notify(&self, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn notify(&self, event: &Event) {
        self(event)
    }
}
