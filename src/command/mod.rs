//! Outbound commands and inbound command classification.

mod serialize;

/// A line the bot sends.
///
/// `Display` renders the wire form without the CRLF terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `PASS password`
    PASS(String),
    /// `NICK nick`
    NICK(String),
    /// `USER ident 0 * :realname`
    USER(String, String),
    /// `JOIN channel [key]`
    JOIN(String, Option<String>),
    /// `PART channel [:reason]`
    PART(String, Option<String>),
    /// `QUIT [:message]`
    QUIT(Option<String>),
    /// `PRIVMSG target :text`
    PRIVMSG(String, String),
    /// `NOTICE target :text`
    NOTICE(String, String),
    /// `MODE target [modes [args...]]`
    MODE(String, Option<String>, Vec<String>),
    /// `TOPIC channel [:text]`
    TOPIC(String, Option<String>),
    /// `KICK channel nick [:reason]`
    KICK(String, String, Option<String>),
    /// `INVITE nick channel`
    INVITE(String, String),
    /// `WHOIS nick`
    WHOIS(String),
    /// `WHO mask`
    WHO(String),
    /// `OPER name password`
    OPER(String, String),
    /// `WALLOPS :text`
    WALLOPS(String),
    /// `PONG :token`, or bare `PONG`
    PONG(Option<String>),
    /// `ISON nick...`
    ISON(Vec<String>),
    /// `AWAY [:reason]`
    AWAY(Option<String>),
    /// CTCP request framed in PRIVMSG: target, verb, text
    CTCP(String, String, Option<String>),
    /// CTCP reply framed in NOTICE: target, verb, text
    CTCPREPLY(String, String, Option<String>),
    /// Verbatim line.
    Raw(String),
}

/// Inbound command word, classified once for dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Three-digit reply.
    Numeric(u16),
    /// `PING`
    Ping,
    /// `PONG`
    Pong,
    /// `ERROR`
    Error,
    /// `JOIN`
    Join,
    /// `PART`
    Part,
    /// `KICK`
    Kick,
    /// `QUIT`
    Quit,
    /// `NICK`
    Nick,
    /// `MODE`
    Mode,
    /// `TOPIC`
    Topic,
    /// `INVITE`
    Invite,
    /// `PRIVMSG`
    Privmsg,
    /// `NOTICE`
    Notice,
    /// `WALLOPS`
    Wallops,
    /// Anything else.
    Other,
}

impl Verb {
    /// Classify a command word, case-insensitively.
    pub fn classify(command: &str) -> Self {
        if command.len() == 3 && command.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = command.parse() {
                return Verb::Numeric(n);
            }
        }
        match command.to_ascii_uppercase().as_str() {
            "PING" => Verb::Ping,
            "PONG" => Verb::Pong,
            "ERROR" => Verb::Error,
            "JOIN" => Verb::Join,
            "PART" => Verb::Part,
            "KICK" => Verb::Kick,
            "QUIT" => Verb::Quit,
            "NICK" => Verb::Nick,
            "MODE" => Verb::Mode,
            "TOPIC" => Verb::Topic,
            "INVITE" => Verb::Invite,
            "PRIVMSG" => Verb::Privmsg,
            "NOTICE" => Verb::Notice,
            "WALLOPS" => Verb::Wallops,
            _ => Verb::Other,
        }
    }
}
