//! CTCP framing inside PRIVMSG and NOTICE bodies.
//!
//! A CTCP payload is wrapped in `\x01` bytes: `\x01ACTION waves\x01`. Some
//! clients omit the closing delimiter, so it is optional on input.

use std::fmt;

/// The CTCP delimiter byte.
pub const CTCP_DELIM: char = '\x01';

/// CTCP verbs the engine treats specially.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CtcpKind {
    /// `/me` style action.
    Action,
    /// Client version query.
    Version,
    /// Latency probe.
    Ping,
    /// Local time query.
    Time,
    /// DCC negotiation; recognised but not handled.
    Dcc,
    /// Any other verb, uppercased.
    Other(String),
}

impl CtcpKind {
    /// Classify a verb, case-insensitively.
    pub fn parse(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "ACTION" => CtcpKind::Action,
            "VERSION" => CtcpKind::Version,
            "PING" => CtcpKind::Ping,
            "TIME" => CtcpKind::Time,
            "DCC" => CtcpKind::Dcc,
            other => CtcpKind::Other(other.to_string()),
        }
    }

    /// Canonical uppercase verb.
    pub fn as_str(&self) -> &str {
        match self {
            CtcpKind::Action => "ACTION",
            CtcpKind::Version => "VERSION",
            CtcpKind::Ping => "PING",
            CtcpKind::Time => "TIME",
            CtcpKind::Dcc => "DCC",
            CtcpKind::Other(s) => s,
        }
    }
}

impl fmt::Display for CtcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed CTCP payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The verb.
    pub kind: CtcpKind,
    /// Text after the verb, if any.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse a message body. Returns `None` unless it starts with `\x01`
    /// and carries a verb.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.strip_prefix(CTCP_DELIM)?;
        let text = text.strip_suffix(CTCP_DELIM).unwrap_or(text);
        let (verb, params) = match text.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest).filter(|r| !r.is_empty())),
            None => (text, None),
        };
        if verb.is_empty() {
            return None;
        }
        Some(Ctcp {
            kind: CtcpKind::parse(verb),
            params,
        })
    }

    /// Whether a body is CTCP-framed.
    #[inline]
    pub fn is_ctcp(text: &str) -> bool {
        text.starts_with(CTCP_DELIM)
    }

    /// Build a payload from a verb and optional text.
    pub fn new(verb: &str, params: Option<&'a str>) -> Self {
        Ctcp {
            kind: CtcpKind::parse(verb),
            params,
        }
    }
}

impl fmt::Display for Ctcp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CTCP_DELIM, self.kind)?;
        if let Some(params) = self.params {
            write!(f, " {}", params)?;
        }
        write!(f, "{}", CTCP_DELIM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        let ctcp = Ctcp::parse("\x01ACTION waves\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Action);
        assert_eq!(ctcp.params, Some("waves"));
    }

    #[test]
    fn test_parse_without_closing_delim() {
        let ctcp = Ctcp::parse("\x01version").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Version);
        assert_eq!(ctcp.params, None);
    }

    #[test]
    fn test_parse_other_verb() {
        let ctcp = Ctcp::parse("\x01FINGER please\x01").unwrap();
        assert_eq!(ctcp.kind, CtcpKind::Other("FINGER".into()));
        assert_eq!(ctcp.kind.as_str(), "FINGER");
    }

    #[test]
    fn test_not_ctcp() {
        assert!(Ctcp::parse("hello").is_none());
        assert!(Ctcp::parse("\x01\x01").is_none());
        assert!(!Ctcp::is_ctcp("plain text"));
    }

    #[test]
    fn test_display_framing() {
        assert_eq!(Ctcp::new("action", Some("dances")).to_string(), "\x01ACTION dances\x01");
        assert_eq!(Ctcp::new("VERSION", None).to_string(), "\x01VERSION\x01");
    }
}
