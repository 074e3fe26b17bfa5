//! Inbound line representation.
//!
//! [`MessageRef`] borrows from the raw line: the session tokenizes each line
//! once, dispatches on it, and drops it before reading the next.

mod parser;
mod source;

pub use self::source::Source;

use crate::error::MessageParseError;

/// A tokenized protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef<'a> {
    raw: &'a str,
    /// Originator, if the line carried a `:source` prefix.
    pub source: Option<Source<'a>>,
    /// Command word or three-digit numeric, as sent.
    pub command: &'a str,
    /// Parameters; the trailing parameter, if any, is last.
    pub params: Vec<&'a str>,
    has_trailing: bool,
}

impl<'a> MessageRef<'a> {
    /// Tokenize a raw line. Trailing CR/LF are tolerated.
    pub fn parse(raw: &'a str) -> Result<Self, MessageParseError> {
        let parts = parser::tokenize(raw)?;
        Ok(MessageRef {
            raw: raw.trim_end_matches(['\r', '\n']),
            source: parts.source.map(Source::parse),
            command: parts.command,
            params: parts.params,
            has_trailing: parts.has_trailing,
        })
    }

    /// The line as received, without its terminator.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Parameter `n`, if present.
    pub fn arg(&self, n: usize) -> Option<&'a str> {
        self.params.get(n).copied()
    }

    /// The colon-introduced trailing parameter, if the line had one.
    pub fn trailing(&self) -> Option<&'a str> {
        if self.has_trailing {
            self.params.last().copied()
        } else {
            None
        }
    }

    /// The last parameter, whether or not it was colon-introduced.
    pub fn last_arg(&self) -> Option<&'a str> {
        self.params.last().copied()
    }

    /// The numeric reply code, for three-digit commands.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Nick of the source, or an empty string for sourceless lines.
    pub fn source_nick(&self) -> &'a str {
        self.source.map(|s| s.nick).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_detection() {
        let msg = MessageRef::parse(":irc.example.com 001 Bot :Welcome").unwrap();
        assert_eq!(msg.numeric(), Some(1));
        assert_eq!(msg.arg(0), Some("Bot"));
        assert_eq!(msg.trailing(), Some("Welcome"));
        assert!(msg.source.unwrap().is_server());

        let msg = MessageRef::parse("PING :abc").unwrap();
        assert_eq!(msg.numeric(), None);
    }

    #[test]
    fn test_trailing_vs_last_arg() {
        let msg = MessageRef::parse(":a!b@c JOIN #chan").unwrap();
        assert_eq!(msg.trailing(), None);
        assert_eq!(msg.last_arg(), Some("#chan"));

        let msg = MessageRef::parse(":a!b@c JOIN :#chan").unwrap();
        assert_eq!(msg.trailing(), Some("#chan"));
    }

    #[test]
    fn test_raw_strips_terminator() {
        let msg = MessageRef::parse("PING :x\r\n").unwrap();
        assert_eq!(msg.raw(), "PING :x");
        assert_eq!(msg.source_nick(), "");
    }
}
