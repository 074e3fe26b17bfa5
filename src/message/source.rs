//! Message source (`nick!ident@host` or `server.name`).

/// The originator of an inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'a> {
    /// Nick, or the server name for server-originated lines.
    pub nick: &'a str,
    /// Ident (username), when present.
    pub ident: Option<&'a str>,
    /// Host, when present.
    pub host: Option<&'a str>,
}

impl<'a> Source<'a> {
    /// Split a raw source string. Never fails; missing parts are `None`.
    pub fn parse(raw: &'a str) -> Self {
        let (front, host) = match raw.split_once('@') {
            Some((front, host)) => (front, Some(host)),
            None => (raw, None),
        };
        let (nick, ident) = match front.split_once('!') {
            Some((nick, ident)) => (nick, Some(ident)),
            None => (front, None),
        };
        Source { nick, ident, host }
    }

    /// Heuristic used by every IRC client: a bare name with a dot is a server.
    pub fn is_server(&self) -> bool {
        self.ident.is_none() && self.host.is_none() && self.nick.contains('.')
    }

    /// The `ident@host` part, if both are known.
    pub fn hostmask(&self) -> Option<String> {
        match (self.ident, self.host) {
            (Some(ident), Some(host)) => Some(format!("{}@{}", ident, host)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.nick)?;
        if let Some(ident) = self.ident {
            write!(f, "!{}", ident)?;
        }
        if let Some(host) = self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}
