use std::fmt::{self, Write};

use crate::ctcp::Ctcp;

use super::Command;

/// Write a command; the last argument gets a `:` only when it needs one.
fn write_cmd(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    let Some((trailing, middle)) = args.split_last() else {
        return Ok(());
    };
    for param in middle {
        f.write_char(' ')?;
        f.write_str(param)?;
    }
    f.write_char(' ')?;
    if trailing.is_empty() || trailing.contains(' ') || trailing.starts_with(':') {
        f.write_char(':')?;
    }
    f.write_str(trailing)
}

/// Write a command whose last argument is always colon-prefixed.
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    match args.split_last() {
        Some((suffix, middle)) => {
            f.write_str(cmd)?;
            for arg in middle {
                f.write_char(' ')?;
                f.write_str(arg)?;
            }
            f.write_str(" :")?;
            f.write_str(suffix)
        }
        None => f.write_str(cmd),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(pass) => write_cmd(f, "PASS", &[pass.as_str()]),
            Command::NICK(nick) => write_cmd(f, "NICK", &[nick.as_str()]),
            Command::USER(ident, realname) => {
                write_cmd_freeform(f, "USER", &[ident.as_str(), "0", "*", realname.as_str()])
            }
            Command::JOIN(chan, Some(key)) => write_cmd(f, "JOIN", &[chan.as_str(), key.as_str()]),
            Command::JOIN(chan, None) => write_cmd(f, "JOIN", &[chan.as_str()]),
            Command::PART(chan, Some(reason)) => write_cmd_freeform(f, "PART", &[chan.as_str(), reason.as_str()]),
            Command::PART(chan, None) => write_cmd(f, "PART", &[chan.as_str()]),
            Command::QUIT(Some(msg)) => write_cmd_freeform(f, "QUIT", &[msg.as_str()]),
            Command::QUIT(None) => f.write_str("QUIT"),
            Command::PRIVMSG(target, text) => write_cmd_freeform(f, "PRIVMSG", &[target.as_str(), text.as_str()]),
            Command::NOTICE(target, text) => write_cmd_freeform(f, "NOTICE", &[target.as_str(), text.as_str()]),
            Command::MODE(target, modes, args) => {
                f.write_str("MODE ")?;
                f.write_str(target)?;
                if let Some(modes) = modes {
                    write!(f, " {}", modes)?;
                    for arg in args {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
            Command::TOPIC(chan, Some(text)) => write_cmd_freeform(f, "TOPIC", &[chan.as_str(), text.as_str()]),
            Command::TOPIC(chan, None) => write_cmd(f, "TOPIC", &[chan.as_str()]),
            Command::KICK(chan, nick, Some(reason)) => {
                write_cmd_freeform(f, "KICK", &[chan.as_str(), nick.as_str(), reason.as_str()])
            }
            Command::KICK(chan, nick, None) => write_cmd(f, "KICK", &[chan.as_str(), nick.as_str()]),
            Command::INVITE(nick, chan) => write_cmd(f, "INVITE", &[nick.as_str(), chan.as_str()]),
            Command::WHOIS(nick) => write_cmd(f, "WHOIS", &[nick.as_str()]),
            Command::WHO(mask) => write_cmd(f, "WHO", &[mask.as_str()]),
            Command::OPER(name, pass) => write_cmd(f, "OPER", &[name.as_str(), pass.as_str()]),
            Command::WALLOPS(text) => write_cmd_freeform(f, "WALLOPS", &[text.as_str()]),
            Command::PONG(Some(token)) => write_cmd_freeform(f, "PONG", &[token.as_str()]),
            Command::PONG(None) => f.write_str("PONG"),
            Command::ISON(nicks) => {
                f.write_str("ISON")?;
                for nick in nicks {
                    write!(f, " {}", nick)?;
                }
                Ok(())
            }
            Command::AWAY(Some(reason)) => write_cmd_freeform(f, "AWAY", &[reason.as_str()]),
            Command::AWAY(None) => f.write_str("AWAY"),
            Command::CTCP(target, verb, text) => {
                let body = Ctcp::new(verb, text.as_deref()).to_string();
                write_cmd_freeform(f, "PRIVMSG", &[target.as_str(), body.as_str()])
            }
            Command::CTCPREPLY(target, verb, text) => {
                let body = Ctcp::new(verb, text.as_deref()).to_string();
                write_cmd_freeform(f, "NOTICE", &[target.as_str(), body.as_str()])
            }
            Command::Raw(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_registration_lines() {
        assert_eq!(Command::PASS(s("secret")).to_string(), "PASS secret");
        assert_eq!(Command::NICK(s("Bot")).to_string(), "NICK Bot");
        assert_eq!(
            Command::USER(s("bot"), s("slirc-bot 0.1")).to_string(),
            "USER bot 0 * :slirc-bot 0.1"
        );
    }

    #[test]
    fn test_channel_lines() {
        assert_eq!(Command::JOIN(s("#a"), None).to_string(), "JOIN #a");
        assert_eq!(Command::JOIN(s("#a"), Some(s("key"))).to_string(), "JOIN #a key");
        assert_eq!(Command::PART(s("#a"), Some(s("bye now"))).to_string(), "PART #a :bye now");
        assert_eq!(
            Command::MODE(s("#a"), Some(s("+ov")), vec![s("Alice"), s("Bob")]).to_string(),
            "MODE #a +ov Alice Bob"
        );
        assert_eq!(Command::MODE(s("#a"), None, vec![]).to_string(), "MODE #a");
        assert_eq!(Command::TOPIC(s("#a"), None).to_string(), "TOPIC #a");
        assert_eq!(Command::KICK(s("#a"), s("x"), Some(s("out"))).to_string(), "KICK #a x :out");
    }

    #[test]
    fn test_pong_forms() {
        assert_eq!(Command::PONG(Some(s("abc123"))).to_string(), "PONG :abc123");
        assert_eq!(Command::PONG(None).to_string(), "PONG");
    }

    #[test]
    fn test_ctcp_framing() {
        assert_eq!(
            Command::CTCP(s("#a"), s("ACTION"), Some(s("waves"))).to_string(),
            "PRIVMSG #a :\x01ACTION waves\x01"
        );
        assert_eq!(
            Command::CTCPREPLY(s("Alice"), s("VERSION"), Some(s("slirc-bot"))).to_string(),
            "NOTICE Alice :\x01VERSION slirc-bot\x01"
        );
    }

    #[test]
    fn test_quit_and_ison() {
        assert_eq!(Command::QUIT(None).to_string(), "QUIT");
        assert_eq!(Command::QUIT(Some(s("bye"))).to_string(), "QUIT :bye");
        assert_eq!(Command::ISON(vec![s("a"), s("b")]).to_string(), "ISON a b");
    }
}
