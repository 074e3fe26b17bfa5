//! `proptest` generators for protocol inputs.
//!
//! Enabled with the `proptest` feature so downstream modules can fuzz their
//! own handlers with the same shapes the engine is tested against.

use proptest::prelude::*;

/// A nick: letter or special first, then up to 15 more.
pub fn nick() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,15}")
        .expect("valid regex")
}

/// A channel name.
pub fn channel() -> impl Strategy<Value = String> {
    prop::string::string_regex("#[a-zA-Z0-9_\\-]{1,30}").expect("valid regex")
}

/// A mode string of the form `([+-][a-zA-Z])+`.
pub fn mode_string() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::bool::ANY, prop::char::range('a', 'z')), 1..12).prop_map(
        |changes| {
            changes
                .into_iter()
                .map(|(plus, c)| format!("{}{}", if plus { '+' } else { '-' }, c))
                .collect()
        },
    )
}

/// Parameter tokens to follow a mode string.
pub fn mode_args() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("[a-zA-Z0-9*!@.]{1,20}").expect("valid regex"),
        0..12,
    )
}

/// Free text without line breaks or NUL.
pub fn text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0]{0,200}").expect("valid regex")
}

/// A PRIVMSG line from a full source.
pub fn privmsg_line() -> impl Strategy<Value = String> {
    (nick(), channel(), text())
        .prop_map(|(from, chan, text)| format!(":{}!user@host.example PRIVMSG {} :{}", from, chan, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRef;

    proptest! {
        #[test]
        fn privmsg_lines_tokenize(line in privmsg_line()) {
            let msg = MessageRef::parse(&line).unwrap();
            prop_assert_eq!(msg.command, "PRIVMSG");
            prop_assert_eq!(msg.params.len(), 2);
        }
    }
}
