use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::modelist::ModeList;

/// Channel topic with its history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topic {
    /// Current topic text.
    pub text: Option<String>,
    /// The topic before the last change.
    pub previous: Option<String>,
    /// Who set it, as sent by the server.
    pub setter: Option<String>,
    /// When it was set.
    pub set_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// Replace the text, shifting the old one into `previous`.
    pub fn set(&mut self, text: &str, setter: Option<&str>, at: Option<DateTime<Utc>>) {
        self.previous = self.text.take();
        self.text = Some(text.to_string()).filter(|t| !t.is_empty());
        self.setter = setter.map(str::to_string);
        self.set_at = at;
    }
}

/// A channel the bot occupies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Name in display casing.
    pub name: String,
    /// Topic state.
    pub topic: Topic,
    /// Enforced channel modes, without sign or parameters.
    pub modes: String,
    /// Channel key (`+k`), if known.
    pub key: Option<String>,
    /// User limit (`+l`), if known.
    pub limit: Option<u32>,
    /// Creation time (329).
    pub created: Option<DateTime<Utc>>,
    /// Messages in this channel raise no events.
    pub ignored: bool,
    /// Cached permission level.
    pub permission: i32,
    /// Whether `permission` came from the store.
    pub permission_fetched: bool,
    pub(crate) members: BTreeSet<String>,
    lists: BTreeMap<char, ModeList>,
}

impl Channel {
    /// An empty channel.
    pub fn new(name: &str) -> Self {
        Channel {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Casemapped nick keys of current members.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether a casemapped nick key is a member.
    pub fn has_member(&self, user_key: &str) -> bool {
        self.members.contains(user_key)
    }

    /// The list for a list-mode letter, if anything was recorded.
    pub fn list(&self, letter: char) -> Option<&ModeList> {
        self.lists.get(&letter)
    }

    /// The list for a letter, created on demand.
    pub fn list_mut(&mut self, letter: char) -> &mut ModeList {
        self.lists.entry(letter).or_insert_with(|| ModeList::new(letter))
    }

    /// Letters with recorded lists.
    pub fn list_letters(&self) -> impl Iterator<Item = char> + '_ {
        self.lists.keys().copied()
    }

    /// Whether `+letter` is set.
    pub fn has_mode(&self, letter: char) -> bool {
        self.modes.contains(letter)
    }
}
