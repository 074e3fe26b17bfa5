//! In-memory model of channels and users.
//!
//! Channels and users reference each other by casemapped key; every mutation
//! goes through [`Directory`] so both sides stay consistent. Mutations on a
//! key that does not exist are silent no-ops: the server's view and ours
//! legitimately drift, and a stale event must not take the dispatcher down.
//!
//! A user is dropped when it leaves its last channel, unless it is being
//! tracked through ISON.

mod channel;
mod modelist;
mod user;

pub use self::channel::{Channel, Topic};
pub use self::modelist::{wildcard_match, ModeList};
pub use self::user::User;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::casemap::Casemapping;

/// Channel and user store for one connection.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    casemap: Casemapping,
    channels: HashMap<String, Channel>,
    users: HashMap<String, User>,
    tracked: BTreeSet<String>,
    found: BTreeSet<String>,
}

impl Directory {
    /// Empty directory using RFC 1459 case-mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The mapping used for keys.
    pub fn casemapping(&self) -> Casemapping {
        self.casemap
    }

    /// Lookup key for a nick or channel name.
    pub fn key(&self, name: &str) -> String {
        self.casemap.to_lower(name)
    }

    /// Switch case-mapping and re-key everything.
    pub fn rehash(&mut self, casemap: Casemapping) {
        if casemap == self.casemap {
            return;
        }
        self.casemap = casemap;
        let rekey = |s: &String| casemap.to_lower(s);

        let channels = std::mem::take(&mut self.channels);
        for (_, mut chan) in channels {
            chan.members = chan.members.iter().map(rekey).collect();
            self.channels.insert(casemap.to_lower(&chan.name), chan);
        }
        let users = std::mem::take(&mut self.users);
        for (_, mut user) in users {
            user.channels = user
                .channels
                .into_iter()
                .map(|(k, v)| (casemap.to_lower(&k), v))
                .collect();
            self.users.insert(casemap.to_lower(&user.nick), user);
        }
        self.tracked = self.tracked.iter().map(rekey).collect();
        self.found = self.found.iter().map(rekey).collect();
    }

    // Channels

    /// Record that the bot occupies `name`. Returns the (possibly existing)
    /// channel.
    pub fn add_channel(&mut self, name: &str) -> &mut Channel {
        let key = self.key(name);
        self.channels.entry(key).or_insert_with(|| {
            debug!(channel = name, "adding channel");
            Channel::new(name)
        })
    }

    /// Forget a channel, removing it from every member and dropping members
    /// left without channels.
    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        let key = self.key(name);
        let chan = self.channels.remove(&key)?;
        debug!(channel = name, members = chan.members.len(), "removing channel");
        for member in &chan.members {
            if let Some(user) = self.users.get_mut(member) {
                user.channels.remove(&key);
            }
            self.drop_if_orphan(member);
        }
        Some(chan)
    }

    /// Channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&self.key(name))
    }

    /// Mutable channel by name.
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        let key = self.key(name);
        self.channels.get_mut(&key)
    }

    /// Whether the bot is in `name`.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(&self.key(name))
    }

    /// All channels.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    // Users

    /// Add a user by nick. Returns the existing user if already known.
    pub fn add_user(&mut self, nick: &str) -> &mut User {
        let key = self.key(nick);
        self.users.entry(key).or_insert_with(|| User::new(nick))
    }

    /// Add a user with ident and host, filling them in if already known.
    pub fn add_user_with_mask(&mut self, nick: &str, ident: &str, host: &str) -> &mut User {
        let user = self.add_user(nick);
        if !ident.is_empty() {
            user.ident = Some(ident.to_string());
        }
        if !host.is_empty() {
            user.host = Some(host.to_string());
        }
        user
    }

    /// Refresh ident, host and display casing of a known user.
    pub fn update_user(&mut self, nick: &str, ident: Option<&str>, host: Option<&str>) {
        if let Some(user) = self.user_mut(nick) {
            user.nick = nick.to_string();
            if let Some(ident) = ident.filter(|i| !i.is_empty()) {
                user.ident = Some(ident.to_string());
            }
            if let Some(host) = host.filter(|h| !h.is_empty()) {
                user.host = Some(host.to_string());
            }
        }
    }

    /// Remove a user and its memberships.
    pub fn remove_user(&mut self, nick: &str) -> Option<User> {
        let key = self.key(nick);
        let user = self.users.remove(&key)?;
        for chan_key in user.channels.keys() {
            if let Some(chan) = self.channels.get_mut(chan_key) {
                chan.members.remove(&key);
            }
        }
        self.tracked.remove(&key);
        self.found.remove(&key);
        Some(user)
    }

    /// User by nick.
    pub fn user(&self, nick: &str) -> Option<&User> {
        self.users.get(&self.key(nick))
    }

    /// Mutable user by nick.
    pub fn user_mut(&mut self, nick: &str) -> Option<&mut User> {
        let key = self.key(nick);
        self.users.get_mut(&key)
    }

    /// Whether a nick is known.
    pub fn has_user(&self, nick: &str) -> bool {
        self.users.contains_key(&self.key(nick))
    }

    /// All users.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    // Membership

    /// Bind a known user to a channel we occupy. No-op if either is unknown.
    pub fn add_user_to_channel(&mut self, nick: &str, channel: &str) {
        let user_key = self.key(nick);
        let chan_key = self.key(channel);
        let (Some(user), Some(chan)) = (
            self.users.get_mut(&user_key),
            self.channels.get_mut(&chan_key),
        ) else {
            return;
        };
        user.channels.entry(chan_key).or_default();
        chan.members.insert(user_key);
    }

    /// Unbind a user from a channel, dropping the user if it was the last.
    pub fn remove_user_from_channel(&mut self, nick: &str, channel: &str) {
        let user_key = self.key(nick);
        let chan_key = self.key(channel);
        if let Some(chan) = self.channels.get_mut(&chan_key) {
            chan.members.remove(&user_key);
        }
        if let Some(user) = self.users.get_mut(&user_key) {
            if user.channels.remove(&chan_key).is_some() {
                self.drop_if_orphan(&user_key);
            }
        }
    }

    /// Replace a user's status symbols in a channel (from NAMES/WHO).
    pub fn set_status(&mut self, nick: &str, channel: &str, symbols: &str) {
        let chan_key = self.key(channel);
        if let Some(status) = self
            .user_mut(nick)
            .and_then(|u| u.channels.get_mut(&chan_key))
        {
            *status = symbols.to_string();
        }
    }

    /// Grant or revoke one status symbol in a channel (from MODE).
    pub fn change_status(&mut self, nick: &str, channel: &str, symbol: char, add: bool) {
        let chan_key = self.key(channel);
        if let Some(user) = self.user_mut(nick) {
            if add {
                user.add_status(&chan_key, symbol);
            } else {
                user.remove_status(&chan_key, symbol);
            }
        }
    }

    /// Rename a user, keeping its memberships. An existing distinct user
    /// holding `new` is removed first.
    pub fn rename_user(&mut self, old: &str, new: &str) {
        let old_key = self.key(old);
        let new_key = self.key(new);
        if !self.users.contains_key(&old_key) {
            return;
        }
        if old_key != new_key && self.users.contains_key(&new_key) {
            debug!(old, new, "nick collision, dropping previous holder");
            self.remove_user(new);
        }
        let Some(mut user) = self.users.remove(&old_key) else {
            return;
        };
        for chan_key in user.channels.keys() {
            if let Some(chan) = self.channels.get_mut(chan_key) {
                chan.members.remove(&old_key);
                chan.members.insert(new_key.clone());
            }
        }
        if self.tracked.remove(&old_key) {
            self.tracked.insert(new_key.clone());
        }
        if self.found.remove(&old_key) {
            self.found.insert(new_key.clone());
        }
        user.nick = new.to_string();
        self.users.insert(new_key, user);
    }

    /// Drop a user seen outside any shared channel, unless it is tracked or
    /// ignored. Returns whether it was dropped.
    pub fn release_user(&mut self, nick: &str) -> bool {
        let key = self.key(nick);
        let keep = self.users.get(&key).map_or(true, |u| u.ignored);
        if keep {
            return false;
        }
        self.drop_if_orphan(&key);
        !self.users.contains_key(&key)
    }

    fn drop_if_orphan(&mut self, user_key: &str) {
        let orphan = self
            .users
            .get(user_key)
            .map_or(false, |u| u.channels.is_empty());
        if orphan && !self.tracked.contains(user_key) {
            debug!(user = user_key, "dropping user with no channels");
            self.users.remove(user_key);
        }
    }

    // Permissions and ignores

    /// Clear every cached permission.
    pub fn reset_all_permissions(&mut self) {
        for user in self.users.values_mut() {
            user.reset_permission();
        }
        for chan in self.channels.values_mut() {
            chan.permission = 0;
            chan.permission_fetched = false;
        }
    }

    /// Mark a user ignored. No-op if unknown.
    pub fn ignore_user(&mut self, nick: &str) {
        if let Some(user) = self.user_mut(nick) {
            user.ignored = true;
        }
    }

    /// Clear a user's ignore flag.
    pub fn unignore_user(&mut self, nick: &str) {
        if let Some(user) = self.user_mut(nick) {
            user.ignored = false;
        }
    }

    /// Whether a user is ignored.
    pub fn is_user_ignored(&self, nick: &str) -> bool {
        self.user(nick).map_or(false, |u| u.ignored)
    }

    /// Mark a channel ignored. No-op if unknown.
    pub fn ignore_channel(&mut self, name: &str) {
        if let Some(chan) = self.channel_mut(name) {
            chan.ignored = true;
        }
    }

    /// Clear a channel's ignore flag.
    pub fn unignore_channel(&mut self, name: &str) {
        if let Some(chan) = self.channel_mut(name) {
            chan.ignored = false;
        }
    }

    /// Whether a channel is ignored.
    pub fn is_channel_ignored(&self, name: &str) -> bool {
        self.channel(name).map_or(false, |c| c.ignored)
    }

    // ISON tracking

    /// Track a nick through ISON; creates the user if unknown.
    pub fn track_user(&mut self, nick: &str) {
        self.add_user(nick);
        let key = self.key(nick);
        self.tracked.insert(key);
    }

    /// Stop tracking a nick. The user is dropped if it has no channels.
    pub fn untrack_user(&mut self, nick: &str) {
        let key = self.key(nick);
        self.tracked.remove(&key);
        self.found.remove(&key);
        self.drop_if_orphan(&key);
    }

    /// Record that a tracked nick is online.
    pub fn found_user(&mut self, nick: &str) {
        let key = self.key(nick);
        if self.tracked.contains(&key) {
            self.found.insert(key);
        }
    }

    /// Record that a tracked nick went offline.
    pub fn lost_user(&mut self, nick: &str) {
        let key = self.key(nick);
        self.found.remove(&key);
    }

    /// Whether a tracked nick was last seen online.
    pub fn is_found(&self, nick: &str) -> bool {
        self.found.contains(&self.key(nick))
    }

    /// Nicks being tracked.
    pub fn tracked_users(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    /// Forget everything (on disconnect).
    pub fn purge(&mut self) {
        self.channels.clear();
        self.users.clear();
        self.found.clear();
        self.tracked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_cleanup_on_remove_channel() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        dir.add_channel("#test");
        dir.add_user_to_channel("Alice", "#test");
        assert!(dir.has_channel("#TEST"));
        dir.remove_channel("#test");
        assert!(dir.user("Alice").is_none());
        assert!(dir.remove_channel("#test").is_none());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        let a = dir.user("ALICE").map(|u| u.nick.clone());
        let b = dir.user("alice").map(|u| u.nick.clone());
        assert_eq!(a.as_deref(), Some("Alice"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rename_keeps_memberships() {
        let mut dir = Directory::new();
        dir.add_user("Bob");
        dir.add_channel("#a");
        dir.add_user_to_channel("Bob", "#a");
        dir.add_channel("#b");
        dir.add_user_to_channel("Bob", "#b");
        dir.rename_user("Bob", "Carol");
        assert!(dir.user("Bob").is_none());
        let carol = dir.user("Carol").unwrap();
        assert_eq!(carol.nick, "Carol");
        assert_eq!(carol.channels().collect::<Vec<_>>(), vec!["#a", "#b"]);
        assert!(dir.channel("#a").unwrap().has_member("carol"));
        assert!(!dir.channel("#a").unwrap().has_member("bob"));
    }

    #[test]
    fn test_rename_collision_new_nick_wins() {
        let mut dir = Directory::new();
        dir.add_user("Bob");
        dir.add_channel("#a");
        dir.add_user_to_channel("Bob", "#a");
        dir.add_user("Carol");
        dir.add_channel("#b");
        dir.add_user_to_channel("Carol", "#b");
        dir.rename_user("Bob", "Carol");
        let carol = dir.user("carol").unwrap();
        assert_eq!(carol.channels().collect::<Vec<_>>(), vec!["#a"]);
        assert!(!dir.channel("#b").unwrap().has_member("carol"));
    }

    #[test]
    fn test_rename_case_only() {
        let mut dir = Directory::new();
        dir.add_user("bob");
        dir.rename_user("bob", "BOB");
        assert_eq!(dir.user("bob").unwrap().nick, "BOB");
    }

    #[test]
    fn test_missing_keys_are_noops() {
        let mut dir = Directory::new();
        dir.remove_user("ghost");
        dir.remove_user_from_channel("ghost", "#nowhere");
        dir.rename_user("ghost", "spirit");
        dir.add_user_to_channel("ghost", "#nowhere");
        dir.update_user("ghost", Some("g"), Some("h"));
        dir.ignore_user("ghost");
        assert!(!dir.has_user("ghost"));
        assert!(!dir.has_user("spirit"));
        assert!(!dir.has_channel("#nowhere"));
    }

    #[test]
    fn test_binding_needs_joined_channel() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        dir.add_user_to_channel("Alice", "#elsewhere");
        assert!(!dir.has_channel("#elsewhere"));
        assert_eq!(dir.user("Alice").unwrap().channel_count(), 0);
    }

    #[test]
    fn test_release_user() {
        let mut dir = Directory::new();
        dir.add_user("Stranger");
        dir.add_user("Friend");
        dir.track_user("Friend");
        dir.add_user("Pest");
        dir.ignore_user("Pest");
        dir.add_channel("#a");
        dir.add_user("Member");
        dir.add_user_to_channel("Member", "#a");

        assert!(dir.release_user("stranger"));
        assert!(!dir.release_user("Friend"));
        assert!(!dir.release_user("Pest"));
        assert!(!dir.release_user("Member"));
        assert!(!dir.release_user("ghost"));
        assert_eq!(dir.users().count(), 3);
    }

    #[test]
    fn test_last_part_drops_user() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        dir.add_channel("#a");
        dir.add_user_to_channel("Alice", "#a");
        dir.add_channel("#b");
        dir.add_user_to_channel("Alice", "#b");
        dir.remove_user_from_channel("Alice", "#a");
        assert!(dir.has_user("Alice"));
        dir.remove_user_from_channel("Alice", "#b");
        assert!(!dir.has_user("Alice"));
        assert_eq!(dir.channel("#b").unwrap().member_count(), 0);
    }

    #[test]
    fn test_remove_user_cascades_membership() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        dir.add_channel("#a");
        dir.add_user_to_channel("Alice", "#a");
        dir.remove_user("alice");
        assert!(!dir.channel("#a").unwrap().has_member("alice"));
    }

    #[test]
    fn test_status_tracking() {
        let mut dir = Directory::new();
        dir.add_user("Alice");
        dir.add_channel("#a");
        dir.add_user_to_channel("Alice", "#a");
        dir.set_status("Alice", "#A", "@");
        dir.change_status("alice", "#a", '+', true);
        assert_eq!(dir.user("Alice").unwrap().status("#a"), Some("@+"));
        dir.change_status("alice", "#a", '@', false);
        assert!(!dir.user("Alice").unwrap().has_status("#a", '@'));
    }

    #[test]
    fn test_reset_all_permissions() {
        let mut dir = Directory::new();
        let user = dir.add_user_with_mask("Alice", "alice", "example.com");
        user.permission = 10;
        user.permission_fetched = true;
        dir.reset_all_permissions();
        let user = dir.user("Alice").unwrap();
        assert_eq!(user.permission, 0);
        assert!(!user.has_permission());
        assert!(user.can_get_permission());
    }

    #[test]
    fn test_tracked_user_survives_part() {
        let mut dir = Directory::new();
        dir.track_user("Friend");
        dir.add_channel("#a");
        dir.add_user_to_channel("Friend", "#a");
        dir.remove_user_from_channel("Friend", "#a");
        assert!(dir.has_user("Friend"));
        dir.found_user("friend");
        assert!(dir.is_found("FRIEND"));
        dir.untrack_user("Friend");
        assert!(!dir.has_user("Friend"));
    }

    #[test]
    fn test_rehash_ascii() {
        let mut dir = Directory::new();
        dir.add_user("nick[1]");
        assert!(dir.has_user("NICK{1}"));
        dir.rehash(Casemapping::Ascii);
        assert!(!dir.has_user("NICK{1}"));
        assert!(dir.has_user("NICK[1]"));
    }
}
