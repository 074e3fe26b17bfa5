//! Permission lookups against an external store.

use crate::error::PermissionError;

/// Source of permission levels for users and channels.
///
/// The session calls this lazily and caches the answer per user until
/// [`Directory::reset_all_permissions`](crate::directory::Directory::reset_all_permissions).
/// Errors degrade to level 0.
pub trait PermissionStore: Send + Sync {
    /// Level for a user identified by nick, ident and host.
    fn fetch_permission(&self, nick: &str, ident: &str, host: &str) -> Result<i32, PermissionError>;

    /// Level for a channel on a network.
    fn fetch_channel_permission(&self, _channel: &str, _network: &str) -> Result<i32, PermissionError> {
        Ok(0)
    }
}

/// Store that grants nobody anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPermissions;

impl PermissionStore for NoPermissions {
    fn fetch_permission(&self, _nick: &str, _ident: &str, _host: &str) -> Result<i32, PermissionError> {
        Ok(0)
    }
}

/// Resolve a user's level, treating store failures as 0.
pub(crate) fn resolve(store: &dyn PermissionStore, nick: &str, ident: &str, host: &str) -> i32 {
    match store.fetch_permission(nick, ident, host) {
        Ok(level) => level,
        Err(e) => {
            tracing::warn!(nick, error = %e, "permission lookup failed, using 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl PermissionStore for Broken {
        fn fetch_permission(&self, _: &str, _: &str, _: &str) -> Result<i32, PermissionError> {
            Err(PermissionError::Unavailable("db down".into()))
        }
    }

    #[test]
    fn test_failure_degrades_to_zero() {
        assert_eq!(resolve(&Broken, "a", "b", "c"), 0);
        assert_eq!(resolve(&NoPermissions, "a", "b", "c"), 0);
        assert_eq!(Broken.fetch_channel_permission("#a", "net"), Ok(0));
    }
}
