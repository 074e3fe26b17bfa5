//! IRC case-mapping.
//!
//! Nick and channel keys are compared case-insensitively, but what counts as
//! "the same letter" depends on the server's advertised `CASEMAPPING`. The
//! directory keys every entity through one of these mappings.

/// Case-mapping rules a server can advertise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Casemapping {
    /// Only `A-Z` fold to `a-z`.
    Ascii,
    /// ASCII plus `[]\~` fold to `{}|^`.
    #[default]
    Rfc1459,
    /// ASCII plus `[]\` fold to `{}|`; `~` and `^` stay distinct.
    StrictRfc1459,
}

impl Casemapping {
    /// Resolve an ISUPPORT `CASEMAPPING` value. Unknown values map to `None`.
    pub fn from_token(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ascii" => Some(Casemapping::Ascii),
            "rfc1459" => Some(Casemapping::Rfc1459),
            "strict-rfc1459" => Some(Casemapping::StrictRfc1459),
            _ => None,
        }
    }

    #[inline]
    fn fold(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => c.to_ascii_lowercase(),
            (Casemapping::Ascii, _) => c,
            (_, '[') => '{',
            (_, ']') => '}',
            (_, '\\') => '|',
            (Casemapping::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a nick or channel name into its lookup key.
    pub fn to_lower(self, s: &str) -> String {
        s.chars().map(|c| self.fold(c)).collect()
    }

    /// Compare two names under this mapping.
    pub fn names_eq(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a
                .chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold(ca) == self.fold(cb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc1459_folding() {
        let map = Casemapping::Rfc1459;
        assert_eq!(map.to_lower("Nick[Away]"), "nick{away}");
        assert_eq!(map.to_lower("a\\b~c"), "a|b^c");
        assert!(map.names_eq("ALICE", "alice"));
        assert!(map.names_eq("foo[1]", "FOO{1}"));
        assert!(!map.names_eq("alice", "alicia"));
    }

    #[test]
    fn test_ascii_leaves_brackets() {
        let map = Casemapping::Ascii;
        assert_eq!(map.to_lower("Nick[Away]"), "nick[away]");
        assert!(!map.names_eq("foo[", "foo{"));
    }

    #[test]
    fn test_strict_rfc1459_tilde() {
        let map = Casemapping::StrictRfc1459;
        assert_eq!(map.to_lower("A~[\\]"), "a~{|}");
        assert!(!map.names_eq("~", "^"));
    }

    #[test]
    fn test_from_token() {
        assert_eq!(Casemapping::from_token("ascii"), Some(Casemapping::Ascii));
        assert_eq!(
            Casemapping::from_token("STRICT-RFC1459"),
            Some(Casemapping::StrictRfc1459)
        );
        assert_eq!(Casemapping::from_token("rfc7613"), None);
    }
}
