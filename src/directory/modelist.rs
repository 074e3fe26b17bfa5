//! Per-letter channel lists (bans, exceptions, invite exceptions, ...).

/// Entries of one list mode on one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeList {
    letter: char,
    entries: Vec<String>,
}

impl ModeList {
    /// Empty list for `letter`.
    pub fn new(letter: char) -> Self {
        ModeList {
            letter,
            entries: Vec::new(),
        }
    }

    /// The mode letter this list belongs to.
    pub fn letter(&self) -> char {
        self.letter
    }

    /// Add a mask. Duplicates (case-insensitive) are ignored.
    pub fn add(&mut self, mask: &str) {
        if mask.is_empty() || self.contains(mask) {
            return;
        }
        self.entries.push(mask.to_string());
    }

    /// Remove a mask; returns whether it was present.
    pub fn remove(&mut self, mask: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !e.eq_ignore_ascii_case(mask));
        self.entries.len() != before
    }

    /// Exact (case-insensitive) membership.
    pub fn contains(&self, mask: &str) -> bool {
        self.entries.iter().any(|e| e.eq_ignore_ascii_case(mask))
    }

    /// First entry whose wildcard mask matches `needle`.
    ///
    /// A needle that is a bare nick is widened to `nick!*@*`.
    pub fn find(&self, needle: &str) -> Option<&str> {
        let widened;
        let needle = if needle.contains('!') || needle.contains('@') {
            needle
        } else {
            widened = format!("{}!*@*", needle);
            &widened
        };
        self.entries
            .iter()
            .find(|mask| wildcard_match(mask, needle))
            .map(String::as_str)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Case-insensitive glob match supporting `*` and `?`.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let t: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*!*@*.example.com", "alice!a@host.example.com"));
        assert!(wildcard_match("a?ice!*@*", "ALICE!x@y"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("bob!*@*", "alice!a@b"));
        assert!(!wildcard_match("*.org", "host.com"));
    }

    #[test]
    fn test_find_widens_bare_nick() {
        let mut bans = ModeList::new('b');
        bans.add("Troll!*@*");
        bans.add("*!*@bad.host");
        assert_eq!(bans.find("troll"), Some("Troll!*@*"));
        assert_eq!(bans.find("nick!user@bad.host"), Some("*!*@bad.host"));
        assert_eq!(bans.find("friend"), None);
    }

    #[test]
    fn test_add_remove() {
        let mut list = ModeList::new('e');
        list.add("a!*@*");
        list.add("A!*@*");
        list.add("");
        assert_eq!(list.len(), 1);
        assert!(list.remove("a!*@*"));
        assert!(!list.remove("a!*@*"));
        assert!(list.is_empty());
    }
}
