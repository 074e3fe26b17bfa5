//! Structured ISUPPORT values: `PREFIX`, `CHANMODES` and `MAXLIST`.

use tracing::warn;

/// Status prefixes: mode letters paired positionally with their symbols.
///
/// `PREFIX=(ov)@+` pairs `o` with `@` and `v` with `+`. Order is rank order,
/// highest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixTable {
    letters: String,
    symbols: String,
}

impl PrefixTable {
    /// Parse the `(letters)symbols` form.
    ///
    /// Unequal halves are truncated to the shorter one; a value with no
    /// parentheses is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix('(')?;
        let (letters, symbols) = rest.split_once(')')?;
        let pairs = letters.chars().count().min(symbols.chars().count());
        if pairs != letters.chars().count() || pairs != symbols.chars().count() {
            warn!(value, "PREFIX halves differ in length, truncating");
        }
        Some(PrefixTable {
            letters: letters.chars().take(pairs).collect(),
            symbols: symbols.chars().take(pairs).collect(),
        })
    }

    /// Mode letters, in rank order.
    pub fn letters(&self) -> &str {
        &self.letters
    }

    /// Display symbols, in rank order.
    pub fn symbols(&self) -> &str {
        &self.symbols
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Symbol for a mode letter (`o` → `@`).
    pub fn symbol_for(&self, letter: char) -> Option<char> {
        let idx = self.letters.chars().position(|c| c == letter)?;
        self.symbols.chars().nth(idx)
    }

    /// Mode letter for a symbol (`@` → `o`).
    pub fn letter_for(&self, symbol: char) -> Option<char> {
        let idx = self.symbols.chars().position(|c| c == symbol)?;
        self.letters.chars().nth(idx)
    }

    /// Split leading status symbols off a NAMES entry: `@+Alice` → (`@+`, `Alice`).
    pub fn strip<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        let end = name
            .char_indices()
            .find(|(_, c)| !self.symbols.contains(*c))
            .map(|(i, _)| i)
            .unwrap_or(name.len());
        name.split_at(end)
    }
}

/// The four `CHANMODES` classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChanModeClasses {
    /// Type A: list modes such as `b`, `e`, `I`.
    pub list: String,
    /// Type B: always take a parameter, such as `k`.
    pub always: String,
    /// Type C: take a parameter only when set, such as `l`.
    pub set_only: String,
    /// Type D: never take a parameter, such as `n`, `t`.
    pub flags: String,
}

impl ChanModeClasses {
    /// Parse a `CHANMODES` value.
    ///
    /// Anything other than exactly four comma-separated groups is treated as
    /// one parameterless group.
    pub fn parse(value: &str) -> Self {
        let groups: Vec<&str> = value.split(',').collect();
        match groups.as_slice() {
            [list, always, set_only, flags] => ChanModeClasses {
                list: list.to_string(),
                always: always.to_string(),
                set_only: set_only.to_string(),
                flags: flags.to_string(),
            },
            _ => {
                warn!(value, "CHANMODES does not have four groups");
                ChanModeClasses {
                    flags: value.to_string(),
                    ..Default::default()
                }
            }
        }
    }

    /// Whether `letter` is a list mode.
    pub fn is_list(&self, letter: char) -> bool {
        self.list.contains(letter)
    }
}

/// `MAXLIST` entries: mode letters sharing one list-size limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaxList {
    entries: Vec<(char, u32)>,
}

impl MaxList {
    /// Parse `b:60,e:60,I:60` or the grouped form `beI:100`.
    ///
    /// Returns `None` if no part parsed, leaving the caller's limits alone.
    pub fn parse(value: &str) -> Option<Self> {
        let mut entries: Vec<(char, u32)> = Vec::new();
        for part in value.split(',').filter(|p| !p.is_empty()) {
            let Some((modes, limit)) = part.split_once(':') else {
                warn!(part, "MAXLIST entry without a count");
                continue;
            };
            let Ok(limit) = limit.parse::<u32>() else {
                warn!(part, "MAXLIST entry with a non-numeric count");
                continue;
            };
            for ch in modes.chars() {
                entries.retain(|(c, _)| *c != ch);
                entries.push((ch, limit));
            }
        }
        if entries.is_empty() {
            None
        } else {
            Some(MaxList { entries })
        }
    }

    /// Limit for one list letter.
    pub fn limit_for(&self, mode: char) -> Option<u32> {
        self.entries.iter().find(|(c, _)| *c == mode).map(|(_, n)| *n)
    }

    /// All `(letter, limit)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.entries.iter().copied()
    }
}
