//! MODE line grammar.
//!
//! A mode string packs several changes into one token (`+ov-s`) followed by
//! positional parameters. Which letters consume a parameter is negotiated
//! through ISUPPORT, so the parser takes the current set as input.

use std::collections::BTreeSet;

/// One mode change.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Mode set (`+x`), with its parameter if the letter takes one.
    Plus(char, Option<String>),
    /// Mode unset (`-x`), with its parameter if the letter takes one.
    Minus(char, Option<String>),
}

impl Mode {
    /// The mode letter.
    pub fn letter(&self) -> char {
        match self {
            Mode::Plus(c, _) | Mode::Minus(c, _) => *c,
        }
    }

    /// The parameter, or `""` when there is none.
    pub fn arg(&self) -> &str {
        match self {
            Mode::Plus(_, arg) | Mode::Minus(_, arg) => arg.as_deref().unwrap_or(""),
        }
    }

    /// Whether this change adds the mode.
    pub fn is_plus(&self) -> bool {
        matches!(self, Mode::Plus(..))
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_plus() { '+' } else { '-' };
        write!(f, "{}{}", sign, self.letter())?;
        if !self.arg().is_empty() {
            write!(f, " {}", self.arg())?;
        }
        Ok(())
    }
}

/// Letters used before any ISUPPORT arrives.
pub const LEGACY_PARAM_MODES: &str = "ovbek";

/// Set of mode letters that consume a positional parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamModes {
    letters: BTreeSet<char>,
}

impl Default for ParamModes {
    fn default() -> Self {
        ParamModes::legacy()
    }
}

impl ParamModes {
    /// The fixed pre-ISUPPORT set `{o, v, b, e, k}`.
    pub fn legacy() -> Self {
        LEGACY_PARAM_MODES.chars().collect()
    }

    /// Whether `letter` takes a parameter.
    pub fn contains(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }

    /// Iterate the letters in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.letters.iter().copied()
    }

    /// Number of letters in the set.
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

impl FromIterator<char> for ParamModes {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        ParamModes {
            letters: iter.into_iter().collect(),
        }
    }
}

/// Decode a mode string and its trailing parameter tokens.
///
/// The Nth parameterized letter takes the Nth token. A parameterized letter
/// with no token left gets an empty parameter. A string without a leading
/// sign is read as `+`. Surplus tokens are ignored.
pub fn parse_modes(modes: &str, args: &[&str], params: &ParamModes) -> Vec<Mode> {
    let mut res = Vec::with_capacity(modes.len());
    let mut args = args.iter().filter(|a| !a.is_empty());
    let mut plus = true;

    for c in modes.chars() {
        match c {
            '+' => plus = true,
            '-' => plus = false,
            ' ' => continue,
            _ => {
                let arg = if params.contains(c) {
                    Some(args.next().map(|a| a.to_string()).unwrap_or_default())
                } else {
                    None
                };
                res.push(if plus {
                    Mode::Plus(c, arg)
                } else {
                    Mode::Minus(c, arg)
                });
            }
        }
    }

    res
}

/// Decode a whole MODE parameter string, e.g. `+ov-b Alice Bob *!*@host`.
pub fn parse_mode_line(line: &str, params: &ParamModes) -> Vec<Mode> {
    let mut pieces = line.split(' ').filter(|p| !p.is_empty());
    match pieces.next() {
        Some(modes) => {
            let args: Vec<&str> = pieces.collect();
            parse_modes(modes, &args, params)
        }
        None => Vec::new(),
    }
}

/// Decode a user-mode string; user modes never take parameters here.
pub fn parse_user_modes(modes: &str) -> Vec<Mode> {
    parse_modes(modes, &[], &ParamModes::from_iter(std::iter::empty()))
}

/// Apply changes to a flat mode string such as `iw`, keeping letter order.
pub fn apply_modes(current: &str, changes: &[Mode]) -> String {
    let mut out: String = current.chars().filter(|c| *c != '+').collect();
    for mode in changes {
        let letter = mode.letter();
        if mode.is_plus() {
            if !out.contains(letter) {
                out.push(letter);
            }
        } else {
            out.retain(|c| c != letter);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(letters: &str) -> ParamModes {
        letters.chars().collect()
    }

    #[test]
    fn test_mixed_polarity() {
        // MODE #chan +ov-s Alice Bob
        let modes = parse_modes("+ov-s", &["Alice", "Bob"], &set("ov"));
        assert_eq!(
            modes,
            vec![
                Mode::Plus('o', Some("Alice".into())),
                Mode::Plus('v', Some("Bob".into())),
                Mode::Minus('s', None),
            ]
        );
        assert_eq!(modes[2].arg(), "");
    }

    #[test]
    fn test_missing_parameter_degrades() {
        // MODE #chan +ob Alice   (truncated)
        let modes = parse_modes("+ob", &["Alice"], &set("ob"));
        assert_eq!(modes.len(), 2);
        assert_eq!(modes[1], Mode::Plus('b', Some(String::new())));
        assert_eq!(modes[1].arg(), "");
    }

    #[test]
    fn test_no_parameters() {
        let modes = parse_modes("+i", &[], &ParamModes::legacy());
        assert_eq!(modes, vec![Mode::Plus('i', None)]);
    }

    #[test]
    fn test_no_leading_sign_is_plus() {
        let modes = parse_modes("nt", &[], &ParamModes::legacy());
        assert!(modes.iter().all(Mode::is_plus));
        assert_eq!(modes.len(), 2);
    }

    #[test]
    fn test_parameter_order_matches_letters() {
        // MODE #chan -b+kl *!*@bad key 10
        let modes = parse_mode_line("-b+kl *!*@bad key 10", &set("bkl"));
        assert_eq!(modes[0], Mode::Minus('b', Some("*!*@bad".into())));
        assert_eq!(modes[1], Mode::Plus('k', Some("key".into())));
        assert_eq!(modes[2], Mode::Plus('l', Some("10".into())));
    }

    #[test]
    fn test_surplus_tokens_ignored() {
        let modes = parse_modes("+o", &["Alice", "extra"], &set("o"));
        assert_eq!(modes, vec![Mode::Plus('o', Some("Alice".into()))]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_mode_line("", &ParamModes::legacy()).is_empty());
        assert!(parse_modes("+-", &[], &ParamModes::legacy()).is_empty());
    }

    #[test]
    fn test_apply_modes() {
        let changes = parse_user_modes("+iw-x");
        assert_eq!(apply_modes("x", &changes), "iw");
        assert_eq!(apply_modes("+iw", &parse_user_modes("-i+s")), "ws");
        assert_eq!(apply_modes("iw", &parse_user_modes("+i")), "iw");
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::Plus('o', Some("Alice".into())).to_string(), "+o Alice");
        assert_eq!(Mode::Minus('s', None).to_string(), "-s");
    }
}
