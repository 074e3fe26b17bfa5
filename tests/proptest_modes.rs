//! Property-based tests for the MODE grammar.
//!
//! Run with: `cargo test --features proptest`

use proptest::prelude::*;
use slirc_bot::mode::{apply_modes, parse_mode_line, parse_modes, Mode, ParamModes};
use slirc_bot::strategies::{mode_args as tokens, mode_string};

// =============================================================================
// STRATEGIES
// =============================================================================

fn param_letters() -> impl Strategy<Value = ParamModes> {
    prop::collection::btree_set(prop::char::range('a', 'z'), 0..8)
        .prop_map(|set| set.into_iter().collect())
}

fn letter_count(modes: &str) -> usize {
    modes.chars().filter(|c| *c != '+' && *c != '-').count()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// One change per letter, whatever the parameters.
    #[test]
    fn one_change_per_letter(modes in mode_string(), args in tokens(), params in param_letters()) {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let parsed = parse_modes(&modes, &args, &params);
        prop_assert_eq!(parsed.len(), letter_count(&modes));
    }

    /// The Kth parameterized letter takes the Kth token, or nothing once
    /// the tokens run out.
    #[test]
    fn parameters_bind_positionally(modes in mode_string(), args in tokens(), params in param_letters()) {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let parsed = parse_modes(&modes, &refs, &params);

        let mut next = 0;
        for change in &parsed {
            if params.contains(change.letter()) {
                let expected = args.get(next).map(String::as_str).unwrap_or("");
                prop_assert_eq!(change.arg(), expected);
                next += 1;
            } else {
                prop_assert_eq!(change.arg(), "");
            }
        }
    }

    /// Polarity follows the most recent sign.
    #[test]
    fn polarity_follows_sign(modes in mode_string()) {
        let parsed = parse_modes(&modes, &[], &ParamModes::legacy());
        let signs: Vec<bool> = modes
            .as_bytes()
            .chunks(2)
            .map(|pair| pair[0] == b'+')
            .collect();
        prop_assert_eq!(parsed.iter().map(Mode::is_plus).collect::<Vec<_>>(), signs);
    }

    /// A whole line parses the same as its split form.
    #[test]
    fn line_matches_split(modes in mode_string(), args in tokens()) {
        let line = std::iter::once(modes.clone()).chain(args.iter().cloned()).collect::<Vec<_>>().join(" ");
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let params = ParamModes::legacy();
        prop_assert_eq!(parse_mode_line(&line, &params), parse_modes(&modes, &refs, &params));
    }

    /// Applied flags never repeat and removed flags are gone.
    #[test]
    fn applied_flags_are_a_set(first in mode_string(), second in mode_string()) {
        let none = ParamModes::from_iter(std::iter::empty());
        let once = apply_modes("", &parse_modes(&first, &[], &none));
        let twice = apply_modes(&once, &parse_modes(&second, &[], &none));

        let mut seen = std::collections::HashSet::new();
        prop_assert!(twice.chars().all(|c| seen.insert(c)));
        if let Some(Mode::Minus(last, _)) = parse_modes(&second, &[], &none).last() {
            prop_assert!(!twice.contains(*last));
        }
    }
}
