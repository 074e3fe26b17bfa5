//! Fuzz target for MODE decoding under arbitrary parameter-mode sets.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_bot::mode::{apply_modes, parse_mode_line, ParamModes};

fuzz_target!(|data: (&str, &str)| {
    let (letters, line) = data;
    let params: ParamModes = letters.chars().take(32).collect();
    let modes = parse_mode_line(line, &params);
    let _ = apply_modes("", &modes);
});
