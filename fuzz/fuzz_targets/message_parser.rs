//! Fuzz target for the IRC line tokenizer.
//!
//! Any input must either tokenize or return an error; it must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.len() > 8191 {
            return;
        }
        if let Ok(msg) = slirc_bot::MessageRef::parse(input) {
            let _ = msg.source_nick();
            let _ = msg.trailing();
            let _ = slirc_bot::Ctcp::parse(msg.params.last().copied().unwrap_or(""));
        }
    }
});
