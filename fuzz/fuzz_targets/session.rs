//! Fuzz target feeding arbitrary lines to a registered session.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use slirc_bot::{NetworkConfig, NoPermissions, Session};

fuzz_target!(|data: &[u8]| {
    let config = NetworkConfig::new("FuzzNet", "irc.example.com", 6667, "Bot");
    let mut session = Session::new(config, Arc::new(NoPermissions));
    session.start();
    session.handle_line(":irc.example.com 001 Bot :Welcome to the FuzzNet IRC Network Bot");
    session.handle_line(":Bot!bot@host JOIN #fuzz");

    for line in String::from_utf8_lossy(data).split('\n') {
        let _ = session.handle_line(line);
    }
});
