//! Benchmarks for line tokenizing, MODE decoding and session dispatch.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slirc_bot::mode::{parse_mode_line, ParamModes};
use slirc_bot::{MessageRef, NetworkConfig, NoPermissions, ServerCapabilities, Session};

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

/// Message with a full source
const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

/// Numeric response
const NUMERIC_RESPONSE: &str = ":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

/// WHO reply with every field populated
const WHO_REPLY: &str = ":irc.server.net 352 Bot #channel ident some.long.host.example irc.server.net Alice H@ :0 Alice Liddell";

/// A full ISUPPORT line
const ISUPPORT: &str = ":irc.server.net 005 Bot CHANTYPES=#& EXCEPTS INVEX CHANMODES=eIbq,k,flj,CFLMPQScgimnprstz CHANLIMIT=#&:15 PREFIX=(ov)@+ MAXLIST=bqeI:100 MODES=4 NETWORK=ExampleNet STATUSMSG=@+ CALLERID=g CASEMAPPING=rfc1459 :are supported by this server";

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Tokenizing");

    for (name, line) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("numeric_response", NUMERIC_RESPONSE),
        ("who_reply", WHO_REPLY),
        ("isupport", ISUPPORT),
    ] {
        group.bench_with_input(BenchmarkId::new("parse", name), line, |b, s| {
            b.iter(|| {
                let msg = MessageRef::parse(black_box(s)).unwrap();
                black_box(msg.params.len())
            })
        });
    }

    group.finish();
}

fn benchmark_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mode Decoding");
    let legacy = ParamModes::legacy();

    group.bench_function("short", |b| {
        b.iter(|| black_box(parse_mode_line(black_box("+o Alice"), &legacy)))
    });

    group.bench_function("mixed", |b| {
        b.iter(|| {
            black_box(parse_mode_line(
                black_box("+ov-b+ntk-e Alice Bob *!*@spam.example secret *!*@friend"),
                &legacy,
            ))
        })
    });

    group.finish();
}

fn benchmark_isupport(c: &mut Criterion) {
    let msg = MessageRef::parse(ISUPPORT).unwrap();
    c.bench_function("isupport_apply", |b| {
        b.iter(|| {
            let mut caps = ServerCapabilities::new();
            caps.apply_reply(black_box(&msg.params));
            black_box(caps)
        })
    });
}

fn benchmark_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("Session Dispatch");
    let config = NetworkConfig::new("ExampleNet", "irc.example.com", 6667, "Bot");
    let mut session = Session::new(config, Arc::new(NoPermissions));
    session.start();
    session.handle_line(":irc.example.com 001 Bot :Welcome to the ExampleNet IRC Network Bot");
    session.handle_line(":Bot!bot@bot.host JOIN #channel");

    group.bench_function("privmsg", |b| {
        b.iter(|| black_box(session.handle_line(black_box(PREFIX_MESSAGE))))
    });

    group.bench_function("who_reply", |b| {
        b.iter(|| black_box(session.handle_line(black_box(WHO_REPLY))))
    });

    group.bench_function("ping", |b| {
        b.iter(|| black_box(session.handle_line(black_box(SIMPLE_MESSAGE))))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_modes,
    benchmark_isupport,
    benchmark_session,
);

criterion_main!(benches);
