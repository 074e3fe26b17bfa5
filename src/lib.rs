//! # slirc-bot
//!
//! An IRC client bot engine: it keeps a connection to an IRC server, parses
//! the line protocol, learns server capabilities from ISUPPORT, tracks
//! channels and users, and raises events to pluggable handlers.
//!
//! ## Features
//!
//! - Tokenizer for IRC lines that tolerates what real servers send
//! - MODE grammar parsing driven by negotiated parameter modes
//! - ISUPPORT (RPL_ISUPPORT) accumulation across multiple 005 lines
//! - Case-mapped channel and user directory with referential cleanup
//! - Sans-IO protocol [`Session`](state::Session) that turns lines into actions
//! - Optional Tokio transport (plain or TLS) and reconnecting [`Client`]
//!
//! The `tokio` feature (on by default) enables the transport, the client and
//! the `slirc-bot` binary. Everything else builds without an async runtime.

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Driving a session by hand
//!
//! ```rust
//! use std::sync::Arc;
//! use slirc_bot::{Action, Event, NetworkConfig, NoPermissions, Session};
//!
//! let config = NetworkConfig::new("ExampleNet", "irc.example.com", 6667, "Bot")
//!     .with_channel("#rust", None);
//! let mut session = Session::new(config, Arc::new(NoPermissions));
//! session.start();
//!
//! let actions = session.handle_line(":irc.example.com 001 Bot :Welcome to the ExampleNet IRC Network");
//! assert!(actions.contains(&Action::Emit(Event::Connect { nick: "Bot".into() })));
//! assert!(actions.contains(&Action::Send("JOIN #rust".into())));
//! ```
//!
//! ### Parsing modes
//!
//! ```rust
//! use slirc_bot::mode::{parse_mode_line, Mode, ParamModes};
//!
//! let params: ParamModes = "ov".chars().collect();
//! let modes = parse_mode_line("+ov-s Alice Bob", &params);
//! assert_eq!(modes[0], Mode::Plus('o', Some("Alice".into())));
//! assert_eq!(modes[2], Mode::Minus('s', None));
//! ```

pub mod casemap;
pub mod command;
pub mod config;
pub mod ctcp;
pub mod directory;
pub mod error;
pub mod event;
pub mod isupport;
pub mod message;
pub mod mode;
pub mod module;
pub mod permission;
pub mod response;
pub mod state;
#[cfg(feature = "proptest")]
pub mod strategies;

#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::casemap::Casemapping;
pub use self::command::{Command, Verb};
pub use self::config::{BotConfig, NetworkConfig, TlsVerification, TransportKind};
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::directory::{Channel, Directory, User};
pub use self::error::{ConfigError, MessageParseError, PermissionError, TransportError};
pub use self::event::{Actor, Event, EventHandler, EventKind};
pub use self::isupport::{Limit, ServerCapabilities, ServerInfo};
pub use self::message::{MessageRef, Source};
pub use self::mode::{parse_modes, Mode, ParamModes};
pub use self::module::ModuleRegistry;
pub use self::permission::{NoPermissions, PermissionStore};
pub use self::response::Response;
pub use self::state::{Action, ConnectionState, Session};

#[cfg(feature = "tokio")]
pub use self::client::Client;
#[cfg(feature = "tokio")]
pub use self::transport::{LineReader, LineWriter, Transport};
