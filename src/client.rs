//! Connection lifecycle controller.
//!
//! A [`Client`] owns one network: it opens the transport with bounded retry,
//! registers, runs the reader task that feeds the [`Session`], delivers events
//! to handlers and reconnects when asked to. Cloning a `Client` is cheap; all
//! clones drive the same connection.
//!
//! ```no_run
//! # async fn run() {
//! use std::sync::Arc;
//! use slirc_bot::client::Client;
//! use slirc_bot::config::NetworkConfig;
//! use slirc_bot::event::Event;
//! use slirc_bot::permission::NoPermissions;
//!
//! let config = NetworkConfig::new("ExampleNet", "irc.example.com", 6667, "Bot")
//!     .with_channel("#rust", None);
//! let log = |event: &Event| println!("{:?}", event);
//! let client = Client::new(config, vec![Arc::new(log)], Arc::new(NoPermissions));
//! client.start();
//! client.wait().await;
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::config::NetworkConfig;
use crate::error::TransportError;
use crate::event::{Event, EventHandler};
use crate::permission::PermissionStore;
use crate::state::{Action, Session};
use crate::transport::{LineReader, LineWriter, Transport, CONNECT_TIMEOUT};

/// Connect attempts per `connect()` before giving up.
pub const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Charset used when the configured one is unknown.
pub const FALLBACK_CHARSET: &str = "utf-8";

struct Inner {
    config: NetworkConfig,
    session: Mutex<Session>,
    handlers: Vec<Arc<dyn EventHandler>>,
    writer: Mutex<Option<LineWriter>>,
    close_reason: Mutex<Option<String>>,
    running: AtomicBool,
    reconnect_requested: AtomicBool,
    quitting: AtomicBool,
    finished: Notify,
}

/// Handle to one network connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Client for `config`, delivering events to `handlers` in order.
    pub fn new(
        config: NetworkConfig,
        handlers: Vec<Arc<dyn EventHandler>>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        let session = Session::new(config.clone(), permissions);
        Client {
            inner: Arc::new(Inner {
                config,
                session: Mutex::new(session),
                handlers,
                writer: Mutex::new(None),
                close_reason: Mutex::new(None),
                running: AtomicBool::new(false),
                reconnect_requested: AtomicBool::new(false),
                quitting: AtomicBool::new(false),
                finished: Notify::new(),
            }),
        }
    }

    /// Connect if the network is marked for startup and not yet running.
    pub fn start(&self) {
        if !self.inner.config.startup {
            debug!(network = %self.inner.config.network, "startup disabled");
            return;
        }
        self.connect();
    }

    /// Spawn the connection task unless one is already running.
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!(network = %self.inner.config.network, "already running");
            return;
        }
        self.inner.quitting.store(false, Ordering::SeqCst);
        tokio::spawn(supervise(Arc::clone(&self.inner)));
    }

    /// Send QUIT with `reason`, then connect again.
    pub async fn reconnect(&self, reason: &str) {
        if self.inner.running.load(Ordering::SeqCst) {
            self.inner.quitting.store(false, Ordering::SeqCst);
            self.inner.request_reconnect(reason).await;
        } else {
            self.connect();
        }
    }

    /// Close the transport. The client reconnects only if a reconnect was
    /// already requested.
    pub async fn disconnect(&self) {
        self.inner.close("disconnect requested").await;
    }

    /// Send QUIT and close without reconnecting. A connect still in progress
    /// is abandoned.
    pub async fn quit(&self, message: Option<&str>) {
        let message = message.unwrap_or(&self.inner.config.quit_message).to_string();
        self.inner.quitting.store(true, Ordering::SeqCst);
        self.inner.reconnect_requested.store(false, Ordering::SeqCst);
        if let Err(e) = self.inner.send(&Command::QUIT(Some(message.clone())).to_string()).await {
            debug!(error = %e, "QUIT not sent");
        }
        self.inner.close(&message).await;
    }

    /// Write a raw protocol line.
    pub async fn raw(&self, line: &str) -> Result<(), TransportError> {
        self.inner.send(line).await
    }

    async fn send(&self, cmd: Command) -> Result<(), TransportError> {
        self.inner.send(&cmd.to_string()).await
    }

    /// PRIVMSG.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(Command::PRIVMSG(target.to_string(), text.to_string())).await
    }

    /// NOTICE.
    pub async fn notice(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.send(Command::NOTICE(target.to_string(), text.to_string())).await
    }

    /// CTCP ACTION.
    pub async fn action(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.ctcp(target, "ACTION", Some(text)).await
    }

    /// CTCP request.
    pub async fn ctcp(&self, target: &str, verb: &str, text: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::CTCP(
            target.to_string(),
            verb.to_string(),
            text.map(str::to_string),
        ))
        .await
    }

    /// CTCP reply.
    pub async fn ctcp_reply(&self, target: &str, verb: &str, text: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::CTCPREPLY(
            target.to_string(),
            verb.to_string(),
            text.map(str::to_string),
        ))
        .await
    }

    /// JOIN, with an optional key.
    pub async fn join(&self, channel: &str, key: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::JOIN(channel.to_string(), key.map(str::to_string))).await
    }

    /// PART, with an optional reason.
    pub async fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::PART(channel.to_string(), reason.map(str::to_string))).await
    }

    /// PART then JOIN again, keeping the known key.
    pub async fn cycle(&self, channel: &str) -> Result<(), TransportError> {
        let key = self
            .inner
            .session
            .lock()
            .directory()
            .channel(channel)
            .and_then(|c| c.key.clone());
        self.part(channel, None).await?;
        self.join(channel, key.as_deref()).await
    }

    /// WHOIS.
    pub async fn whois(&self, nick: &str) -> Result<(), TransportError> {
        self.send(Command::WHOIS(nick.to_string())).await
    }

    /// WHO.
    pub async fn who(&self, mask: &str) -> Result<(), TransportError> {
        self.send(Command::WHO(mask.to_string())).await
    }

    /// MODE with a mode string and its parameters.
    pub async fn mode(&self, target: &str, modes: &str, args: &[&str]) -> Result<(), TransportError> {
        let modes = Some(modes.to_string()).filter(|m| !m.is_empty());
        let args = args.iter().map(|a| a.to_string()).collect();
        self.send(Command::MODE(target.to_string(), modes, args)).await
    }

    /// TOPIC: query with `None`, set with `Some`.
    pub async fn topic(&self, channel: &str, text: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::TOPIC(channel.to_string(), text.map(str::to_string))).await
    }

    /// OPER.
    pub async fn oper(&self, name: &str, password: &str) -> Result<(), TransportError> {
        self.send(Command::OPER(name.to_string(), password.to_string())).await
    }

    /// WALLOPS.
    pub async fn wallops(&self, text: &str) -> Result<(), TransportError> {
        self.send(Command::WALLOPS(text.to_string())).await
    }

    /// Request a nick change.
    pub async fn nick(&self, nick: &str) -> Result<(), TransportError> {
        let line = self.inner.session.lock().request_nick(nick);
        self.inner.send(&line).await
    }

    /// Set (`Some`) or clear (`None`) away.
    pub async fn away(&self, reason: Option<&str>) -> Result<(), TransportError> {
        self.send(Command::AWAY(reason.map(str::to_string))).await
    }

    /// Track nicks and ask which are online.
    pub async fn ison(&self, nicks: &[&str]) -> Result<(), TransportError> {
        {
            let mut session = self.inner.session.lock();
            for nick in nicks {
                session.directory_mut().track_user(nick);
            }
        }
        self.send(Command::ISON(nicks.iter().map(|n| n.to_string()).collect()))
            .await
    }

    /// Whether the transport is open.
    pub fn is_connected(&self) -> bool {
        self.inner.writer().map_or(false, |w| w.connected())
    }

    /// Whether the connection task is alive (connecting, connected or
    /// between reconnects).
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Read the session under its lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.inner.session.lock())
    }

    /// Mutate the session under its lock (ignores, permission resets).
    pub fn with_session_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.inner.session.lock())
    }

    /// Network configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// Resolve once the connection task has stopped for good.
    pub async fn wait(&self) {
        loop {
            let finished = self.inner.finished.notified();
            if !self.inner.running.load(Ordering::SeqCst) {
                return;
            }
            finished.await;
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("network", &self.inner.config.network)
            .field("running", &self.is_running())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Inner {
    fn writer(&self) -> Option<LineWriter> {
        self.writer.lock().clone()
    }

    async fn send(&self, line: &str) -> Result<(), TransportError> {
        match self.writer() {
            Some(writer) => writer.write_line(line).await,
            None => Err(TransportError::Closed),
        }
    }

    fn emit(&self, event: &Event) {
        for handler in &self.handlers {
            handler.notify(event);
        }
    }

    async fn close(&self, reason: &str) {
        self.close_reason.lock().get_or_insert_with(|| reason.to_string());
        let writer = self.writer();
        if let Some(writer) = writer {
            writer.close().await;
        }
    }

    async fn request_reconnect(&self, reason: &str) {
        info!(network = %self.config.network, reason, "reconnect requested");
        self.reconnect_requested.store(true, Ordering::SeqCst);
        if let Err(e) = self.send(&Command::QUIT(Some(reason.to_string())).to_string()).await {
            debug!(error = %e, "QUIT not sent");
        }
        self.close(reason).await;
    }

    async fn perform(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send(line) => {
                    if let Err(e) = self.send(&line).await {
                        debug!(error = %e, line = %line, "dropping outbound line");
                    }
                }
                Action::Emit(event) => self.emit(&event),
                Action::Reconnect(reason) => {
                    if !self.quitting.load(Ordering::SeqCst) {
                        self.request_reconnect(&reason).await;
                    }
                }
                Action::Disconnect(reason) => self.close(&reason).await,
            }
        }
    }

    /// Open the transport with bounded retry and send registration.
    async fn open(&self) -> Option<LineReader> {
        let cfg = &self.config;
        let mut charset = cfg.charset.clone();

        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            if self.quitting.load(Ordering::SeqCst) {
                info!(network = %cfg.network, "quit before connecting");
                return self.abandon("quit").await;
            }
            self.session.lock().connecting();
            info!(network = %cfg.network, host = %cfg.host, port = cfg.port, attempt, "connecting");

            let opened = Transport::open(
                &cfg.host,
                cfg.port,
                &charset,
                cfg.transport,
                cfg.tls_verification,
                CONNECT_TIMEOUT,
            )
            .await
            .and_then(Transport::split);

            match opened {
                Ok((reader, writer)) => {
                    *self.writer.lock() = Some(writer);
                    // Publish the writer first so a concurrent quit either
                    // closes it or is seen here.
                    if self.quitting.load(Ordering::SeqCst) {
                        info!(network = %cfg.network, "quit while connecting");
                        let writer = self.writer.lock().take();
                        if let Some(writer) = writer {
                            writer.close().await;
                        }
                        return self.abandon("quit").await;
                    }
                    let actions = self.session.lock().start();
                    self.perform(actions).await;
                    return Some(reader);
                }
                Err(TransportError::EncodingUnsupported(label)) => {
                    warn!(charset = %label, fallback = FALLBACK_CHARSET, "unsupported charset");
                    charset = FALLBACK_CHARSET.to_string();
                }
                Err(e) if e.is_retryable() => {
                    warn!(network = %cfg.network, error = %e, attempt, "connect failed, retrying");
                }
                Err(e) => {
                    error!(network = %cfg.network, error = %e, "connect failed");
                    return self.abandon(&e.to_string()).await;
                }
            }
        }

        error!(network = %cfg.network, attempts = MAX_CONNECT_ATTEMPTS, "giving up");
        self.abandon("connect attempts exhausted").await
    }

    async fn abandon(&self, reason: &str) -> Option<LineReader> {
        let actions = self.session.lock().connection_lost(reason);
        self.perform(actions).await;
        None
    }

    /// Feed lines to the session until the transport ends. Returns why.
    async fn read_loop(&self, reader: &mut LineReader) -> String {
        loop {
            match reader.read_line().await {
                Ok(Some(line)) => {
                    let actions = self.session.lock().handle_line(&line);
                    self.perform(actions).await;
                }
                Ok(None) => return "connection closed".to_string(),
                Err(e) => {
                    warn!(network = %self.config.network, error = %e, "read failed");
                    return e.to_string();
                }
            }
        }
    }
}

/// Connection task: connect, read until closed, reconnect while asked to.
async fn supervise(inner: Arc<Inner>) {
    loop {
        inner.reconnect_requested.store(false, Ordering::SeqCst);
        *inner.close_reason.lock() = None;

        let Some(mut reader) = inner.open().await else {
            break;
        };
        let read_end = inner.read_loop(&mut reader).await;

        let writer = inner.writer.lock().take();
        if let Some(writer) = writer {
            writer.close().await;
        }
        let reason = inner.close_reason.lock().take().unwrap_or(read_end);
        let actions = inner.session.lock().connection_lost(&reason);
        inner.perform(actions).await;

        if !inner.reconnect_requested.load(Ordering::SeqCst) {
            info!(network = %inner.config.network, "stopped");
            break;
        }
        info!(network = %inner.config.network, "reconnecting");
    }
    inner.running.store(false, Ordering::SeqCst);
    inner.finished.notify_waiters();
}
