//! A real [`Client`] against a scripted server on a loopback socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use slirc_bot::{Client, Event, EventHandler, NetworkConfig, NoPermissions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(5);

async fn next_line(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> String {
    timeout(STEP, lines.next_line())
        .await
        .expect("server timed out waiting for a line")
        .expect("read failed")
        .expect("client closed early")
}

fn recorder() -> (Arc<Mutex<Vec<Event>>>, Arc<dyn EventHandler>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = move |event: &Event| sink.lock().unwrap().push(event.clone());
    (seen, Arc::new(handler))
}

#[tokio::test]
async fn registers_answers_ping_and_quits() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = NetworkConfig::new("TestNet", "127.0.0.1", port, "Bot").with_channel("#test", None);
    config.charset = "utf-8".into();
    let (seen, handler) = recorder();
    let client = Client::new(config, vec![handler], Arc::new(NoPermissions));
    client.start();

    let (socket, _) = timeout(STEP, listener.accept()).await.unwrap().unwrap();
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();

    assert_eq!(next_line(&mut lines).await, "NICK Bot");
    assert!(next_line(&mut lines).await.starts_with("USER bot 0 * :"));

    write
        .write_all(b":irc.test 001 Bot :Welcome to the TestNet IRC Network Bot\r\nPING :xyz\r\n")
        .await
        .unwrap();
    assert_eq!(next_line(&mut lines).await, "JOIN #test");
    assert_eq!(next_line(&mut lines).await, "PONG :xyz");
    assert!(client.is_connected());
    assert_eq!(client.with_session(|s| s.network().map(str::to_string)), Some("TestNet".into()));

    client.quit(Some("bye")).await;
    assert_eq!(next_line(&mut lines).await, "QUIT :bye");

    timeout(STEP, client.wait()).await.expect("client did not stop");
    assert!(!client.is_running());
    assert!(!client.is_connected());

    let seen = seen.lock().unwrap();
    assert!(seen.contains(&Event::Connect { nick: "Bot".into() }));
    assert!(matches!(seen.last(), Some(Event::Disconnect { .. })));
}

#[tokio::test]
async fn server_error_triggers_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = NetworkConfig::new("TestNet", "127.0.0.1", port, "Bot");
    config.charset = "utf-8".into();
    let client = Client::new(config, Vec::new(), Arc::new(NoPermissions));
    client.start();

    let (socket, _) = timeout(STEP, listener.accept()).await.unwrap().unwrap();
    let (read, mut write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();
    assert_eq!(next_line(&mut lines).await, "NICK Bot");
    next_line(&mut lines).await;

    write.write_all(b"ERROR :Closing Link: flood\r\n").await.unwrap();
    assert!(next_line(&mut lines).await.starts_with("QUIT"));

    // The client comes back on a fresh socket and registers again.
    let (socket, _) = timeout(STEP, listener.accept()).await.unwrap().unwrap();
    let (read, _write) = socket.into_split();
    let mut lines = BufReader::new(read).lines();
    assert_eq!(next_line(&mut lines).await, "NICK Bot");

    client.quit(None).await;
    timeout(STEP, client.wait()).await.expect("client did not stop");
}

#[tokio::test]
async fn refused_connection_gives_up() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut config = NetworkConfig::new("TestNet", "127.0.0.1", port, "Bot");
    config.charset = "no-such-charset".into();
    let (seen, handler) = recorder();
    let client = Client::new(config, vec![handler], Arc::new(NoPermissions));
    client.start();

    timeout(Duration::from_secs(60), client.wait())
        .await
        .expect("client kept retrying");
    assert!(!client.is_running());
    assert!(seen.lock().unwrap().iter().all(|e| !matches!(e, Event::Connect { .. })));
}

#[tokio::test]
async fn quit_before_connect_completes_stays_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = NetworkConfig::new("TestNet", "127.0.0.1", port, "Bot");
    let (seen, handler) = recorder();
    let client = Client::new(config, vec![handler], Arc::new(NoPermissions));
    client.start();
    client.quit(Some("changed my mind")).await;

    timeout(STEP, client.wait()).await.expect("client did not stop");
    assert!(!client.is_running());
    assert!(timeout(Duration::from_millis(300), listener.accept()).await.is_err());
    assert!(seen.lock().unwrap().iter().all(|e| !matches!(e, Event::Connect { .. })));
}
