// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the outbox-remote binary.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use outbox_core::protocol::{ClientMessage, ServerMessage};
use outbox_core::{MutationPayload, PendingMutation};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper to spawn a server process and clean it up on drop.
struct ServerProcess {
    child: Child,
    port: u16,
    _temp_dir: tempfile::TempDir,
}

impl ServerProcess {
    fn spawn(extra: &[&str]) -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");

        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let child = Command::new(env!("CARGO_BIN_EXE_outbox-remote"))
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", port))
            .arg("--data")
            .arg(temp_dir.path())
            .args(extra)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server process");

        ServerProcess {
            child,
            port,
            _temp_dir: temp_dir,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Connects, retrying while the server starts up.
    async fn connect(&self) -> (SplitSink<Socket, Message>, SplitStream<Socket>) {
        for _ in 0..20 {
            if let Ok(Ok((stream, _))) =
                tokio::time::timeout(Duration::from_millis(500), connect_async(self.ws_url())).await
            {
                return stream.split();
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        panic!("could not connect to {}", self.ws_url());
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn request(
    sink: &mut SplitSink<Socket, Message>,
    stream: &mut SplitStream<Socket>,
    msg: ClientMessage,
) -> ServerMessage {
    sink.send(Message::Text(msg.to_json().unwrap().into()))
        .await
        .expect("send");
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("reply timed out");
        match frame {
            Some(Ok(Message::Text(text))) => return ServerMessage::from_json(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected a reply, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_ping_and_idempotent_apply() {
    let server = ServerProcess::spawn(&[]);
    let (mut sink, mut stream) = server.connect().await;

    let pong = request(&mut sink, &mut stream, ClientMessage::ping(12345)).await;
    assert_eq!(pong, ServerMessage::pong(12345));

    let m = PendingMutation::new(MutationPayload::bookmark("p1", true), chrono::Utc::now(), 0);
    let first = request(&mut sink, &mut stream, ClientMessage::apply(m.clone())).await;
    assert_eq!(first, ServerMessage::applied(m.id));

    let second = request(&mut sink, &mut stream, ClientMessage::apply(m.clone())).await;
    assert_eq!(second, ServerMessage::duplicate(m.id));
}

#[tokio::test]
async fn test_maintenance_mode() {
    let server = ServerProcess::spawn(&["--maintenance"]);
    let (mut sink, mut stream) = server.connect().await;

    let m = PendingMutation::new(MutationPayload::bookmark("p1", true), chrono::Utc::now(), 0);
    let reply = request(&mut sink, &mut stream, ClientMessage::apply(m.clone())).await;
    assert!(matches!(reply, ServerMessage::Unavailable { id, .. } if id == m.id));
}
