//! WebSocket connection run on its own thread, with reconnect and backoff.
//! The frame loop drains events with `poll_events` and sends through the
//! `Channel` impl.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use url::Url;

use crate::session::{Channel, ChannelMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    Connected,
    Disconnected,
    Message(ChannelMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

type CmdSender = tokio::sync::mpsc::UnboundedSender<ChannelMessage>;

pub struct Connection {
    state: ConnectionState,
    event_rx: Receiver<NetEvent>,
    cmd_tx: CmdSender,
}

impl Connection {
    pub fn new(url: Url) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<NetEvent>();
        let cmd_tx = spawn_network_thread(url, event_tx);
        Self {
            state: ConnectionState::Connecting,
            event_rx,
            cmd_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Everything the network thread delivered since the last call.
    pub fn poll_events(&mut self) -> Vec<NetEvent> {
        let mut out = Vec::new();
        while let Ok(evt) = self.event_rx.try_recv() {
            match evt {
                NetEvent::Connected => self.state = ConnectionState::Connected,
                NetEvent::Disconnected => self.state = ConnectionState::Disconnected,
                NetEvent::Message(_) => {}
            }
            out.push(evt);
        }
        out
    }

    /// A failed send means the network thread has exited; the connection is
    /// not coming back.
    fn send(&mut self, msg: ChannelMessage) {
        if self.cmd_tx.send(msg).is_err() && self.state != ConnectionState::Disconnected {
            tracing::error!("Network thread has stopped, marking connection disconnected");
            self.state = ConnectionState::Disconnected;
        }
    }
}

impl Channel for Connection {
    fn is_open(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn send_text(&mut self, text: String) {
        self.send(ChannelMessage::Text(text));
    }

    fn send_binary(&mut self, bytes: Vec<u8>) {
        self.send(ChannelMessage::Binary(bytes));
    }
}

fn spawn_network_thread(url: Url, event_tx: Sender<NetEvent>) -> CmdSender {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel::<ChannelMessage>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Failed to build network runtime: {}", e);
                let _ = event_tx.send(NetEvent::Disconnected);
                return;
            }
        };

        rt.block_on(async move {
            let mut reconnect_delay = Duration::from_millis(1000);
            let max_delay = Duration::from_millis(30_000);

            loop {
                let (ws_stream, _) = match tokio_tungstenite::connect_async(url.as_str()).await {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::warn!("Connect to {} failed: {}", url, e);
                        let _ = event_tx.send(NetEvent::Disconnected);
                        tokio::time::sleep(reconnect_delay).await;
                        reconnect_delay = (reconnect_delay.mul_f32(1.5)).min(max_delay);
                        continue;
                    }
                };

                // Frames queued while we were down are stale.
                while cmd_rx.try_recv().is_ok() {}

                reconnect_delay = Duration::from_millis(1000);
                tracing::info!("Connected to {}", url);
                let _ = event_tx.send(NetEvent::Connected);

                let (mut write, mut read) = ws_stream.split();

                loop {
                    tokio::select! {
                        biased;

                        Some(cmd) = cmd_rx.recv() => {
                            let msg = match cmd {
                                ChannelMessage::Text(text) => Message::Text(text.into()),
                                ChannelMessage::Binary(bytes) => Message::Binary(bytes.into()),
                            };
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }

                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(txt))) => {
                                    let _ = event_tx.send(NetEvent::Message(ChannelMessage::Text(txt.as_str().to_owned())));
                                }
                                Some(Ok(Message::Binary(bytes))) => {
                                    let _ = event_tx.send(NetEvent::Message(ChannelMessage::Binary(bytes.to_vec())));
                                }
                                Some(Ok(Message::Close(_))) => {
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    tracing::warn!("WebSocket error: {}", e);
                                    break;
                                }
                                None => {
                                    break;
                                }
                            }
                        }
                    }
                }

                tracing::info!("Disconnected from {}", url);
                let _ = event_tx.send(NetEvent::Disconnected);
                tokio::time::sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay.mul_f32(1.5)).min(max_delay);
            }
        });
    });

    cmd_tx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> (Connection, Sender<NetEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        drop(cmd_rx);
        let conn = Connection {
            state: ConnectionState::Connecting,
            event_rx,
            cmd_tx,
        };
        (conn, event_tx)
    }

    #[test]
    fn send_after_network_thread_exit_marks_disconnected() {
        let (mut conn, _events) = detached();
        assert!(!conn.is_open());
        conn.send_text("{}".to_string());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn poll_events_tracks_state() {
        let (mut conn, events) = detached();
        events.send(NetEvent::Connected).unwrap();
        events
            .send(NetEvent::Message(ChannelMessage::Text("x".to_string())))
            .unwrap();
        let got = conn.poll_events();
        assert_eq!(got.len(), 2);
        assert!(conn.is_open());

        events.send(NetEvent::Disconnected).unwrap();
        conn.poll_events();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }
}
