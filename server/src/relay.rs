use std::collections::BTreeSet;

use axum::body::Bytes;
use presence_shared::protocol::ControlMsg;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from client connections to the relay task
pub enum RelayCommand {
    Join {
        requested_id: Option<u32>,
        response: oneshot::Sender<Result<Joined, JoinRejected>>,
    },
    Leave {
        id: u32,
    },
    Control {
        from: u32,
        msg: ControlMsg,
    },
    Frame {
        from: u32,
        bytes: Bytes,
    },
}

/// What a new connection learns about the space it joined.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub id: u32,
    /// Replayed to the joiner in order before any live traffic
    pub backlog: Vec<ControlMsg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejected {
    DuplicateId(u32),
}

#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

/// Broadcasts from the relay to every connection except the sender
#[derive(Debug, Clone)]
pub struct RelayBroadcast {
    pub from: u32,
    pub payload: Payload,
}

/// Who is connected and which shared objects exist.
#[derive(Debug, Default)]
pub struct RelayState {
    participants: BTreeSet<u32>,
    objects: BTreeSet<u32>,
}

impl RelayState {
    pub fn participants(&self) -> impl Iterator<Item = u32> + '_ {
        self.participants.iter().copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = u32> + '_ {
        self.objects.iter().copied()
    }

    /// Admit a connection under `requested` or a fresh random id.
    pub fn join(&mut self, requested: Option<u32>) -> Result<Joined, JoinRejected> {
        let id = match requested {
            Some(id) if self.participants.contains(&id) => {
                return Err(JoinRejected::DuplicateId(id));
            }
            Some(id) => id,
            None => loop {
                let candidate = rand::random::<u32>().max(1);
                if !self.participants.contains(&candidate) {
                    break candidate;
                }
            },
        };

        let mut backlog: Vec<ControlMsg> = self
            .participants()
            .map(|p| ControlMsg::ParticipantEnter { id: p })
            .collect();
        backlog.extend(self.objects().map(|o| ControlMsg::ObjectAdd { id: o }));
        backlog.push(ControlMsg::Sync);

        self.participants.insert(id);
        Ok(Joined { id, backlog })
    }

    /// Returns false if `id` was not connected.
    pub fn leave(&mut self, id: u32) -> bool {
        self.participants.remove(&id)
    }

    /// Apply a control message from `from`; returns what to relay, if anything.
    pub fn apply_control(&mut self, from: u32, msg: ControlMsg) -> Option<ControlMsg> {
        match msg {
            ControlMsg::ParticipantEnter { .. } => Some(ControlMsg::ParticipantEnter { id: from }),
            ControlMsg::ObjectAdd { id } => {
                if self.objects.insert(id) {
                    Some(ControlMsg::ObjectAdd { id })
                } else {
                    None
                }
            }
            ControlMsg::ObjectRemove { id, .. } => {
                if self.objects.remove(&id) {
                    Some(ControlMsg::ObjectRemove {
                        id,
                        owner: Some(from),
                    })
                } else {
                    None
                }
            }
            ControlMsg::ParticipantLeave { .. } | ControlMsg::Sync => {
                tracing::warn!("Participant {} sent a server-only message: {:?}", from, msg);
                None
            }
        }
    }
}

/// Run the relay. Owns all relay state.
pub async fn run_relay(
    mut cmd_rx: mpsc::Receiver<RelayCommand>,
    broadcast_tx: broadcast::Sender<RelayBroadcast>,
) {
    let mut state = RelayState::default();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            RelayCommand::Join {
                requested_id,
                response,
            } => {
                let result = state.join(requested_id);
                if let Ok(joined) = &result {
                    tracing::info!(
                        "Participant {} joined ({} present)",
                        joined.id,
                        state.participants.len()
                    );
                }
                if let Err(Ok(joined)) = response.send(result) {
                    // Connection went away before it heard back.
                    state.leave(joined.id);
                }
            }
            RelayCommand::Leave { id } => {
                if state.leave(id) {
                    let _ = broadcast_tx.send(RelayBroadcast {
                        from: id,
                        payload: Payload::Text(ControlMsg::ParticipantLeave { id }.to_json()),
                    });
                    tracing::info!("Participant {} left", id);
                }
            }
            RelayCommand::Control { from, msg } => {
                if let Some(out) = state.apply_control(from, msg) {
                    let _ = broadcast_tx.send(RelayBroadcast {
                        from,
                        payload: Payload::Text(out.to_json()),
                    });
                }
            }
            RelayCommand::Frame { from, bytes } => {
                let _ = broadcast_tx.send(RelayBroadcast {
                    from,
                    payload: Payload::Binary(bytes),
                });
            }
        }
    }

    tracing::info!("Relay ended");
}
