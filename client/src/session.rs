//! One duplex channel carrying JSON control messages as text and pose/audio
//! frames as binary, dispatched into the entity registry.

use presence_shared::frame::{
    self, encode_audio, encode_object_pose, encode_player_pose, Frame, FrameError, ObjectPose,
    PlayerPose,
};
use presence_shared::protocol::{ControlError, ControlMsg, CANONICAL_OBJECT_ID};
use thiserror::Error;

use crate::registry::EntityRegistry;

/// The transport underneath a session.
pub trait Channel {
    fn is_open(&self) -> bool;
    fn send_text(&mut self, text: String);
    fn send_binary(&mut self, bytes: Vec<u8>);
}

/// An inbound message as the channel delivered it.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// Receives entity lifecycle and pose updates for rendering.
pub trait RenderSink {
    fn apply_participant_pose(&mut self, id: u32, pose: &PlayerPose);
    fn apply_object_pose(&mut self, id: u32, pose: &ObjectPose);
    fn on_participant_added(&mut self, id: u32);
    fn on_participant_removed(&mut self, id: u32);
    fn on_object_added(&mut self, id: u32);
    fn on_object_removed(&mut self, id: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Participant,
    Object,
}

/// Reasons an inbound message was dropped. None of them end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed frame: {len} bytes, need at least {expected}")]
    MalformedFrame { len: usize, expected: usize },
    #[error("unknown binary message type {0}")]
    UnknownMessageType(u32),
    #[error("pose update for unknown {kind:?} {id}")]
    UnknownEntityReference { kind: EntityKind, id: u32 },
    #[error("malformed control message: {0}")]
    MalformedControlMessage(String),
    #[error("unknown control message type {0:?}")]
    UnknownControlType(String),
}

impl From<FrameError> for SessionError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Malformed { len, expected } => SessionError::MalformedFrame { len, expected },
            FrameError::UnknownMessageType(t) => SessionError::UnknownMessageType(t),
        }
    }
}

impl From<ControlError> for SessionError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::Malformed(m) => SessionError::MalformedControlMessage(m),
            ControlError::UnknownType(t) => SessionError::UnknownControlType(t),
        }
    }
}

pub struct TransportSession<C: Channel> {
    channel: C,
    local_id: u32,
    voice_enabled: bool,
}

impl<C: Channel> TransportSession<C> {
    pub fn new(channel: C, local_id: u32, voice_enabled: bool) -> Self {
        Self {
            channel,
            local_id,
            voice_enabled,
        }
    }

    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    /// Announce ourselves once the channel has opened.
    pub fn on_open(&mut self) {
        tracing::info!("Channel open, entering as participant {}", self.local_id);
        self.send_control(&ControlMsg::ParticipantEnter { id: self.local_id });
    }

    /// Returns false if the channel was not open and nothing was sent.
    pub fn send_control(&mut self, msg: &ControlMsg) -> bool {
        if !self.channel.is_open() {
            return false;
        }
        self.channel.send_text(msg.to_json());
        true
    }

    /// Returns false if the channel was not open and nothing was sent.
    pub fn send_frame(&mut self, bytes: Vec<u8>) -> bool {
        if !self.channel.is_open() {
            return false;
        }
        self.channel.send_binary(bytes);
        true
    }

    pub fn send_player_pose(&mut self, pose: &PlayerPose) -> bool {
        if !self.channel.is_open() {
            return false;
        }
        self.send_frame(encode_player_pose(self.local_id, pose))
    }

    pub fn send_object_pose(&mut self, object_id: u32, pose: &ObjectPose) -> bool {
        if !self.channel.is_open() {
            return false;
        }
        self.send_frame(encode_object_pose(object_id, pose))
    }

    /// Send a captured microphone buffer as our voice.
    pub fn send_audio(&mut self, samples: &[f32]) -> bool {
        if !self.channel.is_open() || !self.voice_enabled {
            return false;
        }
        self.send_frame(encode_audio(self.local_id, samples))
    }

    /// Apply one inbound message. Dropped messages are logged and returned.
    pub fn handle_message(
        &mut self,
        msg: ChannelMessage,
        registry: &mut EntityRegistry,
        sink: &mut dyn RenderSink,
    ) -> Result<(), SessionError> {
        let result = match msg {
            ChannelMessage::Text(text) => self.handle_text(&text, registry, sink),
            ChannelMessage::Binary(bytes) => self.handle_binary(&bytes, registry, sink),
        };
        if let Err(e) = &result {
            tracing::warn!("Dropped inbound message: {}", e);
        }
        result
    }

    fn handle_text(
        &mut self,
        text: &str,
        registry: &mut EntityRegistry,
        sink: &mut dyn RenderSink,
    ) -> Result<(), SessionError> {
        match ControlMsg::parse(text)? {
            ControlMsg::ParticipantEnter { id } => {
                if id == self.local_id {
                    tracing::debug!("Ignoring participant-enter for ourselves");
                } else if registry.add_participant(id) {
                    tracing::info!("Participant {} entered", id);
                    sink.on_participant_added(id);
                } else {
                    tracing::debug!("Participant {} already present", id);
                }
            }
            ControlMsg::ParticipantLeave { id } => {
                if registry.remove_participant(id) {
                    tracing::info!("Participant {} left", id);
                    sink.on_participant_removed(id);
                }
            }
            ControlMsg::ObjectAdd { id } => {
                if registry.add_object(id) {
                    tracing::info!("Object {} added", id);
                    sink.on_object_added(id);
                }
            }
            ControlMsg::ObjectRemove { id, owner } => {
                if registry.remove_object(id) {
                    tracing::info!("Object {} removed (owner {:?})", id, owner);
                    sink.on_object_removed(id);
                }
            }
            ControlMsg::Sync => {
                if registry.find_object(CANONICAL_OBJECT_ID).is_none() {
                    registry.add_object(CANONICAL_OBJECT_ID);
                    sink.on_object_added(CANONICAL_OBJECT_ID);
                    self.send_control(&ControlMsg::ObjectAdd {
                        id: CANONICAL_OBJECT_ID,
                    });
                    tracing::info!("Sync: created object {}", CANONICAL_OBJECT_ID);
                }
            }
        }
        Ok(())
    }

    fn handle_binary(
        &mut self,
        bytes: &[u8],
        registry: &mut EntityRegistry,
        sink: &mut dyn RenderSink,
    ) -> Result<(), SessionError> {
        match frame::decode(bytes)? {
            Frame::PlayerPose { entity_id, pose } => {
                let participant = registry.find_participant_mut(entity_id).ok_or(
                    SessionError::UnknownEntityReference {
                        kind: EntityKind::Participant,
                        id: entity_id,
                    },
                )?;
                participant.latest_pose = pose;
                sink.apply_participant_pose(entity_id, &participant.latest_pose);
            }
            Frame::ObjectPose { entity_id, pose } => {
                let object = registry.find_object_mut(entity_id).ok_or(
                    SessionError::UnknownEntityReference {
                        kind: EntityKind::Object,
                        id: entity_id,
                    },
                )?;
                object.latest_pose = pose;
                sink.apply_object_pose(entity_id, &object.latest_pose);
            }
            Frame::Audio(chunk) => {
                if self.voice_enabled {
                    let id = chunk.entity_id;
                    if !registry.push_audio(chunk) {
                        return Err(SessionError::UnknownEntityReference {
                            kind: EntityKind::Participant,
                            id,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// In-process channel that records what was sent. Used by tests and the
/// headless demo before a real connection is up.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
    pub open: bool,
    pub sent_text: Vec<String>,
    pub sent_binary: Vec<Vec<u8>>,
}

impl LoopbackChannel {
    pub fn open() -> Self {
        Self {
            open: true,
            ..Default::default()
        }
    }
}

impl Channel for LoopbackChannel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send_text(&mut self, text: String) {
        self.sent_text.push(text);
    }

    fn send_binary(&mut self, bytes: Vec<u8>) {
        self.sent_binary.push(bytes);
    }
}
