//! Binary pose/audio frames.
//!
//! Every frame starts with an 8-byte header: a little-endian `u32` message
//! type followed by a `u32` entity id. Player and object poses have a fixed
//! payload; audio frames carry however many `f32` samples fit.

use thiserror::Error;

use crate::vec3::{Quat, Vec3};

pub const HEADER_SIZE: usize = 8;

/// Fingers per hand times bones per finger.
pub const BONES_PER_HAND: usize = 5 * 4;

/// Four-byte slots in a player pose payload: head, two controllers, two hands.
pub const PLAYER_POSE_SLOTS: usize =
    (3 + 4) + (1 + (3 + 4)) * 2 + (1 + BONES_PER_HAND * (3 + 3)) * 2;
pub const PLAYER_POSE_FRAME_SIZE: usize = HEADER_SIZE + PLAYER_POSE_SLOTS * 4;

pub const OBJECT_POSE_SLOTS: usize = 3 + 4;
pub const OBJECT_POSE_FRAME_SIZE: usize = HEADER_SIZE + OBJECT_POSE_SLOTS * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageType {
    PlayerPose = 0,
    Audio = 1,
    ObjectPose = 2,
}

impl MessageType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MessageType::PlayerPose),
            1 => Some(MessageType::Audio),
            2 => Some(MessageType::ObjectPose),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Total frame size for fixed-layout types.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            MessageType::PlayerPose => Some(PLAYER_POSE_FRAME_SIZE),
            MessageType::ObjectPose => Some(OBJECT_POSE_FRAME_SIZE),
            MessageType::Audio => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed frame: {len} bytes, need at least {expected}")]
    Malformed { len: usize, expected: usize },
    #[error("unknown binary message type {0}")]
    UnknownMessageType(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseHeader {
    pub message_type: MessageType,
    pub entity_id: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerPose {
    pub enabled: bool,
    pub position: Vec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BonePair {
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    pub enabled: bool,
    pub bones: [BonePair; BONES_PER_HAND],
}

impl Default for HandPose {
    fn default() -> Self {
        Self {
            enabled: false,
            bones: [BonePair::default(); BONES_PER_HAND],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerPose {
    pub head: Transform,
    pub controllers: [ControllerPose; 2],
    pub hands: [HandPose; 2],
}

pub type ObjectPose = Transform;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub entity_id: u32,
    pub samples: Vec<f32>,
}

/// A decoded binary frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    PlayerPose { entity_id: u32, pose: PlayerPose },
    ObjectPose { entity_id: u32, pose: ObjectPose },
    Audio(AudioChunk),
}

impl Frame {
    pub fn entity_id(&self) -> u32 {
        match self {
            Frame::PlayerPose { entity_id, .. } | Frame::ObjectPose { entity_id, .. } => *entity_id,
            Frame::Audio(chunk) => chunk.entity_id,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Frame::PlayerPose { .. } => MessageType::PlayerPose,
            Frame::ObjectPose { .. } => MessageType::ObjectPose,
            Frame::Audio(_) => MessageType::Audio,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::PlayerPose { entity_id, pose } => encode_player_pose(*entity_id, pose),
            Frame::ObjectPose { entity_id, pose } => encode_object_pose(*entity_id, pose),
            Frame::Audio(chunk) => encode_audio(chunk.entity_id, &chunk.samples),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Frame, FrameError> {
        decode(bytes)
    }
}

struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    fn new(message_type: MessageType, entity_id: u32, capacity: usize) -> Self {
        let mut w = Self {
            buf: Vec::with_capacity(capacity),
        };
        w.put_u32(message_type.code());
        w.put_u32(entity_id);
        w
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_flag(&mut self, v: bool) {
        self.put_u32(u32::from(v));
    }

    fn put_vec3(&mut self, v: Vec3) {
        for c in v.to_array() {
            self.put_f32(c);
        }
    }

    fn put_quat(&mut self, q: Quat) {
        for c in q.to_array() {
            self.put_f32(c);
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a buffer whose length has already been checked.
struct FrameReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn get_u32(&mut self) -> u32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_le_bytes(b)
    }

    fn get_f32(&mut self) -> f32 {
        f32::from_bits(self.get_u32())
    }

    fn get_flag(&mut self) -> bool {
        self.get_u32() != 0
    }

    fn get_vec3(&mut self) -> Vec3 {
        Vec3::new(self.get_f32(), self.get_f32(), self.get_f32())
    }

    fn get_quat(&mut self) -> Quat {
        Quat::new(self.get_f32(), self.get_f32(), self.get_f32(), self.get_f32())
    }
}

pub fn encode_player_pose(entity_id: u32, pose: &PlayerPose) -> Vec<u8> {
    let mut w = FrameWriter::new(MessageType::PlayerPose, entity_id, PLAYER_POSE_FRAME_SIZE);
    w.put_vec3(pose.head.position);
    w.put_quat(pose.head.orientation);
    for controller in &pose.controllers {
        w.put_flag(controller.enabled);
        w.put_vec3(controller.position);
        w.put_quat(controller.orientation);
    }
    for hand in &pose.hands {
        w.put_flag(hand.enabled);
        for bone in &hand.bones {
            w.put_vec3(bone.start);
            w.put_vec3(bone.end);
        }
    }
    w.finish()
}

pub fn encode_object_pose(entity_id: u32, pose: &ObjectPose) -> Vec<u8> {
    let mut w = FrameWriter::new(MessageType::ObjectPose, entity_id, OBJECT_POSE_FRAME_SIZE);
    w.put_vec3(pose.position);
    w.put_quat(pose.orientation);
    w.finish()
}

pub fn encode_audio(entity_id: u32, samples: &[f32]) -> Vec<u8> {
    let mut w = FrameWriter::new(MessageType::Audio, entity_id, HEADER_SIZE + samples.len() * 4);
    for &s in samples {
        w.put_f32(s);
    }
    w.finish()
}

/// Read the header without interpreting the payload. An unrecognised type
/// code is reported as `UnknownMessageType`.
pub fn decode_header(bytes: &[u8]) -> Result<PoseHeader, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::Malformed {
            len: bytes.len(),
            expected: HEADER_SIZE,
        });
    }
    let mut r = FrameReader::new(bytes, 0);
    let code = r.get_u32();
    let message_type = MessageType::from_code(code).ok_or(FrameError::UnknownMessageType(code))?;
    Ok(PoseHeader {
        message_type,
        entity_id: r.get_u32(),
    })
}

/// Decode a whole frame into an owned value.
pub fn decode(bytes: &[u8]) -> Result<Frame, FrameError> {
    let header = decode_header(bytes)?;
    let message_type = header.message_type;

    if let Some(expected) = message_type.fixed_size() {
        if bytes.len() < expected {
            return Err(FrameError::Malformed {
                len: bytes.len(),
                expected,
            });
        }
    }

    let mut r = FrameReader::new(bytes, HEADER_SIZE);
    let entity_id = header.entity_id;
    let frame = match message_type {
        MessageType::PlayerPose => {
            let mut pose = PlayerPose::default();
            pose.head.position = r.get_vec3();
            pose.head.orientation = r.get_quat();
            for controller in pose.controllers.iter_mut() {
                controller.enabled = r.get_flag();
                controller.position = r.get_vec3();
                controller.orientation = r.get_quat();
            }
            for hand in pose.hands.iter_mut() {
                hand.enabled = r.get_flag();
                for bone in hand.bones.iter_mut() {
                    bone.start = r.get_vec3();
                    bone.end = r.get_vec3();
                }
            }
            Frame::PlayerPose { entity_id, pose }
        }
        MessageType::ObjectPose => Frame::ObjectPose {
            entity_id,
            pose: Transform {
                position: r.get_vec3(),
                orientation: r.get_quat(),
            },
        },
        MessageType::Audio => {
            let count = (bytes.len() - HEADER_SIZE) / 4;
            let samples = (0..count).map(|_| r.get_f32()).collect();
            Frame::Audio(AudioChunk { entity_id, samples })
        }
    };
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::vec3;

    const EPS: f32 = 1e-6;

    fn assert_vec3_close(a: Vec3, b: Vec3) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS,
            "Expected {:?} to be close to {:?}",
            a,
            b
        );
    }

    fn assert_quat_close(a: Quat, b: Quat) {
        for (x, y) in a.to_array().iter().zip(b.to_array().iter()) {
            assert!((x - y).abs() < EPS, "Expected {:?} to be close to {:?}", a, b);
        }
    }

    fn sample_pose(left_enabled: bool, right_enabled: bool, hands_enabled: [bool; 2]) -> PlayerPose {
        let mut pose = PlayerPose {
            head: Transform {
                position: vec3(0.1, 1.6, -0.25),
                orientation: Quat::new(0.0, 0.3826834, 0.0, 0.9238795),
            },
            ..Default::default()
        };
        pose.controllers[0] = ControllerPose {
            enabled: left_enabled,
            position: vec3(-0.2, 1.1, -0.4),
            orientation: Quat::new(0.1, 0.2, 0.3, 0.9273618),
        };
        pose.controllers[1] = ControllerPose {
            enabled: right_enabled,
            position: vec3(0.2, 1.05, -0.38),
            orientation: Quat::IDENTITY,
        };
        for (h, hand) in pose.hands.iter_mut().enumerate() {
            hand.enabled = hands_enabled[h];
            for (i, bone) in hand.bones.iter_mut().enumerate() {
                let f = i as f32 * 0.01 + h as f32;
                bone.start = vec3(f, f + 0.5, -f);
                bone.end = vec3(f + 0.02, f + 0.51, -f - 0.03);
            }
        }
        pose
    }

    fn assert_player_pose_close(a: &PlayerPose, b: &PlayerPose) {
        assert_vec3_close(a.head.position, b.head.position);
        assert_quat_close(a.head.orientation, b.head.orientation);
        for (ca, cb) in a.controllers.iter().zip(b.controllers.iter()) {
            assert_eq!(ca.enabled, cb.enabled);
            assert_vec3_close(ca.position, cb.position);
            assert_quat_close(ca.orientation, cb.orientation);
        }
        for (ha, hb) in a.hands.iter().zip(b.hands.iter()) {
            assert_eq!(ha.enabled, hb.enabled);
            for (ba, bb) in ha.bones.iter().zip(hb.bones.iter()) {
                assert_vec3_close(ba.start, bb.start);
                assert_vec3_close(ba.end, bb.end);
            }
        }
    }

    #[test]
    fn player_pose_slot_count_matches_layout() {
        assert_eq!(PLAYER_POSE_SLOTS, 265);
        assert_eq!(PLAYER_POSE_FRAME_SIZE, 1068);
        assert_eq!(OBJECT_POSE_FRAME_SIZE, 36);
    }

    #[test]
    fn player_pose_roundtrip_with_every_flag_combination() {
        for bits in 0..16u32 {
            let pose = sample_pose(
                bits & 1 != 0,
                bits & 2 != 0,
                [bits & 4 != 0, bits & 8 != 0],
            );
            let bytes = encode_player_pose(42, &pose);
            assert_eq!(bytes.len(), PLAYER_POSE_FRAME_SIZE);
            match decode(&bytes).unwrap() {
                Frame::PlayerPose { entity_id, pose: decoded } => {
                    assert_eq!(entity_id, 42);
                    assert_player_pose_close(&decoded, &pose);
                }
                other => panic!("Expected PlayerPose, got {:?}", other),
            }
        }
    }

    #[test]
    fn object_pose_roundtrip() {
        let pose = Transform {
            position: vec3(3.0, -1.5, 0.25),
            orientation: Quat::new(0.5, 0.5, 0.5, 0.5),
        };
        let bytes = encode_object_pose(1, &pose);
        assert_eq!(bytes.len(), OBJECT_POSE_FRAME_SIZE);
        match decode(&bytes).unwrap() {
            Frame::ObjectPose { entity_id, pose: decoded } => {
                assert_eq!(entity_id, 1);
                assert_vec3_close(decoded.position, pose.position);
                assert_quat_close(decoded.orientation, pose.orientation);
            }
            other => panic!("Expected ObjectPose, got {:?}", other),
        }
    }

    #[test]
    fn header_layout_is_little_endian() {
        let bytes = encode_object_pose(0x0102_0304, &Transform::default());
        assert_eq!(&bytes[0..4], &[2, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[4, 3, 2, 1]);
    }

    #[test]
    fn controller_flag_is_written_as_u32() {
        let mut pose = PlayerPose::default();
        pose.controllers[0].enabled = true;
        let bytes = encode_player_pose(9, &pose);
        // header + head (7 slots)
        let at = HEADER_SIZE + 7 * 4;
        assert_eq!(&bytes[at..at + 4], &[1, 0, 0, 0]);
    }

    #[test]
    fn any_nonzero_flag_decodes_as_enabled() {
        let mut bytes = encode_player_pose(9, &PlayerPose::default());
        let at = HEADER_SIZE + 7 * 4;
        bytes[at..at + 4].copy_from_slice(&7u32.to_le_bytes());
        match decode(&bytes).unwrap() {
            Frame::PlayerPose { pose, .. } => assert!(pose.controllers[0].enabled),
            other => panic!("Expected PlayerPose, got {:?}", other),
        }
    }

    #[test]
    fn audio_roundtrip_preserves_samples() {
        let samples = vec![0.0, 0.25, -0.5, 1.0];
        let bytes = encode_audio(5, &samples);
        assert_eq!(bytes.len(), HEADER_SIZE + 16);
        match decode(&bytes).unwrap() {
            Frame::Audio(chunk) => {
                assert_eq!(chunk.entity_id, 5);
                assert_eq!(chunk.samples, samples);
            }
            other => panic!("Expected Audio, got {:?}", other),
        }
    }

    #[test]
    fn empty_audio_frame_has_no_samples() {
        match decode(&encode_audio(5, &[])).unwrap() {
            Frame::Audio(chunk) => assert!(chunk.samples.is_empty()),
            other => panic!("Expected Audio, got {:?}", other),
        }
    }

    #[test]
    fn audio_ignores_trailing_partial_sample() {
        let mut bytes = encode_audio(5, &[0.5, 0.75]);
        bytes.push(0xff);
        match decode(&bytes).unwrap() {
            Frame::Audio(chunk) => assert_eq!(chunk.samples, vec![0.5, 0.75]),
            other => panic!("Expected Audio, got {:?}", other),
        }
    }

    #[test]
    fn buffer_shorter_than_header_is_malformed() {
        assert_eq!(
            decode(&[0, 0, 0]),
            Err(FrameError::Malformed {
                len: 3,
                expected: HEADER_SIZE
            })
        );
    }

    #[test]
    fn truncated_player_pose_is_malformed() {
        let bytes = encode_player_pose(1, &PlayerPose::default());
        let err = decode(&bytes[..PLAYER_POSE_FRAME_SIZE - 1]).unwrap_err();
        assert_eq!(
            err,
            FrameError::Malformed {
                len: PLAYER_POSE_FRAME_SIZE - 1,
                expected: PLAYER_POSE_FRAME_SIZE
            }
        );
    }

    #[test]
    fn truncated_object_pose_is_malformed() {
        let bytes = encode_object_pose(1, &Transform::default());
        assert!(matches!(
            decode(&bytes[..20]),
            Err(FrameError::Malformed { expected: 36, .. })
        ));
    }

    #[test]
    fn unknown_type_is_reported() {
        let mut bytes = encode_object_pose(1, &Transform::default());
        bytes[0..4].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(decode(&bytes), Err(FrameError::UnknownMessageType(9)));
    }

    #[test]
    fn header_decodes_type_and_entity() {
        let header = decode_header(&encode_audio(42, &[0.5])).unwrap();
        assert_eq!(header.message_type, MessageType::Audio);
        assert_eq!(header.entity_id, 42);

        let mut bytes = encode_object_pose(1, &Transform::default());
        bytes[0..4].copy_from_slice(&7u32.to_le_bytes());
        assert_eq!(decode_header(&bytes), Err(FrameError::UnknownMessageType(7)));
    }

    #[test]
    fn frame_encode_dispatches_on_variant() {
        let frame = Frame::ObjectPose {
            entity_id: 3,
            pose: Transform::default(),
        };
        assert_eq!(frame.message_type(), MessageType::ObjectPose);
        assert_eq!(frame.entity_id(), 3);
        assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);
    }
}
