use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Id of the object every session expects to exist after a `sync`.
pub const CANONICAL_OBJECT_ID: u32 = 1;

/// Control-channel messages, carried as JSON text frames in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/generated/")]
#[serde(tag = "type")]
pub enum ControlMsg {
    #[serde(rename = "participant-enter")]
    ParticipantEnter { id: u32 },
    #[serde(rename = "participant-leave")]
    ParticipantLeave { id: u32 },
    #[serde(rename = "object-add")]
    ObjectAdd { id: u32 },
    #[serde(rename = "object-remove")]
    ObjectRemove {
        id: u32,
        #[serde(default)]
        owner: Option<u32>,
    },
    #[serde(rename = "sync")]
    Sync,
}

const KNOWN_TYPES: [&str; 5] = [
    "participant-enter",
    "participant-leave",
    "object-add",
    "object-remove",
    "sync",
];

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("malformed control message: {0}")]
    Malformed(String),
    #[error("unknown control message type {0:?}")]
    UnknownType(String),
}

impl ControlMsg {
    /// Parse a text frame, telling an unknown `type` apart from a broken body.
    pub fn parse(text: &str) -> Result<ControlMsg, ControlError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ControlError::Malformed(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ControlError::Malformed("missing \"type\" field".to_string()))?;
        if !KNOWN_TYPES.contains(&kind) {
            return Err(ControlError::UnknownType(kind.to_string()));
        }
        serde_json::from_value(value).map_err(|e| ControlError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // A tagged enum of integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}
