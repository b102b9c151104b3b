use std::collections::VecDeque;

use presence_shared::frame::{AudioChunk, ObjectPose, PlayerPose};

#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    pub id: u32,
    pub latest_pose: PlayerPose,
    pending_audio: VecDeque<AudioChunk>,
}

impl RemoteParticipant {
    pub fn pending_audio_len(&self) -> usize {
        self.pending_audio.len()
    }
}

#[derive(Debug, Clone)]
pub struct SharedObject {
    pub id: u32,
    pub latest_pose: ObjectPose,
}

/// Live remote participants and shared objects, keyed by id.
///
/// The sets are interactive-scale, so lookups are linear scans.
#[derive(Debug)]
pub struct EntityRegistry {
    participants: Vec<RemoteParticipant>,
    objects: Vec<SharedObject>,
    audio_capacity: usize,
}

impl EntityRegistry {
    pub fn new(audio_capacity: usize) -> Self {
        Self {
            participants: Vec::new(),
            objects: Vec::new(),
            audio_capacity: audio_capacity.max(1),
        }
    }

    /// Returns false if the id is already present.
    pub fn add_participant(&mut self, id: u32) -> bool {
        if self.find_participant(id).is_some() {
            return false;
        }
        self.participants.push(RemoteParticipant {
            id,
            latest_pose: PlayerPose::default(),
            pending_audio: VecDeque::with_capacity(self.audio_capacity),
        });
        true
    }

    /// Returns false if the id was not present.
    pub fn remove_participant(&mut self, id: u32) -> bool {
        match self.participants.iter().position(|p| p.id == id) {
            Some(index) => {
                self.participants.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find_participant(&self, id: u32) -> Option<&RemoteParticipant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn find_participant_mut(&mut self, id: u32) -> Option<&mut RemoteParticipant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn participants(&self) -> &[RemoteParticipant] {
        &self.participants
    }

    pub fn add_object(&mut self, id: u32) -> bool {
        if self.find_object(id).is_some() {
            return false;
        }
        self.objects.push(SharedObject {
            id,
            latest_pose: ObjectPose::default(),
        });
        true
    }

    pub fn remove_object(&mut self, id: u32) -> bool {
        match self.objects.iter().position(|o| o.id == id) {
            Some(index) => {
                self.objects.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find_object(&self, id: u32) -> Option<&SharedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find_object_mut(&mut self, id: u32) -> Option<&mut SharedObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn objects(&self) -> &[SharedObject] {
        &self.objects
    }

    /// Queue a voice chunk for a participant, dropping the oldest when full.
    /// Returns false if the participant is unknown.
    pub fn push_audio(&mut self, chunk: AudioChunk) -> bool {
        let capacity = self.audio_capacity;
        let Some(participant) = self.find_participant_mut(chunk.entity_id) else {
            return false;
        };
        if participant.pending_audio.len() >= capacity {
            participant.pending_audio.pop_front();
            tracing::debug!(
                "Audio queue for participant {} full, dropped oldest chunk",
                chunk.entity_id
            );
        }
        participant.pending_audio.push_back(chunk);
        true
    }

    /// Pull the next chunk for playback once at least `min_buffered` are queued.
    pub fn next_audio_chunk(&mut self, id: u32, min_buffered: usize) -> Option<AudioChunk> {
        let participant = self.find_participant_mut(id)?;
        if participant.pending_audio.len() < min_buffered.max(1) {
            return None;
        }
        participant.pending_audio.pop_front()
    }

    /// Forget everything, e.g. after the channel reconnects.
    pub fn clear(&mut self) {
        self.participants.clear();
        self.objects.clear();
    }
}
