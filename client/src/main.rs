use std::time::Duration;

use presence_client::client::{FrameInput, PresenceClient};
use presence_client::config::ClientConfig;
use presence_client::connection::{Connection, NetEvent};
use presence_client::session::RenderSink;
use presence_shared::frame::{ObjectPose, PlayerPose};
use presence_shared::vec3::vec3;

const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Stands in for a renderer: logs what would be drawn.
struct LoggingSink;

impl RenderSink for LoggingSink {
    fn apply_participant_pose(&mut self, id: u32, pose: &PlayerPose) {
        tracing::debug!("participant {} head at {:?}", id, pose.head.position);
    }

    fn apply_object_pose(&mut self, id: u32, pose: &ObjectPose) {
        tracing::debug!("object {} at {:?}", id, pose.position);
    }

    fn on_participant_added(&mut self, id: u32) {
        tracing::info!("participant {} joined", id);
    }

    fn on_participant_removed(&mut self, id: u32) {
        tracing::info!("participant {} left", id);
    }

    fn on_object_added(&mut self, id: u32) {
        tracing::info!("object {} appeared", id);
    }

    fn on_object_removed(&mut self, id: u32) {
        tracing::info!("object {} removed", id);
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Invalid client configuration: {}", e);
        std::process::exit(1);
    }
    let url = match config.connect_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Invalid server URL {}: {}", config.server_url, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Connecting to {} as participant {}", url, config.local_id);
    let connection = Connection::new(url);
    let mut client = PresenceClient::new(connection, config.local_id, config.interaction);
    client.set_voice_enabled(config.voice_enabled);

    let mut sink = LoggingSink;
    let mut input = FrameInput::default();
    input.head.position = vec3(0.0, 1.6, 0.0);

    loop {
        let events = client.session_mut().channel_mut().poll_events();
        for event in events {
            match event {
                NetEvent::Connected => client.on_open(),
                NetEvent::Disconnected => {
                    for action in client.on_close(&mut sink) {
                        tracing::debug!("{:?}", action);
                    }
                }
                NetEvent::Message(msg) => {
                    let _ = client.handle_message(msg, &mut sink);
                }
            }
        }

        client.tick(&input);

        let ids: Vec<u32> = client.registry().participants().iter().map(|p| p.id).collect();
        for id in ids {
            if let Some(chunk) = client.next_audio_chunk(id) {
                tracing::debug!("would play {} samples from {}", chunk.samples.len(), id);
            }
        }

        std::thread::sleep(FRAME_INTERVAL);
    }
}
