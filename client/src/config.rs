use presence_shared::config::InteractionConfig;
use url::Url;

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:9002/ws";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    /// Our participant id on the wire, never 0
    pub local_id: u32,
    pub voice_enabled: bool,
    pub interaction: InteractionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            local_id: random_participant_id(),
            voice_enabled: false,
            interaction: InteractionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PRESENCE_WS_URL` and `PRESENCE_VOICE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PRESENCE_WS_URL") {
            if !url.trim().is_empty() {
                config.server_url = url.trim().to_string();
            }
        }
        if let Ok(voice) = std::env::var("PRESENCE_VOICE") {
            config.voice_enabled = matches!(voice.trim(), "1" | "true" | "yes" | "on");
        }
        config
    }

    /// Server URL with our id attached as `?id=`.
    pub fn connect_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.server_url)?;
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "id")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(others)
            .append_pair("id", &self.local_id.to_string());
        Ok(url)
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| format!("server_url {:?} is not a URL: {}", self.server_url, e))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(format!("server_url must use ws or wss, got {}", url.scheme()));
        }
        if self.local_id == 0 {
            return Err("local_id must be non-zero".to_string());
        }
        self.interaction.validate()
    }
}

pub fn random_participant_id() -> u32 {
    rand::random::<u32>().max(1)
}
