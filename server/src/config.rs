use presence_shared::frame::PLAYER_POSE_FRAME_SIZE;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Concurrent WebSocket connections accepted
    pub max_connections: usize,
    /// Messages a slow connection may fall behind before it starts losing them
    pub broadcast_capacity: usize,
    pub command_capacity: usize,
    /// Largest binary frame relayed, in bytes
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            max_connections: 256,
            broadcast_capacity: 1024,
            command_capacity: 1024,
            max_frame_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PRESENCE_LISTEN_ADDR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("PRESENCE_LISTEN_ADDR") {
            if !addr.trim().is_empty() {
                config.listen_addr = addr.trim().to_string();
            }
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.broadcast_capacity == 0 || self.command_capacity == 0 {
            return Err("channel capacities must be > 0".to_string());
        }
        if self.max_frame_bytes < PLAYER_POSE_FRAME_SIZE {
            return Err(format!(
                "max_frame_bytes must be at least one player pose ({} bytes)",
                PLAYER_POSE_FRAME_SIZE
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn frame_limit_must_fit_a_player_pose() {
        let config = ServerConfig {
            max_frame_bytes: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_connections_is_rejected() {
        let config = ServerConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
