//! API server configuration.

use std::path::PathBuf;
use std::time::Duration;

use ostwald_core::SHARED_USER_ID;
use ostwald_core::transcript::reveal::REVEAL_INTERVAL;

/// Default cap on a `/get` or `/stream` request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3000").
    pub bind_addr: String,
    /// Context row shared by every session.
    pub user_id: String,
    /// Send the logged conversation with each prompt.
    pub include_history: bool,
    /// Directory served at `/`.
    pub public_dir: PathBuf,
    /// Where uploads are spooled for the length of a request.
    pub upload_dir: PathBuf,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
    /// Delay between streamed reveal frames.
    pub reveal_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            user_id: SHARED_USER_ID.into(),
            include_history: false,
            public_dir: PathBuf::from("public"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            reveal_interval: REVEAL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.user_id, "unique_user_id");
        assert!(!config.include_history);
        assert_eq!(config.reveal_interval, Duration::from_millis(30));
    }
}
