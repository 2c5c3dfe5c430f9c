//! CLI argument parsing and server configuration.

mod args;

pub use args::{Args, DEFAULT_CLOUD_URL, DEFAULT_REMOTE_URL, ServerConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["voice-relay"]).unwrap();
        let config = args.server_config();

        assert_eq!(config.addr.to_string(), "0.0.0.0:5050");
        assert_eq!(config.storage_dir, std::env::temp_dir());
        assert_eq!(config.remote_url, DEFAULT_REMOTE_URL);
        assert_eq!(config.cloud_url, DEFAULT_CLOUD_URL);
        assert_eq!(config.cloud_lang, "en");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.espeak_bin.as_deref(), Some("espeak-ng"));
        assert_eq!(config.max_text_chars, 5000);
        assert!(!args.verbose);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "voice-relay",
            "--host",
            "127.0.0.1",
            "-p",
            "8080",
            "--storage-dir",
            "/var/lib/voice-relay",
            "--request-timeout-secs",
            "3",
            "-v",
        ])
        .unwrap();
        let config = args.server_config();

        assert_eq!(config.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/voice-relay"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(args.verbose);
    }

    #[test]
    fn test_no_local_engine_flag() {
        let args = Args::try_parse_from(["voice-relay", "--no-local-engine"]).unwrap();
        assert_eq!(args.server_config().espeak_bin, None);
    }

    #[test]
    fn test_rejects_invalid_host() {
        assert!(Args::try_parse_from(["voice-relay", "--host", "not-an-ip"]).is_err());
    }
}
