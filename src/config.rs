use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

/// Broadcast tennis scoreboard overlay fed by a live score WebSocket
#[derive(Parser, Debug, Clone)]
#[command(name = "tennis-scoreboard", version, about)]
pub struct Config {
    /// Which score server to use
    #[arg(long, env = "SCOREBOARD_ENV", value_enum, default_value = "development")]
    pub environment: Environment,

    /// Score server base URL used in development
    #[arg(long, env = "DEV_FEED_URL", default_value = "ws://localhost:8080")]
    pub dev_feed_url: String,

    /// Score server base URL used in production
    #[arg(long, env = "PROD_FEED_URL")]
    pub prod_feed_url: Option<String>,

    /// Feed path of the court to display
    #[arg(long, env = "FEED_PATH", default_value = "/tennis/grandstand")]
    pub feed_path: String,

    /// API key sent to the score server (omitted when empty)
    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Delay before reconnecting after the feed drops (milliseconds)
    #[arg(long, env = "RECONNECT_DELAY_MS", default_value = "3000")]
    pub reconnect_delay_ms: u64,

    /// Interval between keepalive pings on an open feed (seconds)
    #[arg(long, env = "PING_INTERVAL_SECS", default_value = "25")]
    pub ping_interval_secs: u64,

    /// Overlay HTTP listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:3000")]
    pub dashboard_addr: String,

    /// Venue logo shown in the header
    #[arg(long, env = "VENUE_LOGO_URL")]
    pub venue_logo_url: Option<String>,

    /// Event logo shown in the header
    #[arg(long, env = "EVENT_LOGO_URL")]
    pub event_logo_url: Option<String>,

    /// Tournament logo shown next to the score table
    #[arg(long, env = "TOURNAMENT_LOGO_URL")]
    pub tournament_logo_url: Option<String>,

    /// Image used as the serving indicator instead of the ▶ glyph
    #[arg(long, env = "ARROW_IMAGE_URL")]
    pub arrow_image_url: Option<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.environment == Environment::Production && self.prod_feed_url.is_none() {
            anyhow::bail!("PROD_FEED_URL is required when SCOREBOARD_ENV=production");
        }
        if self.reconnect_delay_ms == 0 {
            anyhow::bail!("reconnect_delay_ms must be positive");
        }
        if self.ping_interval_secs == 0 {
            anyhow::bail!("ping_interval_secs must be positive");
        }
        let base = self.base_feed_url();
        if !(base.starts_with("ws://") || base.starts_with("wss://")) {
            anyhow::bail!("feed URL must start with ws:// or wss:// (got {})", base);
        }
        if self.feed_path.trim_matches('/').is_empty() {
            anyhow::bail!("feed_path must name a feed");
        }
        Ok(())
    }

    /// Base endpoint for the configured environment.
    pub fn base_feed_url(&self) -> &str {
        match self.environment {
            Environment::Development => &self.dev_feed_url,
            Environment::Production => self.prod_feed_url.as_deref().unwrap_or_default(),
        }
    }

    /// The API key, with an empty value treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["tennis-scoreboard"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse(&["--environment", "development"]);
        config.validate().unwrap();
        assert_eq!(config.base_feed_url(), "ws://localhost:8080");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.ping_interval(), Duration::from_secs(25));
    }

    #[test]
    fn test_production_requires_url() {
        let config = parse(&["--environment", "production", "--prod-feed-url", ""]);
        assert!(config.validate().is_err());

        let config = parse(&[
            "--environment",
            "production",
            "--prod-feed-url",
            "wss://scores.example.com",
        ]);
        config.validate().unwrap();
        assert_eq!(config.base_feed_url(), "wss://scores.example.com");
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = parse(&["--environment", "development", "--reconnect-delay-ms", "0"]);
        assert!(config.validate().is_err());

        let config = parse(&["--environment", "development", "--ping-interval-secs", "0"]);
        assert!(config.validate().is_err());

        let config = parse(&["--environment", "development", "--dev-feed-url", "http://x"]);
        assert!(config.validate().is_err());

        let config = parse(&["--environment", "development", "--feed-path", "/"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        let config = parse(&["--environment", "development", "--api-key", ""]);
        assert_eq!(config.credential(), None);
        let config = parse(&["--environment", "development", "--api-key", "k"]);
        assert_eq!(config.credential(), Some("k"));
    }
}
