//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::{
    state::{PhaseDurations, DEFAULT_BREAK_SECONDS, DEFAULT_WORK_SECONDS},
    streak::Identity,
};

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "focus-streak")]
#[command(about = "A state-managed HTTP server for a work/break focus timer with a synced daily streak")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "FOCUS_STREAK_PORT", default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "FOCUS_STREAK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Work phase length in seconds
    #[arg(long, env = "FOCUS_STREAK_WORK_SECONDS", default_value_t = DEFAULT_WORK_SECONDS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub work_seconds: u64,

    /// Break phase length in seconds
    #[arg(long, env = "FOCUS_STREAK_BREAK_SECONDS", default_value_t = DEFAULT_BREAK_SECONDS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub break_seconds: u64,

    /// Base URL of the remote streak counter
    #[arg(long, env = "FOCUS_STREAK_COUNTER_URL")]
    pub counter_url: Url,

    /// API key sent with every counter request
    #[arg(long, env = "FOCUS_STREAK_COUNTER_API_KEY", default_value = "", hide_env_values = true)]
    pub counter_api_key: String,

    /// Access token of the signed-in user; without it the streak stays at zero
    #[arg(long, env = "FOCUS_STREAK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Timeout for counter requests in seconds
    #[arg(long, env = "FOCUS_STREAK_REQUEST_TIMEOUT", default_value = "10")]
    pub request_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations::new(self.work_seconds, self.break_seconds)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.access_token.clone().and_then(Identity::new)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["focus-streak", "--counter-url", "https://abcd.supabase.co"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_use_standard_phase_lengths() {
        let config = parse(&[]);
        assert_eq!(config.durations(), PhaseDurations::default());
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn zero_length_phase_is_rejected() {
        let result = Config::try_parse_from([
            "focus-streak",
            "--counter-url",
            "https://abcd.supabase.co",
            "--work-seconds",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn blank_access_token_means_signed_out() {
        assert!(parse(&["--access-token", "  "]).identity().is_none());
        assert!(parse(&["--access-token", "tok"]).identity().is_some());
    }

    #[test]
    fn custom_lengths_and_verbose() {
        let config = parse(&["--work-seconds", "50", "--break-seconds", "10", "-v"]);
        assert_eq!(config.durations(), PhaseDurations::new(50, 10));
        assert_eq!(config.log_level(), "debug");
    }
}
