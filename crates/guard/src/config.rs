use std::collections::HashMap;

use banter_core::abuse::AbusePolicy;
use banter_core::ratelimit::{RateLimits, RateQuota};

/// Guard configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Session lifetime in days (default: `30`).
    pub session_ttl_days: i64,
    /// Per-request timeout for provider verification calls, in seconds
    /// (default: `8`).
    pub provider_timeout_secs: u64,
    /// Verification endpoint per provider name, parsed from comma-separated
    /// `provider=url` pairs in `PROVIDER_VERIFY_URLS`.
    pub provider_verify_urls: HashMap<String, String>,
    /// Per-class rate quotas, hourly windows.
    pub rate_limits: RateLimits,
    /// Abuse scoring weights and thresholds. `from_env` leaves these on
    /// their defaults; embedders adjust the field directly.
    pub abuse_policy: AbusePolicy,
    /// Interval between background sweep passes, in seconds
    /// (default: `3600`).
    pub sweep_interval_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: 30,
            provider_timeout_secs: 8,
            provider_verify_urls: HashMap::new(),
            rate_limits: RateLimits::default(),
            abuse_policy: AbusePolicy::default(),
            sweep_interval_secs: 3600,
        }
    }
}

impl GuardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default  |
    /// |-------------------------|----------|
    /// | `SESSION_TTL_DAYS`      | `30`     |
    /// | `PROVIDER_TIMEOUT_SECS` | `8`      |
    /// | `PROVIDER_VERIFY_URLS`  | (none)   |
    /// | `RATE_COMMENT_PER_HOUR` | `30`     |
    /// | `RATE_VOTE_PER_HOUR`    | `100`    |
    /// | `RATE_REPORT_PER_HOUR`  | `10`     |
    /// | `SWEEP_INTERVAL_SECS`   | `3600`   |
    ///
    /// `PROVIDER_VERIFY_URLS` is a comma-separated list of `provider=url`
    /// pairs, e.g. `discord=https://discord.example/verify,google=...`.
    pub fn from_env() -> Self {
        let session_ttl_days: i64 = std::env::var("SESSION_TTL_DAYS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SESSION_TTL_DAYS must be a valid i64");

        let provider_timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        let provider_verify_urls: HashMap<String, String> =
            std::env::var("PROVIDER_VERIFY_URLS")
                .unwrap_or_default()
                .split(',')
                .filter_map(|pair| {
                    let (name, url) = pair.split_once('=')?;
                    let (name, url) = (name.trim(), url.trim());
                    if name.is_empty() || url.is_empty() {
                        return None;
                    }
                    Some((name.to_string(), url.to_string()))
                })
                .collect();

        let comment_per_hour: i32 = std::env::var("RATE_COMMENT_PER_HOUR")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("RATE_COMMENT_PER_HOUR must be a valid i32");

        let vote_per_hour: i32 = std::env::var("RATE_VOTE_PER_HOUR")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("RATE_VOTE_PER_HOUR must be a valid i32");

        let report_per_hour: i32 = std::env::var("RATE_REPORT_PER_HOUR")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("RATE_REPORT_PER_HOUR must be a valid i32");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        Self {
            session_ttl_days,
            provider_timeout_secs,
            provider_verify_urls,
            rate_limits: RateLimits {
                comment: RateQuota { max_requests: comment_per_hour, window_secs: 3600 },
                vote: RateQuota { max_requests: vote_per_hour, window_secs: 3600 },
                report: RateQuota { max_requests: report_per_hour, window_secs: 3600 },
            },
            abuse_policy: AbusePolicy::default(),
            sweep_interval_secs,
        }
    }
}
