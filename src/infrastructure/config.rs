use std::env;

use crate::bulk::BulkSettings;

/// How submitted operations reach the task runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Run in the submitting request
    Inline,
    /// Hand to an in-process worker task over a channel
    Queue,
    /// Leave PENDING for a separate `--worker` process to pick up
    External,
}

impl DispatchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" => Some(DispatchMode::Inline),
            "queue" => Some(DispatchMode::Queue),
            "external" | "worker" => Some(DispatchMode::External),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub bulk: BulkSettings,
    pub dispatch: DispatchMode,
    pub worker_poll_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = BulkSettings::default();

        let dispatch = match env::var("BULK_DISPATCH") {
            Ok(value) => DispatchMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Unknown BULK_DISPATCH '{}', falling back to queue", value);
                DispatchMode::Queue
            }),
            Err(_) => DispatchMode::Queue,
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://displacement_bulk.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            bulk: BulkSettings {
                max_records: env::var("BULK_MAX_RECORDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_records),
                stale_after_minutes: env::var("BULK_STALE_MINUTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.stale_after_minutes),
                frontend_base_url: env::var("FRONTEND_BASE_URL")
                    .unwrap_or(defaults.frontend_base_url),
            },
            dispatch,
            worker_poll_secs: env::var("WORKER_POLL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_mode_parse() {
        assert_eq!(DispatchMode::parse("Inline"), Some(DispatchMode::Inline));
        assert_eq!(DispatchMode::parse(" queue "), Some(DispatchMode::Queue));
        assert_eq!(DispatchMode::parse("worker"), Some(DispatchMode::External));
        assert_eq!(DispatchMode::parse("celery"), None);
    }
}
