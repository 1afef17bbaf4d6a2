//! Environment configuration. The serverless function names mirror the
//! hosted app's env-var override pattern; everything has a working default.

use crate::outbox::OutboxConfig;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub outbox: OutboxConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let mut outbox = OutboxConfig::default();
        if let Ok(name) = std::env::var("ROSTERD_FN_WELCOME_EMAIL") {
            if !name.is_empty() {
                outbox.welcome_email_fn = name;
            }
        }
        if let Ok(name) = std::env::var("ROSTERD_FN_ANALYZE_IMAGE") {
            if !name.is_empty() {
                outbox.analyze_image_fn = name;
            }
        }
        if let Ok(raw) = std::env::var("ROSTERD_OUTBOX_MAX_ATTEMPTS") {
            if let Ok(n) = raw.parse::<i64>() {
                if n > 0 {
                    outbox.max_attempts = n;
                }
            }
        }
        Self { outbox }
    }
}
