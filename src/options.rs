use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::validator::ValidationMode;

/// Configuration knobs for [`probe_with_options`](crate::probe_with_options).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub helo_domain: String,
    pub mail_from: String,
    pub primary_port: u16,
    pub secondary_port: u16,
    pub primary_timeout_ms: u64,
    pub secondary_timeout_ms: u64,
    pub dns_timeout_ms: u64,
    pub validation_mode: ValidationMode,
    /// Local part used for the catch-all RCPT. A random one is generated
    /// per probe when unset.
    pub catchall_local: Option<String>,
    pub ipv6: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            helo_domain: "example.com".to_string(),
            mail_from: "test@example.com".to_string(),
            primary_port: 25,
            secondary_port: 587,
            primary_timeout_ms: 20_000,
            secondary_timeout_ms: 20_000,
            dns_timeout_ms: 10_000,
            validation_mode: ValidationMode::Strict,
            catchall_local: None,
            ipv6: false,
        }
    }
}

impl ProbeOptions {
    pub fn primary_timeout(&self) -> Duration {
        bounded(self.primary_timeout_ms)
    }

    pub fn secondary_timeout(&self) -> Duration {
        bounded(self.secondary_timeout_ms)
    }

    pub fn dns_timeout(&self) -> Duration {
        bounded(self.dns_timeout_ms)
    }

    pub fn helo_name(&self) -> &str {
        let trimmed = self.helo_domain.trim();
        if trimmed.is_empty() { "localhost" } else { trimmed }
    }

    /// Envelope for `MAIL FROM`. An empty sender yields the null path `<>`.
    pub fn mail_from_command(&self) -> String {
        format!("MAIL FROM:<{}>", self.mail_from.trim())
    }
}

// A zero timeout would make socket reads block forever.
fn bounded(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}
