//! Advisor configuration from the environment

use crate::capture::DEFAULT_MAX_IMAGE_BYTES;
use std::time::Duration;

const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(2000);
const DEFAULT_EVENT_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// Simulated "thinking" time before the canned response lands
    pub response_delay: Duration,
    pub max_image_bytes: u64,
    /// Open every session with the assistant greeting
    pub greeting: bool,
    /// Buffer size of the session event broadcast
    pub event_capacity: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            response_delay: DEFAULT_RESPONSE_DELAY,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            greeting: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AdvisorConfig {
    /// Read `FARM_ASSIST_*` variables; anything missing or unparsable keeps
    /// its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            response_delay: parsed("FARM_ASSIST_RESPONSE_DELAY_MS")
                .map_or(defaults.response_delay, Duration::from_millis),
            max_image_bytes: parsed("FARM_ASSIST_MAX_IMAGE_BYTES")
                .unwrap_or(defaults.max_image_bytes),
            greeting: lookup("FARM_ASSIST_GREETING")
                .map_or(defaults.greeting, |v| parse_flag(&v, defaults.greeting)),
            event_capacity: parsed("FARM_ASSIST_EVENT_CAPACITY")
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    pub fn without_greeting(mut self) -> Self {
        self.greeting = false;
        self
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
