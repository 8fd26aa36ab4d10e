//! Processing mode profiles
//!
//! Provides pre-configured profiles for each load mode:
//! - Normal: 10 tx/s, relaxed tick, 10 in flight
//! - Burst: 100 tx/s, 50 in flight
//! - Stress: 1,000 tx/s, 50 in flight
//! - Hft: 10,000 tx/s, 100 in flight, tight jitter
//!
//! The scheduler only ever sees a `ModeProfile`, never the mode itself.

use crate::core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Load mode selected by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Burst,
    Stress,
    Hft,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Normal, Mode::Burst, Mode::Stress, Mode::Hft];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Burst => "burst",
            Self::Stress => "stress",
            Self::Hft => "hft",
        }
    }

    /// Constants governing generation and scheduling in this mode
    pub const fn profile(&self) -> ModeProfile {
        match self {
            Self::Normal => ModeProfile {
                target_rate: 10,
                tick_interval: Duration::from_millis(100),
                concurrency_limit: 10,
                jitter: 0.20,
            },
            Self::Burst => ModeProfile {
                target_rate: 100,
                tick_interval: Duration::from_millis(50),
                concurrency_limit: 50,
                jitter: 0.20,
            },
            Self::Stress => ModeProfile {
                target_rate: 1_000,
                tick_interval: Duration::from_millis(20),
                concurrency_limit: 50,
                jitter: 0.15,
            },
            Self::Hft => ModeProfile {
                target_rate: 10_000,
                tick_interval: Duration::from_millis(10),
                concurrency_limit: 100,
                jitter: 0.10,
            },
        }
    }

    /// Largest concurrency limit across all modes
    pub fn busiest_concurrency_limit() -> usize {
        Self::ALL
            .iter()
            .map(|m| m.profile().concurrency_limit)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "burst" => Ok(Self::Burst),
            "stress" => Ok(Self::Stress),
            "hft" => Ok(Self::Hft),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Per-mode generation and scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeProfile {
    /// Target generation rate (transactions per second)
    pub target_rate: u64,
    /// Interval of the generation/scheduling tick
    pub tick_interval: Duration,
    /// Maximum transactions in flight at once
    pub concurrency_limit: usize,
    /// Relative latency jitter (0.1 = +/-10%)
    pub jitter: f64,
}

impl ModeProfile {
    /// Transactions to synthesize for `elapsed_ms` of wall time
    #[inline]
    pub fn transactions_for(&self, elapsed_ms: u64) -> usize {
        (self.target_rate * elapsed_ms).div_ceil(1_000) as usize
    }
}
