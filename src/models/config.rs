use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User configuration from `TrafficDash Config.yaml`.
///
/// Every section and field falls back to its default, so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend: BackendSettings,
    pub animation: AnimationSettings,
    pub logging: LoggingSettings,
}

/// Where the analysis backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Delays of the decorative loading animation and the light-cycle tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub first_progress_delay_ms: u64,
    pub second_progress_delay_ms: u64,
    pub dot_pulse_interval_ms: u64,
    pub fade_in_delay_ms: u64,
    pub simulation_start_delay_ms: u64,
    pub light_tick_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            first_progress_delay_ms: 800,
            second_progress_delay_ms: 1800,
            dot_pulse_interval_ms: 400,
            fade_in_delay_ms: 300,
            simulation_start_delay_ms: 500,
            light_tick_ms: 1000,
        }
    }
}

impl AnimationSettings {
    pub fn first_progress_delay(&self) -> Duration {
        Duration::from_millis(self.first_progress_delay_ms)
    }

    pub fn second_progress_delay(&self) -> Duration {
        Duration::from_millis(self.second_progress_delay_ms)
    }

    /// Never zero: `tokio::time::interval` panics on a zero period.
    pub fn dot_pulse_interval(&self) -> Duration {
        Duration::from_millis(self.dot_pulse_interval_ms.max(1))
    }

    pub fn fade_in_delay(&self) -> Duration {
        Duration::from_millis(self.fade_in_delay_ms)
    }

    pub fn simulation_start_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_start_delay_ms)
    }

    /// Never zero, for the same reason as [`Self::dot_pulse_interval`].
    pub fn light_tick(&self) -> Duration {
        Duration::from_millis(self.light_tick_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub debug_mode: bool,
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            debug_mode: false,
            console_output: true,
        }
    }
}
