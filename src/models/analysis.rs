use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one successful `POST /api/analyze` call.
///
/// Superseded in full by the next analysis; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Congestion classification text, e.g. "High Congestion".
    pub prediction: String,

    /// Vehicle counts, one per lane, in lane order.
    pub counts: Vec<u32>,

    pub timings: LightTimings,

    /// Base64-encoded PNG produced by the backend, if it could render one.
    #[serde(default)]
    pub visualization: Option<String>,
}

impl AnalysisResult {
    /// Parse and validate a success payload.
    ///
    /// Missing fields (e.g. no `timings`) or out-of-range numbers are
    /// rejected here instead of surfacing later as a rendering fault.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn congestion(&self) -> CongestionLevel {
        CongestionLevel::classify(&self.prediction)
    }
}

/// Light durations computed by the backend, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTimings {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
    pub vehicle_count: u32,
}

impl LightTimings {
    /// Configured duration of a phase.
    pub fn duration(&self, phase: LightPhase) -> u32 {
        match phase {
            LightPhase::Green => self.green,
            LightPhase::Yellow => self.yellow,
            LightPhase::Red => self.red,
        }
    }
}

/// One phase of the simulated traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightPhase {
    Green,
    Yellow,
    Red,
}

impl LightPhase {
    /// Fixed cycle: green → yellow → red → green.
    pub fn next(self) -> Self {
        match self {
            LightPhase::Green => LightPhase::Yellow,
            LightPhase::Yellow => LightPhase::Red,
            LightPhase::Red => LightPhase::Green,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LightPhase::Green => "Green",
            LightPhase::Yellow => "Yellow",
            LightPhase::Red => "Red",
        }
    }
}

impl fmt::Display for LightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorical traffic density derived from the prediction text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    /// Substring classification: "High" wins over "Medium"; anything else is low.
    pub fn classify(prediction: &str) -> Self {
        if prediction.contains("High") {
            CongestionLevel::High
        } else if prediction.contains("Medium") {
            CongestionLevel::Medium
        } else {
            CongestionLevel::Low
        }
    }

    /// Style class used by the results summary.
    pub fn style_class(self) -> &'static str {
        match self {
            CongestionLevel::Low => "congestion-low",
            CongestionLevel::Medium => "congestion-medium",
            CongestionLevel::High => "congestion-high",
        }
    }
}
