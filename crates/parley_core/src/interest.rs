use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::persona::ProductCategory;

/// Five-bucket classification of a 0–100 interest score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl InterestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestLevel::VeryLow => "very_low",
            InterestLevel::Low => "low",
            InterestLevel::Moderate => "moderate",
            InterestLevel::High => "high",
            InterestLevel::VeryHigh => "very_high",
        }
    }
}

/// Lower bounds of each level; anything below `low` is `VeryLow`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestThresholds {
    pub very_high: f64,
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
}

impl Default for InterestThresholds {
    fn default() -> Self {
        Self {
            very_high: 80.0,
            high: 60.0,
            moderate: 40.0,
            low: 20.0,
        }
    }
}

impl InterestThresholds {
    /// Defaults with any of `very_high`/`high`/`moderate`/`low` replaced from `overrides`.
    /// Unknown keys are ignored.
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Self {
        let mut t = Self::default();
        for (key, value) in overrides {
            match key.as_str() {
                "very_high" => t.very_high = *value,
                "high" => t.high = *value,
                "moderate" => t.moderate = *value,
                "low" => t.low = *value,
                other => tracing::debug!("ignoring unknown interest threshold `{}`", other),
            }
        }
        t
    }

    pub fn classify(&self, score: f64) -> InterestLevel {
        if score >= self.very_high {
            InterestLevel::VeryHigh
        } else if score >= self.high {
            InterestLevel::High
        } else if score >= self.moderate {
            InterestLevel::Moderate
        } else if score >= self.low {
            InterestLevel::Low
        } else {
            InterestLevel::VeryLow
        }
    }
}

/// Per-keyword weights applied by the content scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordWeights {
    pub positive: f64,
    pub negative: f64,
}

impl Default for KeywordWeights {
    fn default() -> Self {
        Self {
            positive: 5.0,
            negative: -5.0,
        }
    }
}

impl KeywordWeights {
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Self {
        let mut w = Self::default();
        if let Some(v) = overrides.get("positive") {
            w.positive = *v;
        }
        if let Some(v) = overrides.get("negative") {
            w.negative = *v;
        }
        w
    }
}

/// A single quantified reading of the organization's receptiveness.
/// Immutable once created; appended to history, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestScore {
    pub score: f64,
    pub product_category: Option<ProductCategory>,
    pub level: InterestLevel,
    /// Named contributions that produced `score`.
    #[serde(default)]
    pub factors: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

impl InterestScore {
    /// Score on the 0–1 scale used in session history.
    pub fn normalized(&self) -> f64 {
        self.score / 100.0
    }
}
