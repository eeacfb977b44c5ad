//! Risk buckets derived from the server-assigned fraud score.
//!
//! Every screen classifies through [`classify_risk`]; nothing else in the
//! workspace compares a risk score against a threshold.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::{StatusTag, TagColor};

/// Lower bound (inclusive) of the High Risk bucket.
pub const HIGH_RISK_FLOOR: f64 = 70.0;
/// Lower bound (inclusive) of the Medium Risk bucket.
pub const MEDIUM_RISK_FLOOR: f64 = 35.0;
/// Lower bound (inclusive) of the Low Risk bucket.
pub const LOW_RISK_FLOOR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBucket {
    #[serde(rename = "Clean")]
    Clean,
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    /// No usable score. Counted in totals, never in risk counts.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl RiskBucket {
    pub const SCORED: [RiskBucket; 4] = [
        RiskBucket::Clean,
        RiskBucket::Low,
        RiskBucket::Medium,
        RiskBucket::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Clean => "Clean",
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color(self) -> TagColor {
        match self {
            Self::Clean => TagColor::Green,
            Self::Low => TagColor::CoolGray,
            Self::Medium => TagColor::Yellow,
            Self::High => TagColor::Red,
            Self::Unknown => TagColor::Gray,
        }
    }

    pub fn tag(self) -> StatusTag {
        StatusTag::new(self.color(), self.label())
    }

    pub fn is_scored(self) -> bool {
        self != Self::Unknown
    }

    /// Medium and High are what the analytics tiles call "risky".
    pub fn is_risky(self) -> bool {
        matches!(self, Self::Medium | Self::High)
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a 0-100 risk score to its bucket.
///
/// Out-of-range scores land in the nearest bucket (negative is Clean, above
/// 100 is High Risk). A missing or NaN score is [`RiskBucket::Unknown`].
pub fn classify_risk(score: Option<f64>) -> RiskBucket {
    let Some(score) = score else {
        return RiskBucket::Unknown;
    };
    if score.is_nan() {
        return RiskBucket::Unknown;
    }

    if score >= HIGH_RISK_FLOOR {
        RiskBucket::High
    } else if score >= MEDIUM_RISK_FLOOR {
        RiskBucket::Medium
    } else if score >= LOW_RISK_FLOOR {
        RiskBucket::Low
    } else {
        RiskBucket::Clean
    }
}

/// Classify a raw JSON value, accepting numbers and numeric strings.
pub fn classify_risk_value(value: &serde_json::Value) -> RiskBucket {
    classify_risk(crate::record::score_from_value(value))
}
