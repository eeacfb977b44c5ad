use serde::{Deserialize, Serialize};
use std::fmt;

/// Carbon tag palette used by every dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagColor {
    Green,
    Red,
    Yellow,
    Blue,
    Cyan,
    CoolGray,
    Gray,
}

/// Color/label pair rendered as a status tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTag {
    pub color: TagColor,
    pub label: String,
}

impl StatusTag {
    pub fn new(color: TagColor, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
        }
    }
}

/// Claim status as reported by the claims API.
///
/// The set is closed on our side, but the server is free to introduce new
/// values; those are kept verbatim in [`ClaimStatus::Other`] so they still
/// render and still count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClaimStatus {
    Approved,
    Rejected,
    Pending,
    InProgress,
    Rfi,
    Initiated,
    DocumentsReceived,
    OcrDataExtraction,
    EligibilityCheck,
    FraudAnalysis,
    MedicalNecessityCostValidation,
    ClaimUnderReview,
    PaymentProcessing,
    Completed,
    Other(String),
}

impl ClaimStatus {
    pub const KNOWN: [ClaimStatus; 14] = [
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Pending,
        ClaimStatus::InProgress,
        ClaimStatus::Rfi,
        ClaimStatus::Initiated,
        ClaimStatus::DocumentsReceived,
        ClaimStatus::OcrDataExtraction,
        ClaimStatus::EligibilityCheck,
        ClaimStatus::FraudAnalysis,
        ClaimStatus::MedicalNecessityCostValidation,
        ClaimStatus::ClaimUnderReview,
        ClaimStatus::PaymentProcessing,
        ClaimStatus::Completed,
    ];

    /// Total parse: unknown strings become `Other` with the input kept as-is.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Approved" => Self::Approved,
            "Rejected" => Self::Rejected,
            "Pending" => Self::Pending,
            "In Progress" => Self::InProgress,
            "RFI" => Self::Rfi,
            "Initiated" => Self::Initiated,
            "Documents Received" => Self::DocumentsReceived,
            "OCR & Data Extraction" => Self::OcrDataExtraction,
            "Eligibility Check" => Self::EligibilityCheck,
            "Fraud Analysis" => Self::FraudAnalysis,
            "Medical Necessity & Cost Validation" => Self::MedicalNecessityCostValidation,
            "Claim Under Review" => Self::ClaimUnderReview,
            "Payment Processing" => Self::PaymentProcessing,
            "Completed" => Self::Completed,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Rfi => "RFI",
            Self::Initiated => "Initiated",
            Self::DocumentsReceived => "Documents Received",
            Self::OcrDataExtraction => "OCR & Data Extraction",
            Self::EligibilityCheck => "Eligibility Check",
            Self::FraudAnalysis => "Fraud Analysis",
            Self::MedicalNecessityCostValidation => "Medical Necessity & Cost Validation",
            Self::ClaimUnderReview => "Claim Under Review",
            Self::PaymentProcessing => "Payment Processing",
            Self::Completed => "Completed",
            Self::Other(raw) => raw,
        }
    }

    /// Approved and Rejected are the only terminal decisions; everything
    /// else, including statuses we have never seen, is still in flight.
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for ClaimStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ClaimStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ClaimStatus> for String {
    fn from(status: ClaimStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the tag shown next to a claim on every dashboard.
pub fn status_tag(status: &ClaimStatus) -> StatusTag {
    let color = match status {
        ClaimStatus::Approved | ClaimStatus::Completed => TagColor::Green,
        ClaimStatus::Rejected => TagColor::Red,
        ClaimStatus::Pending => TagColor::Yellow,
        ClaimStatus::InProgress
        | ClaimStatus::Rfi
        | ClaimStatus::Initiated
        | ClaimStatus::DocumentsReceived
        | ClaimStatus::OcrDataExtraction
        | ClaimStatus::EligibilityCheck
        | ClaimStatus::FraudAnalysis
        | ClaimStatus::MedicalNecessityCostValidation
        | ClaimStatus::ClaimUnderReview
        | ClaimStatus::PaymentProcessing => TagColor::Blue,
        ClaimStatus::Other(_) => TagColor::Gray,
    };
    StatusTag::new(color, status.as_str())
}

/// Tag for an insurance policy status on the patient dashboard.
pub fn policy_status_tag(status: &str) -> StatusTag {
    let color = match status {
        "Active" | "Approved" => TagColor::Green,
        "Processing" => TagColor::Blue,
        "Pending" => TagColor::Cyan,
        "Inactive" => TagColor::Red,
        _ => TagColor::Gray,
    };
    StatusTag::new(color, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_known_labels() {
        for status in ClaimStatus::KNOWN {
            assert_eq!(ClaimStatus::parse(status.as_str()), status);
            assert!(status.is_known());
        }
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        let status = ClaimStatus::parse("Escalated To Legal");
        assert_eq!(status, ClaimStatus::Other("Escalated To Legal".to_string()));
        assert_eq!(status.as_str(), "Escalated To Legal");
        assert!(!status.is_decided());
    }

    #[test]
    fn test_status_tag_colors() {
        assert_eq!(status_tag(&ClaimStatus::Approved).color, TagColor::Green);
        assert_eq!(status_tag(&ClaimStatus::Rejected).color, TagColor::Red);
        assert_eq!(status_tag(&ClaimStatus::Pending).color, TagColor::Yellow);
        assert_eq!(status_tag(&ClaimStatus::InProgress).color, TagColor::Blue);
        assert_eq!(status_tag(&ClaimStatus::Rfi).color, TagColor::Blue);
        assert_eq!(status_tag(&ClaimStatus::FraudAnalysis).color, TagColor::Blue);
    }

    #[test]
    fn test_unrecognized_status_falls_back_to_gray() {
        let tag = status_tag(&ClaimStatus::parse("On Hold"));
        assert_eq!(tag, StatusTag::new(TagColor::Gray, "On Hold"));
    }

    #[test]
    fn test_policy_status_tag() {
        assert_eq!(policy_status_tag("Active").color, TagColor::Green);
        assert_eq!(policy_status_tag("Pending").color, TagColor::Cyan);
        assert_eq!(policy_status_tag("Inactive").color, TagColor::Red);
        assert_eq!(policy_status_tag("Lapsed"), StatusTag::new(TagColor::Gray, "Lapsed"));
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&ClaimStatus::OcrDataExtraction).unwrap();
        assert_eq!(json, "\"OCR & Data Extraction\"");
        let back: ClaimStatus = serde_json::from_str("\"RFI\"").unwrap();
        assert_eq!(back, ClaimStatus::Rfi);
        assert_eq!(serde_json::to_string(&TagColor::CoolGray).unwrap(), "\"cool-gray\"");
    }
}
