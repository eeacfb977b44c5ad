//! Canonical claim shape and the normalizer that builds it from the
//! heterogeneous payloads of the hospital, patient, insurance and analytics
//! endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{Result, ViewError};
use crate::stage::clamp_stage;
use crate::status::ClaimStatus;

/// Placeholder rendered for a missing or unparsable date.
pub const DATE_PLACEHOLDER: &str = "-";

const ID_FIELDS: [&str; 3] = ["claim_id", "claimId", "id"];
const PATIENT_NAME_FIELDS: [&str; 3] = ["patientName", "patient_name", "name"];
const SUBMITTED_FIELDS: [&str; 6] = [
    "submittedAt",
    "submissionDate",
    "submission_date",
    "submitted_on",
    "submittedOn",
    "date",
];
const AMOUNT_FIELDS: [&str; 3] = ["amount", "claimAmount", "claim_amount"];
const STAGE_FIELDS: [&str; 2] = ["currentStage", "current_stage"];
const RISK_FIELDS: [&str; 2] = ["risk_score", "riskScore"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// "Low", "Medium", "High"
    pub fn title(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fraud-detection finding attached to a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudFlag {
    /// Raw case identifier, e.g. `"CASE 1: amount 4x regional mean"`.
    pub case_type: String,
    pub severity: Severity,
}

/// Note fields that some endpoints carry instead of a top-level `notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateNotes {
    pub claim_details: Option<String>,
    pub adjudicator: Option<String>,
    pub rfi: Option<String>,
}

/// Canonical claim, rebuilt from every API response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub patient_name: String,
    pub submitted_on: Option<DateTime<Utc>>,
    /// Currency display string, kept verbatim.
    pub amount: String,
    pub status: ClaimStatus,
    pub current_stage: Option<u8>,
    pub risk_score: Option<f64>,
    /// Detection order.
    pub flags: Vec<FraudFlag>,
    pub notes: Option<String>,
    pub alternate_notes: AlternateNotes,
    /// Claim-level severity reported by the analytics endpoint.
    pub severity: Option<Severity>,
}

impl ClaimRecord {
    pub fn new(claim_id: impl Into<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            ..Default::default()
        }
    }

    pub fn submitted_on_display(&self) -> String {
        format_date(self.submitted_on)
    }
}

/// Build a [`ClaimRecord`] from one raw claim object.
///
/// The identifier is the first non-empty of `claim_id`, `claimId`, `id`.
/// Anything else that is missing or malformed degrades to an empty string or
/// `None`.
pub fn normalize_claim(raw: &Value) -> Result<ClaimRecord> {
    let obj = raw.as_object().ok_or(ViewError::MissingIdentifier)?;
    let claim_id = first_text(obj, &ID_FIELDS).ok_or(ViewError::MissingIdentifier)?;

    let submitted_on = first_present(obj, &SUBMITTED_FIELDS).and_then(|value| {
        let parsed = parse_date(value);
        if parsed.is_none() {
            warn!(claim_id = %claim_id, value = %value, "Unparsable submission date");
        }
        parsed
    });

    let status = first_text(obj, &["status"])
        .map(|s| ClaimStatus::parse(&s))
        .unwrap_or_default();

    let current_stage = first_present(obj, &STAGE_FIELDS)
        .and_then(stage_from_value)
        .map(clamp_stage);

    let risk_score = first_present(obj, &RISK_FIELDS).and_then(score_from_value);

    let flags = obj
        .get("flags")
        .and_then(Value::as_array)
        .map(|flags| {
            flags
                .iter()
                .filter_map(|flag| parse_flag(&claim_id, flag))
                .collect()
        })
        .unwrap_or_default();

    let alternate_notes = AlternateNotes {
        claim_details: obj
            .get("claim_details")
            .and_then(Value::as_object)
            .and_then(|details| first_text(details, &["notes"])),
        adjudicator: first_text(obj, &["adjudicator_notes"]),
        rfi: first_text(obj, &["rfi_notes"]),
    };

    let severity = first_text(obj, &["severity"]).and_then(|s| Severity::parse(&s));

    Ok(ClaimRecord {
        patient_name: first_text(obj, &PATIENT_NAME_FIELDS).unwrap_or_default(),
        submitted_on,
        amount: first_text(obj, &AMOUNT_FIELDS).unwrap_or_default(),
        status,
        current_stage,
        risk_score,
        flags,
        notes: first_text(obj, &["notes"]),
        alternate_notes,
        severity,
        claim_id,
    })
}

/// Normalize a list of raw claims, dropping (and logging) the ones without
/// an identifier.
pub fn normalize_claims(raw: &[Value]) -> Vec<ClaimRecord> {
    let claims: Vec<ClaimRecord> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match normalize_claim(value) {
            Ok(claim) => Some(claim),
            Err(e) => {
                warn!(index, error = %e, "Discarding claim payload");
                None
            }
        })
        .collect();

    debug!(
        received = raw.len(),
        kept = claims.len(),
        "Normalized claim payloads"
    );
    claims
}

/// Parse a date the way a browser `Date` would accept it from our API:
/// RFC 3339, ISO date/time without offset, plain ISO date, US `m/d/Y`, or
/// epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}

/// Numeric score from a JSON number or numeric string. NaN is treated as
/// absent.
pub fn score_from_value(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (!score.is_nan()).then_some(score)
}

fn stage_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_flag(claim_id: &str, flag: &Value) -> Option<FraudFlag> {
    let case_type = flag.get("case_type").and_then(Value::as_str)?.to_string();
    let raw_severity = flag
        .get("severity")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match Severity::parse(raw_severity) {
        Some(severity) => Some(FraudFlag {
            case_type,
            severity,
        }),
        None => {
            warn!(
                claim_id = %claim_id,
                case_type = %case_type,
                severity = %raw_severity,
                "Dropping fraud flag with unknown severity"
            );
            None
        }
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

/// First key holding a non-blank string or a number, rendered as text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
