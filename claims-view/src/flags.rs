//! Fraud case types and severity breakdowns for the analytics screen.

use serde::{Deserialize, Serialize};

use crate::record::{ClaimRecord, Severity};

/// Fraud detector case identifiers and what they check.
pub const CASE_TYPE_DESCRIPTIONS: [(&str, &str); 7] = [
    ("CASE 1", "Amount Outlier Check"),
    ("CASE 2", "Rural Hospital, High-Tech Surgery"),
    ("CASE 3", "Pre-existing Disease before Insurance"),
    ("CASE 4", "Multiple Claims in Year"),
    ("CASE 5", "Fake or Unknown Disease"),
    ("CASE 6", "Overdose/Overbilling Detection"),
    ("CASE 7", "Mismatched Diagnosis and Claimed Treatment"),
];

/// Lookup key of a raw case type: everything before the first `:`.
pub fn case_key(case_type: &str) -> &str {
    case_type.split(':').next().unwrap_or(case_type).trim()
}

pub fn case_description(case_type: &str) -> Option<&'static str> {
    let key = case_key(case_type);
    CASE_TYPE_DESCRIPTIONS
        .iter()
        .find(|(case, _)| *case == key)
        .map(|(_, description)| *description)
}

/// Description when the case is known, the raw case type otherwise.
pub fn describe_case(case_type: &str) -> String {
    case_description(case_type)
        .map(str::to_string)
        .unwrap_or_else(|| case_type.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseTypeCount {
    pub group: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseTypeClaims {
    pub case_type: String,
    pub claim_ids: Vec<String>,
}

/// Flag counts per case type, in first-seen order.
///
/// Groups are keyed by the case key, so `"CASE 1: x"` and `"CASE 1: y"`
/// share a slice. Unknown keys are labelled with the key itself.
pub fn case_type_counts(claims: &[ClaimRecord]) -> Vec<CaseTypeCount> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for flag in claims.iter().flat_map(|claim| claim.flags.iter()) {
        let key = case_key(&flag.case_type);
        match counts.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key.to_string(), 1)),
        }
    }

    counts
        .into_iter()
        .map(|(key, value)| CaseTypeCount {
            group: describe_case(&key),
            value,
        })
        .collect()
}

/// Claim ids per described case type, without duplicates.
pub fn case_type_claims(claims: &[ClaimRecord]) -> Vec<CaseTypeClaims> {
    let mut groups: Vec<CaseTypeClaims> = Vec::new();
    for claim in claims {
        for flag in &claim.flags {
            let description = describe_case(case_key(&flag.case_type));
            let index = match groups.iter().position(|g| g.case_type == description) {
                Some(index) => index,
                None => {
                    groups.push(CaseTypeClaims {
                        case_type: description,
                        claim_ids: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            let ids = &mut groups[index].claim_ids;
            if !ids.contains(&claim.claim_id) {
                ids.push(claim.claim_id.clone());
            }
        }
    }
    groups
}

/// Counts of LOW / MEDIUM / HIGH findings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityDistribution {
    #[serde(rename = "LOW", default)]
    pub low: usize,
    #[serde(rename = "MEDIUM", default)]
    pub medium: usize,
    #[serde(rename = "HIGH", default)]
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeveritySlice {
    pub group: String,
    pub value: usize,
}

impl SeverityDistribution {
    pub fn from_flags(claims: &[ClaimRecord]) -> Self {
        let mut distribution = Self::default();
        for flag in claims.iter().flat_map(|claim| claim.flags.iter()) {
            distribution.add(flag.severity);
        }
        distribution
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// Chart series; zero buckets are left out.
    pub fn slices(&self) -> Vec<SeveritySlice> {
        [
            ("Low Severity", self.low),
            ("Medium Severity", self.medium),
            ("High Severity", self.high),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .map(|(group, value)| SeveritySlice {
            group: group.to_string(),
            value,
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimSeverityRow {
    pub claim_id: String,
    /// "Low", "Medium", "High"
    pub severity: String,
}

/// Rows for the severity-by-claim table; claims without a severity are skipped.
pub fn claim_severity_rows(claims: &[ClaimRecord]) -> Vec<ClaimSeverityRow> {
    claims
        .iter()
        .filter_map(|claim| {
            claim.severity.map(|severity| ClaimSeverityRow {
                claim_id: claim.claim_id.clone(),
                severity: severity.title().to_string(),
            })
        })
        .collect()
}
