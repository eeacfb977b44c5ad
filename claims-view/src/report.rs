//! Downloadable plain-text reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::Result;
use crate::flags::describe_case;
use crate::record::{format_date, parse_date, score_from_value};
use crate::risk::{RiskBucket, classify_risk_value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFlag {
    #[serde(default)]
    pub case_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Number or numeric string, as the analysis service sends it.
    #[serde(default)]
    pub overall_risk_score: Option<Value>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub fraud_flags: Vec<ReportFlag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportClaimDetails {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub submission_date: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
}

/// Payload of `GET /download-report/{claimId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudReport {
    pub claim_id: String,
    #[serde(default)]
    pub report_date: Option<String>,
    #[serde(default)]
    pub risk_assessment: RiskAssessment,
    #[serde(default)]
    pub claim_details: ReportClaimDetails,
    #[serde(default)]
    pub analysis_summary: String,
}

impl FraudReport {
    pub fn file_name(&self) -> String {
        format!("fraud_report_{}.txt", self.claim_id)
    }

    /// Risk level shown in the report, from the shared classifier. The
    /// server's own label is only used when there is no score to classify.
    pub fn risk_level(&self) -> String {
        let bucket = self
            .risk_assessment
            .overall_risk_score
            .as_ref()
            .map(classify_risk_value)
            .unwrap_or(RiskBucket::Unknown);
        match bucket {
            RiskBucket::Unknown => self
                .risk_assessment
                .risk_level
                .clone()
                .unwrap_or_else(|| RiskBucket::Unknown.label().to_string()),
            bucket => bucket.label().to_string(),
        }
    }

    pub fn render(&self) -> String {
        self.to_string().trim().to_string()
    }

    fn write_report(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let details = &self.claim_details;
        let report_date = format_date(
            self.report_date
                .as_deref()
                .and_then(|d| parse_date(&Value::String(d.to_string()))),
        );
        let score = self
            .risk_assessment
            .overall_risk_score
            .as_ref()
            .and_then(score_from_value)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        writeln!(out, "FRAUD DETECTION REPORT")?;
        writeln!(out, "======================")?;
        writeln!(out)?;
        writeln!(out, "Claim ID: {}", self.claim_id)?;
        writeln!(out, "Report Date: {}", report_date)?;
        writeln!(out)?;
        writeln!(out, "RISK ASSESSMENT")?;
        writeln!(out, "---------------")?;
        writeln!(out, "Overall Risk Score: {}", score)?;
        writeln!(out, "Risk Level: {}", self.risk_level())?;
        writeln!(out)?;
        writeln!(out, "CLAIM DETAILS")?;
        writeln!(out, "-------------")?;
        writeln!(out, "Patient Name: {}", or_dash(details.patient_name.as_deref()))?;
        writeln!(out, "Submission Date: {}", or_dash(details.submission_date.as_deref()))?;
        writeln!(out, "Amount: {}", amount_text(details.amount.as_ref()))?;
        writeln!(out, "Treatment: {}", or_dash(details.treatment.as_deref()))?;
        writeln!(out, "Diagnosis: {}", or_dash(details.diagnosis.as_deref()))?;
        writeln!(out)?;
        writeln!(out, "FRAUD FLAGS")?;
        writeln!(out, "-----------")?;
        if self.risk_assessment.fraud_flags.is_empty() {
            writeln!(out, "None")?;
        }
        for flag in &self.risk_assessment.fraud_flags {
            writeln!(out, "Case Type: {} ({})", flag.case_type, describe_case(&flag.case_type))?;
            writeln!(out, "Severity: {}", flag.severity)?;
            writeln!(out, "Description: {}", or_dash(flag.description.as_deref()))?;
            writeln!(out, "Recommendation: {}", or_dash(flag.recommendation.as_deref()))?;
            writeln!(out)?;
        }
        writeln!(out)?;
        writeln!(out, "ANALYSIS SUMMARY")?;
        writeln!(out, "----------------")?;
        write!(out, "{}", self.analysis_summary.trim())
    }
}

impl fmt::Display for FraudReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_report(f)
    }
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn amount_text(amount: Option<&Value>) -> String {
    match amount {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => or_dash(Some(s)).to_string(),
        Some(other) => other.to_string(),
    }
}

/// Plain `key: value` dump of a table row, one field per line.
pub fn claim_report<T: Serialize>(row: &T) -> Result<String> {
    let value = serde_json::to_value(row)?;
    let Value::Object(fields) = value else {
        return Ok(amount_text(Some(&value)));
    };

    Ok(fields
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}: {}", key, s),
            Value::Null => format!("{}: ", key),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn claim_report_file_name(claim_id: &str) -> String {
    format!("claim_{}_report.txt", claim_id)
}
