//! Screen-ready view models assembled from normalized claims.
//!
//! Every screen goes through the same resolvers, so a claim renders with
//! the same stage, status tag and risk bucket wherever it appears.

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{ClaimSummary, SummaryCard, summarize};
use crate::error::Result;
use crate::export::CsvColumn;
use crate::flags::{
    CaseTypeClaims, CaseTypeCount, ClaimSeverityRow, SeverityDistribution, SeveritySlice,
    case_type_claims, case_type_counts, claim_severity_rows, describe_case,
};
use crate::notes::RfiNoteCache;
use crate::record::{ClaimRecord, Severity};
use crate::risk::{RiskBucket, classify_risk};
use crate::stage::{StageProgress, progress_for_claim};
use crate::status::{ClaimStatus, StatusTag, policy_status_tag, status_tag};
use crate::table::{ClaimFilter, Page, filter_claims, paginate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagView {
    pub case_type: String,
    pub description: String,
    pub severity: Severity,
}

/// One table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimRow {
    pub claim_id: String,
    pub patient_name: String,
    pub submitted_on: String,
    pub amount: String,
    pub status: String,
    pub status_tag: StatusTag,
    pub current_stage: Option<u8>,
    pub percent_complete: u8,
    pub risk_score: Option<f64>,
    pub risk: RiskBucket,
    pub risk_tag: StatusTag,
    pub flags: Vec<FlagView>,
    /// Only set for claims waiting on an RFI response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfi_note: Option<String>,
}

impl ClaimRow {
    pub fn from_record(claim: &ClaimRecord, notes: &RfiNoteCache) -> Self {
        let progress = progress_for_claim(claim);
        let risk = classify_risk(claim.risk_score);
        let rfi_note = (claim.status == ClaimStatus::Rfi).then(|| notes.resolve(claim));

        Self {
            claim_id: claim.claim_id.clone(),
            patient_name: claim.patient_name.clone(),
            submitted_on: claim.submitted_on_display(),
            amount: claim.amount.clone(),
            status: claim.status.as_str().to_string(),
            status_tag: status_tag(&claim.status),
            current_stage: progress.current_stage,
            percent_complete: progress.percent_complete,
            risk_score: claim.risk_score,
            risk,
            risk_tag: risk.tag(),
            flags: claim
                .flags
                .iter()
                .map(|flag| FlagView {
                    case_type: flag.case_type.clone(),
                    description: describe_case(&flag.case_type),
                    severity: flag.severity,
                })
                .collect(),
            rfi_note,
        }
    }
}

/// Columns of the insurance dashboard export.
pub fn claim_csv_columns() -> Vec<CsvColumn> {
    vec![
        CsvColumn::new("claim_id", "Claim ID"),
        CsvColumn::new("patient_name", "Patient Name"),
        CsvColumn::new("submitted_on", "Submission Date"),
        CsvColumn::new("amount", "Amount"),
        CsvColumn::new("status", "Status"),
        CsvColumn::new("percent_complete", "Progress"),
    ]
}

/// Row of the patient's policy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRow {
    pub provider: String,
    pub policy_type: String,
    pub policy_number: String,
    pub status: String,
    pub status_tag: StatusTag,
    pub premium: String,
    pub coverage: String,
    pub deductible: String,
}

impl PolicyRow {
    pub fn from_value(raw: &Value) -> Self {
        let text = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|key| match raw.get(*key)? {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_default()
        };
        let status = text(&["status"]);

        Self {
            provider: text(&["provider", "insuranceProvider"]),
            policy_type: text(&["type", "policyType", "policy_type"]),
            policy_number: text(&["policyNumber", "policy_number"]),
            status_tag: policy_status_tag(&status),
            status,
            premium: text(&["premium"]),
            coverage: text(&["coverage", "coverageLimit"]),
            deductible: text(&["deductible"]),
        }
    }
}

/// Detail panel for one claim: the row plus its full stage tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimDetail {
    #[serde(flatten)]
    pub row: ClaimRow,
    pub progress: StageProgress,
}

impl ClaimDetail {
    pub fn from_record(claim: &ClaimRecord, notes: &RfiNoteCache) -> Self {
        Self {
            row: ClaimRow::from_record(claim, notes),
            progress: progress_for_claim(claim),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: ClaimSummary,
    pub cards: Vec<SummaryCard>,
    pub page: Page<ClaimRow>,
}

impl DashboardView {
    /// Summary and cards cover every claim; only the table is filtered and paged.
    pub fn build(
        claims: &[ClaimRecord],
        notes: &RfiNoteCache,
        filter: &ClaimFilter,
        page: usize,
        page_size: usize,
    ) -> Result<Self> {
        let summary = summarize(claims);
        let matched = filter_claims(claims, filter);
        let page = paginate(&matched, page, page_size)?
            .map(|claim| ClaimRow::from_record(claim, notes));
        Ok(Self {
            cards: summary.status_cards(),
            summary,
            page,
        })
    }
}

pub fn claim_rows(claims: &[ClaimRecord], notes: &RfiNoteCache) -> Vec<ClaimRow> {
    claims
        .iter()
        .map(|claim| ClaimRow::from_record(claim, notes))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsView {
    pub summary: ClaimSummary,
    pub tiles: Vec<SummaryCard>,
    pub severity_distribution: SeverityDistribution,
    pub severity_slices: Vec<SeveritySlice>,
    pub case_types: Vec<CaseTypeCount>,
    pub case_type_claims: Vec<CaseTypeClaims>,
    pub severity_rows: Vec<ClaimSeverityRow>,
}

impl AnalyticsView {
    /// `reported` is the server's severity distribution; flags are counted
    /// when it is absent.
    pub fn build(claims: &[ClaimRecord], reported: Option<SeverityDistribution>) -> Self {
        let summary = summarize(claims);
        let severity_distribution =
            reported.unwrap_or_else(|| SeverityDistribution::from_flags(claims));

        Self {
            tiles: summary.risk_cards(),
            summary,
            severity_slices: severity_distribution.slices(),
            severity_distribution,
            case_types: case_type_counts(claims),
            case_type_claims: case_type_claims(claims),
            severity_rows: claim_severity_rows(claims),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::export_to_csv;
    use crate::record::normalize_claims;
    use crate::status::TagColor;
    use crate::table::DEFAULT_PAGE_SIZE;
    use serde_json::json;

    fn claims() -> Vec<ClaimRecord> {
        normalize_claims(&[
            json!({"claim_id": "C1", "patientName": "Ann", "status": "Approved", "risk_score": 3, "amount": "$10"}),
            json!({"claim_id": "C2", "patientName": "Bo", "status": "RFI", "notes": "Send discharge summary", "risk_score": 80,
                   "flags": [{"case_type": "CASE 2: rural", "severity": "HIGH"}]}),
            json!({"claim_id": "C3", "patientName": "Cy", "status": "Eligibility Check"}),
        ])
    }

    #[test]
    fn test_rows_share_resolvers() {
        let notes = RfiNoteCache::new();
        let view =
            DashboardView::build(&claims(), &notes, &ClaimFilter::default(), 1, DEFAULT_PAGE_SIZE)
                .unwrap();

        assert_eq!(view.summary.total, 3);
        assert_eq!(view.cards[1].value, 1);
        assert_eq!(view.page.total_items, 3);

        let approved = &view.page.items[0];
        assert_eq!(approved.risk, RiskBucket::Clean);
        assert_eq!(approved.status_tag.color, TagColor::Green);
        assert_eq!(approved.current_stage, Some(8));
        assert!(approved.rfi_note.is_none());

        let rfi = &view.page.items[1];
        assert_eq!(rfi.risk, RiskBucket::High);
        assert_eq!(rfi.rfi_note.as_deref(), Some("Send discharge summary"));
        assert_eq!(rfi.flags[0].description, "Rural Hospital, High-Tech Surgery");
        assert_eq!(notes.get("C2").as_deref(), Some("Send discharge summary"));

        let unscored = &view.page.items[2];
        assert_eq!(unscored.risk, RiskBucket::Unknown);
        assert_eq!(unscored.percent_complete, 40);
    }

    #[test]
    fn test_summary_ignores_table_filter() {
        let filter = ClaimFilter { query: "bo".to_string(), status: None };
        let view = DashboardView::build(&claims(), &RfiNoteCache::new(), &filter, 1, 1).unwrap();

        assert_eq!(view.summary.total, 3);
        assert_eq!(view.page.total_items, 1);
        assert_eq!(view.page.items[0].claim_id, "C2");

        let err = DashboardView::build(&claims(), &RfiNoteCache::new(), &filter, 0, 5).unwrap_err();
        assert!(matches!(err, crate::error::ViewError::InvalidPage { page: 0, .. }));
    }

    #[test]
    fn test_analytics_prefers_reported_distribution() {
        let claims = claims();
        let computed = AnalyticsView::build(&claims, None);
        assert_eq!(computed.severity_distribution.high, 1);
        assert_eq!(computed.tiles[2].value, 1);
        assert_eq!(computed.case_types[0].group, "Rural Hospital, High-Tech Surgery");

        let reported = SeverityDistribution { low: 7, medium: 0, high: 2 };
        let view = AnalyticsView::build(&claims, Some(reported));
        assert_eq!(view.severity_distribution, reported);
        assert_eq!(view.severity_slices.len(), 2);
    }

    #[test]
    fn test_rows_export_to_csv() {
        let rows = claim_rows(&claims()[..1], &RfiNoteCache::new());
        let csv = export_to_csv(&rows, &claim_csv_columns()).unwrap();
        assert_eq!(
            csv,
            "\"Claim ID\",\"Patient Name\",\"Submission Date\",\"Amount\",\"Status\",\"Progress\"\n\"C1\",\"Ann\",\"-\",\"$10\",\"Approved\",\"80\""
        );
    }

    #[test]
    fn test_policy_row() {
        let row = PolicyRow::from_value(&json!({
            "provider": "Acme Health", "type": "Family", "policyNumber": "POL-1",
            "status": "Active", "premium": 120, "coverage": "$50,000"
        }));
        assert_eq!(row.status_tag.color, TagColor::Green);
        assert_eq!(row.premium, "120");
        assert_eq!(row.deductible, "");

        let unknown = PolicyRow::from_value(&json!({"status": "Lapsed"}));
        assert_eq!(unknown.status_tag, StatusTag::new(TagColor::Gray, "Lapsed"));
    }

    #[test]
    fn test_detail_flattens_row() {
        let claims = claims();
        let detail = ClaimDetail::from_record(&claims[2], &RfiNoteCache::new());
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["claim_id"], "C3");
        assert_eq!(value["progress"]["current_stage"], 4);
        assert_eq!(detail.progress.caption().as_deref(), Some("Stage 4 of 10"));
    }
}
