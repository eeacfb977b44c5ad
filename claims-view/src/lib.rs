pub mod aggregate;
pub mod error;
pub mod export;
pub mod flags;
pub mod notes;
pub mod queue;
pub mod record;
pub mod report;
pub mod risk;
pub mod stage;
pub mod status;
pub mod table;
pub mod validation;
pub mod view;

// Re-export commonly used types
pub use aggregate::{ClaimSummary, RiskCounts, SummaryCard, summarize};
pub use export::{CsvColumn, export_to_csv};
pub use error::{Result, ValidationError, ViewError};
pub use flags::{SeverityDistribution, case_type_claims, case_type_counts, describe_case};
pub use notes::{DEFAULT_RFI_NOTE, RfiNoteCache};
pub use queue::{AdjudicationAction, AdjudicationRequest, WorkQueue};
pub use record::{ClaimRecord, FraudFlag, Severity, normalize_claim, normalize_claims};
pub use report::{FraudReport, claim_report, claim_report_file_name};
pub use risk::{RiskBucket, classify_risk};
pub use stage::{STAGES, StageProgress, StageState, progress_for_claim, resolve_progress};
pub use status::{ClaimStatus, StatusTag, TagColor, policy_status_tag, status_tag};
pub use table::{ClaimFilter, Page, filter_claims, paginate};
pub use validation::{Attachment, ClaimSubmission, Submitter};
pub use view::{
    AnalyticsView, ClaimDetail, ClaimRow, DashboardView, PolicyRow, claim_csv_columns, claim_rows,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_to_dashboard_pipeline() {
        let payload = json!({
            "claims": [
                {"claim_id": "H-1", "patientName": "Ann", "status": "Approved", "risk_score": 12, "currentStage": 10},
                {"claimId": "H-2", "name": "Bo", "status": "Rejected", "riskScore": 91},
                {"id": "H-3", "patient_name": "Cy", "status": "RFI", "rfi_notes": "Need prescription", "risk_score": 40},
                {"patientName": "no id"},
                {"id": "H-4", "status": "Escalated to SIU"}
            ]
        });
        let raw = payload["claims"].as_array().cloned().unwrap_or_default();

        let claims = normalize_claims(&raw);
        assert_eq!(claims.len(), 4);

        let notes = RfiNoteCache::new();
        let view =
            DashboardView::build(&claims, &notes, &ClaimFilter::default(), 1, table::DEFAULT_PAGE_SIZE)
                .unwrap();
        assert_eq!(view.summary.total, 4);
        assert_eq!(view.summary.approved, 1);
        assert_eq!(view.summary.rejected, 1);
        assert_eq!(view.summary.in_progress, 2);
        assert_eq!(
            view.summary.by_risk_bucket,
            RiskCounts { clean: 0, low: 1, medium: 1, high: 1 }
        );

        let unknown_status = &view.page.items[3];
        assert_eq!(unknown_status.status_tag, StatusTag::new(TagColor::Gray, "Escalated to SIU"));
        assert_eq!(unknown_status.risk, RiskBucket::Unknown);
        assert_eq!(unknown_status.percent_complete, 0);

        assert_eq!(notes.get("H-3").as_deref(), Some("Need prescription"));
    }

    #[test]
    fn test_filtered_page_of_rows() {
        let raw: Vec<serde_json::Value> = (1..=12)
            .map(|i| json!({"id": format!("C-{:02}", i), "status": if i % 3 == 0 { "RFI" } else { "Pending" }}))
            .collect();
        let claims = normalize_claims(&raw);

        let filter = ClaimFilter {
            query: String::new(),
            status: Some(ClaimStatus::Rfi),
        };
        let matched: Vec<ClaimRecord> = filter_claims(&claims, &filter).into_iter().cloned().collect();
        let page = paginate(&matched, 1, table::DEFAULT_PAGE_SIZE).unwrap();

        assert_eq!(page.total_items, 4);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].claim_id, "C-03");
    }

    #[test]
    fn test_single_risk_policy_across_screens() {
        let mut claim = ClaimRecord::new("C1");
        claim.risk_score = Some(70.0);

        let row = ClaimRow::from_record(&claim, &RfiNoteCache::new());
        let summary = summarize(std::slice::from_ref(&claim));
        let report: FraudReport = serde_json::from_value(json!({
            "claim_id": "C1",
            "risk_assessment": {"overall_risk_score": 70, "risk_level": "MEDIUM"}
        }))
        .unwrap();

        assert_eq!(row.risk, classify_risk(Some(70.0)));
        assert_eq!(summary.by_risk_bucket.high, 1);
        assert_eq!(report.risk_level(), RiskBucket::High.label());
    }
}
