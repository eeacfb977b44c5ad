use serde::Serialize;

use crate::record::ClaimRecord;
use crate::risk::{RiskBucket, classify_risk};
use crate::status::ClaimStatus;

/// Per-bucket counts. Claims without a usable score are not counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub clean: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskCounts {
    pub fn get(&self, bucket: RiskBucket) -> usize {
        match bucket {
            RiskBucket::Clean => self.clean,
            RiskBucket::Low => self.low,
            RiskBucket::Medium => self.medium,
            RiskBucket::High => self.high,
            RiskBucket::Unknown => 0,
        }
    }

    pub fn risky(&self) -> usize {
        RiskBucket::SCORED
            .into_iter()
            .filter(|bucket| bucket.is_risky())
            .map(|bucket| self.get(bucket))
            .sum()
    }

    fn record(&mut self, bucket: RiskBucket) {
        match bucket {
            RiskBucket::Clean => self.clean += 1,
            RiskBucket::Low => self.low += 1,
            RiskBucket::Medium => self.medium += 1,
            RiskBucket::High => self.high += 1,
            RiskBucket::Unknown => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClaimSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Everything that is neither Approved nor Rejected, including statuses
    /// introduced server-side after this code was written.
    pub in_progress: usize,
    pub by_risk_bucket: RiskCounts,
}

/// Fold a claim list into dashboard counts.
pub fn summarize(claims: &[ClaimRecord]) -> ClaimSummary {
    claims
        .iter()
        .fold(ClaimSummary::default(), |mut summary, claim| {
            summary.total += 1;
            match claim.status {
                ClaimStatus::Approved => summary.approved += 1,
                ClaimStatus::Rejected => summary.rejected += 1,
                _ => summary.in_progress += 1,
            }
            summary
                .by_risk_bucket
                .record(classify_risk(claim.risk_score));
            summary
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardIcon {
    Document,
    Checkmark,
    Close,
    Time,
    WarningAlt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: usize,
    pub icon: CardIcon,
}

impl ClaimSummary {
    /// Cards on the hospital, insurance and patient dashboards.
    pub fn status_cards(&self) -> Vec<SummaryCard> {
        vec![
            SummaryCard {
                title: "Total Claims Submitted",
                value: self.total,
                icon: CardIcon::Document,
            },
            SummaryCard {
                title: "Approved Claims",
                value: self.approved,
                icon: CardIcon::Checkmark,
            },
            SummaryCard {
                title: "Rejected Claims",
                value: self.rejected,
                icon: CardIcon::Close,
            },
            SummaryCard {
                title: "Claims In Progress",
                value: self.in_progress,
                icon: CardIcon::Time,
            },
        ]
    }

    /// Tiles on the fraud analytics screen.
    pub fn risk_cards(&self) -> Vec<SummaryCard> {
        vec![
            SummaryCard {
                title: "Total Claims",
                value: self.total,
                icon: CardIcon::Document,
            },
            SummaryCard {
                title: "Clean Claims",
                value: self.by_risk_bucket.clean,
                icon: CardIcon::Checkmark,
            },
            SummaryCard {
                title: "Risky Claims",
                value: self.by_risk_bucket.risky(),
                icon: CardIcon::WarningAlt,
            },
            SummaryCard {
                title: "High Risk Claims",
                value: self.by_risk_bucket.high,
                icon: CardIcon::WarningAlt,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(id: &str, status: &str, score: Option<f64>) -> ClaimRecord {
        let mut claim = ClaimRecord::new(id);
        claim.status = ClaimStatus::parse(status);
        claim.risk_score = score;
        claim
    }

    #[test]
    fn test_in_progress_is_open_world() {
        let statuses = [
            "Approved", "Approved", "Approved", "Rejected", "Rejected", "Pending", "RFI",
            "Fraud Analysis", "Escalated", "",
        ];
        let claims: Vec<ClaimRecord> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| claim(&format!("C{}", i), status, None))
            .collect();

        let summary = summarize(&claims);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.approved, 3);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.in_progress, 5);
    }

    #[test]
    fn test_unscored_claims_only_count_in_total() {
        let claims = vec![
            claim("C1", "Pending", Some(2.0)),
            claim("C2", "Pending", Some(20.0)),
            claim("C3", "Pending", Some(50.0)),
            claim("C4", "Pending", Some(90.0)),
            claim("C5", "Pending", Some(70.0)),
            claim("C6", "Pending", None),
        ];

        let summary = summarize(&claims);
        assert_eq!(summary.total, 6);
        assert_eq!(
            summary.by_risk_bucket,
            RiskCounts { clean: 1, low: 1, medium: 1, high: 2 }
        );
        assert_eq!(summary.by_risk_bucket.risky(), 3);
        assert_eq!(summary.by_risk_bucket.get(RiskBucket::Unknown), 0);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(summarize(&[]), ClaimSummary::default());
    }

    #[test]
    fn test_cards() {
        let summary = summarize(&[claim("C1", "Approved", Some(80.0)), claim("C2", "Initiated", Some(1.0))]);
        let cards = summary.status_cards();
        assert_eq!(cards[0].value, 2);
        assert_eq!(cards[1].value, 1);
        assert_eq!(cards[3].title, "Claims In Progress");
        assert_eq!(cards[3].value, 1);

        let tiles = summary.risk_cards();
        assert_eq!(tiles[1].value, 1);
        assert_eq!(tiles[2].value, 1);
        assert_eq!(tiles[3].value, 1);
    }
}
