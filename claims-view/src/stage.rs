use serde::{Deserialize, Serialize};

use crate::record::ClaimRecord;
use crate::status::ClaimStatus;

pub const TOTAL_STAGES: u8 = 10;

/// One step of the fixed claim processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub static STAGES: [Stage; TOTAL_STAGES as usize] = [
    Stage {
        id: 1,
        name: "Initiated",
        description: "Claim has been submitted and logged into the system",
    },
    Stage {
        id: 2,
        name: "Documents Received",
        description: "All required documents have been received and verified",
    },
    Stage {
        id: 3,
        name: "OCR & Data Extraction",
        description: "Optical character recognition and data extraction in progress",
    },
    Stage {
        id: 4,
        name: "Eligibility Check",
        description: "Verifying patient eligibility and coverage details",
    },
    Stage {
        id: 5,
        name: "Fraud Analysis",
        description: "Analyzing claim for potential fraudulent activity",
    },
    Stage {
        id: 6,
        name: "Medical Necessity & Cost Validation",
        description: "Validating medical necessity and cost appropriateness",
    },
    Stage {
        id: 7,
        name: "Claim Under Review",
        description: "Comprehensive review by medical professionals",
    },
    Stage {
        id: 8,
        name: "Approved / Rejected",
        description: "Final decision has been made on the claim",
    },
    Stage {
        id: 9,
        name: "Payment Processing",
        description: "Processing payment to healthcare provider",
    },
    Stage {
        id: 10,
        name: "Completed",
        description: "Claim processing has been completed successfully",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub id: u8,
    pub name: &'static str,
    pub state: StageState,
}

/// Progress of a single claim through the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageProgress {
    /// `None` when the claim has not entered the pipeline.
    pub current_stage: Option<u8>,
    pub total_stages: u8,
    pub percent_complete: u8,
    pub stages: Vec<StageView>,
}

impl StageProgress {
    pub fn current(&self) -> Option<&'static Stage> {
        self.current_stage.map(|id| &STAGES[usize::from(id) - 1])
    }

    /// "Stage 4 of 10"
    pub fn caption(&self) -> Option<String> {
        self.current_stage
            .map(|id| format!("Stage {} of {}", id, self.total_stages))
    }
}

pub fn clamp_stage(stage: i64) -> u8 {
    stage.clamp(1, i64::from(TOTAL_STAGES)) as u8
}

pub fn stage_state(stage_id: u8, current_stage: u8) -> StageState {
    if stage_id < current_stage {
        StageState::Completed
    } else if stage_id == current_stage {
        StageState::Current
    } else {
        StageState::Pending
    }
}

/// Resolve per-stage states and the completion percentage.
///
/// Out-of-range stages are clamped into 1..=10; `None` yields the unstarted
/// view (0%, everything pending).
pub fn resolve_progress(current_stage: Option<i64>) -> StageProgress {
    let current = current_stage.map(clamp_stage);

    let stages = STAGES
        .iter()
        .map(|stage| StageView {
            id: stage.id,
            name: stage.name,
            state: match current {
                Some(current) => stage_state(stage.id, current),
                None => StageState::Pending,
            },
        })
        .collect();

    let percent_complete = current
        .map(|c| (f64::from(c) / f64::from(TOTAL_STAGES) * 100.0).round() as u8)
        .unwrap_or(0);

    StageProgress {
        current_stage: current,
        total_stages: TOTAL_STAGES,
        percent_complete,
        stages,
    }
}

/// Pipeline stage implied by a status string, when there is one.
pub fn stage_for_status(status: &ClaimStatus) -> Option<u8> {
    match status {
        ClaimStatus::Initiated => Some(1),
        ClaimStatus::DocumentsReceived => Some(2),
        ClaimStatus::OcrDataExtraction => Some(3),
        ClaimStatus::EligibilityCheck => Some(4),
        ClaimStatus::FraudAnalysis => Some(5),
        ClaimStatus::MedicalNecessityCostValidation => Some(6),
        ClaimStatus::ClaimUnderReview => Some(7),
        ClaimStatus::Approved | ClaimStatus::Rejected => Some(8),
        ClaimStatus::PaymentProcessing => Some(9),
        ClaimStatus::Completed => Some(10),
        _ => None,
    }
}

/// Progress for a claim: the numeric stage wins, the status is the fallback.
pub fn progress_for_claim(claim: &ClaimRecord) -> StageProgress {
    let stage = claim
        .current_stage
        .map(i64::from)
        .or_else(|| stage_for_status(&claim.status).map(i64::from));
    resolve_progress(stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_current_stage() {
        for current in 1..=10 {
            let progress = resolve_progress(Some(current));
            let current_count = progress
                .stages
                .iter()
                .filter(|s| s.state == StageState::Current)
                .count();
            assert_eq!(current_count, 1);

            for stage in &progress.stages {
                let expected = if i64::from(stage.id) < current {
                    StageState::Completed
                } else if i64::from(stage.id) == current {
                    StageState::Current
                } else {
                    StageState::Pending
                };
                assert_eq!(stage.state, expected);
            }
        }
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(resolve_progress(Some(1)).percent_complete, 10);
        assert_eq!(resolve_progress(Some(7)).percent_complete, 70);
        assert_eq!(resolve_progress(Some(10)).percent_complete, 100);
    }

    #[test]
    fn test_out_of_range_stage_is_clamped() {
        let low = resolve_progress(Some(-3));
        assert_eq!(low.current_stage, Some(1));
        assert_eq!(low.percent_complete, 10);

        let high = resolve_progress(Some(42));
        assert_eq!(high.current_stage, Some(10));
        assert_eq!(high.percent_complete, 100);
        assert!(high.stages[..9].iter().all(|s| s.state == StageState::Completed));
    }

    #[test]
    fn test_unstarted_view() {
        let progress = resolve_progress(None);
        assert_eq!(progress.percent_complete, 0);
        assert!(progress.stages.iter().all(|s| s.state == StageState::Pending));
        assert!(progress.current().is_none());
        assert!(progress.caption().is_none());
    }

    #[test]
    fn test_current_stage_detail() {
        let progress = resolve_progress(Some(5));
        let stage = progress.current().unwrap();
        assert_eq!(stage.name, "Fraud Analysis");
        assert_eq!(progress.caption().unwrap(), "Stage 5 of 10");
    }

    #[test]
    fn test_stage_for_status() {
        assert_eq!(stage_for_status(&ClaimStatus::Initiated), Some(1));
        assert_eq!(stage_for_status(&ClaimStatus::ClaimUnderReview), Some(7));
        assert_eq!(stage_for_status(&ClaimStatus::Rejected), Some(8));
        assert_eq!(stage_for_status(&ClaimStatus::Completed), Some(10));
        assert_eq!(stage_for_status(&ClaimStatus::Rfi), None);
        assert_eq!(stage_for_status(&ClaimStatus::parse("Escalated")), None);
    }

    #[test]
    fn test_numeric_stage_wins_over_status() {
        let mut claim = ClaimRecord::new("C-1");
        claim.status = ClaimStatus::PaymentProcessing;
        assert_eq!(progress_for_claim(&claim).current_stage, Some(9));

        claim.current_stage = Some(3);
        assert_eq!(progress_for_claim(&claim).current_stage, Some(3));

        claim.current_stage = None;
        claim.status = ClaimStatus::Pending;
        assert_eq!(progress_for_claim(&claim).current_stage, None);
    }
}
