//! Adjudication work queue: claims awaiting an adjudicator decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::record::ClaimRecord;
use crate::status::ClaimStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjudicationAction {
    Approved,
    Rejected,
    #[serde(rename = "RFI")]
    Rfi,
}

impl AdjudicationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Rfi => "RFI",
        }
    }

    /// Status the claim is expected to carry once the action is accepted.
    pub fn resulting_status(self) -> ClaimStatus {
        match self {
            Self::Approved => ClaimStatus::Approved,
            Self::Rejected => ClaimStatus::Rejected,
            Self::Rfi => ClaimStatus::Rfi,
        }
    }
}

impl fmt::Display for AdjudicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /adjudicator-post`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationRequest {
    pub claim_id: String,
    pub action: AdjudicationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AdjudicationRequest {
    /// Blank notes are dropped from the payload.
    pub fn new(claim_id: impl Into<String>, action: AdjudicationAction, notes: Option<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            action,
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkQueue {
    claims: Vec<ClaimRecord>,
}

impl WorkQueue {
    /// Keep only the claims whose status is exactly "In Progress".
    pub fn from_claims(claims: impl IntoIterator<Item = ClaimRecord>) -> Self {
        let claims: Vec<ClaimRecord> = claims
            .into_iter()
            .filter(|claim| claim.status == ClaimStatus::InProgress)
            .collect();
        debug!(queued = claims.len(), "Built adjudication work queue");
        Self { claims }
    }

    pub fn claims(&self) -> &[ClaimRecord] {
        &self.claims
    }

    pub fn get(&self, claim_id: &str) -> Option<&ClaimRecord> {
        self.claims.iter().find(|claim| claim.claim_id == claim_id)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Drop a claim after its decision was accepted. Returns the removed claim.
    pub fn remove(&mut self, claim_id: &str) -> Option<ClaimRecord> {
        let index = self.claims.iter().position(|claim| claim.claim_id == claim_id)?;
        Some(self.claims.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claim(id: &str, status: &str) -> ClaimRecord {
        let mut claim = ClaimRecord::new(id);
        claim.status = ClaimStatus::parse(status);
        claim
    }

    #[test]
    fn test_queue_holds_in_progress_only() {
        let queue = WorkQueue::from_claims(vec![
            claim("C1", "In Progress"),
            claim("C2", "Pending"),
            claim("C3", "In Progress"),
            claim("C4", "Fraud Analysis"),
        ]);
        let ids: Vec<&str> = queue.claims().iter().map(|c| c.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C3"]);
    }

    #[test]
    fn test_remove() {
        let mut queue = WorkQueue::from_claims(vec![claim("C1", "In Progress"), claim("C2", "In Progress")]);
        assert_eq!(queue.remove("C1").map(|c| c.claim_id), Some("C1".to_string()));
        assert!(queue.remove("C1").is_none());
        assert_eq!(queue.len(), 1);
        assert!(queue.get("C2").is_some());
    }

    #[test]
    fn test_request_payload() {
        let request = AdjudicationRequest::new("C1", AdjudicationAction::Rfi, Some("  ".to_string()));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"claim_id": "C1", "action": "RFI"})
        );

        let request = AdjudicationRequest::new("C2", AdjudicationAction::Rejected, Some("duplicate".to_string()));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"claim_id": "C2", "action": "Rejected", "notes": "duplicate"})
        );
        assert_eq!(request.action.resulting_status(), ClaimStatus::Rejected);
    }

    #[test]
    fn test_action_parses_from_payload() {
        let action: AdjudicationAction = serde_json::from_value(json!("RFI")).unwrap();
        assert_eq!(action, AdjudicationAction::Rfi);
        assert!(serde_json::from_value::<AdjudicationAction>(json!("Escalate")).is_err());
    }
}
