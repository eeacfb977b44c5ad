use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewError};
use crate::record::ClaimRecord;
use crate::status::ClaimStatus;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Search box and status dropdown of a claims table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFilter {
    /// Case-insensitive substring matched against id, patient name,
    /// submission date, amount and status.
    #[serde(default)]
    pub query: String,
    /// Exact status match when set.
    #[serde(default)]
    pub status: Option<ClaimStatus>,
}

impl ClaimFilter {
    pub fn matches(&self, claim: &ClaimRecord) -> bool {
        if let Some(status) = &self.status {
            if &claim.status != status {
                return false;
            }
        }

        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        [
            claim.claim_id.as_str(),
            claim.patient_name.as_str(),
            claim.submitted_on_display().as_str(),
            claim.amount.as_str(),
            claim.status.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

pub fn filter_claims<'a>(claims: &'a [ClaimRecord], filter: &ClaimFilter) -> Vec<&'a ClaimRecord> {
    claims.iter().filter(|claim| filter.matches(claim)).collect()
}

/// Claims whose patient name or id contains the query (claim tracker search).
pub fn search_by_patient_or_id<'a>(claims: &'a [ClaimRecord], query: &str) -> Vec<&'a ClaimRecord> {
    let query = query.trim().to_lowercase();
    claims
        .iter()
        .filter(|claim| {
            claim.patient_name.to_lowercase().contains(&query)
                || claim.claim_id.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// 1-based page slice. A page past the end is empty rather than an error.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Page<T>> {
    if page == 0 || page_size == 0 {
        return Err(ViewError::InvalidPage { page, page_size });
    }

    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Ok(Page {
        page,
        page_size,
        total_items: items.len(),
        total_pages: items.len().div_ceil(page_size),
        items: items[start..end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> Vec<ClaimRecord> {
        crate::record::normalize_claims(&[
            json!({"id": "HC-001", "patientName": "Asha Rao", "amount": "$1,200", "status": "Approved", "submissionDate": "2024-02-01"}),
            json!({"id": "HC-002", "patientName": "Ben Ortiz", "amount": "$80", "status": "RFI"}),
            json!({"id": "HC-003", "patientName": "Chen Wei", "amount": "$300", "status": "Pending"}),
        ])
    }

    #[test]
    fn test_query_matches_any_column_case_insensitively() {
        let claims = claims();
        let by_name = ClaimFilter { query: "ben".to_string(), status: None };
        assert_eq!(filter_claims(&claims, &by_name).len(), 1);

        let by_status = ClaimFilter { query: "APPROVED".to_string(), status: None };
        assert_eq!(filter_claims(&claims, &by_status)[0].claim_id, "HC-001");

        let by_date = ClaimFilter { query: "02/01".to_string(), status: None };
        assert_eq!(filter_claims(&claims, &by_date)[0].claim_id, "HC-001");

        let by_amount = ClaimFilter { query: "$80".to_string(), status: None };
        assert_eq!(filter_claims(&claims, &by_amount)[0].claim_id, "HC-002");
    }

    #[test]
    fn test_status_filter_is_exact() {
        let claims = claims();
        let filter = ClaimFilter { query: String::new(), status: Some(ClaimStatus::Rfi) };
        let matched = filter_claims(&claims, &filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].claim_id, "HC-002");

        let filter = ClaimFilter { query: "asha".to_string(), status: Some(ClaimStatus::Rfi) };
        assert!(filter_claims(&claims, &filter).is_empty());
    }

    #[test]
    fn test_search_by_patient_or_id() {
        let claims = claims();
        assert_eq!(search_by_patient_or_id(&claims, "hc-00").len(), 3);
        assert_eq!(search_by_patient_or_id(&claims, "wei")[0].claim_id, "HC-003");
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate(&items, 3, 5).unwrap();
        assert_eq!(page.items, vec![11, 12]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 12);

        let past_end = paginate(&items, 9, 5).unwrap();
        assert!(past_end.items.is_empty());

        assert!(matches!(paginate(&items, 0, 5), Err(ViewError::InvalidPage { .. })));
        assert!(paginate(&items, 1, 0).is_err());
    }

    #[test]
    fn test_map_keeps_page_metadata() {
        let items: Vec<u32> = (1..=7).collect();
        let page = paginate(&items, 2, 5).unwrap().map(|i| i * 10);
        assert_eq!(page.items, vec![60, 70]);
        assert_eq!((page.page, page.total_pages, page.total_items), (2, 2, 7));
    }
}
