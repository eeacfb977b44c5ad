use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::record::ClaimRecord;
use crate::status::ClaimStatus;

pub const DEFAULT_RFI_NOTE: &str =
    "Please provide the requested information to proceed with your claim.";

/// Notes remembered per claim id from earlier RFI observations.
///
/// Entries never expire; a fresher note for the same claim overwrites the
/// previous one. The cache is cheap to clone and clones share storage.
#[derive(Clone, Debug, Default)]
pub struct RfiNoteCache {
    notes: Arc<DashMap<String, String>>,
}

impl RfiNoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the persisted `rfiNotes` map.
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        let cache = Self::new();
        for (claim_id, note) in map {
            cache.notes.insert(claim_id, note);
        }
        cache
    }

    /// Snapshot for persistence, ordered by claim id.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.notes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn get(&self, claim_id: &str) -> Option<String> {
        self.notes.get(claim_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, claim_id: impl Into<String>, note: impl Into<String>) {
        self.notes.insert(claim_id.into(), note.into());
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&self) {
        self.notes.clear();
    }

    /// Remember the claim's own note if it is an RFI claim that carries one.
    /// Returns true when the cache changed.
    pub fn observe(&self, claim: &ClaimRecord) -> bool {
        if claim.status != ClaimStatus::Rfi {
            return false;
        }
        let Some(note) = claim_note(claim) else {
            return false;
        };

        let changed = self.get(&claim.claim_id).as_deref() != Some(note);
        if changed {
            debug!(claim_id = %claim.claim_id, "Caching RFI note");
            self.insert(claim.claim_id.clone(), note);
        }
        changed
    }

    /// Observe a whole fetch. Returns true when any entry changed.
    pub fn observe_all<'a>(&self, claims: impl IntoIterator<Item = &'a ClaimRecord>) -> bool {
        claims
            .into_iter()
            .fold(false, |changed, claim| self.observe(claim) || changed)
    }

    /// Resolve the "information requested" text for a claim.
    ///
    /// Precedence: `notes`, `claim_details.notes`, `adjudicator_notes`,
    /// `rfi_notes`, the cached note, then [`DEFAULT_RFI_NOTE`].
    pub fn resolve(&self, claim: &ClaimRecord) -> String {
        self.observe(claim);

        claim_note(claim)
            .map(str::to_string)
            .or_else(|| self.get(&claim.claim_id))
            .unwrap_or_else(|| DEFAULT_RFI_NOTE.to_string())
    }
}

/// The first note carried by the claim payload itself.
pub fn claim_note(claim: &ClaimRecord) -> Option<&str> {
    [
        claim.notes.as_deref(),
        claim.alternate_notes.claim_details.as_deref(),
        claim.alternate_notes.adjudicator.as_deref(),
        claim.alternate_notes.rfi.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|note| !note.is_empty())
}
