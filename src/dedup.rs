use crate::models::NormalizedLead;
use std::collections::HashSet;

/// In-memory index of lead URLs already stored for the acting user.
///
/// Built fresh per pipeline run from a storage query and discarded at the
/// end; the index itself holds no cross-invocation state. Matching is exact,
/// case-sensitive string equality on the URL; callers are responsible for
/// producing comparably-formed URLs upstream.
pub struct DedupIndex {
    known_urls: HashSet<String>,
}

impl DedupIndex {
    pub fn new(urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            known_urls: urls.into_iter().collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.known_urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.known_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_urls.is_empty()
    }

    /// Splits candidates into genuinely new leads and the count of skipped
    /// duplicates. Single pass, order-preserving.
    pub fn partition_new(&self, candidates: Vec<NormalizedLead>) -> (Vec<NormalizedLead>, usize) {
        let mut fresh = Vec::with_capacity(candidates.len());
        let mut skipped = 0usize;

        for lead in candidates {
            if self.contains(&lead.url) {
                skipped += 1;
            } else {
                fresh.push(lead);
            }
        }

        (fresh, skipped)
    }
}
