use crate::index::{DocId, InvertedIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// TF-IDF ranking over the posting lists. Pure function of its inputs.
///
/// Candidates are every document matching at least one query term (OR
/// semantics), collected in first-seen order while walking the query terms'
/// posting lists. Score is the sum over matching terms of
/// `(1 + ln tf) * ln(N / (1 + df))`. The sort is stable and descending, so
/// equal scores keep candidate insertion order.
pub fn rank(query_terms: &[String], index: &InvertedIndex, total_docs: usize) -> Vec<RankedDoc> {
    // IDF is undefined for an empty corpus; bail out before touching ln.
    if total_docs == 0 || query_terms.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<DocId> = Vec::new();
    let mut seen: HashSet<DocId> = HashSet::new();
    for term in query_terms {
        for posting in index.postings(term) {
            if seen.insert(posting.doc_id) {
                candidates.push(posting.doc_id);
            }
        }
    }

    let mut results: Vec<RankedDoc> = candidates
        .into_iter()
        .map(|doc_id| {
            let mut score = 0.0;
            for term in query_terms {
                let postings = index.postings(term);
                if let Some(p) = postings.iter().find(|p| p.doc_id == doc_id) {
                    let tf = 1.0 + f64::from(p.frequency).ln();
                    let idf = (total_docs as f64 / (1.0 + postings.len() as f64)).ln();
                    score += tf * idf;
                }
            }
            RankedDoc { doc_id, score }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}
