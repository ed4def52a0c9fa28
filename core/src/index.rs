use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;

/// One indexed page. `tokens` is the normalized term sequence produced by the
/// tokenizer; posting positions are indices into it. Ids are assigned by the
/// index manager and are unique and monotonically increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub tokens: Vec<String>,
}

/// Per-(term, document) occurrence record. Invariant: `frequency` equals
/// `positions.len()`, and a term's posting list holds at most one posting per
/// doc id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
    pub positions: Vec<u32>,
}

/// In-memory inverted index: term -> posting list, doc id -> document.
///
/// Not concurrency-safe on its own; exclusive mutation is the index manager's
/// job. Posting lists keep insertion order, which the ranker relies on for
/// deterministic tie-breaking.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) index: HashMap<String, Vec<Posting>>,
    pub(crate) documents: HashMap<DocId, Document>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        index: HashMap<String, Vec<Posting>>,
        documents: HashMap<DocId, Document>,
    ) -> Self {
        Self { index, documents }
    }

    /// Store the document record and fold every token occurrence into the
    /// posting lists.
    ///
    /// Additive: re-adding a document that is already indexed under the same
    /// id extends its existing postings rather than replacing them. Callers
    /// that want a true replace must remove the document first (the manager's
    /// update path does exactly that).
    pub fn add_document(&mut self, doc: Document) {
        for (pos, term) in doc.tokens.iter().enumerate() {
            let postings = self.index.entry(term.clone()).or_default();
            match postings.iter_mut().find(|p| p.doc_id == doc.id) {
                Some(p) => {
                    p.frequency += 1;
                    p.positions.push(pos as u32);
                }
                None => postings.push(Posting {
                    doc_id: doc.id,
                    frequency: 1,
                    positions: vec![pos as u32],
                }),
            }
        }
        self.documents.insert(doc.id, doc);
    }

    /// Drop the document record and sweep its postings out of every term's
    /// list. O(vocabulary), acceptable at this corpus scale.
    pub fn remove_document(&mut self, id: DocId) -> Option<Document> {
        let doc = self.documents.remove(&id)?;
        self.index.retain(|_, postings| {
            postings.retain(|p| p.doc_id != id);
            !postings.is_empty()
        });
        Some(doc)
    }

    /// Posting list for a term, in insertion order. Unknown terms yield an
    /// empty slice, never an error.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.index.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Corpus size N for IDF scoring.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn term_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId, url: &str, tokens: &[&str]) -> Document {
        Document {
            id,
            url: url.to_string(),
            title: format!("doc {id}"),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn posting_consistency() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc(1, "http://a.test/", &["cat", "dog", "cat", "fish", "cat"]));

        let cat = idx.postings("cat");
        assert_eq!(cat.len(), 1);
        assert_eq!(cat[0].doc_id, 1);
        assert_eq!(cat[0].frequency, 3);
        assert_eq!(cat[0].positions, vec![0, 2, 4]);

        let dog = idx.postings("dog");
        assert_eq!(dog[0].frequency, 1);
        assert_eq!(dog[0].positions.len() as u32, dog[0].frequency);
    }

    #[test]
    fn unknown_term_yields_empty_postings() {
        let idx = InvertedIndex::new();
        assert!(idx.postings("nothing").is_empty());
    }

    #[test]
    fn re_add_same_id_is_additive() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc(7, "http://a.test/", &["cat"]));
        idx.add_document(doc(7, "http://a.test/", &["cat"]));
        assert_eq!(idx.postings("cat")[0].frequency, 2);
        assert_eq!(idx.document_count(), 1);
    }

    #[test]
    fn removal_sweeps_all_postings() {
        let mut idx = InvertedIndex::new();
        idx.add_document(doc(1, "http://a.test/", &["cat", "dog"]));
        idx.add_document(doc(2, "http://b.test/", &["cat"]));

        let removed = idx.remove_document(1).unwrap();
        assert_eq!(removed.url, "http://a.test/");
        assert_eq!(idx.document_count(), 1);
        assert!(idx.postings("dog").is_empty());
        assert!(idx.postings("cat").iter().all(|p| p.doc_id != 1));
        assert!(idx.remove_document(1).is_none());
    }
}
