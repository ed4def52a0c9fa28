use crate::error::{EngineError, Result};
use crate::index::{DocId, Document, InvertedIndex};
use crate::persist::DiskIndex;
use crate::ranker;
use crate::tokenizer::tokenize;
use crate::updater::UpdateTask;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f64,
    pub document: Document,
}

#[derive(Default)]
struct IndexState {
    index: InvertedIndex,
    url_to_id: HashMap<String, DocId>,
    next_id: DocId,
}

/// Sole mutator of an [`InvertedIndex`]; bridges the in-memory index and its
/// on-disk form.
///
/// One mutex covers both mutation and search, serializing reads behind
/// writes. Mutations normally arrive through the realtime updater's single
/// consumer, so the lock is uncontended in the common case.
pub struct IndexManager {
    state: Mutex<IndexState>,
    disk: DiskIndex,
}

impl IndexManager {
    pub fn new<P: AsRef<Path>>(index_dir: P) -> Self {
        Self {
            state: Mutex::new(IndexState::default()),
            disk: DiskIndex::new(index_dir),
        }
    }

    /// Index a new document, assigning the next doc id. The incoming `id`
    /// field is ignored.
    ///
    /// A URL that is already indexed is routed through the replace path
    /// instead, so re-crawling a page never double-counts its terms.
    pub fn add_document(&self, doc: Document) -> Result<DocId> {
        let mut state = self.state.lock();
        match state.url_to_id.get(&doc.url).copied() {
            Some(id) => Self::replace_locked(&mut state, id, doc),
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.url_to_id.insert(doc.url.clone(), id);
                state.index.add_document(Document { id, ..doc });
                Ok(id)
            }
        }
    }

    /// Replace an indexed document, keeping its id. Fails with `NotFound` if
    /// the URL was never indexed.
    pub fn update_document(&self, doc: Document) -> Result<DocId> {
        let mut state = self.state.lock();
        let id = state
            .url_to_id
            .get(&doc.url)
            .copied()
            .ok_or_else(|| EngineError::NotFound(doc.url.clone()))?;
        Self::replace_locked(&mut state, id, doc)
    }

    fn replace_locked(state: &mut IndexState, id: DocId, doc: Document) -> Result<DocId> {
        state.index.remove_document(id);
        state.index.add_document(Document { id, ..doc });
        Ok(id)
    }

    pub fn remove_document(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        let id = state
            .url_to_id
            .remove(url)
            .ok_or_else(|| EngineError::NotFound(url.to_string()))?;
        state.index.remove_document(id);
        Ok(())
    }

    pub(crate) fn apply(&self, task: UpdateTask) -> Result<()> {
        match task {
            UpdateTask::Add(doc) => self.add_document(doc).map(|_| ()),
            UpdateTask::Update(doc) => self.update_document(doc).map(|_| ()),
            UpdateTask::Delete { url } => self.remove_document(&url),
        }
    }

    /// Tokenize the query, rank against the current index snapshot, and map
    /// the ranked ids back to documents.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidInput("empty query".to_string()));
        }
        let terms = tokenize(query);
        let state = self.state.lock();
        let ranked = ranker::rank(&terms, &state.index, state.index.document_count());
        Ok(ranked
            .into_iter()
            .filter_map(|r| {
                state.index.document(r.doc_id).map(|d| SearchHit {
                    score: r.score,
                    document: d.clone(),
                })
            })
            .collect())
    }

    pub fn document(&self, id: DocId) -> Result<Document> {
        self.state
            .lock()
            .index
            .document(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("doc {id}")))
    }

    pub fn document_by_url(&self, url: &str) -> Result<Document> {
        let state = self.state.lock();
        state
            .url_to_id
            .get(url)
            .and_then(|id| state.index.document(*id))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(url.to_string()))
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().index.document_count()
    }

    /// Checkpoint the index. A failed save leaves the in-memory index
    /// untouched.
    pub fn save(&self) -> Result<()> {
        let state = self.state.lock();
        self.disk.save(&state.index)
    }

    /// Replace the in-memory index with the saved one, rebuilding the url map
    /// and the id counter from the loaded documents.
    pub fn load(&self) -> Result<()> {
        let index = self.disk.load()?;
        let mut url_to_id = HashMap::new();
        let mut next_id = 0;
        for doc in index.documents() {
            url_to_id.insert(doc.url.clone(), doc.id);
            next_id = next_id.max(doc.id + 1);
        }
        *self.state.lock() = IndexState {
            index,
            url_to_id,
            next_id,
        };
        Ok(())
    }

    pub fn has_saved_index(&self) -> bool {
        self.disk.exists()
    }
}
