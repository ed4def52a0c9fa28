use crate::error::{EngineError, Result};
use crate::index::{DocId, Document, InvertedIndex, Posting};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// On-disk layout of one index directory: bincode payloads plus a
/// human-readable metadata sidecar.
pub struct DiskIndex {
    root: PathBuf,
}

impl DiskIndex {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn documents_path(&self) -> PathBuf {
        self.root.join("documents.bin")
    }

    fn postings_path(&self) -> PathBuf {
        self.root.join("postings.bin")
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    /// True if this directory holds a previously saved index.
    pub fn exists(&self) -> bool {
        self.meta_path().is_file()
    }

    /// Write the full index. `load` on the resulting directory reconstructs
    /// identical documents and postings.
    pub fn save(&self, index: &InvertedIndex) -> Result<()> {
        create_dir_all(&self.root)?;

        let mut docs = BufWriter::new(File::create(self.documents_path())?);
        bincode::serialize_into(&mut docs, &index.documents)?;
        docs.flush()?;

        let mut postings = BufWriter::new(File::create(self.postings_path())?);
        bincode::serialize_into(&mut postings, &index.index)?;
        postings.flush()?;

        let meta = MetaFile {
            num_docs: index.document_count() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        let mut f = File::create(self.meta_path())?;
        f.write_all(serde_json::to_string_pretty(&meta)?.as_bytes())?;
        Ok(())
    }

    pub fn load(&self) -> Result<InvertedIndex> {
        let meta = self.load_meta()?;
        if meta.version != FORMAT_VERSION {
            return Err(EngineError::InvalidInput(format!(
                "unsupported index format version {}",
                meta.version
            )));
        }

        let documents: HashMap<DocId, Document> =
            bincode::deserialize_from(BufReader::new(File::open(self.documents_path())?))?;
        let postings: HashMap<String, Vec<Posting>> =
            bincode::deserialize_from(BufReader::new(File::open(self.postings_path())?))?;
        Ok(InvertedIndex::from_parts(postings, documents))
    }

    pub fn load_meta(&self) -> Result<MetaFile> {
        let meta: MetaFile =
            serde_json::from_reader(BufReader::new(File::open(self.meta_path())?))?;
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc(id: DocId, url: &str, tokens: &[&str]) -> Document {
        Document {
            id,
            url: url.to_string(),
            title: format!("doc {id}"),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn round_trip_preserves_documents_and_postings() {
        let mut index = InvertedIndex::new();
        index.add_document(doc(1, "http://a.test/", &["cat", "dog", "cat"]));
        index.add_document(doc(2, "http://b.test/", &["dog", "fish"]));

        let dir = tempdir().unwrap();
        let disk = DiskIndex::new(dir.path());
        assert!(!disk.exists());
        disk.save(&index).unwrap();
        assert!(disk.exists());

        let loaded = disk.load().unwrap();
        assert_eq!(loaded.document_count(), index.document_count());
        assert_eq!(loaded.term_count(), index.term_count());
        for d in index.documents() {
            assert_eq!(loaded.document(d.id), Some(d));
        }
        for term in ["cat", "dog", "fish"] {
            let mut a = index.postings(term).to_vec();
            let mut b = loaded.postings(term).to_vec();
            a.sort_by_key(|p| p.doc_id);
            b.sort_by_key(|p| p.doc_id);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_index_round_trips() {
        let dir = tempdir().unwrap();
        let disk = DiskIndex::new(dir.path());
        disk.save(&InvertedIndex::new()).unwrap();
        let loaded = disk.load().unwrap();
        assert_eq!(loaded.document_count(), 0);
    }

    #[test]
    fn load_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let disk = DiskIndex::new(dir.path().join("absent"));
        match disk.load() {
            Err(EngineError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
