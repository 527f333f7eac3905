//! In-memory document store for the HTTP service.
//!
//! Holds the text of each uploaded document twice: as ingested, and as last
//! edited by the user. Extraction always reads the edited text. Nothing is
//! persisted and nothing is evicted; the store lives as long as the process.

use crate::error::ParagraphError;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// One stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub file_name: String,
    pub original_text: String,
    pub edited_text: String,
}

/// Thread-safe map from document id to [`StoredDocument`].
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` for `file_name` and return the new id.
    ///
    /// Ids have the form `<file_name>_<unix millis>`; the timestamp is bumped
    /// when two uploads of the same name land in the same millisecond.
    pub fn create(&self, file_name: &str, text: String) -> Result<String, ParagraphError> {
        let mut documents = self.write()?;
        let mut millis = now_millis();
        let mut id = format!("{file_name}_{millis}");
        while documents.contains_key(&id) {
            millis += 1;
            id = format!("{file_name}_{millis}");
        }

        documents.insert(
            id.clone(),
            StoredDocument {
                file_name: file_name.to_string(),
                original_text: text.clone(),
                edited_text: text,
            },
        );
        debug!("Stored document {}", id);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<StoredDocument, ParagraphError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| ParagraphError::DocumentNotFound { id: id.to_string() })
    }

    /// The text extraction should run on.
    pub fn edited_text(&self, id: &str) -> Result<String, ParagraphError> {
        self.read()?
            .get(id)
            .map(|doc| doc.edited_text.clone())
            .ok_or_else(|| ParagraphError::DocumentNotFound { id: id.to_string() })
    }

    /// Replace the edited text of `id`. The original text is kept.
    pub fn update_edited(&self, id: &str, text: String) -> Result<(), ParagraphError> {
        let mut documents = self.write()?;
        let doc = documents
            .get_mut(id)
            .ok_or_else(|| ParagraphError::DocumentNotFound { id: id.to_string() })?;
        doc.edited_text = text;
        debug!("Updated edited text of {}", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredDocument>>, ParagraphError> {
        self.documents
            .read()
            .map_err(|e| ParagraphError::Internal(format!("document store lock poisoned: {e}")))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredDocument>>, ParagraphError> {
        self.documents
            .write()
            .map_err(|e| ParagraphError::Internal(format!("document store lock poisoned: {e}")))
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let store = DocumentStore::new();
        let id = store.create("informe.pdf", "1. Texto.".into()).unwrap();
        assert!(id.starts_with("informe.pdf_"));

        let doc = store.get(&id).unwrap();
        assert_eq!(doc.file_name, "informe.pdf");
        assert_eq!(doc.original_text, "1. Texto.");
        assert_eq!(doc.edited_text, "1. Texto.");
    }

    #[test]
    fn ids_are_unique_for_the_same_name() {
        let store = DocumentStore::new();
        let a = store.create("same.pdf", "a".into()).unwrap();
        let b = store.create("same.pdf", "b".into()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn edits_keep_the_original() {
        let store = DocumentStore::new();
        let id = store.create("a.txt", "old".into()).unwrap();
        store.update_edited(&id, "new".into()).unwrap();

        let doc = store.get(&id).unwrap();
        assert_eq!(doc.original_text, "old");
        assert_eq!(store.edited_text(&id).unwrap(), "new");
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let store = DocumentStore::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.get("nope"),
            Err(ParagraphError::DocumentNotFound { .. })
        ));
        assert!(matches!(
            store.update_edited("nope", "x".into()),
            Err(ParagraphError::DocumentNotFound { .. })
        ));
    }
}
