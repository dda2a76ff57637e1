//! Id-addressed document records.

use std::collections::HashMap;

use scitree_core::{Document, LoadError};

/// Documents in file order with an id lookup.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl DocumentSet {
    /// Build a set, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateDocument`] if two records share an id.
    pub fn new(documents: Vec<Document>) -> Result<Self, LoadError> {
        let mut by_id = HashMap::with_capacity(documents.len());
        for (pos, doc) in documents.iter().enumerate() {
            if by_id.insert(doc.id.clone(), pos).is_some() {
                return Err(LoadError::DuplicateDocument(doc.id.clone()));
            }
        }
        Ok(Self { documents, by_id })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|&pos| &self.documents[pos])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document {
            id: id.to_string(),
            ..Document::default()
        }
    }

    #[test]
    fn lookup_by_id() {
        let set = DocumentSet::new(vec![doc("2101.00001"), doc("astro-ph/9901001")]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("astro-ph/9901001"));
        assert_eq!(set.get("2101.00001").unwrap().id, "2101.00001");
        assert!(set.get("2101.99999").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = DocumentSet::new(vec![doc("a"), doc("a")]).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateDocument(id) if id == "a"));
    }
}
