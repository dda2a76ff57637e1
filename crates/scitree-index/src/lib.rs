//! # scitree-index
//!
//! In-memory corpus for scitree, loaded once from three artifacts:
//! - `embeddings_matrix.npy`: one `f32` row per embedded section
//! - `documents.json`: the document records
//! - `index_mapping.json`: `{id: {"abstract": row, "conclusions": row}}`
//!
//! Everything is validated at load time so retrieval never sees a dangling
//! row or an unknown id.

pub mod documents;
pub mod npy;
pub mod vector;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use ndarray::Array2;
use serde::de::DeserializeOwned;

use scitree_core::{CorpusPaths, Document, LoadError};

pub use documents::DocumentSet;
pub use npy::read_f32_matrix;
pub use vector::{QueryResult, SectionRows, VectorIndex};

/// The loaded corpus: embeddings, mapping and documents. Immutable after load.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub index: VectorIndex,
    pub documents: DocumentSet,
}

impl Corpus {
    /// Load and cross-validate the three corpus artifacts.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] for a missing or malformed artifact, a mapped
    /// row past the end of the matrix, or a mapped id with no document.
    pub fn load(paths: &CorpusPaths) -> Result<Self, LoadError> {
        let started = Instant::now();
        let matrix = read_f32_matrix(&paths.embeddings)?;
        let documents: Vec<Document> = read_json(&paths.documents)?;
        let mapping: BTreeMap<String, SectionRows> = read_json(&paths.index_mapping)?;

        let corpus = Self::from_matrix(documents, matrix, mapping)?;
        tracing::info!(
            documents = corpus.documents.len(),
            rows = corpus.index.rows(),
            dim = corpus.index.dim(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "corpus loaded"
        );
        Ok(corpus)
    }

    /// Assemble a corpus from in-memory parts with the same validation as
    /// [`Corpus::load`].
    ///
    /// # Errors
    ///
    /// See [`Corpus::load`].
    pub fn from_parts(
        documents: Vec<Document>,
        matrix: Vec<f32>,
        dim: usize,
        mapping: BTreeMap<String, SectionRows>,
    ) -> Result<Self, LoadError> {
        let documents = DocumentSet::new(documents)?;
        Self::check_mapping(&documents, &mapping)?;
        let index = VectorIndex::new(matrix, dim, mapping)?;
        Ok(Self { index, documents })
    }

    fn from_matrix(
        documents: Vec<Document>,
        matrix: Array2<f32>,
        mapping: BTreeMap<String, SectionRows>,
    ) -> Result<Self, LoadError> {
        let documents = DocumentSet::new(documents)?;
        Self::check_mapping(&documents, &mapping)?;
        let index = VectorIndex::from_array(matrix, mapping)?;
        Ok(Self { index, documents })
    }

    fn check_mapping(
        documents: &DocumentSet,
        mapping: &BTreeMap<String, SectionRows>,
    ) -> Result<(), LoadError> {
        if let Some(unknown) = mapping.keys().find(|id| !documents.contains(id)) {
            return Err(LoadError::UnknownDocument(unknown.clone()));
        }
        let unmapped = documents
            .iter()
            .filter(|d| !mapping.contains_key(&d.id))
            .count();
        if unmapped > 0 {
            tracing::debug!(unmapped, "documents without embeddings will never be retrieved");
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::MissingArtifact {
            path: path.to_path_buf(),
        },
        _ => LoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;
    serde_json::from_str(&raw).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
