//! Embedding matrix plus the document/section → row mapping.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use scitree_core::{LoadError, ScitreeError, Section};

/// Matrix rows holding the embeddings of one document's sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRows {
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusions: Option<usize>,
}

impl SectionRows {
    #[must_use]
    pub fn row(&self, section: Section) -> Option<usize> {
        match section {
            Section::Abstract => self.abstract_row,
            Section::Conclusions => self.conclusions,
        }
    }

    fn is_empty(&self) -> bool {
        self.abstract_row.is_none() && self.conclusions.is_none()
    }
}

/// Best-scoring section of one document for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub id: String,
    pub section: Section,
    pub score: f32,
}

/// Read-only embedding matrix with its index mapping.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    matrix: Array2<f32>,
    mapping: BTreeMap<String, SectionRows>,
}

impl VectorIndex {
    /// Build an index from a flat row-major buffer of `dim`-wide rows.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ShapeMismatch`] if `matrix` is not a whole number
    /// of `dim`-wide rows, otherwise the same as [`VectorIndex::from_array`].
    pub fn new(
        matrix: Vec<f32>,
        dim: usize,
        mapping: BTreeMap<String, SectionRows>,
    ) -> Result<Self, LoadError> {
        let values = matrix.len();
        let rows = if dim == 0 { 0 } else { values / dim };
        let mismatch = LoadError::ShapeMismatch { values, rows, dim };
        if dim == 0 || values % dim != 0 {
            return Err(mismatch);
        }
        let matrix = Array2::from_shape_vec((rows, dim), matrix).map_err(|_| mismatch)?;
        Self::from_array(matrix, mapping)
    }

    /// Build an index, validating every mapped row against the matrix.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ShapeMismatch`] for a zero-width matrix and
    /// [`LoadError::RowOutOfBounds`] for any mapped row past its end.
    pub fn from_array(
        matrix: Array2<f32>,
        mapping: BTreeMap<String, SectionRows>,
    ) -> Result<Self, LoadError> {
        let (rows, dim) = matrix.dim();
        if dim == 0 {
            return Err(LoadError::ShapeMismatch {
                values: 0,
                rows,
                dim,
            });
        }

        for (id, entry) in &mapping {
            for section in Section::ALL {
                if let Some(row) = entry.row(section) {
                    if row >= rows {
                        return Err(LoadError::RowOutOfBounds {
                            doc_id: id.clone(),
                            section: section.to_string(),
                            row,
                            rows,
                        });
                    }
                }
            }
        }

        Ok(Self { matrix, mapping })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    /// Number of documents in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Mapped document ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.mapping.keys().map(String::as_str)
    }

    #[must_use]
    pub fn section_rows(&self, id: &str) -> Option<SectionRows> {
        self.mapping.get(id).copied()
    }

    /// Dot product of every matrix row with `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ScitreeError::Retrieval`] if `query` does not have the
    /// matrix's dimension.
    pub fn score(&self, query: &[f32]) -> Result<Vec<f32>, ScitreeError> {
        if query.len() != self.dim() {
            return Err(ScitreeError::Retrieval(format!(
                "query embedding has dimension {}, index has {}",
                query.len(),
                self.dim()
            )));
        }
        Ok(self.matrix.dot(&ArrayView1::from(query)).to_vec())
    }

    /// One result per mapped document: the higher-scoring of its sections.
    ///
    /// A missing section never wins; on an exact tie the conclusions section
    /// is chosen. Documents with no mapped sections are not scored.
    ///
    /// # Errors
    ///
    /// Same as [`VectorIndex::score`].
    pub fn best_sections(&self, query: &[f32]) -> Result<Vec<QueryResult>, ScitreeError> {
        let scores = self.score(query)?;
        let at = |row: Option<usize>| row.map_or(f32::NEG_INFINITY, |r| scores[r]);

        Ok(self
            .mapping
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(id, rows)| {
                let abstract_score = at(rows.abstract_row);
                let conclusions_score = at(rows.conclusions);
                let (section, score) = if abstract_score > conclusions_score {
                    (Section::Abstract, abstract_score)
                } else {
                    (Section::Conclusions, conclusions_score)
                };
                QueryResult {
                    id: id.clone(),
                    section,
                    score,
                }
            })
            .collect())
    }
}
