//! Document type: a paper in the pre-embedded corpus.

use serde::{Deserialize, Serialize};

use crate::temporal::publication_year;

/// A paper in the corpus. Loaded once from `documents.json` and never mutated;
/// retrieval hands out clones carrying a `score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub conclusions: String,

    /// arXiv identifier the document was taken from.
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub n_citation: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Text of the given section.
    #[must_use]
    pub fn section_text(&self, section: Section) -> &str {
        match section {
            Section::Abstract => &self.abstract_text,
            Section::Conclusions => &self.conclusions,
        }
    }

    /// Publication year derived from the arXiv source id, if recognizable.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        publication_year(&self.source)
            .or_else(|_| publication_year(&self.id))
            .ok()
    }
}

/// An embedded span of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Abstract,
    Conclusions,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Abstract, Section::Conclusions];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Conclusions => "conclusions",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The texts of a resolved document, as returned by `get_document_texts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    pub id: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub conclusions: String,
}

impl From<&Document> for DocumentText {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            abstract_text: doc.abstract_text.clone(),
            conclusions: doc.conclusions.clone(),
        }
    }
}

impl DocumentText {
    #[must_use]
    pub fn section_text(&self, section: Section) -> &str {
        match section {
            Section::Abstract => &self.abstract_text,
            Section::Conclusions => &self.conclusions,
        }
    }
}
