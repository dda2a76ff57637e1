//! Paper links: mapping corpus document ids to arXiv abstract URLs.

const ARXIV_ABS: &str = "https://arxiv.org/abs";
const OLD_STYLE_ARCHIVE: &str = "astro-ph";

/// Format a corpus document id as an arXiv abstract URL.
///
/// Ids extracted from old-style section files (`astro-ph0001_sec2.txt`) are
/// reduced to their numeric part and placed under the `astro-ph` archive.
#[must_use]
pub fn paper_url(doc_id: &str) -> String {
    if doc_id.contains(".txt") {
        let stem = doc_id.split('_').next().unwrap_or(doc_id);
        let number = stem.rsplit(OLD_STYLE_ARCHIVE).next().unwrap_or(stem);
        format!("{ARXIV_ABS}/{OLD_STYLE_ARCHIVE}/{number}")
    } else {
        format!("{ARXIV_ABS}/{doc_id}")
    }
}
