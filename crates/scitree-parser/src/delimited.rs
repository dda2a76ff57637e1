//! Line-oriented extraction of `{…}`-delimited entries from a generation
//! response.

/// Opening marker of an entry.
pub const ENTRY_OPEN: char = '{';
/// Closing marker of an entry.
pub const ENTRY_CLOSE: char = '}';

/// Entries accepted from a response, plus diagnostics for what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelimitedEntries {
    pub entries: Vec<String>,
    /// Non-blank lines without a complete, non-empty delimited segment.
    pub skipped: usize,
    /// Well-formed entries beyond the requested limit.
    pub overflow: usize,
}

/// Extract at most `limit` entries, one per line.
///
/// A line contributes an entry only when it contains an opening marker
/// followed later by a closing marker with non-blank text between them; the
/// trimmed text between the first such pair is the entry.
#[must_use]
pub fn parse_delimited_entries(response: &str, limit: usize) -> DelimitedEntries {
    let mut parsed = DelimitedEntries::default();
    for line in response.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match delimited_segment(line) {
            Some(_) if parsed.entries.len() >= limit => parsed.overflow += 1,
            Some(entry) => parsed.entries.push(entry.to_string()),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

fn delimited_segment(line: &str) -> Option<&str> {
    let start = line.find(ENTRY_OPEN)?;
    let rest = &line[start + ENTRY_OPEN.len_utf8()..];
    let end = rest.find(ENTRY_CLOSE)?;
    let segment = rest[..end].trim();
    (!segment.is_empty()).then_some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_entry_per_line() {
        let response = "{Measure the stellar mass function}\n{Map the dark matter halo}\n";
        let parsed = parse_delimited_entries(response, 2);
        assert_eq!(
            parsed.entries,
            vec!["Measure the stellar mass function", "Map the dark matter halo"]
        );
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn skips_preamble_and_malformed_lines() {
        let response = "Here are the objectives:\n\n1. {First objective}\n{unterminated\nno braces at all\n{ }\n";
        let parsed = parse_delimited_entries(response, 5);
        assert_eq!(parsed.entries, vec!["First objective"]);
        assert_eq!(parsed.skipped, 4);
    }

    #[test]
    fn never_exceeds_limit() {
        let response = "{a}\n{b}\n{c}\n";
        let parsed = parse_delimited_entries(response, 2);
        assert_eq!(parsed.entries, vec!["a", "b"]);
        assert_eq!(parsed.overflow, 1);
    }

    #[test]
    fn closing_marker_before_opening_is_not_a_segment() {
        let parsed = parse_delimited_entries("} backwards {", 3);
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn text_around_segment_is_ignored() {
        let parsed = parse_delimited_entries("- {H-alpha equivalent width} (optical)", 1);
        assert_eq!(parsed.entries, vec!["H-alpha equivalent width"]);
    }
}
