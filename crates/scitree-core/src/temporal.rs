//! Temporal helpers: publication years from arXiv identifiers, date cutoffs,
//! and the validated recency weight.
//!
//! arXiv ids come in two shapes:
//! - new style `YYMM.NNNNN` (optionally `vN`), always 20YY
//! - old style `archive/YYMMNNN`, also seen flattened as `astro-phYYMMNNN_sec2.txt`

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TemporalError;

/// First two-digit year that belongs to the 1900s for old-style identifiers.
const OLD_STYLE_CENTURY_PIVOT: i32 = 90;
/// arXiv switched to `YYMM.NNNNN` identifiers in April 2007.
const NEW_STYLE_FIRST_YEAR: i32 = 2007;

/// Derive the publication year from an arXiv identifier.
///
/// # Errors
///
/// Returns [`TemporalError::UnrecognizedIdentifier`] if no `YYMM` stamp can be found.
pub fn publication_year(id: &str) -> Result<i32, TemporalError> {
    let unrecognized = || TemporalError::UnrecognizedIdentifier(id.to_string());

    let trimmed = id.trim();
    // Old style with an explicit archive: "astro-ph/0001234".
    let stem = match trimmed.rsplit_once('/') {
        Some((_, rest)) => rest,
        None => trimmed.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '-'),
    };

    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return Err(unrecognized());
    }
    let yy: i32 = digits[..2].parse().map_err(|_| unrecognized())?;
    let mm: u32 = digits[2..4].parse().map_err(|_| unrecognized())?;
    if !(1..=12).contains(&mm) {
        return Err(unrecognized());
    }

    let new_style = stem[digits.len()..].starts_with('.') && digits.len() == 4;
    let year = if new_style || yy < OLD_STYLE_CENTURY_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    };
    Ok(year)
}

/// The current calendar year (UTC).
#[must_use]
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Upper bound on publication dates considered by retrieval.
///
/// The bound is year-granular: anything published in `year` or earlier passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateCutoff {
    pub year: i32,
}

impl DateCutoff {
    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self { year }
    }

    /// Parse either a bare year (`"2024"`) or an arXiv identifier
    /// (`"2301.00001"`, `"astro-ph/9912001"`).
    ///
    /// # Errors
    ///
    /// Returns [`TemporalError::UnrecognizedIdentifier`] if neither form matches.
    pub fn parse(input: &str) -> Result<Self, TemporalError> {
        let trimmed = input.trim();
        if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = trimmed.parse() {
                return Ok(Self { year });
            }
        }
        publication_year(trimmed).map(Self::from_year)
    }

    /// Coarse arXiv-style stamp for the first identifier of the cutoff year:
    /// `2401.00001` for 2024, old-style `astro-ph/9901001` before 2007.
    ///
    /// Parsing the stamp gives back the same year only for 1990 through 2099;
    /// two-digit years outside that window are ambiguous.
    #[must_use]
    pub fn coarse_stamp(&self) -> String {
        let yy = self.year.rem_euclid(100);
        if self.year < NEW_STYLE_FIRST_YEAR {
            format!("astro-ph/{yy:02}01001")
        } else {
            format!("{yy:02}01.00001")
        }
    }

    /// Whether a document published in `year` falls inside the cutoff.
    #[must_use]
    pub fn admits(&self, year: i32) -> bool {
        year <= self.year
    }
}

/// How strongly a query favours recent documents: 0 (no bias) to 10 (extreme).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RecencyWeight(u8);

impl RecencyWeight {
    pub const MAX: u8 = 10;

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Weight as a fraction of the maximum, in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(self) -> f32 {
        f32::from(self.0) / f32::from(Self::MAX)
    }
}

impl TryFrom<i64> for RecencyWeight {
    type Error = TemporalError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(w) if w <= Self::MAX => Ok(Self(w)),
            _ => Err(TemporalError::RecencyOutOfRange(value)),
        }
    }
}

impl From<RecencyWeight> for u8 {
    fn from(w: RecencyWeight) -> Self {
        w.0
    }
}
