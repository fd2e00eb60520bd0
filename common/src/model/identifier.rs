use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest sequence number that fits the three-digit suffix.
pub const MAX_SEQUENCE: u16 = 999;

/// Length of a rendered identifier: `YYYYMMDD` followed by three digits.
pub const RENDERED_LEN: usize = 11;

const DATE_PART_LEN: usize = 8;

/// Formats a calendar date as the fixed-width `YYYYMMDD` prefix.
///
/// Returns `None` for years that do not fit in four digits.
pub fn format_date_part(date: NaiveDate) -> Option<String> {
    let year = date.year();
    if !(0..=9999).contains(&year) {
        return None;
    }
    Some(format!("{:04}{:02}{:02}", year, date.month(), date.day()))
}

/// A Bill-of-Lading / Sales Order number.
///
/// Ordering follows `(date, sequence)`, which is also the lexicographic order of
/// the rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "IdentifierWire", try_from = "IdentifierWire")]
pub struct DocumentIdentifier {
    date: NaiveDate,
    sequence: u16,
}

impl DocumentIdentifier {
    /// Builds an identifier, rejecting sequences outside `1..=999` and dates
    /// whose year cannot be rendered in four digits.
    pub fn new(date: NaiveDate, sequence: u16) -> Option<Self> {
        if !(1..=MAX_SEQUENCE).contains(&sequence) || format_date_part(date).is_none() {
            return None;
        }
        Some(Self { date, sequence })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn date_part(&self) -> String {
        // `new` already checked the year range.
        format_date_part(self.date).unwrap_or_default()
    }

    /// The 11-digit external form, e.g. `20260105001`.
    pub fn rendered(&self) -> String {
        format!("{}{:03}", self.date_part(), self.sequence)
    }
}

impl fmt::Display for DocumentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered())
    }
}

/// Why a string is not a rendered identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdentifierError {
    #[error("identifier must be exactly 11 ASCII digits, got {0:?}")]
    Format(String),
    #[error("identifier {0:?} does not start with a valid calendar date")]
    Date(String),
    #[error("identifier sequence {0} is outside 001-999")]
    Sequence(u16),
}

impl FromStr for DocumentIdentifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RENDERED_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseIdentifierError::Format(s.to_string()));
        }
        let number = |range: std::ops::Range<usize>| -> Result<u32, ParseIdentifierError> {
            s[range]
                .parse()
                .map_err(|_| ParseIdentifierError::Format(s.to_string()))
        };

        let year = number(0..4)? as i32;
        let month = number(4..6)?;
        let day = number(6..DATE_PART_LEN)?;
        let sequence = number(DATE_PART_LEN..RENDERED_LEN)? as u16;

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ParseIdentifierError::Date(s.to_string()))?;
        DocumentIdentifier::new(date, sequence).ok_or(ParseIdentifierError::Sequence(sequence))
    }
}

/// JSON shape of an identifier: every part spelled out so clients never have to
/// slice the rendered string themselves.
#[derive(Serialize, Deserialize)]
struct IdentifierWire {
    date_part: String,
    sequence: u16,
    rendered: String,
}

impl From<DocumentIdentifier> for IdentifierWire {
    fn from(id: DocumentIdentifier) -> Self {
        IdentifierWire {
            date_part: id.date_part(),
            sequence: id.sequence,
            rendered: id.rendered(),
        }
    }
}

impl TryFrom<IdentifierWire> for DocumentIdentifier {
    type Error = ParseIdentifierError;

    fn try_from(wire: IdentifierWire) -> Result<Self, Self::Error> {
        let id: DocumentIdentifier = wire.rendered.parse()?;
        if id.date_part() != wire.date_part || id.sequence != wire.sequence {
            return Err(ParseIdentifierError::Format(wire.rendered));
        }
        Ok(id)
    }
}
