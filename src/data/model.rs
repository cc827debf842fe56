use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::RowRejection;

// ---------------------------------------------------------------------------
// Gender – registry sex code
// ---------------------------------------------------------------------------

/// Sex code of a registry row. The registry encodes it as `"1"` / `"2"`;
/// any other code is kept verbatim so it still counts toward totals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Gender::Male,
            "2" => Gender::Female,
            other => Gender::Other(other.to_string()),
        }
    }

    /// The registry code this value was read from.
    pub fn code(&self) -> &str {
        match self {
            Gender::Male => "1",
            Gender::Female => "2",
            Gender::Other(code) => code,
        }
    }

    /// Legend label: `Male`, `Female`, or the raw code.
    pub fn label(&self) -> &str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other(code) => code,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// RawRow – one unvalidated input row
// ---------------------------------------------------------------------------

/// Cells of one input row as text, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub gender: String,
    pub name: String,
    pub year: String,
    pub department: String,
    pub count: String,
}

// ---------------------------------------------------------------------------
// BirthRecord – one validated registry row
// ---------------------------------------------------------------------------

/// Births of one name, for one sex, in one department and year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthRecord {
    pub gender: Gender,
    /// Trimmed, uppercased, never empty.
    pub name: String,
    pub year: i32,
    /// Department code; may be non-numeric (`2A`, `971`, ...).
    pub department: String,
    pub count: u64,
}

impl BirthRecord {
    /// `floor(year / 10) * 10`.
    pub fn decade(&self) -> i32 {
        self.year.div_euclid(10) * 10
    }
}

// ---------------------------------------------------------------------------
// LoadReport – tally of accepted and dropped rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub accepted: usize,
    pub empty_name: usize,
    pub unknown_year: usize,
    pub invalid_year: usize,
    pub invalid_count: usize,
}

impl LoadReport {
    pub fn reject(&mut self, reason: &RowRejection) {
        match reason {
            RowRejection::EmptyName => self.empty_name += 1,
            RowRejection::UnknownYear => self.unknown_year += 1,
            RowRejection::InvalidYear(_) => self.invalid_year += 1,
            RowRejection::InvalidCount(_) => self.invalid_count += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.empty_name + self.unknown_year + self.invalid_year + self.invalid_count
    }
}

// ---------------------------------------------------------------------------
// RecordStore – the loaded dataset
// ---------------------------------------------------------------------------

/// The validated dataset. Immutable once built; clones share the rows,
/// so any number of readers can hold it without locking.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Arc<[BirthRecord]>,
    report: LoadReport,
}

impl RecordStore {
    pub fn new(records: Vec<BirthRecord>, report: LoadReport) -> Self {
        RecordStore {
            records: records.into(),
            report,
        }
    }

    /// Build a store from already-validated records.
    pub fn from_records(records: Vec<BirthRecord>) -> Self {
        let report = LoadReport {
            accepted: records.len(),
            ..LoadReport::default()
        };
        Self::new(records, report)
    }

    pub fn records(&self) -> &[BirthRecord] {
        &self.records
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregation outputs
// ---------------------------------------------------------------------------

/// One aggregated value: a year, decade, department or gender key and its sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint<K> {
    pub key: K,
    pub value: u64,
}

/// One chart line: a label and its points, ascending by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSeries<K> {
    pub label: String,
    pub points: Vec<SeriesPoint<K>>,
}

impl<K: Copy> NamedSeries<K> {
    pub fn max_value(&self) -> Option<u64> {
        self.points.iter().map(|p| p.value).max()
    }

    pub fn last(&self) -> Option<SeriesPoint<K>> {
        self.points.last().copied()
    }
}

/// Male/female split of one decade.
///
/// `male_pct` / `female_pct` are `None` when `total` is zero: there is no
/// split to report, and `Some(0.0)` would read as "nobody".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeBin {
    pub decade: i32,
    pub male: u64,
    pub female: u64,
    pub total: u64,
    pub male_pct: Option<f64>,
    pub female_pct: Option<f64>,
}

impl DecadeBin {
    /// Whether the bin has a split to draw.
    pub fn has_data(&self) -> bool {
        self.total > 0
    }
}
