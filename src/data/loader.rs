use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{BirthRecord, Gender, LoadReport, RawRow, RecordStore};
use crate::config::{ColumnNames, RegistryConfig};
use crate::error::{LoadError, RowRejection};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a registry export from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text with a header row (`;` by default)
/// * `.json`         – `[{ "sexe": "1", "preusuel": "MARIE", ... }, ...]`
/// * `.parquet`      – one column per field, text or numeric
pub fn load_file(path: &Path, config: &RegistryConfig) -> Result<RecordStore, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" | "txt" => read_delimited(std::fs::File::open(path)?, config)?,
        "json" => read_json(&std::fs::read_to_string(path)?, &config.columns)?,
        "parquet" | "pq" => read_parquet(path, &config.columns)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    let store = load(rows, config)?;
    log::info!(
        "Loaded {} records from {} ({} rows dropped)",
        store.len(),
        path.display(),
        store.report().rejected()
    );
    Ok(store)
}

/// Validate raw rows into a [`RecordStore`].
///
/// Rows with an empty name, the unknown-year token or a non-integer year are
/// dropped. Rows with an unparseable count are dropped too, unless
/// `strict_counts` is set, in which case the load fails.
pub fn load<I>(rows: I, config: &RegistryConfig) -> Result<RecordStore, LoadError>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (i, raw) in rows.into_iter().enumerate() {
        match validate_row(&raw, config) {
            Ok(record) => records.push(record),
            Err(RowRejection::InvalidCount(value)) if config.strict_counts => {
                return Err(LoadError::InvalidCount { row: i + 1, value });
            }
            Err(reason) => report.reject(&reason),
        }
    }
    report.accepted = records.len();

    if report.invalid_count > 0 {
        log::warn!(
            "Dropped {} rows with an invalid count",
            report.invalid_count
        );
    }
    log::debug!("Load report: {report:?}");

    Ok(RecordStore::new(records, report))
}

/// Turn one raw row into a record, or say why it cannot be one.
pub fn validate_row(raw: &RawRow, config: &RegistryConfig) -> Result<BirthRecord, RowRejection> {
    let name = raw.name.trim().to_uppercase();
    if name.is_empty() {
        return Err(RowRejection::EmptyName);
    }

    let year_text = raw.year.trim();
    if year_text == config.unknown_year_token {
        return Err(RowRejection::UnknownYear);
    }
    let year = year_text
        .parse::<i32>()
        .map_err(|_| RowRejection::InvalidYear(raw.year.clone()))?;

    let count = raw
        .count
        .trim()
        .parse::<u64>()
        .map_err(|_| RowRejection::InvalidCount(raw.count.clone()))?;

    Ok(BirthRecord {
        gender: Gender::from_code(&raw.gender),
        name,
        year,
        department: raw.department.trim().to_string(),
        count,
    })
}

// ---------------------------------------------------------------------------
// Background load
// ---------------------------------------------------------------------------

/// A load running on a worker thread.
pub struct PendingLoad {
    rx: Receiver<Result<RecordStore, LoadError>>,
}

impl PendingLoad {
    /// The outcome, once the worker has finished.
    pub fn try_finish(&self) -> Option<Result<RecordStore, LoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::Io(std::io::Error::other(
                "load worker stopped without a result",
            )))),
        }
    }

    /// Block until the worker has finished.
    pub fn wait(self) -> Result<RecordStore, LoadError> {
        self.rx.recv().unwrap_or_else(|_| {
            Err(LoadError::Io(std::io::Error::other(
                "load worker stopped without a result",
            )))
        })
    }
}

/// Start loading `path` on a worker thread.
pub fn load_in_background(path: PathBuf, config: RegistryConfig) -> PendingLoad {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = load_file(&path, &config);
        // The receiver may have been dropped; nobody is waiting then.
        let _ = tx.send(result);
    });
    PendingLoad { rx }
}

// ---------------------------------------------------------------------------
// Delimited text reader
// ---------------------------------------------------------------------------

/// Header row naming the columns, then one row per (sex, name, year, department).
/// Extra columns are ignored. Short rows read missing cells as empty, so
/// validation rejects them one row at a time.
pub fn read_delimited<R: Read>(reader: R, config: &RegistryConfig) -> Result<Vec<RawRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let idx = ColumnIndex::locate(&config.columns, |col| headers.iter().position(|h| h == col))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        rows.push(RawRow {
            gender: cell(idx.gender),
            name: cell(idx.name),
            year: cell(idx.year),
            department: cell(idx.department),
            count: cell(idx.count),
        });
    }
    Ok(rows)
}

/// Positions of the five registry fields in a header.
struct ColumnIndex {
    gender: usize,
    name: usize,
    year: usize,
    department: usize,
    count: usize,
}

impl ColumnIndex {
    fn locate(columns: &ColumnNames, find: impl Fn(&str) -> Option<usize>) -> Result<Self, LoadError> {
        let at = |col: &str| find(col).ok_or_else(|| LoadError::MissingColumn(col.to_string()));
        Ok(ColumnIndex {
            gender: at(columns.gender.as_str())?,
            name: at(columns.name.as_str())?,
            year: at(columns.year.as_str())?,
            department: at(columns.department.as_str())?,
            count: at(columns.count.as_str())?,
        })
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON; cells may be strings or numbers:
///
/// ```json
/// [
///   { "sexe": "1", "preusuel": "PAUL", "annais": 1990, "dpt": "75", "nombre": 12 },
///   ...
/// ]
/// ```
pub fn read_json(text: &str, columns: &ColumnNames) -> Result<Vec<RawRow>, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let items = root.as_array().ok_or(LoadError::MalformedRow {
        row: 0,
        reason: "expected a top-level JSON array".to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item.as_object().ok_or_else(|| LoadError::MalformedRow {
                row: i + 1,
                reason: "not a JSON object".to_string(),
            })?;
            let cell = |col: &str| obj.get(col).map(json_cell).unwrap_or_default();
            Ok(RawRow {
                gender: cell(&columns.gender),
                name: cell(&columns.name),
                year: cell(&columns.year),
                department: cell(&columns.department),
                count: cell(&columns.count),
            })
        })
        .collect()
}

fn json_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Each registry field is one column of Utf8, LargeUtf8, Int32, Int64 or
/// Float64. Nulls read as empty cells and are rejected by validation.
pub fn read_parquet(path: &Path, columns: &ColumnNames) -> Result<Vec<RawRow>, LoadError> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let idx = ColumnIndex::locate(columns, |col| schema.index_of(col).ok())?;

        let cols = [
            (batch.column(idx.gender), columns.gender.as_str()),
            (batch.column(idx.name), columns.name.as_str()),
            (batch.column(idx.year), columns.year.as_str()),
            (batch.column(idx.department), columns.department.as_str()),
            (batch.column(idx.count), columns.count.as_str()),
        ];

        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(cols.len());
            for (col, name) in &cols {
                cells.push(arrow_cell(col, row, name)?);
            }
            let [gender, name, year, department, count]: [String; 5] =
                cells.try_into().map_err(|_| LoadError::MalformedRow {
                    row: row + 1,
                    reason: "wrong number of cells".to_string(),
                })?;
            rows.push(RawRow {
                gender,
                name,
                year,
                department,
                count,
            });
        }
    }

    Ok(rows)
}

/// Read one cell of an Arrow column as text.
fn arrow_cell(col: &ArrayRef, row: usize, column: &str) -> Result<String, LoadError> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        other => {
            return Err(LoadError::UnsupportedColumnType {
                column: column.to_string(),
                data_type: format!("{other:?}"),
            })
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(gender: &str, name: &str, year: &str, dpt: &str, count: &str) -> RawRow {
        RawRow {
            gender: gender.to_string(),
            name: name.to_string(),
            year: year.to_string(),
            department: dpt.to_string(),
            count: count.to_string(),
        }
    }

    #[test]
    fn valid_row_is_normalized() {
        let rec = validate_row(&raw("2", " marie ", " 1990", "2A", "12"), &RegistryConfig::default())
            .unwrap();
        assert_eq!(rec.name, "MARIE");
        assert_eq!(rec.year, 1990);
        assert_eq!(rec.department, "2A");
        assert_eq!(rec.gender, Gender::Female);
        assert_eq!(rec.count, 12);
    }

    #[test]
    fn rejection_reasons() {
        let cfg = RegistryConfig::default();
        assert_eq!(
            validate_row(&raw("1", "  ", "1990", "75", "3"), &cfg),
            Err(RowRejection::EmptyName)
        );
        assert_eq!(
            validate_row(&raw("1", "PAUL", "XXXX", "75", "3"), &cfg),
            Err(RowRejection::UnknownYear)
        );
        assert_eq!(
            validate_row(&raw("1", "PAUL", "", "75", "3"), &cfg),
            Err(RowRejection::InvalidYear(String::new()))
        );
        assert_eq!(
            validate_row(&raw("1", "PAUL", "19x0", "75", "3"), &cfg),
            Err(RowRejection::InvalidYear("19x0".to_string()))
        );
        assert_eq!(
            validate_row(&raw("1", "PAUL", "1990", "75", "abc"), &cfg),
            Err(RowRejection::InvalidCount("abc".to_string()))
        );
        assert_eq!(
            validate_row(&raw("1", "PAUL", "1990", "75", "-4"), &cfg),
            Err(RowRejection::InvalidCount("-4".to_string()))
        );
    }

    #[test]
    fn load_tallies_dropped_rows() {
        let rows = vec![
            raw("1", "PAUL", "1990", "75", "3"),
            raw("1", "", "1990", "75", "3"),
            raw("2", "MARIE", "XXXX", "75", "3"),
            raw("2", "MARIE", "2001", "75", "n/a"),
        ];
        let store = load(rows, &RegistryConfig::default()).unwrap();
        assert_eq!(store.len(), 1);
        let report = store.report();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.empty_name, 1);
        assert_eq!(report.unknown_year, 1);
        assert_eq!(report.invalid_count, 1);
    }

    #[test]
    fn strict_counts_fail_the_load() {
        let cfg = RegistryConfig {
            strict_counts: true,
            ..RegistryConfig::default()
        };
        let rows = vec![
            raw("1", "PAUL", "1990", "75", "3"),
            raw("1", "PAUL", "1991", "75", "three"),
        ];
        match load(rows, &cfg) {
            Err(LoadError::InvalidCount { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidCount, got {other:?}"),
        }
    }

    #[test]
    fn delimited_reader_finds_columns_by_header() {
        let text = "\u{feff}nombre;dpt;annais;preusuel;sexe;extra\n5;13;2001;Lea;2;x\n";
        let rows = read_delimited(text.as_bytes(), &RegistryConfig::default()).unwrap();
        assert_eq!(rows, vec![raw("2", "Lea", "2001", "13", "5")]);
    }

    #[test]
    fn delimited_reader_pads_short_rows() {
        let text = "sexe;preusuel;annais;dpt;nombre\n1;PAUL;1990;75\n2;LEA;2005;35;12;x\n";
        let config = RegistryConfig::default();
        let rows = read_delimited(text.as_bytes(), &config).unwrap();
        assert_eq!(
            rows,
            vec![raw("1", "PAUL", "1990", "75", ""), raw("2", "LEA", "2005", "35", "12")]
        );
        let store = load(rows, &config).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.report().invalid_count, 1);
    }

    #[test]
    fn delimited_reader_reports_missing_column() {
        let text = "sexe;preusuel;annais;dpt\n1;PAUL;1990;75\n";
        match read_delimited(text.as_bytes(), &RegistryConfig::default()) {
            Err(LoadError::MissingColumn(col)) => assert_eq!(col, "nombre"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn json_reader_accepts_numbers_and_strings() {
        let text = r#"[
            { "sexe": 1, "preusuel": "PAUL", "annais": 1990, "dpt": "75", "nombre": 4 },
            { "sexe": "2", "preusuel": "LEA", "annais": "XXXX", "dpt": "13", "nombre": "7" },
            { "sexe": "2", "preusuel": null, "annais": 2000, "dpt": "13" }
        ]"#;
        let rows = read_json(text, &ColumnNames::default()).unwrap();
        assert_eq!(rows[0], raw("1", "PAUL", "1990", "75", "4"));
        assert_eq!(rows[1].year, "XXXX");
        assert_eq!(rows[2].name, "");
        assert_eq!(rows[2].count, "");
    }

    #[test]
    fn json_reader_rejects_non_objects() {
        let err = read_json("[1, 2]", &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("names.xlsx"), &RegistryConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "xlsx"));
    }
}
