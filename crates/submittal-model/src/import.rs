//! Reading export files into [`KeyedRow`]s.
//!
//! Both readers skip `skip_rows` leading rows (report banners, export timestamps) before the
//! header row, trim every cell and drop blank cells and fully blank rows.

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use std::str::Utf8Error;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use thiserror::Error;

use crate::{KeyedRow, RawValue};

#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Rows to skip before the header row.
    pub skip_rows: usize,
    pub delimiter: u8,
    /// How to decode raw CSV bytes into text fields.
    pub encoding: TextEncoding,
    /// Worksheet to read from a workbook; the first sheet when `None`.
    pub sheet: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            delimiter: b',',
            encoding: TextEncoding::Auto,
            sheet: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Attempt to decode as UTF-8; if a field contains invalid UTF-8, fall back to Windows-1252.
    ///
    /// This matches what spreadsheet software does when exporting CSV on Windows.
    #[default]
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("export contained no header row after skipping {skipped} rows")]
    MissingHeader { skipped: usize },
    #[error("malformed csv near line {line}: {reason}")]
    Csv { line: u64, reason: String },
    #[error("row {row}, column {column} is not valid UTF-8")]
    Encoding {
        row: u64,
        column: usize,
        #[source]
        source: Utf8Error,
    },
    #[error("workbook error: {0}")]
    Workbook(String),
    #[error("worksheet not found: {0}")]
    SheetNotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read a CSV export.
pub fn read_csv_rows<R: Read>(reader: R, options: &ImportOptions) -> Result<Vec<KeyedRow>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled manually so leading banner rows can be skipped.
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    let mut record_index: u64 = 0;
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    loop {
        record.clear();
        let more = csv_reader
            .read_byte_record(&mut record)
            .map_err(csv_error)?;
        if !more {
            break;
        }
        record_index += 1;
        if record_index <= options.skip_rows as u64 {
            continue;
        }

        let fields = decode_record(&record, record_index, options.encoding)?;
        match &headers {
            None => headers = Some(header_names(fields)),
            Some(names) => {
                let row = keyed_row(names, fields.into_iter().map(RawValue::text));
                if !row.is_empty() {
                    rows.push(row);
                }
            }
        }
    }

    if headers.is_none() {
        return Err(ImportError::MissingHeader {
            skipped: options.skip_rows,
        });
    }
    log::debug!("read {} csv rows", rows.len());
    Ok(rows)
}

/// Read an `.xlsx`/`.xlsm`/`.xlsb`/`.xls`/`.ods` export.
///
/// Date-formatted cells arrive as serial numbers so they flow through the same normalizer as
/// numeric cells in CSV exports.
pub fn read_workbook_rows(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Vec<KeyedRow>, ImportError> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(|e| ImportError::Workbook(e.to_string()))?;

    let sheet_name = match &options.sheet {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::Workbook("workbook has no worksheets".to_string()))?,
    };
    if !workbook.sheet_names().iter().any(|s| s == &sheet_name) {
        return Err(ImportError::SheetNotFound(sheet_name));
    }

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for cells in range.rows().skip(options.skip_rows) {
        match &headers {
            None => {
                let names = cells.iter().map(|c| cell_text(c).into_owned()).collect();
                headers = Some(header_names(names));
            }
            Some(names) => {
                let row = keyed_row(names, cells.iter().map(cell_value));
                if !row.is_empty() {
                    rows.push(row);
                }
            }
        }
    }

    if headers.is_none() {
        return Err(ImportError::MissingHeader {
            skipped: options.skip_rows,
        });
    }
    log::debug!(
        "read {} rows from worksheet {sheet_name:?} of {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

fn header_names(fields: Vec<String>) -> Vec<String> {
    fields
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Column{}", idx + 1)
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn keyed_row(headers: &[String], values: impl Iterator<Item = Option<RawValue>>) -> KeyedRow {
    let mut row = KeyedRow::new();
    for (idx, value) in values.enumerate() {
        let Some(value) = value else {
            continue;
        };
        let header = headers
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Column{}", idx + 1));
        row.insert(header, value);
    }
    row
}

fn cell_value(cell: &Data) -> Option<RawValue> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => RawValue::number(*i as f64),
        Data::Float(f) => RawValue::number(*f),
        Data::DateTime(dt) => RawValue::number(dt.as_f64()),
        Data::Bool(b) => RawValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::text(s),
        // Error cells carry no usable value.
        Data::Error(_) => None,
    }
}

fn cell_text(cell: &Data) -> Cow<'_, str> {
    match cell {
        Data::String(s) => Cow::Borrowed(s.as_str()),
        other => match cell_value(other) {
            Some(value) => Cow::Owned(value.as_text().into_owned()),
            None => Cow::Borrowed(""),
        },
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode one CSV record. `row` is 1-based over the whole file, banner rows included.
fn decode_record(record: &ByteRecord, row: u64, encoding: TextEncoding) -> Result<Vec<String>, ImportError> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let field = match (row, idx) {
                (1, 0) => field.strip_prefix(UTF8_BOM).unwrap_or(field),
                _ => field,
            };
            decode_field(field, encoding).map_err(|source| ImportError::Encoding {
                row,
                column: idx + 1,
                source,
            })
        })
        .collect()
}

fn decode_field(field: &[u8], encoding: TextEncoding) -> Result<String, Utf8Error> {
    let windows_1252 = |bytes: &[u8]| WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned();
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(field).map(str::to_owned),
        TextEncoding::Windows1252 => Ok(windows_1252(field)),
        TextEncoding::Auto => Ok(std::str::from_utf8(field)
            .map(str::to_owned)
            .unwrap_or_else(|_| windows_1252(field))),
    }
}

fn csv_error(err: csv::Error) -> ImportError {
    let line = err.position().map_or(0, csv::Position::line);
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ImportError::Io(io),
        _ => ImportError::Csv { line, reason },
    }
}
