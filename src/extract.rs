use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use crate::amount::normalize_amount;
use crate::error::{BankrecError, Result};
use crate::models::ParsedRow;
use crate::parse::ParseOptions;
use crate::pdf::read_pdf;

// Case-insensitive substring aliases for tabular column detection, per
// field, covering the English and Romanian statement exports we see.
const DATE_ALIASES: &[&str] = &["date", "data"];
const DESCRIPTION_ALIASES: &[&str] = &[
    "description",
    "descriere",
    "detalii",
    "details",
    "transaction",
    "explica",
];
const AMOUNT_ALIASES: &[&str] = &["amount", "sum", "suma", "value", "valoare"];

/// Produce transaction rows from raw file bytes, dispatching on the
/// original filename's extension. Unrecognized extensions fall back to
/// CSV-style parsing rather than failing.
pub fn extract_rows(
    bytes: &[u8],
    original_name: &str,
    options: &ParseOptions,
) -> Result<Vec<ParsedRow>> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => read_pdf(bytes, options.password.as_deref()),
        "xlsx" | "xls" => read_workbook(bytes),
        _ => read_delimited(&String::from_utf8_lossy(bytes)),
    }
}

struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h.contains(alias)))
}

fn detect_columns(headers: &[String]) -> ColumnMap {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    ColumnMap {
        date: find_column(&normalized, DATE_ALIASES),
        description: find_column(&normalized, DESCRIPTION_ALIASES),
        amount: find_column(&normalized, AMOUNT_ALIASES),
    }
}

fn row_from_cells(cells: &[String], columns: &ColumnMap) -> ParsedRow {
    let date = columns
        .date
        .and_then(|i| cells.get(i))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    // Without a recognizable description column, keep the whole row so
    // nothing is silently lost.
    let description = match columns.description.and_then(|i| cells.get(i)) {
        Some(cell) => cell.trim().to_string(),
        None => cells.join(" , "),
    };
    let amount = columns
        .amount
        .and_then(|i| cells.get(i))
        .map(|c| normalize_amount(c))
        .unwrap_or(0.0);
    ParsedRow {
        date,
        description,
        amount,
    }
}

/// Read CSV (or CSV-shaped) text: the first record is the header row,
/// columns are detected by alias, remaining records become rows directly,
/// bypassing line segmentation.
pub fn read_delimited(text: &str) -> Result<Vec<ParsedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    let mut columns: Option<ColumnMap> = None;
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        match &columns {
            None => columns = Some(detect_columns(&cells)),
            Some(map) => rows.push(row_from_cells(&cells, map)),
        }
    }
    Ok(rows)
}

fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

fn date_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        other => other.to_string().trim().to_string(),
    }
}

/// Read the first sheet of an XLSX/XLS workbook with the same header-alias
/// column detection as the CSV path.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<ParsedRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| BankrecError::MalformedInput(format!("failed to open workbook: {e}")))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range.map_err(|e| BankrecError::Extraction(e.to_string()))?;

    let mut rows = Vec::new();
    let mut row_iter = range.rows();
    let Some(header_row) = row_iter.next() else {
        return Ok(rows);
    };
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();
    let columns = detect_columns(&headers);

    for row in row_iter {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let date = columns
            .date
            .and_then(|i| row.get(i))
            .map(date_cell_to_string)
            .unwrap_or_default();
        let description = match columns.description.and_then(|i| row.get(i)) {
            Some(cell) => cell.to_string().trim().to_string(),
            None => row
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" , "),
        };
        let amount = columns
            .amount
            .and_then(|i| row.get(i))
            .map(|cell| match cell {
                Data::Float(f) => *f,
                Data::Int(i) => *i as f64,
                other => normalize_amount(&other.to_string()),
            })
            .unwrap_or(0.0);
        rows.push(ParsedRow {
            date,
            description,
            amount,
        });
    }
    Ok(rows)
}
