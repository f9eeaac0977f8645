use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat numeric columns
/// * `.json`    – `[{ "H": 1.0, "M": 0.2 }, ...]` or `{ "H": [...], "M": [...] }`
/// * anything else – delimited text (tab, `;`, `,` or whitespace), optional header
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        _ => load_delimited(path)?,
    };

    if table.is_empty() {
        bail!("{} contains no columns", path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Byte(u8),
    Whitespace,
}

fn load_delimited(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    parse_delimited(&text)
}

/// Parse delimited text.  The delimiter is sniffed from the first data line
/// and a first row holding any non-numeric token is taken as the header.
pub fn parse_delimited(text: &str) -> Result<Table> {
    let first = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .context("file contains no data")?;
    let delimiter = sniff_delimiter(first);

    let mut rows: Vec<Vec<String>> = match delimiter {
        Delimiter::Whitespace => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .collect(),
        Delimiter::Byte(b) => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(b)
                .has_headers(false)
                .flexible(true)
                .comment(Some(b'#'))
                .trim(csv::Trim::All)
                .from_reader(text.as_bytes());
            let mut rows = Vec::new();
            for (row_no, result) in reader.records().enumerate() {
                let record = result.with_context(|| format!("row {row_no}"))?;
                rows.push(record.iter().map(str::to_string).collect());
            }
            rows
        }
    };
    rows.retain(|r: &Vec<String>| r.iter().any(|cell| !cell.is_empty()));

    if rows.is_empty() {
        bail!("file contains no data");
    }

    let has_header = rows[0]
        .iter()
        .any(|cell| !cell.is_empty() && parse_cell(cell).is_none());
    let header = if has_header {
        Some(rows.remove(0))
    } else {
        None
    };

    let n_cols = rows
        .iter()
        .map(Vec::len)
        .chain(header.iter().map(Vec::len))
        .max()
        .unwrap_or(0);
    let names = column_names(header.as_deref(), n_cols);

    let mut bad_cells = 0usize;
    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let values = rows
                .iter()
                .map(|row| match row.get(j).map(String::as_str) {
                    None | Some("") => f64::NAN,
                    Some(cell) => parse_cell(cell).unwrap_or_else(|| {
                        bad_cells += 1;
                        f64::NAN
                    }),
                })
                .collect();
            Column::new(name, values)
        })
        .collect();

    if bad_cells > 0 {
        log::warn!("{bad_cells} non-numeric cells were loaded as NaN");
    }

    Table::from_columns(columns)
}

fn sniff_delimiter(line: &str) -> Delimiter {
    if line.contains('\t') {
        Delimiter::Byte(b'\t')
    } else if line.contains(';') {
        Delimiter::Byte(b';')
    } else if line.contains(',') {
        Delimiter::Byte(b',')
    } else {
        Delimiter::Whitespace
    }
}

/// Parse a numeric cell, accepting a decimal comma as a fallback.
fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    cell.parse::<f64>()
        .ok()
        .or_else(|| cell.replace(',', ".").parse::<f64>().ok())
}

/// Header names padded to `n_cols`; blanks become `colN`, repeats get a
/// `.1`, `.2`, … suffix.
fn column_names(header: Option<&[String]>, n_cols: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(n_cols);
    for j in 0..n_cols {
        let base = header
            .and_then(|h| h.get(j))
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("col{}", j + 1));
        let mut name = base.clone();
        let mut k = 1;
        while names.contains(&name) {
            name = format!("{base}.{k}");
            k += 1;
        }
        names.push(name);
    }
    names
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Accepted JSON layouts:
///
/// ```json
/// [ { "H": -1.0, "M": -0.9 }, { "H": -0.9, "M": -0.85 } ]
/// ```
/// or
/// ```json
/// { "H": [-1.0, -0.9], "M": [-0.9, -0.85] }
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    match root {
        JsonValue::Array(records) => {
            let mut names: Vec<String> = Vec::new();
            for (i, rec) in records.iter().enumerate() {
                let obj = rec
                    .as_object()
                    .with_context(|| format!("Row {i} is not a JSON object"))?;
                for key in obj.keys() {
                    if !names.contains(key) {
                        names.push(key.clone());
                    }
                }
            }
            let columns = names
                .into_iter()
                .map(|name| {
                    let values = records
                        .iter()
                        .map(|rec| json_to_f64(rec.get(&name)))
                        .collect();
                    Column::new(name, values)
                })
                .collect();
            Table::from_columns(columns)
        }
        JsonValue::Object(map) => {
            let mut columns = Vec::with_capacity(map.len());
            for (name, val) in map {
                let arr = val
                    .as_array()
                    .with_context(|| format!("Column '{name}' is not a JSON array"))?;
                let values = arr.iter().map(|v| json_to_f64(Some(v))).collect();
                columns.push(Column::new(name, values));
            }
            Table::from_columns(columns)
        }
        _ => bail!("Expected a JSON array of records or an object of columns"),
    }
}

fn json_to_f64(val: Option<&JsonValue>) -> f64 {
    match val {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(JsonValue::String(s)) => parse_cell(s).unwrap_or(f64::NAN),
        Some(JsonValue::Bool(b)) => f64::from(u8::from(*b)),
        _ => f64::NAN,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat numeric columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Non-numeric columns are skipped.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for (idx, field) in schema.fields().iter().enumerate() {
            let Some(values) = extract_f64_column(batch.column(idx)) else {
                continue;
            };
            match columns.iter_mut().find(|c| c.name == *field.name()) {
                Some(col) => col.values.extend(values),
                None => columns.push(Column::new(field.name().clone(), values)),
            }
        }
    }

    Table::from_columns(columns)
}

/// Read a numeric Arrow column as `f64`, nulls as `NaN`.  `None` for
/// non-numeric types.
fn extract_f64_column(col: &Arc<dyn Array>) -> Option<Vec<f64>> {
    let values = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()?
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()?
            .iter()
            .map(|v| v.map_or(f64::NAN, |i| i as f64))
            .collect(),
        other => {
            log::debug!("skipping parquet column of type {other:?}");
            return None;
        }
    };
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_comma_separated_with_header() {
        let table = parse_delimited("H,M\n-1,-0.5\n1,0.5\n").unwrap();
        assert_eq!(table.column_names(), vec!["H", "M"]);
        assert_eq!(table.column("M"), Some(&[-0.5, 0.5][..]));
    }

    #[test]
    fn parses_whitespace_without_header() {
        let table = parse_delimited("# comment\n  -1.0   2.0\n\n1.0 3.0\n").unwrap();
        assert_eq!(table.column_names(), vec!["col1", "col2"]);
        assert_eq!(table.column("col2"), Some(&[2.0, 3.0][..]));
    }

    #[test]
    fn semicolon_files_accept_decimal_commas() {
        let table = parse_delimited("H;M\n-1,5;0,25\n").unwrap();
        assert_eq!(table.column("H"), Some(&[-1.5][..]));
        assert_eq!(table.column("M"), Some(&[0.25][..]));
    }

    #[test]
    fn ragged_rows_and_bad_cells_become_nan() {
        let table = parse_delimited("a\tb\tc\n1\t2\n3\tx\t5\n").unwrap();
        let b = table.column("b").unwrap();
        assert_eq!(b[0], 2.0);
        assert!(b[1].is_nan());
        assert!(table.column("c").unwrap()[0].is_nan());
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let table = parse_delimited("H,M,H,M\n1,2,3,4\n").unwrap();
        assert_eq!(table.column_names(), vec!["H", "M", "H.1", "M.1"]);
    }

    #[test]
    fn empty_text_is_an_error() {
        assert!(parse_delimited("\n# only a comment\n").is_err());
    }

    #[test]
    fn parses_json_records_and_columns() {
        let records = parse_json(r#"[{"H": 1, "M": 0.5}, {"H": 2, "M": null}]"#).unwrap();
        assert_eq!(records.column("H"), Some(&[1.0, 2.0][..]));
        assert!(records.column("M").unwrap()[1].is_nan());

        let columns = parse_json(r#"{"H": [1, 2], "M": [3, 4]}"#).unwrap();
        assert_eq!(columns.column("M"), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".dat").tempfile().unwrap();
        writeln!(file, "Field\tMoment").unwrap();
        writeln!(file, "0.0\t1.0").unwrap();
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["Field", "Moment"]);
        assert_eq!(table.n_rows(), 1);
    }

    #[test]
    fn reads_numeric_parquet_columns() {
        use arrow::array::{ArrayRef, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("H", DataType::Float64, false),
            Field::new("M", DataType::Float32, true),
            Field::new("step", DataType::Int32, false),
            Field::new("stamp", DataType::Int64, false),
            Field::new("sample", DataType::Utf8, false),
        ]));
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(vec![-1.0, 0.0, 1.0])),
            Arc::new(Float32Array::from(vec![Some(-0.5), None, Some(0.5)])),
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(Int64Array::from(vec![10, 20, 30])),
            Arc::new(StringArray::from(vec!["a", "b", "c"])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["H", "M", "step", "stamp"]);
        assert_eq!(table.column("H"), Some(&[-1.0, 0.0, 1.0][..]));
        let m = table.column("M").unwrap();
        assert_eq!(m[0], -0.5);
        assert!(m[1].is_nan());
        assert_eq!(table.column("step"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(table.column("stamp"), Some(&[10.0, 20.0, 30.0][..]));
    }
}
