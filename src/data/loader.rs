use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use chrono::{DateTime, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Record};
use super::window::DateParser;
use crate::config::DataConfig;

/// Where the date key lives and how to read it.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub date_column: String,
    pub date_parser: DateParser,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from_config(&DataConfig::default())
    }
}

impl LoadOptions {
    pub fn from_config(config: &DataConfig) -> Self {
        LoadOptions {
            date_column: config.date_column.clone(),
            date_parser: DateParser::new(config.date_format.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dated table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column holding the date key
/// * `.json`    – `[{ "date": "2020-01-01", ...columns }, ...]`, dates as
///   strings or epoch milliseconds
/// * `.parquet` – any flat schema with a string, date or timestamp date column
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, options),
        "json" => load_json(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Assemble a dataset from rows keyed by column name. Column order is the
/// order in which `columns` lists them.
fn assemble(
    options: &LoadOptions,
    columns: Vec<String>,
    rows: Vec<(NaiveDate, BTreeMap<String, CellValue>)>,
) -> Dataset {
    let records = rows
        .into_iter()
        .map(|(date, mut cells)| Record {
            date,
            cells: columns
                .iter()
                .map(|c| cells.remove(c).unwrap_or(CellValue::Null))
                .collect(),
        })
        .collect();
    Dataset::new(options.date_column.clone(), columns, records)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; the configured date column
/// becomes the record key and every other column is type-guessed.
fn load_csv(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader, options)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>, options: &LoadOptions) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let date_idx = headers
        .iter()
        .position(|h| *h == options.date_column)
        .with_context(|| format!("CSV missing '{}' column", options.date_column))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let raw_date = record.get(date_idx).unwrap_or("");
        let date = options
            .date_parser
            .parse_day(raw_date)
            .with_context(|| format!("CSV row {row_no}: bad date"))?;

        let cells = (0..headers.len())
            .filter(|i| *i != date_idx)
            .map(|i| guess_cell_type(record.get(i).unwrap_or("")))
            .collect();

        records.push(Record { date, cells });
    }

    Ok(Dataset::new(options.date_column.clone(), columns, records))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if digit_led(s) {
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

/// `f64::from_str` also takes "nan" and "inf"; those stay text.
fn digit_led(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let unsigned = unsigned.strip_prefix('.').unwrap_or(unsigned);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "date": "2020-01-01T00:00:00.000", "location": "France", "new_cases": 3 },
///   { "date": 1577923200000, "location": "France", "new_cases": 4 },
///   ...
/// ]
/// ```
///
/// String dates go through the configured parser; integers are epoch
/// milliseconds (the pandas default `date_format='epoch'`).
fn load_json(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text, options)
}

fn parse_json(text: &str, options: &LoadOptions) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows_json = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(rows_json.len());

    for (i, rec) in rows_json.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let raw_date = obj
            .get(&options.date_column)
            .with_context(|| format!("Row {i}: missing '{}'", options.date_column))?;
        let date = json_date(raw_date, &options.date_parser)
            .with_context(|| format!("Row {i}: bad date"))?;

        let mut cells = BTreeMap::new();
        for (key, val) in obj {
            if *key == options.date_column {
                continue;
            }
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            cells.insert(key.clone(), json_to_cell(val));
        }
        rows.push((date, cells));
    }

    Ok(assemble(options, columns, rows))
}

fn json_date(val: &JsonValue, parser: &DateParser) -> Result<NaiveDate> {
    match val {
        JsonValue::String(s) => Ok(parser.parse_day(s)?),
        JsonValue::Number(n) => {
            let millis = n.as_i64().context("epoch milliseconds must be an integer")?;
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.date_naive())
                .context("date out of range")
        }
        other => bail!("Expected string or epoch-millisecond date, got {other}"),
    }
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with a flat schema.
///
/// The date column may be Utf8/LargeUtf8 (parsed with the configured format),
/// Date32/Date64, or a Timestamp of any unit (the time of day is dropped).
/// Other columns become cells (strings, ints, floats, bools).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let date_idx = schema
            .index_of(&options.date_column)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", options.date_column))?;
        let date_col = batch.column(date_idx);

        let meta_cols: Vec<usize> = (0..schema.fields().len())
            .filter(|i| *i != date_idx)
            .collect();
        if columns.is_empty() {
            columns = meta_cols
                .iter()
                .map(|&i| schema.field(i).name().clone())
                .collect();
        }

        for row in 0..batch.num_rows() {
            let date = extract_date(date_col, row, &options.date_parser)
                .with_context(|| format!("Row {row}: failed to read '{}'", options.date_column))?;
            let cells = meta_cols
                .iter()
                .map(|&i| extract_cell(batch.column(i), row))
                .collect();
            records.push(Record { date, cells });
        }
    }

    Ok(Dataset::new(options.date_column.clone(), columns, records))
}

// -- Parquet / Arrow helpers --

fn extract_date(col: &Arc<dyn Array>, row: usize, parser: &DateParser) -> Result<NaiveDate> {
    if col.is_null(row) {
        bail!("null date");
    }
    let date = match col.data_type() {
        DataType::Utf8 => Some(parser.parse_day(col.as_string::<i32>().value(row))?),
        DataType::LargeUtf8 => Some(parser.parse_day(col.as_string::<i64>().value(row))?),
        DataType::Date32 => col.as_primitive::<Date32Type>().value_as_date(row),
        DataType::Date64 => col.as_primitive::<Date64Type>().value_as_date(row),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => {
                    col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
                }
            };
            datetime.map(|dt| dt.date())
        }
        other => bail!("Expected string, date or timestamp column, got {other:?}"),
    };
    date.context("date out of range")
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        other => Some(CellValue::Text(format!("{other:?}"))),
    };
    cell.unwrap_or(CellValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::day;
    use std::io::Write;

    use arrow::array::{
        Date32Array, Float64Array, Int64Array, StringArray, TimestampNanosecondArray,
    };
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_rows_are_keyed_and_sorted_by_date() {
        let file = write_temp(
            ".csv",
            "date,location,new_cases,rate\n\
             2020-01-02,France,3,\n\
             2020-01-01T00:00:00,China,5,0.5\n",
        );
        let ds = load_file(file.path(), &LoadOptions::default()).unwrap();

        assert_eq!(ds.columns, vec!["location", "new_cases", "rate"]);
        assert_eq!(ds.records[0].date, day("2020-01-01"));
        assert_eq!(
            ds.records[0].cells,
            vec![CellValue::from("China"), CellValue::Integer(5), CellValue::Float(0.5)]
        );
        assert_eq!(ds.records[1].cells[2], CellValue::Null);
        assert!(ds.is_numeric("rate"));
    }

    #[test]
    fn csv_without_date_column_fails() {
        let file = write_temp(".csv", "day,location\n2020-01-01,France\n");
        let err = load_file(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("missing 'date'"));
    }

    #[test]
    fn csv_bad_date_names_the_row() {
        let file = write_temp(".csv", "date,location\n2020-01-01,France\nnot-a-date,Spain\n");
        let err = load_file(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn json_records_fill_missing_cells_with_null() {
        let ds = parse_json(
            r#"[
                { "date": "2020-01-01T00:00:00.000", "location": "China", "new_cases": 5 },
                { "date": "2020-01-02", "location": "France", "stringency": 12.5 }
            ]"#,
            &LoadOptions::default(),
        )
        .unwrap();

        assert_eq!(ds.columns, vec!["location", "new_cases", "stringency"]);
        assert_eq!(ds.records[0].cells[2], CellValue::Null);
        assert_eq!(ds.records[1].cells[1], CellValue::Null);
        assert_eq!(ds.records[1].cells[2], CellValue::Float(12.5));
    }

    #[test]
    fn json_accepts_epoch_millisecond_dates() {
        let ds = parse_json(
            r#"[
                { "date": 1577923200000, "location": "France" },
                { "date": 1577836800000, "location": "China" }
            ]"#,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(ds.records[0].date, day("2020-01-01"));
        assert_eq!(ds.records[1].date, day("2020-01-02"));
        assert_eq!(ds.records[1].cells[0], CellValue::from("France"));

        let err = parse_json(r#"[{ "date": true }]"#, &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Row 0"));
    }

    #[test]
    fn nan_and_inf_words_stay_text() {
        let file = write_temp(
            ".csv",
            "date,code,value
             2020-01-01,Nan,1.5
             2020-01-02,Inf,-2e3
             2020-01-03,infinity,.25
",
        );
        let ds = load_file(file.path(), &LoadOptions::default()).unwrap();
        let codes: Vec<String> = ds.records.iter().map(|r| r.cells[0].to_string()).collect();
        assert_eq!(codes, ["Nan", "Inf", "infinity"]);
        assert!(ds.records.iter().all(|r| matches!(r.cells[0], CellValue::Text(_))));
        assert_eq!(
            ds.records.iter().map(|r| r.cells[1].clone()).collect::<Vec<_>>(),
            vec![CellValue::Float(1.5), CellValue::Float(-2000.0), CellValue::Float(0.25)]
        );
        assert!(!ds.is_numeric("code"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = write_temp(".xlsx", "");
        assert!(load_file(file.path(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn parquet_with_date32_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("location", DataType::Utf8, false),
            Field::new("new_cases", DataType::Int64, false),
            Field::new("rate", DataType::Float64, true),
        ]));
        // 18262 = 2020-01-01
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![18263, 18262])),
                Arc::new(StringArray::from(vec!["France", "China"])),
                Arc::new(Int64Array::from(vec![3, 5])),
                Arc::new(Float64Array::from(vec![None, Some(0.5)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.columns, vec!["location", "new_cases", "rate"]);
        assert_eq!(ds.records[0].date, day("2020-01-01"));
        assert_eq!(ds.records[0].cells[0], CellValue::from("China"));
        assert_eq!(ds.records[1].cells[2], CellValue::Null);
    }

    #[test]
    fn parquet_with_nanosecond_timestamp_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("date", DataType::Timestamp(TimeUnit::Nanosecond, None), false),
            Field::new("location", DataType::Utf8, false),
        ]));
        // 2020-01-02T00:00:00 and 2020-01-01T18:30:00
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(TimestampNanosecondArray::from(vec![
                    1_577_923_200_000_000_000,
                    1_577_903_400_000_000_000,
                ])),
                Arc::new(StringArray::from(vec!["France", "China"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.columns, vec!["location"]);
        assert_eq!(ds.records[0].date, day("2020-01-01"));
        assert_eq!(ds.records[0].cells[0], CellValue::from("China"));
        assert_eq!(ds.records[1].date, day("2020-01-02"));
    }
}
