use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use chrono::{DateTime, NaiveDate, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Row, Table};
use crate::data::KEY_COLUMN;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – comma-delimited with a header row
/// * `.tsv` / `.tab`   – tab-delimited with a header row
/// * `.json`           – `[{ "id": 1, "price": 150, ... }, ...]`
/// * `.parquet`        – flat Parquet file with scalar columns
///
/// Anything else is read as CSV: tracked artifact files are frequently
/// named without an extension.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        _ => load_delimited(path, b',')?,
    };

    warn_duplicate_keys(&table);
    Ok(table)
}

/// Keys are expected to be unique but, like a Pandas index, not enforced.
fn warn_duplicate_keys(table: &Table) {
    let Some(key_idx) = table.column_index(KEY_COLUMN) else {
        return;
    };
    let mut seen = HashSet::with_capacity(table.len());
    let duplicates = table
        .rows
        .iter()
        .filter(|row| !seen.insert(row.get(key_idx).to_field().into_owned()))
        .count();
    if duplicates > 0 {
        log::warn!("{duplicates} rows share an '{KEY_COLUMN}' with an earlier row");
    }
}

// ---------------------------------------------------------------------------
// Delimited loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per line.  Every field goes
/// through [`CellValue::guess`].
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        rows.push(Row::new(record.iter().map(CellValue::guess).collect()));
    }

    Ok(Table::new(columns, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "id": 2539, "price": 149, "last_review": "2018-10-19" },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order; absent keys are null.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            Row::new(
                columns
                    .iter()
                    .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
                    .collect(),
            )
        })
        .collect();

    Ok(Table::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.
///
/// Scalar columns only (strings, ints, floats, bools, dates, timestamps);
/// nested columns are rejected.  Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        if batch.num_columns() != columns.len() {
            bail!(
                "record batch has {} columns, schema has {}",
                batch.num_columns(),
                columns.len()
            );
        }

        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, name)| extract_cell(col, row, name))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::new(cells));
        }
    }

    Ok(Table::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
///
/// Timestamps keep their date part. Column types with no cell
/// counterpart are an error rather than a placeholder value.
fn extract_cell(col: &Arc<dyn Array>, row: usize, name: &str) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => {
            let days = col.as_primitive::<Date32Type>().value(row);
            date_from_epoch_days(days).map_or(CellValue::Null, CellValue::Date)
        }
        DataType::Date64 => {
            let millis = col.as_primitive::<Date64Type>().value(row);
            date_from_timestamp(millis, &TimeUnit::Millisecond)
                .map_or(CellValue::Null, CellValue::Date)
        }
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value(row),
                TimeUnit::Millisecond => col.as_primitive::<TimestampMillisecondType>().value(row),
                TimeUnit::Microsecond => col.as_primitive::<TimestampMicrosecondType>().value(row),
                TimeUnit::Nanosecond => col.as_primitive::<TimestampNanosecondType>().value(row),
            };
            date_from_timestamp(raw, unit).map_or(CellValue::Null, CellValue::Date)
        }
        other => bail!("column '{name}' has unsupported type {other:?}"),
    };
    Ok(cell)
}

/// UTC calendar date of an epoch timestamp in `unit`.
fn date_from_timestamp(raw: i64, unit: &TimeUnit) -> Option<NaiveDate> {
    let dt = match unit {
        TimeUnit::Second => DateTime::<Utc>::from_timestamp(raw, 0),
        TimeUnit::Millisecond => DateTime::<Utc>::from_timestamp_millis(raw),
        TimeUnit::Microsecond => DateTime::<Utc>::from_timestamp_micros(raw),
        TimeUnit::Nanosecond => Some(DateTime::<Utc>::from_timestamp_nanos(raw)),
    };
    dt.map(|dt| dt.date_naive())
}

/// Days since 1970-01-01, as stored by Arrow `Date32`.
fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    const UNIX_EPOCH_FROM_CE: i32 = 719_163;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_FROM_CE)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{
        Date32Array, Date64Array, Float64Array, Int64Array, ListArray, StringArray,
        TimestampNanosecondArray, UInt16Array,
    };
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_keeps_columns_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sample.csv",
            "id,name,price,last_review\n\
             2539,\"Clean, quiet apt\",149,2018-10-19\n\
             2595,Skylit Midtown Castle,225,\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "name", "price", "last_review"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0].cells[1],
            CellValue::String("Clean, quiet apt".into())
        );
        assert_eq!(table.rows[1].cells[2], CellValue::Integer(225));
        assert!(table.rows[1].cells[3].is_null());
    }

    #[test]
    fn extensionless_files_read_as_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "clean_sample", "id,price\n1,10\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.rows[0].cells, vec![CellValue::Integer(1), CellValue::Integer(10)]);
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sample.tsv", "id\tprice\n1\t99.5\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "price"]);
        assert_eq!(table.rows[0].cells[1], CellValue::Float(99.5));
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "id,price\n1,10\n2\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row 1"));
    }

    #[test]
    fn json_unions_keys_and_fills_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sample.json",
            r#"[{"id": 1, "price": 150.5}, {"id": 2, "last_review": "2019-05-01"}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "price", "last_review"]);
        assert_eq!(table.rows[0].cells[1], CellValue::Float(150.5));
        assert!(table.rows[0].cells[2].is_null());
        assert!(table.rows[1].cells[1].is_null());
    }

    #[test]
    fn parquet_scalar_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("room_type", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, false),
            Field::new("last_review", DataType::Date32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("Entire home/apt"), None])),
                Arc::new(Float64Array::from(vec![40.7, 40.8])),
                Arc::new(Date32Array::from(vec![Some(18017), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "room_type", "latitude", "last_review"]);
        assert_eq!(table.rows[0].cells[0], CellValue::Integer(1));
        assert!(table.rows[1].cells[1].is_null());
        assert_eq!(table.rows[1].cells[2], CellValue::Float(40.8));
        assert_eq!(
            table.rows[0].cells[3],
            CellValue::Date(NaiveDate::from_ymd_opt(2019, 5, 1).unwrap())
        );
        assert!(table.rows[1].cells[3].is_null());
    }

    fn write_parquet(path: &Path, schema: Arc<Schema>, columns: Vec<arrow::array::ArrayRef>) {
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_timestamps_keep_their_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.parquet");
        // 2019-05-01T13:45:00Z
        let review_secs: i64 = 1_556_718_300;

        let schema = Arc::new(Schema::new(vec![
            Field::new("minimum_nights", DataType::UInt16, false),
            Field::new(
                "last_review",
                DataType::Timestamp(TimeUnit::Nanosecond, None),
                true,
            ),
            Field::new("first_review", DataType::Date64, true),
        ]));
        write_parquet(
            &path,
            schema,
            vec![
                Arc::new(UInt16Array::from(vec![3, 30])),
                Arc::new(TimestampNanosecondArray::from(vec![
                    Some(review_secs * 1_000_000_000),
                    None,
                ])),
                Arc::new(Date64Array::from(vec![Some(review_secs * 1_000), None])),
            ],
        );

        let table = load_file(&path).unwrap();
        let may_first = CellValue::Date(NaiveDate::from_ymd_opt(2019, 5, 1).unwrap());
        assert_eq!(table.rows[1].cells[0], CellValue::Integer(30));
        assert_eq!(table.rows[0].cells[1], may_first);
        assert!(table.rows[1].cells[1].is_null());
        assert_eq!(table.rows[0].cells[2], may_first);
    }

    #[test]
    fn parquet_unsupported_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.parquet");
        let amenities =
            ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1), Some(2)])]);
        let schema = Arc::new(Schema::new(vec![Field::new(
            "amenities",
            amenities.data_type().clone(),
            true,
        )]));
        write_parquet(&path, schema, vec![Arc::new(amenities)]);

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("column 'amenities' has unsupported type"));
    }
}
