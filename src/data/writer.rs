use std::path::Path;

use anyhow::{Context, Result};

use super::model::Table;
use crate::data::KEY_COLUMN;

/// Write `table` as a delimited file with a header row.
///
/// The key column goes first, the rest keep their order. `.tsv` / `.tab`
/// paths are tab-delimited, anything else is comma-delimited.
pub fn write_delimited(table: &Table, path: &Path) -> Result<()> {
    let delimiter = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let order = column_order(table);
    writer
        .write_record(order.iter().map(|&i| table.columns[i].as_str()))
        .context("writing header")?;
    for (row_no, row) in table.rows.iter().enumerate() {
        writer
            .write_record(order.iter().map(|&i| row.get(i).to_field().into_owned()))
            .with_context(|| format!("writing row {row_no}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Column indices in output order.
fn column_order(table: &Table) -> Vec<usize> {
    let key = table.column_index(KEY_COLUMN);
    key.into_iter()
        .chain((0..table.columns.len()).filter(|&i| Some(i) != key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::{CellValue, Row};
    use chrono::NaiveDate;

    #[test]
    fn key_column_written_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::new(
            vec!["name".into(), "id".into(), "last_review".into(), "price".into()],
            vec![
                Row::new(vec![
                    CellValue::String("Cozy, bright room".into()),
                    CellValue::Integer(7),
                    CellValue::Date(NaiveDate::from_ymd_opt(2019, 5, 1).unwrap()),
                    CellValue::Float(99.5),
                ]),
                Row::new(vec![
                    CellValue::String("Loft".into()),
                    CellValue::Integer(8),
                    CellValue::Null,
                    CellValue::Integer(120),
                ]),
            ],
        );
        write_delimited(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "id,name,last_review,price\n\
             7,\"Cozy, bright room\",2019-05-01,99.5\n\
             8,Loft,,120\n"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tsv");
        let table = Table::new(vec!["id".into(), "price".into()], Vec::new());
        write_delimited(&table, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\tprice\n");
        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let table = Table::new(vec!["id".into()], Vec::new());
        assert!(write_delimited(&table, &path).is_err());
    }
}
