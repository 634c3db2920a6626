use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;

use crate::error::{CleaningError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the Pandas dtypes the listings
/// dataset ends up with.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Calendar date produced by date coercion.
    Date(NaiveDate),
    Null,
}

/// Tokens read as missing values, on top of the empty field.
const NA_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL"];

impl CellValue {
    /// Guess the type of a raw text field the way `read_csv` would.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Try to interpret the value as an `f64` for range checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Render the cell as a delimited-file field. Nulls become empty fields.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Whole floats keep a fractional digit so they reload as floats.
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Row – one listing
// ---------------------------------------------------------------------------

/// A single record, cells ordered like [`Table::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Row { cells }
    }

    pub fn get(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered rows sharing one schema. Row order is input-file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// All rows.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`] but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| CleaningError::MissingColumn(name.to_string()))
    }

    /// Copy the rows at `indices`, in the given order.
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_matches_read_csv_types() {
        assert_eq!(CellValue::guess("2539"), CellValue::Integer(2539));
        assert_eq!(CellValue::guess("40.64749"), CellValue::Float(40.64749));
        assert_eq!(CellValue::guess("true"), CellValue::Bool(true));
        assert_eq!(
            CellValue::guess("Private room"),
            CellValue::String("Private room".into())
        );
        assert_eq!(CellValue::guess(""), CellValue::Null);
        assert_eq!(CellValue::guess("NaN"), CellValue::Null);
    }

    #[test]
    fn fields_render_losslessly() {
        assert_eq!(CellValue::Float(-73.97237).to_field(), "-73.97237");
        assert_eq!(CellValue::Null.to_field(), "");
        assert_eq!(CellValue::Float(200.0).to_field(), "200.0");
        assert_eq!(CellValue::guess(&CellValue::Float(200.0).to_field()), CellValue::Float(200.0));
        assert_eq!(CellValue::Float(-0.5).to_field(), "-0.5");
        let d = NaiveDate::from_ymd_opt(2019, 5, 1).unwrap();
        assert_eq!(CellValue::Date(d).to_field(), "2019-05-01");
    }

    #[test]
    fn require_column_names_the_missing_column() {
        let table = Table::new(vec!["id".into(), "price".into()], Vec::new());
        assert_eq!(table.require_column("price").unwrap(), 1);
        let err = table.require_column("latitude").unwrap_err();
        assert_eq!(err.to_string(), "missing required column 'latitude'");
    }
}
