use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{CellValue, Table};
use crate::data::{KEY_COLUMN, LAST_REVIEW_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, PRICE_COLUMN};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Inclusive price range. `min > max` is accepted and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl PriceRange {
    pub fn new(min: i64, max: i64) -> Self {
        PriceRange { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min as f64 <= price && price <= self.max as f64
    }
}

/// Inclusive longitude/latitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

/// The New York City area the listings are expected to fall in.
pub const NYC_BOUNDS: GeoBounds = GeoBounds {
    min_longitude: -74.25,
    max_longitude: -73.50,
    min_latitude: 40.5,
    max_latitude: 41.2,
};

impl GeoBounds {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.min_longitude..=self.max_longitude).contains(&longitude)
            && (self.min_latitude..=self.max_latitude).contains(&latitude)
    }
}

/// Columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    KEY_COLUMN,
    PRICE_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_COLUMN,
    LAST_REVIEW_COLUMN,
];

/// Fail on the first column of [`REQUIRED_COLUMNS`] the table lacks.
pub fn check_required_columns(table: &Table) -> Result<()> {
    for col in REQUIRED_COLUMNS {
        table.require_column(col)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual steps
// ---------------------------------------------------------------------------

/// Return indices of rows whose price lies in `range`.
///
/// Null or non-numeric prices never match, like `Series.between` on NaN.
pub fn price_indices(table: &Table, range: PriceRange) -> Result<Vec<usize>> {
    let price_idx = table.require_column(PRICE_COLUMN)?;
    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.get(price_idx).as_f64().is_some_and(|p| range.contains(p)))
        .map(|(i, _)| i)
        .collect())
}

/// Return indices of rows whose coordinates lie inside `bounds`.
pub fn geo_indices(table: &Table, bounds: &GeoBounds) -> Result<Vec<usize>> {
    let lon_idx = table.require_column(LONGITUDE_COLUMN)?;
    let lat_idx = table.require_column(LATITUDE_COLUMN)?;
    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            match (row.get(lon_idx).as_f64(), row.get(lat_idx).as_f64()) {
                (Some(lon), Some(lat)) => bounds.contains(lon, lat),
                _ => false,
            }
        })
        .map(|(i, _)| i)
        .collect())
}

pub fn filter_price(table: &Table, range: PriceRange) -> Result<Table> {
    Ok(table.take(&price_indices(table, range)?))
}

pub fn filter_geo(table: &Table, bounds: &GeoBounds) -> Result<Table> {
    Ok(table.take(&geo_indices(table, bounds)?))
}

/// Coerce `column` to dates in place. Never drops a row.
///
/// Returns how many cells ended up null.
pub fn coerce_dates(table: &mut Table, column: &str) -> Result<usize> {
    let idx = table.require_column(column)?;
    let mut nulls = 0;
    for row in &mut table.rows {
        let Some(cell) = row.cells.get_mut(idx) else {
            nulls += 1;
            continue;
        };
        *cell = match to_date(cell) {
            Some(d) => CellValue::Date(d),
            None => {
                nulls += 1;
                CellValue::Null
            }
        };
    }
    Ok(nulls)
}

fn to_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::String(s) => parse_date(s),
        CellValue::Integer(i) => parse_date(&i.to_string()),
        _ => None,
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date-like string. Date-times keep only their date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

// ---------------------------------------------------------------------------
// The cleaning pipeline
// ---------------------------------------------------------------------------

/// Row counts observed while cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub after_price: usize,
    pub null_dates: usize,
    pub output_rows: usize,
}

/// Price filter, then date coercion, then geo filter.
///
/// Required columns are checked up front so a malformed table fails before
/// any step runs.
pub fn clean(table: &Table, range: PriceRange) -> Result<(Table, CleaningReport)> {
    check_required_columns(table)?;
    if range.min > range.max {
        log::warn!(
            "min_price {} is greater than max_price {}, no rows will be kept",
            range.min,
            range.max
        );
    }

    let mut report = CleaningReport {
        input_rows: table.len(),
        ..Default::default()
    };

    let mut df = filter_price(table, range)?;
    report.after_price = df.len();
    log::info!("Removed price outliers, range info {}-{}", range.min, range.max);

    report.null_dates = coerce_dates(&mut df, LAST_REVIEW_COLUMN)?;
    log::info!("Fixed {LAST_REVIEW_COLUMN} data type");

    let df = filter_geo(&df, &NYC_BOUNDS)?;
    report.output_rows = df.len();
    log::info!(
        "Removed rows outside the geographic bounds, {} of {} rows kept",
        report.output_rows,
        report.input_rows
    );

    Ok((df, report))
}
