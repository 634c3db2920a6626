/// Data layer: core types, loading, cleaning, and writing.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  price range → date coercion → geo box
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → delimited file, key column first
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;

/// Unique row key.
pub const KEY_COLUMN: &str = "id";
pub const PRICE_COLUMN: &str = "price";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LAST_REVIEW_COLUMN: &str = "last_review";
