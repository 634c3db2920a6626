//! Writes a synthetic listings dataset (`sample.csv` and `sample.parquet`)
//! with a sprinkling of price, location and date outliers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Rough centre of each borough: (name, latitude, longitude).
const BOROUGHS: [(&str, f64, f64); 5] = [
    ("Manhattan", 40.78, -73.97),
    ("Brooklyn", 40.68, -73.95),
    ("Queens", 40.73, -73.82),
    ("Bronx", 40.85, -73.88),
    ("Staten Island", 40.58, -74.15),
];

const ROOM_TYPES: [&str; 3] = ["Entire home/apt", "Private room", "Shared room"];
const ADJECTIVES: [&str; 5] = ["Cozy", "Sunny", "Spacious", "Quiet", "Modern"];

struct Listing {
    id: i64,
    name: String,
    neighbourhood_group: &'static str,
    latitude: f64,
    longitude: f64,
    room_type: &'static str,
    price: i64,
    minimum_nights: i64,
    last_review: Option<String>,
}

fn generate(rng: &mut SimpleRng, n: usize) -> Vec<Listing> {
    (0..n)
        .map(|i| {
            let (group, lat, lon) = BOROUGHS[i % BOROUGHS.len()];
            let room_type = rng.pick(&ROOM_TYPES);
            let base = match room_type {
                "Entire home/apt" => 180.0,
                "Private room" => 80.0,
                _ => 50.0,
            };

            let mut price = rng.gauss(base, base * 0.35).round().max(0.0) as i64;
            let mut latitude = lat + rng.gauss(0.0, 0.03);
            let mut longitude = lon + rng.gauss(0.0, 0.03);
            let mut last_review = Some(format!(
                "2019-{:02}-{:02}",
                1 + rng.next_u64() % 12,
                1 + rng.next_u64() % 28
            ));

            // Outliers the cleaning step is expected to catch.
            match i % 23 {
                3 => price = 0,
                7 => price = 5_000 + (rng.next_u64() % 5_000) as i64,
                11 => longitude = rng.uniform(-75.5, -74.5),
                13 => latitude = rng.uniform(41.3, 42.0),
                17 => last_review = None,
                19 => last_review = Some("not reviewed".to_string()),
                _ => {}
            }

            Listing {
                id: 2539 + i as i64 * 7,
                name: format!("{} {} in {group}", rng.pick(&ADJECTIVES), room_type.to_lowercase()),
                neighbourhood_group: group,
                latitude: (latitude * 1e5).round() / 1e5,
                longitude: (longitude * 1e5).round() / 1e5,
                room_type,
                price,
                minimum_nights: 1 + (rng.next_u64() % 7) as i64,
                last_review,
            }
        })
        .collect()
}

const COLUMNS: [&str; 9] = [
    "id",
    "name",
    "neighbourhood_group",
    "latitude",
    "longitude",
    "room_type",
    "price",
    "minimum_nights",
    "last_review",
];

fn write_csv(listings: &[Listing], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(COLUMNS)?;
    for l in listings {
        writer.write_record([
            l.id.to_string(),
            l.name.clone(),
            l.neighbourhood_group.to_string(),
            l.latitude.to_string(),
            l.longitude.to_string(),
            l.room_type.to_string(),
            l.price.to_string(),
            l.minimum_nights.to_string(),
            l.last_review.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(listings: &[Listing], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("neighbourhood_group", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("room_type", DataType::Utf8, false),
        Field::new("price", DataType::Int64, false),
        Field::new("minimum_nights", DataType::Int64, false),
        Field::new("last_review", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.id))),
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.name.as_str()))),
            Arc::new(StringArray::from_iter_values(
                listings.iter().map(|l| l.neighbourhood_group),
            )),
            Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.latitude))),
            Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.longitude))),
            Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.room_type))),
            Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.price))),
            Arc::new(Int64Array::from_iter_values(
                listings.iter().map(|l| l.minimum_nights),
            )),
            Arc::new(StringArray::from(
                listings
                    .iter()
                    .map(|l| l.last_review.as_deref())
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    let mut rng = SimpleRng::new(42);
    let listings = generate(&mut rng, 500);

    let csv_path = out_dir.join("sample.csv");
    write_csv(&listings, &csv_path)?;
    let parquet_path = out_dir.join("sample.parquet");
    write_parquet(&listings, &parquet_path)?;

    println!(
        "Wrote {} listings to {} and {}",
        listings.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
