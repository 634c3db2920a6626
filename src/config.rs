//! Command-line configuration of the cleaning step.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::data::filter::PriceRange;

/// Cleans the listings data and publishes the result as an artifact.
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "basic-cleaning", version, about, long_about = None)]
pub struct CleaningConfig {
    /// Temporary directory for dataset storage
    #[arg(long = "tmp_directory", visible_alias = "tmp-directory")]
    pub tmp_directory: PathBuf,

    /// Input artifact name, e.g. `sample.csv:latest`
    #[arg(long = "input_artifact", visible_alias = "input-artifact")]
    pub input_artifact: String,

    /// Output artifact name
    #[arg(long = "output_artifact", visible_alias = "output-artifact")]
    pub output_artifact: String,

    /// Output artifact type
    #[arg(long = "output_type", visible_alias = "output-type")]
    pub output_type: String,

    /// Output artifact description
    #[arg(long = "output_description", visible_alias = "output-description")]
    pub output_description: String,

    /// Minimum price limit
    #[arg(long = "min_price", visible_alias = "min-price", allow_negative_numbers = true)]
    pub min_price: i64,

    /// Maximum price limit
    #[arg(long = "max_price", visible_alias = "max-price", allow_negative_numbers = true)]
    pub max_price: i64,

    /// Root directory of the artifact store
    #[arg(long, env = "CLEANING_ARTIFACT_ROOT", default_value = "artifacts")]
    #[serde(skip)]
    pub artifact_root: PathBuf,
}

impl CleaningConfig {
    pub fn price_range(&self) -> PriceRange {
        PriceRange::new(self.min_price, self.max_price)
    }
}
