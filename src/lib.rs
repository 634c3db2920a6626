//! Basic cleaning step for the listings dataset.
//!
//! Loads a tracked table, drops price and location outliers, coerces the
//! review date, and publishes the cleaned table as a new artifact version.

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod run;
