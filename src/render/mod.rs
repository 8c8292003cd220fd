//! Rendering module for writing and reading feature tables.

mod csv_export;
mod json;

pub use csv_export::{to_csv, write_features_csv, write_features_csv_to};
pub use json::{from_json, read_features_json, to_json, write_features_json, JsonFormat};
