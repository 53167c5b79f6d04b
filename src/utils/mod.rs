//! Utility functions and types

pub mod data;

pub use data::{read_csv_bytes, read_csv_path, write_csv_string};
