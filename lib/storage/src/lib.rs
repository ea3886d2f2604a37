//! # foilsim Storage
//!
//! Loads the persisted reference table and fitted scaler that back the
//! similarity engine, and writes the same formats for fixtures.
//!
//! - Reference table: columnar JSON (`.json`) or a bincode snapshot (`.bin`)
//! - Scaler: JSON parameters tagged by kind
//!
//! Any file may carry an extra `.gz` suffix to be read or written gzip-compressed.

pub mod loader;
pub mod table;

pub use loader::{
    load_engine, load_scaler, load_table, save_scaler, save_table, DataFiles,
    DEFAULT_SCALER_FILE, DEFAULT_TABLE_FILE,
};
pub use table::{ColumnarTable, TableFormat, TableSnapshot};

use std::path::Path;

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}
