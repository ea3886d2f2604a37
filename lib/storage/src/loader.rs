use crate::table::{ColumnarTable, TableFormat, TableSnapshot};
use anyhow::{Context, Result as AnyResult};
use atomicwrites::{AllowOverwrite, AtomicFile};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use foilsim_core::{
    Error, FeatureScaler, ReferenceRecord, ReferenceTable, Result, ScalerState, SearchConfig,
    SimilarityEngine,
};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_TABLE_FILE: &str = "airfoil_data.json";
pub const DEFAULT_SCALER_FILE: &str = "num_scaler.json";

/// Locations of the persisted reference table and fitted scaler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub table: PathBuf,
    pub scaler: PathBuf,
}

impl DataFiles {
    /// Default file names inside `data_dir`
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            table: data_dir.join(DEFAULT_TABLE_FILE),
            scaler: data_dir.join(DEFAULT_SCALER_FILE),
        }
    }

    pub fn with_table<P: Into<PathBuf>>(mut self, table: P) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_scaler<P: Into<PathBuf>>(mut self, scaler: P) -> Self {
        self.scaler = scaler.into();
        self
    }
}

fn configuration_error(path: &Path, err: anyhow::Error) -> Error {
    Error::Configuration(format!("{}: {:#}", path.display(), err))
}

fn read_bytes(path: &Path) -> AnyResult<Vec<u8>> {
    let raw = fs::read(path).context("failed to read file")?;
    if !crate::is_gzip(path) {
        return Ok(raw);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(raw.as_slice())
        .read_to_end(&mut decoded)
        .context("failed to decompress gzip data")?;
    Ok(decoded)
}

fn write_bytes(path: &Path, data: &[u8]) -> AnyResult<()> {
    let data = if crate::is_gzip(path) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        encoder.finish()?
    } else {
        data.to_vec()
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, AllowOverwrite).write(|f| f.write_all(&data))?;
    Ok(())
}

fn decode_table(path: &Path) -> AnyResult<crate::table::DecodedRows> {
    let format = TableFormat::from_path(path)?;
    let bytes = read_bytes(path)?;
    match format {
        TableFormat::Json => {
            let table: ColumnarTable =
                serde_json::from_slice(&bytes).context("invalid columnar JSON table")?;
            table.into_rows()
        }
        TableFormat::Binary => {
            let snapshot: TableSnapshot =
                bincode::deserialize(&bytes).context("invalid binary table snapshot")?;
            snapshot.into_rows()
        }
    }
}

/// Load the pre-scaled reference table, dropping rows with missing or non-finite features
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<ReferenceTable> {
    let path = path.as_ref();
    let rows = decode_table(path).map_err(|e| configuration_error(path, e))?;
    if rows.dropped > 0 {
        warn!(
            "Dropped {} reference rows with missing or non-finite features from {:?}",
            rows.dropped, path
        );
    }
    let table = ReferenceTable::new(rows.records)
        .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
    info!("Loaded {} reference records from {:?}", table.len(), path);
    Ok(table)
}

/// Load a fitted scaler and check it against the feature schema
pub fn load_scaler<P: AsRef<Path>>(path: P) -> Result<FeatureScaler> {
    let path = path.as_ref();
    let state: ScalerState = read_bytes(path)
        .and_then(|bytes| serde_json::from_slice(&bytes).context("invalid scaler parameters"))
        .map_err(|e| configuration_error(path, e))?;
    let scaler = FeatureScaler::from_state(state)
        .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;
    info!("Loaded feature scaler from {:?}", path);
    Ok(scaler)
}

/// Load table and scaler and build the engine that serves every query
pub fn load_engine(files: &DataFiles, config: SearchConfig) -> Result<SimilarityEngine> {
    let scaler = load_scaler(&files.scaler)?;
    let table = load_table(&files.table)?;
    SimilarityEngine::new(table, scaler, config)
}

/// Write records (already scaled) in the format implied by `path`
pub fn save_table<P: AsRef<Path>>(path: P, records: &[ReferenceRecord]) -> AnyResult<()> {
    let path = path.as_ref();
    let bytes = match TableFormat::from_path(path)? {
        TableFormat::Json => serde_json::to_vec(&ColumnarTable::from_records(records))?,
        TableFormat::Binary => bincode::serialize(&TableSnapshot::from_records(records))
            .map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?,
    };
    write_bytes(path, &bytes).with_context(|| format!("failed to write {:?}", path))
}

pub fn save_scaler<P: AsRef<Path>>(path: P, scaler: &FeatureScaler) -> AnyResult<()> {
    let path = path.as_ref();
    let bytes = serde_json::to_vec_pretty(&scaler.to_state())?;
    write_bytes(path, &bytes).with_context(|| format!("failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foilsim_core::{Geometry, FEATURE_COUNT};
    use serde_json::json;

    fn raw_rows() -> Vec<[f64; FEATURE_COUNT]> {
        vec![
            [1.0e5, 0.0, 0.21, 0.0090, -0.040, 23.3],
            [3.0e5, 4.0, 0.66, 0.0101, -0.052, 65.3],
            [6.0e5, 8.0, 1.04, 0.0142, -0.061, 73.2],
        ]
    }

    fn write_fixture(dir: &Path, table_file: &str, scaler_file: &str) -> DataFiles {
        let raw = raw_rows();
        let scaler = FeatureScaler::fit_standard(&raw).unwrap();
        let records: Vec<ReferenceRecord> = raw
            .iter()
            .enumerate()
            .map(|(i, row)| {
                ReferenceRecord::new(
                    format!("foil-{}", i),
                    scaler.transform(row),
                    Geometry::Encoded(json!([[1.0, 0.0], [0.0, i]]).to_string()),
                )
            })
            .collect();
        let files = DataFiles::in_dir(dir)
            .with_table(dir.join(table_file))
            .with_scaler(dir.join(scaler_file));
        save_table(&files.table, &records).unwrap();
        save_scaler(&files.scaler, &scaler).unwrap();
        files
    }

    #[test]
    fn test_default_file_names() {
        let files = DataFiles::in_dir("/srv/foilsim");
        assert_eq!(files.table, PathBuf::from("/srv/foilsim/airfoil_data.json"));
        assert_eq!(files.scaler, PathBuf::from("/srv/foilsim/num_scaler.json"));
    }

    #[test]
    fn test_load_json_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_fixture(dir.path(), DEFAULT_TABLE_FILE, DEFAULT_SCALER_FILE);
        let engine = load_engine(&files, SearchConfig::default()).unwrap();
        assert_eq!(engine.table().len(), 3);
        assert_eq!(engine.table().get(2).unwrap().airfoil_name, "foil-2");
    }

    #[test]
    fn test_load_gzipped_binary_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_fixture(dir.path(), "airfoil_data.bin.gz", "num_scaler.json.gz");
        let table = load_table(&files.table).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(1).unwrap().geometry.decode().unwrap(),
            json!([[1.0, 0.0], [0.0, 1]])
        );
        assert!(load_scaler(&files.scaler).is_ok());
    }

    #[test]
    fn test_missing_files_are_configuration_errors() {
        let dir = tempfile::tempdir().unwrap();
        let files = DataFiles::in_dir(dir.path());
        match load_engine(&files, SearchConfig::default()) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("num_scaler.json")),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(load_table(&files.table), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_corrupt_scaler_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SCALER_FILE);
        fs::write(&path, b"{\"kind\": \"robust\"}").unwrap();
        assert!(matches!(load_scaler(&path), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_table_with_only_unusable_rows_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_TABLE_FILE);
        let table = json!({
            "airfoil_name": ["a"],
            "reynolds_number": [null],
            "angle_of_attack": [0.0],
            "cl": [0.0],
            "cd": [0.0],
            "cm": [0.0],
            "cl_cd_ratio": [0.0]
        });
        fs::write(&path, serde_json::to_vec(&table).unwrap()).unwrap();
        assert!(matches!(load_table(&path), Err(Error::Configuration(_))));
    }
}
