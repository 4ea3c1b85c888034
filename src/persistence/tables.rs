//! Parquet and CSV output of polars frames.

use crate::persistence::cache::ensure_dir;
use crate::persistence::error::PersistenceError;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<(), PersistenceError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Writes `df` as Snappy-compressed Parquet, creating parent folders as needed.
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), PersistenceError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| PersistenceError::ParquetWriteIo(path.to_path_buf(), e))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)
        .map_err(|e| PersistenceError::ParquetWritePolars(path.to_path_buf(), e))?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<DataFrame, PersistenceError> {
    let file = File::open(path).map_err(|e| {
        PersistenceError::ParquetRead(path.to_path_buf(), PolarsError::from(e))
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| PersistenceError::ParquetRead(path.to_path_buf(), e))
}

/// Writes `df` as comma separated CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), PersistenceError> {
    ensure_parent(path)?;
    let mut file =
        File::create(path).map_err(|e| PersistenceError::CsvWriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| PersistenceError::CsvWritePolars(path.to_path_buf(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("station".into(), &[300111u32, 300112]),
            Column::new("gw_level".into(), &[245.5f64, f64::NAN]),
        ])
        .unwrap()
    }

    #[test]
    fn parquet_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames").join("300111.parquet");
        write_parquet(&mut frame(), &path).unwrap();

        let back = read_parquet(&path).unwrap();
        assert_eq!(back.shape(), (2, 2));
        let level = back.column("gw_level").unwrap().f64().unwrap();
        assert_eq!(level.get(0), Some(245.5));
    }

    #[test]
    fn csv_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&mut frame(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("station,gw_level\n300111,245.5\n"));
    }
}
