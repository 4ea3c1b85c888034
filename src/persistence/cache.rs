//! Bincode snapshots of the prepared series stores and the neighbour table, the hand-off
//! between the `prepare` and `forecast` phases.

use crate::persistence::error::PersistenceError;
use crate::stations::association::NeighborTable;
use crate::types::network::Network;
use crate::types::store::SeriesStore;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const NEIGHBORS_CACHE_FILE_NAME: &str = "neighbors.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

pub(crate) fn ensure_dir(path: &Path) -> Result<(), PersistenceError> {
    fs::create_dir_all(path).map_err(|e| PersistenceError::DirCreation(path.to_path_buf(), e))
}

/// Encodes `value` and replaces `path` atomically. Returns the number of bytes written.
pub fn write_bincode<T: Serialize>(value: &T, path: &Path) -> Result<usize, PersistenceError> {
    let bytes = bincode::serde::encode_to_vec(value, BINCODE_CONFIG)
        .map_err(|e| PersistenceError::CacheEncode(Box::new(e)))?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    ensure_dir(dir)?;
    let write_error = |e: std::io::Error| PersistenceError::CacheWrite(path.to_path_buf(), e);
    let mut temp_file = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp_file.write_all(&bytes).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;
    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::CacheWrite(path.to_path_buf(), e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

pub fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::CacheMissing(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| PersistenceError::CacheRead(path.to_path_buf(), e))?;
    let (value, _) = bincode::serde::decode_from_slice::<T, _>(&bytes, BINCODE_CONFIG)
        .map_err(|e| PersistenceError::CacheDecode(path.to_path_buf(), Box::from(e)))?;
    Ok(value)
}

pub fn store_path(work_dir: &Path, network: Network) -> PathBuf {
    work_dir.join(network.cache_file_name())
}

pub fn save_store(store: &SeriesStore, work_dir: &Path) -> Result<PathBuf, PersistenceError> {
    let path = store_path(work_dir, store.network);
    write_bincode(store, &path)?;
    Ok(path)
}

pub fn load_store(network: Network, work_dir: &Path) -> Result<SeriesStore, PersistenceError> {
    read_bincode(&store_path(work_dir, network))
}

pub fn save_neighbor_table(
    table: &NeighborTable,
    work_dir: &Path,
) -> Result<PathBuf, PersistenceError> {
    let path = work_dir.join(NEIGHBORS_CACHE_FILE_NAME);
    write_bincode(table, &path)?;
    Ok(path)
}

pub fn load_neighbor_table(work_dir: &Path) -> Result<NeighborTable, PersistenceError> {
    read_bincode(&work_dir.join(NEIGHBORS_CACHE_FILE_NAME))
}
