use crate::error::EhydError;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "ehyd_cache";

/// Default work directory: `ehyd_cache` below the platform cache directory.
pub fn get_cache_dir() -> Result<PathBuf, EhydError> {
    dirs::cache_dir()
        .ok_or(EhydError::CacheDirResolution)
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub fn ensure_dir_exists(path: &Path) -> Result<(), EhydError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EhydError::WorkDirCreation(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path is not a directory"),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Creating work directory: {}", path.display());
            fs::create_dir_all(path).map_err(|e| EhydError::WorkDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(EhydError::WorkDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir_exists(&nested).unwrap();
    }

    #[test]
    fn rejects_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file),
            Err(EhydError::WorkDirCreation(..))
        ));
    }
}
