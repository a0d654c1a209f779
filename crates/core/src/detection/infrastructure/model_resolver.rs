use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine a cache directory")]
    NoCacheDir,
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the local path of the named model, downloading it into the
/// user cache on first use.
pub fn resolve(name: &str, url: &str) -> Result<PathBuf, ModelResolveError> {
    let dir = model_cache_dir()?;
    let path = dir.join(name);
    if path.exists() {
        return Ok(path);
    }

    fs::create_dir_all(&dir).map_err(|e| ModelResolveError::CacheDir {
        path: dir.clone(),
        source: e,
    })?;
    log::info!("downloading detection model {name}");
    download(url, &path)?;
    Ok(path)
}

/// Platform cache location for downloaded models, e.g.
/// `~/.cache/facetrack/models/` on Linux.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("facetrack").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let map_download = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(map_download)?;

    // Write to a temp file and rename, so an interrupted download never
    // looks like a cached model.
    let temp = dest.with_extension("part");
    let mut file = fs::File::create(&temp).map_err(|e| ModelResolveError::Write {
        path: temp.clone(),
        source: e,
    })?;
    response.copy_to(&mut file).map_err(map_download)?;
    drop(file);

    fs::rename(&temp, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_cache_dir_under_facetrack() {
        let dir = model_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("facetrack"));
        assert!(dir.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
    }

    #[test]
    fn test_failed_download_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
