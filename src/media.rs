//! Where recordings referenced by persons live.
//!
//! Persons carry either a full URL or a site path such as `/audio/doaa.mp3`.
//! Site paths are looked up under the local media directory, or joined onto
//! `media_base_url` when one is configured.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("no recording is set")]
    Empty,
    #[error("recording is not installed at {}", .0.display())]
    Missing(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRoot {
    dir: PathBuf,
    base_url: Option<String>,
}

impl MediaRoot {
    pub fn new(dir: PathBuf, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Self { dir, base_url }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Turn a stored recording reference into something the audio sink can
    /// open: a URL, or an absolute path to an existing file.
    pub fn resolve(&self, source: &str) -> Result<String, MediaError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(MediaError::Empty);
        }
        if is_remote(source) {
            return Ok(source.to_string());
        }
        let path = Path::new(source);
        if path.is_absolute() && path.is_file() {
            return Ok(source.to_string());
        }

        let relative = source.trim_start_matches('/');
        if let Some(base) = &self.base_url {
            return Ok(format!("{base}/{relative}"));
        }
        let local = self.dir.join(relative);
        debug!(source, path = %local.display(), "resolving recording locally");
        if local.is_file() {
            Ok(local.display().to_string())
        } else {
            Err(MediaError::Missing(local))
        }
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn urls_pass_through() {
        let root = MediaRoot::new(PathBuf::from("/unused"), None);
        assert_eq!(
            root.resolve(" https://example.org/doaa.mp3 ").unwrap(),
            "https://example.org/doaa.mp3"
        );
        assert_eq!(root.resolve("  "), Err(MediaError::Empty));
    }

    #[test]
    fn site_paths_resolve_under_the_media_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("audio/doaa.mp3"), b"ID3").unwrap();
        let root = MediaRoot::new(dir.path().to_path_buf(), None);

        let resolved = root.resolve("/audio/doaa.mp3").unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(Path::new(&resolved).is_file());

        assert_eq!(
            root.resolve("/audio/other.mp3"),
            Err(MediaError::Missing(dir.path().join("audio/other.mp3")))
        );
    }

    #[test]
    fn base_url_takes_over_site_paths() {
        let root = MediaRoot::new(
            PathBuf::from("/unused"),
            Some("https://memorial.example.org/".into()),
        );
        assert_eq!(
            root.resolve("/audio/doaa.mp3").unwrap(),
            "https://memorial.example.org/audio/doaa.mp3"
        );
    }
}
