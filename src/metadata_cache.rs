use crate::model::VideoMetadata;
use crate::probe::MetadataProbe;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    width: Option<u32>,
    height: Option<u32>,
    duration_seconds: Option<u64>,
    /// Modification time of the file at probe time. The entry is only
    /// trusted while the file's current mtime still equals this value.
    timestamp: SystemTime,
}

impl CacheEntry {
    fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            width: self.width,
            height: self.height,
            duration_seconds: self.duration_seconds,
        }
    }

    fn is_complete(&self) -> bool {
        self.width.is_some() && self.height.is_some() && self.duration_seconds.is_some()
    }
}

/// Process-lifetime metadata cache keyed by file path. Dimensions and
/// duration are tracked per field so an entry filled by one caller is
/// merged into, never overwritten by, the other.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

fn current_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return metadata for `path`, probing only the fields that are missing
    /// or stale. A probe failure degrades to `None` fields; it is never an
    /// error. A file that cannot be stat'd is probed without caching.
    pub fn get_metadata(&mut self, probe: &dyn MetadataProbe, path: &Path) -> VideoMetadata {
        let Some(mtime) = current_mtime(path) else {
            debug!("cannot stat {}, probing uncached", path.display());
            return VideoMetadata {
                width: None,
                height: None,
                duration_seconds: probe.probe_duration(path),
            }
            .with_dimensions(probe.probe_dimensions(path));
        };

        let mut entry = match self.entries.get(path) {
            Some(cached) if cached.timestamp == mtime => *cached,
            Some(_) => {
                debug!("stale cache entry for {}", path.display());
                self.entries.remove(path);
                CacheEntry {
                    width: None,
                    height: None,
                    duration_seconds: None,
                    timestamp: mtime,
                }
            }
            None => CacheEntry {
                width: None,
                height: None,
                duration_seconds: None,
                timestamp: mtime,
            },
        };

        if entry.is_complete() {
            return entry.metadata();
        }

        if entry.width.is_none() || entry.height.is_none() {
            if let Some((width, height)) = probe.probe_dimensions(path) {
                entry.width = Some(width);
                entry.height = Some(height);
            }
        }
        if entry.duration_seconds.is_none() {
            entry.duration_seconds = probe.probe_duration(path);
        }

        // Only store what a probe actually produced; failed probes are
        // retried on the next request rather than cached as misses.
        if entry.width.is_some() || entry.height.is_some() || entry.duration_seconds.is_some() {
            entry.timestamp = mtime;
            self.entries.insert(path.to_path_buf(), entry);
        }

        entry.metadata()
    }

    /// Drop every entry whose path is not in `keep_paths` or whose file has
    /// been modified since it was cached.
    pub fn invalidate(&mut self, keep_paths: &[PathBuf]) {
        let before = self.entries.len();
        self.entries.retain(|path, entry| {
            keep_paths.iter().any(|keep| keep == path)
                && current_mtime(path) == Some(entry.timestamp)
        });
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("invalidated {dropped} cache entries");
        }
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl VideoMetadata {
    fn with_dimensions(mut self, dims: Option<(u32, u32)>) -> Self {
        if let Some((width, height)) = dims {
            self.width = Some(width);
            self.height = Some(height);
        }
        self
    }
}
