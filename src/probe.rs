use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

fn ffprobe_command() -> Command {
    let mut cmd = Command::new("ffprobe");
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

static FFPROBE_AVAILABLE: Lazy<bool> = Lazy::new(|| {
    ffprobe_command()
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
});

pub fn is_ffprobe_available() -> bool {
    *FFPROBE_AVAILABLE
}

/// Read-only media inspection. Dimensions and duration are separate calls
/// because they historically serve different callers and are cached
/// independently. Implementations must degrade to `None` instead of failing
/// on unreadable or corrupt media.
pub trait MetadataProbe {
    fn probe_dimensions(&self, path: &Path) -> Option<(u32, u32)>;
    fn probe_duration(&self, path: &Path) -> Option<u64>;
}

/// Probe backed by the external `ffprobe` binary with JSON output.
#[derive(Debug, Default)]
pub struct FfprobeProbe;

#[derive(Deserialize)]
struct StreamsDoc {
    #[serde(default)]
    streams: Vec<StreamEntry>,
}

#[derive(Deserialize)]
struct StreamEntry {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct FormatDoc {
    format: Option<FormatEntry>,
}

#[derive(Deserialize)]
struct FormatEntry {
    duration: Option<String>,
}

impl FfprobeProbe {
    fn run(&self, path: &Path, entries: &str) -> Option<Vec<u8>> {
        if !*FFPROBE_AVAILABLE {
            return None;
        }
        let output = ffprobe_command()
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg(entries)
            .arg("-of")
            .arg("json")
            .arg(path)
            .output()
            .ok()?;
        if !output.status.success() {
            warn!("ffprobe failed for {}", path.display());
            return None;
        }
        Some(output.stdout)
    }
}

impl MetadataProbe for FfprobeProbe {
    fn probe_dimensions(&self, path: &Path) -> Option<(u32, u32)> {
        let stdout = self.run(path, "stream=width,height")?;
        let doc: StreamsDoc = serde_json::from_slice(&stdout).ok()?;
        let stream = doc.streams.into_iter().next()?;
        let dims = stream.width.zip(stream.height)?;
        debug!("{}: {}x{}", path.display(), dims.0, dims.1);
        Some(dims)
    }

    fn probe_duration(&self, path: &Path) -> Option<u64> {
        let stdout = self.run(path, "format=duration")?;
        let doc: FormatDoc = serde_json::from_slice(&stdout).ok()?;
        let raw = doc.format?.duration?;
        let seconds = raw.trim().parse::<f64>().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(seconds as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_json_parsing() {
        let raw = br#"{"streams":[{"width":1920,"height":1080}]}"#;
        let doc: StreamsDoc = serde_json::from_slice(raw).unwrap();
        assert_eq!(doc.streams[0].width, Some(1920));
        assert_eq!(doc.streams[0].height, Some(1080));
    }

    #[test]
    fn test_format_duration_parsing() {
        let raw = br#"{"format":{"duration":"30.033000"}}"#;
        let doc: FormatDoc = serde_json::from_slice(raw).unwrap();
        let seconds = doc
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .map(|s| s as u64);
        assert_eq!(seconds, Some(30));
    }

    #[test]
    fn test_missing_streams_is_none() {
        let raw = br#"{"streams":[]}"#;
        let doc: StreamsDoc = serde_json::from_slice(raw).unwrap();
        assert!(doc.streams.is_empty());
    }
}
