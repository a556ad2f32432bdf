use crate::model::ValidatedFiles;
use std::path::Path;

pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] =
    &["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"];

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_VIDEO_EXTENSIONS.iter().any(|item| *item == ext)
        })
        .unwrap_or(false)
}

/// Split candidate paths into supported video files and everything else.
/// Order within each list follows the input order.
pub fn validate_video_files(paths: &[String]) -> ValidatedFiles {
    let mut valid_files = Vec::new();
    let mut invalid_files = Vec::new();
    for raw in paths {
        if has_supported_extension(Path::new(raw)) {
            valid_files.push(raw.clone());
        } else {
            invalid_files.push(raw.clone());
        }
    }
    ValidatedFiles {
        valid_files,
        invalid_files,
    }
}
