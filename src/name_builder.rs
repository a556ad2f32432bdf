use crate::model::FieldSet;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[^.]+$").expect("failed to compile extension regex"));

// Bracketed 2-3 letter tags ([en], [eng]) are treated as language markers
// and stripped when deriving a video name from a filename.
static NAME_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Za-z]{2,3}\]").expect("failed to compile name tag regex"));

/// Derive a video name from a filename: drop the extension, drop bracketed
/// language tags, trim whitespace.
pub fn extract_video_name(file_name: &str) -> String {
    let without_ext = EXTENSION_RE.replace(file_name, "");
    NAME_TAG_RE.replace_all(&without_ext, "").trim().to_string()
}

/// The video name used for the whole batch. An empty user field falls back
/// to a name derived from the first file, matching the auto-fill behavior
/// the form applies when files are dropped in.
pub fn resolve_video_name(user_video: &str, first_file_name: Option<&str>) -> String {
    let trimmed = user_video.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    first_file_name.map(extract_video_name).unwrap_or_default()
}

/// Render the full target filename. Pure: every input is passed in,
/// including the render date, so previews are deterministic.
#[allow(clippy::too_many_arguments)]
pub fn build_file_name(
    date: &DateTime<Local>,
    fields: &FieldSet,
    video_name: &str,
    suffix: &str,
    ratio: &str,
    language: &str,
    duration_seconds: Option<u64>,
    ext: &str,
) -> String {
    let video_length = duration_seconds
        .map(|seconds| seconds.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{}_P-{}_T-{}_C-{}{}_S-{}_L-{}_VL-L-{}_D-{}_M-{}{}",
        date.format("%y%m%d"),
        fields.product.trim(),
        fields.template.trim(),
        video_name,
        suffix,
        ratio,
        language,
        video_length,
        fields.author.trim(),
        fields.duration.trim(),
        ext,
    )
}
