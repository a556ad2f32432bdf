use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// User-entered naming fields. All values are opaque strings; `video` may be
/// empty, in which case the video name is derived from the first file of the
/// batch. `duration` is the production-duration label, not the media runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSet {
    pub product: String,
    pub template: String,
    pub video: String,
    pub author: String,
    pub duration: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOptions {
    pub use_number_suffix: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            use_number_suffix: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameBatchRequest {
    pub file_paths: Vec<String>,
    pub fields: FieldSet,
    #[serde(default)]
    pub options: RenameOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub file_paths: Vec<String>,
    pub fields: FieldSet,
}

/// Probed media properties. Any field may be missing when the probe failed
/// or the stream carried no such information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<u64>,
}

/// One per input file, in input order, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub old_path: String,
    pub new_path: String,
    pub success: bool,
    pub error: Option<String>,
    pub ratio: String,
    pub group_index: usize,
    pub suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    pub original_path: String,
    pub original_name: String,
    pub preview_name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ratio: String,
    pub duration_seconds: Option<u64>,
    pub language_code: String,
    pub group_index: usize,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub total: usize,
    pub items: Vec<PreviewItem>,
}

/// A rename that actually happened; the unit the undo ledger reverses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOperation {
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoStatus {
    pub can_undo: bool,
    pub timestamp: Option<DateTime<Local>>,
    pub operation_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoItemResult {
    pub old_path: String,
    pub new_path: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResponse {
    pub success: bool,
    pub total_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub results: Vec<UndoItemResult>,
}

/// Result of splitting a candidate path list by supported video extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedFiles {
    pub valid_files: Vec<String>,
    pub invalid_files: Vec<String>,
}
