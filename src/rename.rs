use crate::error::EngineError;
use crate::grouping::{assign_group_indices, find_available_name};
use std::collections::HashSet;
use crate::lang::resolve_language;
use crate::metadata_cache::MetadataCache;
use crate::model::{
    BatchItem, BatchResponse, FieldSet, PreviewItem, PreviewRequest, PreviewResponse,
    RenameBatchRequest, RenameOperation, VideoMetadata,
};
use crate::name_builder::{build_file_name, resolve_video_name};
use crate::probe::MetadataProbe;
use crate::ratio::classify_ratio;
use crate::undo::UndoLedger;
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct ResolvedFile {
    path: PathBuf,
    file_name: String,
    ext: String,
    metadata: VideoMetadata,
    ratio: String,
    language: String,
    group_index: usize,
}

fn split_name(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (file_name, ext)
}

/// Probe every file and derive its ratio, language and group index. Files
/// are processed strictly in input order; group indices reflect encounter
/// order within each (ratio, videoName) group.
fn resolve_batch(
    probe: &dyn MetadataProbe,
    cache: &mut MetadataCache,
    file_paths: &[String],
    fields: &FieldSet,
    use_number_suffix: bool,
) -> Result<(Vec<ResolvedFile>, String), EngineError> {
    if file_paths.is_empty() {
        return Err(EngineError::InvalidRequest(
            "no files supplied".to_string(),
        ));
    }

    let first_name = Path::new(&file_paths[0])
        .file_name()
        .map(|name| name.to_string_lossy().to_string());
    let video_name = resolve_video_name(&fields.video, first_name.as_deref());

    let mut resolved = Vec::with_capacity(file_paths.len());
    for raw in file_paths {
        let path = PathBuf::from(raw);
        let (file_name, ext) = split_name(&path);
        let metadata = cache.get_metadata(probe, &path);
        let ratio = classify_ratio(metadata.width, metadata.height).to_string();
        let language = resolve_language(&fields.language, &file_name);
        resolved.push(ResolvedFile {
            path,
            file_name,
            ext,
            metadata,
            ratio,
            language,
            group_index: 0,
        });
    }

    if use_number_suffix {
        let keys: Vec<(String, String)> = resolved
            .iter()
            .map(|file| (file.ratio.clone(), video_name.clone()))
            .collect();
        let indices = assign_group_indices(&keys);
        for (file, index) in resolved.iter_mut().zip(indices) {
            file.group_index = index;
        }
    }

    Ok((resolved, video_name))
}

fn target_name(
    file: &ResolvedFile,
    fields: &FieldSet,
    video_name: &str,
    timestamp: &DateTime<Local>,
    used_keys: &mut HashSet<String>,
) -> (String, String) {
    let dir = file.path.parent().unwrap_or_else(|| Path::new(""));
    find_available_name(file.group_index, &file.path, dir, used_keys, |suffix| {
        build_file_name(
            timestamp,
            fields,
            video_name,
            suffix,
            &file.ratio,
            &file.language,
            file.metadata.duration_seconds,
            &file.ext,
        )
    })
}

/// Pure naming pass: renders the names a batch would produce without
/// touching any file. Reads the filesystem only for metadata and collision
/// checks.
pub fn preview(
    probe: &dyn MetadataProbe,
    cache: &mut MetadataCache,
    request: &PreviewRequest,
) -> Result<PreviewResponse, EngineError> {
    let timestamp = Local::now();
    let (resolved, video_name) = resolve_batch(
        probe,
        cache,
        &request.file_paths,
        &request.fields,
        true,
    )?;

    // Names chosen for earlier files of this batch count as occupied, so a
    // preview reports the same distinct set of names execute would produce.
    let mut used_keys = HashSet::new();
    let mut items = Vec::with_capacity(resolved.len());
    for file in &resolved {
        let (preview_name, _suffix) =
            target_name(file, &request.fields, &video_name, &timestamp, &mut used_keys);
        let missing = !file.path.exists();
        items.push(PreviewItem {
            original_path: file.path.to_string_lossy().to_string(),
            original_name: file.file_name.clone(),
            preview_name,
            width: file.metadata.width,
            height: file.metadata.height,
            ratio: file.ratio.clone(),
            duration_seconds: file.metadata.duration_seconds,
            language_code: file.language.clone(),
            group_index: file.group_index,
            success: !missing,
            error: missing.then(|| "file not found".to_string()),
        });
    }

    Ok(PreviewResponse {
        total: items.len(),
        items,
    })
}

/// Rename the whole batch, strictly in input order. Each file is attempted
/// independently; failures are recorded and the batch continues. On
/// completion the undo ledger is overwritten with the successful
/// operations, or cleared when there were none.
pub fn execute(
    probe: &dyn MetadataProbe,
    cache: &mut MetadataCache,
    ledger: &mut UndoLedger,
    request: &RenameBatchRequest,
) -> Result<BatchResponse, EngineError> {
    let timestamp = Local::now();
    let (resolved, video_name) = resolve_batch(
        probe,
        cache,
        &request.file_paths,
        &request.fields,
        request.options.use_number_suffix,
    )?;

    let mut items = Vec::with_capacity(resolved.len());
    let mut operations = Vec::new();
    let mut used_keys = HashSet::new();
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for file in &resolved {
        // The collision check runs against the live directory and against
        // names already claimed earlier in this loop, keeping execute in
        // lockstep with what preview reported.
        let (new_name, suffix) =
            target_name(file, &request.fields, &video_name, &timestamp, &mut used_keys);
        let dir = file.path.parent().unwrap_or_else(|| Path::new(""));
        let new_path = dir.join(&new_name);

        let old_path = file.path.to_string_lossy().to_string();
        let new_path_string = new_path.to_string_lossy().to_string();

        if new_path == file.path {
            debug!("{old_path}: already named correctly");
            succeeded += 1;
            items.push(BatchItem {
                old_path,
                new_path: new_path_string,
                success: true,
                error: None,
                ratio: file.ratio.clone(),
                group_index: file.group_index,
                suffix,
            });
            continue;
        }

        match fs::rename(&file.path, &new_path) {
            Ok(()) => {
                succeeded += 1;
                operations.push(RenameOperation {
                    old_path: old_path.clone(),
                    new_path: new_path_string.clone(),
                });
                items.push(BatchItem {
                    old_path,
                    new_path: new_path_string,
                    success: true,
                    error: None,
                    ratio: file.ratio.clone(),
                    group_index: file.group_index,
                    suffix,
                });
            }
            Err(error) => {
                failed += 1;
                items.push(BatchItem {
                    old_path,
                    new_path: new_path_string,
                    success: false,
                    error: Some(error.to_string()),
                    ratio: file.ratio.clone(),
                    group_index: file.group_index,
                    suffix,
                });
            }
        }
    }

    info!("batch done: {succeeded} renamed, {failed} failed");
    ledger.record_batch(operations);

    Ok(BatchResponse {
        total: items.len(),
        succeeded,
        failed,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RenameOptions;
    use std::collections::HashMap;

    struct FakeProbe {
        by_name: HashMap<String, ((u32, u32), u64)>,
    }

    impl FakeProbe {
        fn new(entries: &[(&str, (u32, u32), u64)]) -> Self {
            Self {
                by_name: entries
                    .iter()
                    .map(|(name, dims, duration)| (name.to_string(), (*dims, *duration)))
                    .collect(),
            }
        }

        fn lookup(&self, path: &Path) -> Option<&((u32, u32), u64)> {
            let name = path.file_name()?.to_string_lossy().to_string();
            self.by_name.get(&name)
        }
    }

    impl MetadataProbe for FakeProbe {
        fn probe_dimensions(&self, path: &Path) -> Option<(u32, u32)> {
            self.lookup(path).map(|entry| entry.0)
        }

        fn probe_duration(&self, path: &Path) -> Option<u64> {
            self.lookup(path).map(|entry| entry.1)
        }
    }

    fn fields(video: &str, language: &str) -> FieldSet {
        FieldSet {
            product: "Launch".to_string(),
            template: "TplA".to_string(),
            video: video.to_string(),
            author: "Jane".to_string(),
            duration: "2".to_string(),
            language: language.to_string(),
        }
    }

    fn write_files(dir: &Path, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, b"v").unwrap();
                path.to_string_lossy().to_string()
            })
            .collect()
    }

    fn today() -> String {
        Local::now().format("%y%m%d").to_string()
    }

    #[test]
    fn test_preview_concrete_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["clip[en].mp4", "clip2[en].mp4"]);
        let probe = FakeProbe::new(&[
            ("clip[en].mp4", (1920, 1080), 30),
            ("clip2[en].mp4", (1920, 1080), 45),
        ]);
        let mut cache = MetadataCache::new();

        let request = PreviewRequest {
            file_paths: paths,
            fields: fields("", ""),
        };
        let response = preview(&probe, &mut cache, &request).unwrap();
        let date = today();

        assert_eq!(response.total, 2);
        assert_eq!(
            response.items[0].preview_name,
            format!("{date}_P-Launch_T-TplA_C-clip_S-169_L-en_VL-L-30_D-Jane_M-2.mp4")
        );
        assert_eq!(
            response.items[1].preview_name,
            format!("{date}_P-Launch_T-TplA_C-clip2_S-169_L-en_VL-L-45_D-Jane_M-2.mp4")
        );
        assert_eq!(response.items[0].group_index, 0);
        assert_eq!(response.items[1].group_index, 1);
        assert_eq!(response.items[0].language_code, "en");
    }

    #[test]
    fn test_preview_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["a[en].mp4", "b[en].mp4"]);
        let probe = FakeProbe::new(&[
            ("a[en].mp4", (1080, 1920), 12),
            ("b[en].mp4", (1080, 1920), 13),
        ]);
        let mut cache = MetadataCache::new();
        let request = PreviewRequest {
            file_paths: paths,
            fields: fields("demo", "fr"),
        };

        let first = preview(&probe, &mut cache, &request).unwrap();
        let second = preview(&probe, &mut cache, &request).unwrap();
        let names =
            |response: &PreviewResponse| -> Vec<String> {
                response
                    .items
                    .iter()
                    .map(|item| item.preview_name.clone())
                    .collect()
            };
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_execute_then_undo_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["one[en].mp4", "two[en].mp4"]);
        let probe = FakeProbe::new(&[
            ("one[en].mp4", (1920, 1080), 10),
            ("two[en].mp4", (1920, 1080), 20),
        ]);
        let mut cache = MetadataCache::new();
        let mut ledger = UndoLedger::new();

        let request = RenameBatchRequest {
            file_paths: paths.clone(),
            fields: fields("demo", ""),
            options: RenameOptions::default(),
        };
        let response = execute(&probe, &mut cache, &mut ledger, &request).unwrap();
        assert_eq!(response.succeeded, 2);
        assert!(!dir.path().join("one[en].mp4").exists());
        assert!(ledger.status().can_undo);

        let undo = ledger.undo_last().unwrap();
        assert!(undo.success);
        assert!(dir.path().join("one[en].mp4").exists());
        assert!(dir.path().join("two[en].mp4").exists());
        assert!(!ledger.status().can_undo);
    }

    #[test]
    fn test_group_suffixes_in_executed_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["a.mp4", "b.mp4", "c.mp4"]);
        let probe = FakeProbe::new(&[
            ("a.mp4", (1920, 1080), 1),
            ("b.mp4", (1920, 1080), 2),
            ("c.mp4", (1920, 1080), 3),
        ]);
        let mut cache = MetadataCache::new();
        let mut ledger = UndoLedger::new();

        let request = RenameBatchRequest {
            file_paths: paths,
            fields: fields("demo", "en"),
            options: RenameOptions::default(),
        };
        let response = execute(&probe, &mut cache, &mut ledger, &request).unwrap();
        let suffixes: Vec<&str> = response
            .items
            .iter()
            .map(|item| item.suffix.as_str())
            .collect();
        assert_eq!(suffixes, vec!["", "2", "3"]);
        let date = today();
        assert!(dir
            .path()
            .join(format!(
                "{date}_P-Launch_T-TplA_C-demo3_S-169_L-en_VL-L-3_D-Jane_M-2.mp4"
            ))
            .exists());
    }

    #[test]
    fn test_partial_failure_keeps_batch_going() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_files(dir.path(), &["a.mp4", "c.mp4"]);
        let missing = dir.path().join("b.mp4").to_string_lossy().to_string();
        let probe = FakeProbe::new(&[
            ("a.mp4", (1920, 1080), 1),
            ("b.mp4", (1920, 1080), 2),
            ("c.mp4", (1920, 1080), 3),
        ]);
        let mut cache = MetadataCache::new();
        let mut ledger = UndoLedger::new();

        let request = RenameBatchRequest {
            file_paths: vec![good[0].clone(), missing, good[1].clone()],
            fields: fields("demo", "en"),
            options: RenameOptions::default(),
        };
        let response = execute(&probe, &mut cache, &mut ledger, &request).unwrap();
        assert_eq!(response.succeeded, 2);
        assert_eq!(response.failed, 1);
        assert!(response.items[0].success);
        assert!(!response.items[1].success);
        assert!(response.items[1].error.is_some());
        assert!(response.items[2].success);
        // Only the two successful renames are recoverable.
        assert_eq!(ledger.status().operation_count, Some(2));
    }

    #[test]
    fn test_external_collision_advances_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["a.mp4"]);
        let probe = FakeProbe::new(&[("a.mp4", (1920, 1080), 5)]);
        let date = today();
        // An outside file already owns the clean name.
        fs::write(
            dir.path()
                .join(format!("{date}_P-Launch_T-TplA_C-demo_S-169_L-en_VL-L-5_D-Jane_M-2.mp4")),
            b"x",
        )
        .unwrap();

        let mut cache = MetadataCache::new();
        let mut ledger = UndoLedger::new();
        let request = RenameBatchRequest {
            file_paths: paths,
            fields: fields("demo", "en"),
            options: RenameOptions::default(),
        };
        let response = execute(&probe, &mut cache, &mut ledger, &request).unwrap();
        assert!(response.items[0].success);
        assert_eq!(response.items[0].suffix, "2");
        assert!(dir
            .path()
            .join(format!(
                "{date}_P-Launch_T-TplA_C-demo2_S-169_L-en_VL-L-5_D-Jane_M-2.mp4"
            ))
            .exists());
    }

    #[test]
    fn test_preview_matches_execute_when_clean_name_occupied() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["a.mp4", "b.mp4"]);
        // Identical metadata puts both files in one group with identical
        // rendered names apart from the suffix.
        let probe = FakeProbe::new(&[
            ("a.mp4", (1920, 1080), 5),
            ("b.mp4", (1920, 1080), 5),
        ]);
        let date = today();
        // An outside file already owns the group's clean name.
        fs::write(
            dir.path()
                .join(format!("{date}_P-Launch_T-TplA_C-demo_S-169_L-en_VL-L-5_D-Jane_M-2.mp4")),
            b"x",
        )
        .unwrap();

        let mut cache = MetadataCache::new();
        let preview_response = preview(
            &probe,
            &mut cache,
            &PreviewRequest {
                file_paths: paths.clone(),
                fields: fields("demo", "en"),
            },
        )
        .unwrap();
        let previewed: Vec<String> = preview_response
            .items
            .iter()
            .map(|item| item.preview_name.clone())
            .collect();
        assert_ne!(previewed[0], previewed[1]);

        let mut ledger = UndoLedger::new();
        let response = execute(
            &probe,
            &mut cache,
            &mut ledger,
            &RenameBatchRequest {
                file_paths: paths,
                fields: fields("demo", "en"),
                options: RenameOptions::default(),
            },
        )
        .unwrap();
        let executed: Vec<String> = response
            .items
            .iter()
            .map(|item| {
                Path::new(&item.new_path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect();
        assert_eq!(previewed, executed);
        assert_eq!(
            executed,
            vec![
                format!("{date}_P-Launch_T-TplA_C-demo2_S-169_L-en_VL-L-5_D-Jane_M-2.mp4"),
                format!("{date}_P-Launch_T-TplA_C-demo3_S-169_L-en_VL-L-5_D-Jane_M-2.mp4"),
            ]
        );
    }

    #[test]
    fn test_disabled_number_suffix_leaves_retry_as_only_net() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["a.mp4", "b.mp4"]);
        let probe = FakeProbe::new(&[
            ("a.mp4", (1920, 1080), 5),
            ("b.mp4", (1920, 1080), 5),
        ]);
        let mut cache = MetadataCache::new();
        let mut ledger = UndoLedger::new();

        let response = execute(
            &probe,
            &mut cache,
            &mut ledger,
            &RenameBatchRequest {
                file_paths: paths,
                fields: fields("demo", "en"),
                options: RenameOptions {
                    use_number_suffix: false,
                },
            },
        )
        .unwrap();

        // Both files carry group index 0; only the collision retry keeps
        // the second name distinct.
        assert_eq!(response.items[0].group_index, 0);
        assert_eq!(response.items[1].group_index, 0);
        assert_eq!(response.items[0].suffix, "");
        assert_eq!(response.items[1].suffix, "2");
        let date = today();
        assert!(dir
            .path()
            .join(format!(
                "{date}_P-Launch_T-TplA_C-demo_S-169_L-en_VL-L-5_D-Jane_M-2.mp4"
            ))
            .exists());
        assert!(dir
            .path()
            .join(format!(
                "{date}_P-Launch_T-TplA_C-demo2_S-169_L-en_VL-L-5_D-Jane_M-2.mp4"
            ))
            .exists());
    }

    #[test]
    fn test_probe_failure_renders_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_files(dir.path(), &["broken.mp4"]);
        let probe = FakeProbe::new(&[]);
        let mut cache = MetadataCache::new();

        let request = PreviewRequest {
            file_paths: paths,
            fields: fields("demo", "en"),
        };
        let response = preview(&probe, &mut cache, &request).unwrap();
        let item = &response.items[0];
        assert_eq!(item.ratio, "unknown");
        assert!(item.preview_name.contains("_S-unknown_"));
        assert!(item.preview_name.contains("_VL-L-unknown_"));
        assert!(item.success);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let probe = FakeProbe::new(&[]);
        let mut cache = MetadataCache::new();
        let request = PreviewRequest {
            file_paths: Vec::new(),
            fields: fields("demo", "en"),
        };
        assert!(matches!(
            preview(&probe, &mut cache, &request),
            Err(EngineError::InvalidRequest(_))
        ));
    }
}
