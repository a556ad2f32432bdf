//! Batch-rename engine for video files.
//!
//! Builds structured filenames from probed media metadata (dimensions,
//! duration), user-entered fields and a fixed template, assigns
//! collision-safe sequence suffixes per (ratio, video name) group, renames
//! strictly in input order, and keeps the most recent batch reversible
//! through a single-slot undo ledger.

mod error;
mod file_select;
mod grouping;
mod lang;
mod metadata_cache;
mod model;
mod name_builder;
mod probe;
mod ratio;
mod rename;
mod undo;

pub use error::EngineError;
pub use file_select::{validate_video_files, SUPPORTED_VIDEO_EXTENSIONS};
pub use model::{
    BatchItem, BatchResponse, FieldSet, PreviewItem, PreviewRequest, PreviewResponse,
    RenameBatchRequest, RenameOperation, RenameOptions, UndoItemResult, UndoResponse, UndoStatus,
    ValidatedFiles, VideoMetadata,
};
pub use probe::{is_ffprobe_available, FfprobeProbe, MetadataProbe};

use metadata_cache::MetadataCache;
use std::path::PathBuf;
use undo::UndoLedger;

/// One rename engine instance: owns the metadata cache and the undo ledger,
/// so independent instances never interfere. Batches run strictly
/// sequentially within an instance; the engine defines no concurrent-batch
/// semantics.
pub struct RenameEngine {
    probe: Box<dyn MetadataProbe>,
    cache: MetadataCache,
    ledger: UndoLedger,
}

impl RenameEngine {
    /// Engine backed by the external `ffprobe` binary.
    pub fn new() -> Self {
        Self::with_probe(Box::new(FfprobeProbe))
    }

    /// Engine with a caller-supplied probe, e.g. a deterministic fake.
    pub fn with_probe(probe: Box<dyn MetadataProbe>) -> Self {
        Self {
            probe,
            cache: MetadataCache::new(),
            ledger: UndoLedger::new(),
        }
    }

    /// Render the names a batch would produce without renaming anything.
    pub fn preview(&mut self, request: &PreviewRequest) -> Result<PreviewResponse, EngineError> {
        rename::preview(self.probe.as_ref(), &mut self.cache, request)
    }

    /// Rename the batch and record the successful operations in the undo
    /// ledger, replacing whatever batch it held before.
    pub fn execute(
        &mut self,
        request: &RenameBatchRequest,
    ) -> Result<BatchResponse, EngineError> {
        rename::execute(self.probe.as_ref(), &mut self.cache, &mut self.ledger, request)
    }

    pub fn undo_status(&self) -> UndoStatus {
        self.ledger.status()
    }

    /// Reverse the most recently recorded batch. Fails with
    /// [`EngineError::NothingToUndo`] when no batch is held.
    pub fn undo_last(&mut self) -> Result<UndoResponse, EngineError> {
        self.ledger.undo_last()
    }

    pub fn clear_undo_data(&mut self) {
        self.ledger.clear();
    }

    /// Drop cache entries for files outside the current batch or modified
    /// since they were probed.
    pub fn invalidate_stale_cache(&mut self, current_batch_paths: &[PathBuf]) {
        self.cache.invalidate(current_batch_paths);
    }

    pub fn clear_all_cache(&mut self) {
        self.cache.clear_all();
    }
}

impl Default for RenameEngine {
    fn default() -> Self {
        Self::new()
    }
}
