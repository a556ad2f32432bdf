use crate::error::EngineError;
use crate::model::{RenameOperation, UndoItemResult, UndoResponse, UndoStatus};
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct HeldBatch {
    timestamp: DateTime<Local>,
    operations: Vec<RenameOperation>,
}

/// Single-slot ledger for the most recently completed batch. Two states:
/// empty, or holding exactly one batch's operations. A new successful batch
/// overwrites the slot; a batch with zero successes clears it.
#[derive(Debug, Default)]
pub struct UndoLedger {
    slot: Option<HeldBatch>,
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a completed batch. `operations` holds only the
    /// renames that actually succeeded, in execution order.
    pub fn record_batch(&mut self, operations: Vec<RenameOperation>) {
        if operations.is_empty() {
            // A batch with no successes must not leave an older batch
            // recoverable behind it.
            self.slot = None;
            return;
        }
        debug!("ledger now holds {} operations", operations.len());
        self.slot = Some(HeldBatch {
            timestamp: Local::now(),
            operations,
        });
    }

    pub fn status(&self) -> UndoStatus {
        match &self.slot {
            Some(batch) => UndoStatus {
                can_undo: true,
                timestamp: Some(batch.timestamp),
                operation_count: Some(batch.operations.len()),
            },
            None => UndoStatus {
                can_undo: false,
                timestamp: None,
                operation_count: None,
            },
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Reverse the held batch, item by item, in the order originally
    /// recorded. Item failures are independent; the slot is emptied only
    /// when every item reversed cleanly, so a partially failed undo can be
    /// retried (already-reversed items then fail the exists check
    /// harmlessly).
    pub fn undo_last(&mut self) -> Result<UndoResponse, EngineError> {
        let batch = self.slot.as_ref().ok_or(EngineError::NothingToUndo)?;
        if batch.operations.is_empty() {
            return Err(EngineError::CorruptLedger(
                "held batch has no operations".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(batch.operations.len());
        let mut success_count = 0usize;
        let mut error_count = 0usize;

        for operation in &batch.operations {
            let outcome = reverse_operation(operation);
            match &outcome {
                Ok(()) => success_count += 1,
                Err(reason) => {
                    warn!("undo failed for {}: {}", operation.new_path, reason);
                    error_count += 1;
                }
            }
            results.push(UndoItemResult {
                old_path: operation.old_path.clone(),
                new_path: operation.new_path.clone(),
                success: outcome.is_ok(),
                error: outcome.err(),
            });
        }

        let total_count = results.len();
        if error_count == 0 {
            self.slot = None;
        }

        Ok(UndoResponse {
            success: error_count == 0,
            total_count,
            success_count,
            error_count,
            results,
        })
    }
}

fn reverse_operation(operation: &RenameOperation) -> Result<(), String> {
    let new_path = Path::new(&operation.new_path);
    let old_path = Path::new(&operation.old_path);
    if !new_path.exists() {
        return Err("target missing, possibly moved".to_string());
    }
    if old_path.exists() {
        return Err("original name occupied, cannot restore".to_string());
    }
    fs::rename(new_path, old_path).map_err(|error| error.to_string())
}
