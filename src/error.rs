use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("undo ledger is corrupt: {0}")]
    CorruptLedger(String),
}
