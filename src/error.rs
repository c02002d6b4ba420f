//! Error kinds surfaced by the sequencer and its engine boundary.
use crate::catalog::Step;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error("no dataset uploaded")]
    NoDatasetUploaded,
    #[error("pipeline sequence is empty")]
    EmptySequence,
    #[error("step index {index} is blocked (blocked from index {blocked_from})")]
    IndexBlocked { index: usize, blocked_from: usize },
    #[error("step index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("{message}")]
    RemoteExecutionFailure {
        message: String,
        blocked_step: Option<Step>,
    },
    #[error("unsupported dataset {}: please upload a valid CSV file", path.display())]
    UnsupportedDataset { path: PathBuf },
    #[error("dataset upload failed: {message}")]
    UploadFailed { message: String },
}

impl SequencerError {
    pub fn remote(message: impl Into<String>) -> Self {
        SequencerError::RemoteExecutionFailure {
            message: message.into(),
            blocked_step: None,
        }
    }

    /// Precondition failures are handled locally and never shown as errors.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SequencerError::NoDatasetUploaded
                | SequencerError::EmptySequence
                | SequencerError::IndexBlocked { .. }
        )
    }
}
