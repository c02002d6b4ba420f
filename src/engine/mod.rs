//! Boundary to the remote processing engine.
//!
//! The engine is stateless per call: every execute request carries the full
//! prefix and the engine replays it from the supplied data handle.
#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use http::HttpEngine;

use crate::catalog::Step;
use crate::error::SequencerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Opaque reference to dataset state held by the engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct DataHandle(String);

impl DataHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        DataHandle(raw.into())
    }
}

impl fmt::Display for DataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-step outcome shown to the user.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub step: Step,
    /// Presentational HTML; empty when the engine produced nothing for the step.
    pub fragment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn fragment(step: Step, fragment: impl Into<String>) -> Self {
        Self {
            step,
            fragment: fragment.into(),
            error: None,
        }
    }

    /// The engine returned no entry for the step. Not an error.
    pub fn empty(step: Step) -> Self {
        Self::fragment(step, String::new())
    }

    pub fn failure(step: Step, message: impl Into<String>) -> Self {
        Self {
            step,
            fragment: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.fragment.is_empty()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    #[serde(rename = "csv_path")]
    pub data_handle: DataHandle,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub results: BTreeMap<Step, ExecutionResult>,
    pub data_handle: Option<DataHandle>,
}

/// Handle plus the summary fragment the engine renders for a fresh upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub data_handle: DataHandle,
    pub summary_html: String,
}

pub trait Engine: Send + Sync {
    fn upload(&self, dataset: &Path) -> Result<UploadReceipt, SequencerError>;

    fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, SequencerError>;
}

/// Only `.csv` files are accepted for upload.
pub fn check_dataset_path(dataset: &Path) -> Result<(), SequencerError> {
    let is_csv = dataset
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(SequencerError::UnsupportedDataset {
            path: dataset.to_path_buf(),
        })
    }
}
