//! Deterministic in-memory engine for tests.
use super::{
    check_dataset_path, DataHandle, Engine, ExecuteRequest, ExecuteResponse, ExecutionResult,
    UploadReceipt,
};
use crate::error::SequencerError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeEngine {
    calls: Mutex<Vec<ExecuteRequest>>,
    failure: Mutex<Option<SequencerError>>,
    omit_final: bool,
    /// Requests with this prefix length wait for a release signal before answering.
    gates: Mutex<HashMap<usize, Receiver<()>>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer without an entry for the prefix's final step.
    pub(crate) fn omitting_final_step() -> Self {
        Self {
            omit_final: true,
            ..Self::default()
        }
    }

    pub(crate) fn fail_next(&self, err: SequencerError) {
        *self.failure.lock().expect("failure lock") = Some(err);
    }

    pub(crate) fn gate(&self, prefix_len: usize, release: Receiver<()>) {
        self.gates
            .lock()
            .expect("gates lock")
            .insert(prefix_len, release);
    }

    pub(crate) fn calls(&self) -> Vec<ExecuteRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn fragment_for(request: &ExecuteRequest, upto: usize) -> String {
        let step = request.steps[upto];
        format!("<p>{step} after {} step(s)</p>", upto + 1)
    }
}

impl Engine for FakeEngine {
    fn upload(&self, dataset: &Path) -> Result<UploadReceipt, SequencerError> {
        check_dataset_path(dataset)?;
        Ok(UploadReceipt {
            data_handle: DataHandle::new(dataset.display().to_string()),
            summary_html: format!("<h4>Uploaded: {}</h4>", dataset.display()),
        })
    }

    fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, SequencerError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        let gate = self
            .gates
            .lock()
            .expect("gates lock")
            .remove(&request.steps.len());
        if let Some(release) = gate {
            let _ = release.recv();
        }
        if let Some(err) = self.failure.lock().expect("failure lock").take() {
            return Err(err);
        }

        let mut results = BTreeMap::new();
        let answered = if self.omit_final {
            request.steps.len().saturating_sub(1)
        } else {
            request.steps.len()
        };
        for (upto, step) in request.steps.iter().copied().enumerate().take(answered) {
            results.insert(
                step,
                ExecutionResult::fragment(step, Self::fragment_for(request, upto)),
            );
        }
        let suffix = request
            .steps
            .iter()
            .map(|step| step.as_str())
            .collect::<Vec<_>>()
            .join("_");
        Ok(ExecuteResponse {
            results,
            data_handle: Some(DataHandle::new(format!("{}#{suffix}", request.data_handle))),
        })
    }
}
