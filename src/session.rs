//! Session state owned by a single controller.
//!
//! All mutations go through the methods here; derived transitions, block
//! state and advisories are recomputed from scratch after every change to the
//! sequence. Requests are tracked with tickets so late responses can be
//! recognized and dropped.
use crate::advisory::{advisories, Advisory};
use crate::blocking::{self, BlockState};
use crate::catalog::Step;
use crate::engine::{DataHandle, ExecuteRequest, ExecuteResponse, ExecutionResult, UploadReceipt};
use crate::error::SequencerError;
use crate::sequence::SequenceStore;
use crate::transitions::{self, Transition};

/// What the display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveResult {
    #[default]
    Empty,
    Upload { html: String },
    Step(ExecutionResult),
}

/// Outcome of selecting a step from the step palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Controls are disabled (no dataset); nothing changed.
    Inert,
    /// The step was appended at `index`.
    Appended { index: usize },
    /// The step was already present at `index`; the sequence is unchanged.
    Existing { index: usize },
}

impl Selection {
    pub fn index(self) -> Option<usize> {
        match self {
            Selection::Inert => None,
            Selection::Appended { index } | Selection::Existing { index } => Some(index),
        }
    }
}

/// An execute request that has been issued but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub seq: u64,
    generation: u64,
    pub index: usize,
    pub request: ExecuteRequest,
}

impl PendingRequest {
    pub fn final_step(&self) -> Option<Step> {
        self.request.steps.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Shown(ExecutionResult),
    /// A newer response was already applied, or the session was reset since.
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    sequence: SequenceStore,
    transitions: Vec<Transition>,
    block: BlockState,
    data_handle: Option<DataHandle>,
    uploading: bool,
    active: ActiveResult,
    generation: u64,
    next_seq: u64,
    last_applied_seq: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        self.sequence.steps()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn block_state(&self) -> BlockState {
        self.block
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        advisories(&self.transitions, &self.block)
    }

    pub fn data_handle(&self) -> Option<&DataHandle> {
        self.data_handle.as_ref()
    }

    pub fn active_result(&self) -> &ActiveResult {
        &self.active
    }

    /// Step selection is only live once a dataset is attached and no upload is running.
    pub fn controls_enabled(&self) -> bool {
        self.data_handle.is_some() && !self.uploading
    }

    /// Append `step` to the sequence. Duplicates are ignored.
    pub fn append(&mut self, step: Step) -> bool {
        let added = self.sequence.append(step);
        if added {
            self.refresh();
            tracing::debug!(
                step = %step,
                len = self.sequence.len(),
                blocked_from = ?self.block.blocked_from_index,
                "step appended"
            );
        }
        added
    }

    /// Palette click: append when live and report which index to fetch.
    pub fn select_step(&mut self, step: Step) -> Selection {
        if !self.controls_enabled() {
            tracing::debug!(step = %step, "step selection ignored: controls disabled");
            return Selection::Inert;
        }
        if let Some(index) = self.sequence.position_of(step) {
            return Selection::Existing { index };
        }
        self.append(step);
        Selection::Appended {
            index: self.sequence.len() - 1,
        }
    }

    /// Clear the pipeline: empty sequence, no result, no advisories, no handle.
    pub fn reset(&mut self) {
        self.sequence.reset();
        self.data_handle = None;
        self.active = ActiveResult::Empty;
        self.invalidate_in_flight();
        self.refresh();
        tracing::debug!(generation = self.generation, "session reset");
    }

    pub fn begin_upload(&mut self) {
        self.uploading = true;
    }

    /// A failed upload re-enables controls only if an earlier dataset is still attached.
    pub fn upload_failed(&mut self) {
        self.uploading = false;
    }

    /// Attach a freshly uploaded dataset; the pipeline starts over.
    pub fn attach_dataset(&mut self, receipt: UploadReceipt) {
        self.uploading = false;
        self.sequence.reset();
        self.invalidate_in_flight();
        self.refresh();
        tracing::info!(handle = %receipt.data_handle, "dataset attached");
        self.data_handle = Some(receipt.data_handle);
        self.active = ActiveResult::Upload {
            html: receipt.summary_html,
        };
    }

    /// Check preconditions and issue a ticket for the prefix ending at `index`.
    ///
    /// A blocked index clears the active result, and responses to requests
    /// issued before it are discarded when they arrive.
    pub fn begin_request(&mut self, index: usize) -> Result<PendingRequest, SequencerError> {
        if let Some(blocked_from) = self.block.blocked_from_index {
            if index >= blocked_from {
                // The suppressed request still supersedes every ticket issued before it.
                let seq = self.next_seq;
                self.next_seq += 1;
                self.last_applied_seq = Some(seq);
                self.active = ActiveResult::Empty;
                tracing::debug!(
                    seq,
                    index,
                    blocked_from,
                    "result request suppressed: blocked"
                );
                return Err(SequencerError::IndexBlocked {
                    index,
                    blocked_from,
                });
            }
        }
        let data_handle = self
            .data_handle
            .clone()
            .ok_or(SequencerError::NoDatasetUploaded)?;
        if self.sequence.is_empty() {
            return Err(SequencerError::EmptySequence);
        }
        let steps = self.sequence.current_prefix(index)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::debug!(seq, index, steps = steps.len(), "result request issued");
        Ok(PendingRequest {
            seq,
            generation: self.generation,
            index,
            request: ExecuteRequest { data_handle, steps },
        })
    }

    /// Reconcile an engine outcome for `pending` into the session.
    ///
    /// Successful responses replace the data handle when one is returned and
    /// show the result for the prefix's final step (empty if the engine had
    /// none). Failures are shown but leave the handle and sequence untouched.
    pub fn apply_response(
        &mut self,
        pending: &PendingRequest,
        outcome: Result<ExecuteResponse, SequencerError>,
    ) -> Applied {
        if pending.generation != self.generation
            || self
                .last_applied_seq
                .is_some_and(|applied| pending.seq < applied)
        {
            tracing::debug!(
                seq = pending.seq,
                last_applied = ?self.last_applied_seq,
                "stale engine response discarded"
            );
            return Applied::Stale;
        }
        self.last_applied_seq = Some(pending.seq);

        let Some(step) = pending.final_step() else {
            return Applied::Stale;
        };
        let result = match outcome {
            Ok(mut response) => {
                if let Some(handle) = response.data_handle.take() {
                    self.data_handle = Some(handle);
                }
                response.results.remove(&step).unwrap_or_else(|| {
                    tracing::debug!(step = %step, "engine returned no result for step");
                    ExecutionResult::empty(step)
                })
            }
            Err(err) => {
                tracing::warn!(step = %step, error = %err, "engine execution failed");
                ExecutionResult::failure(step, err.to_string())
            }
        };
        self.active = ActiveResult::Step(result.clone());
        self.refresh();
        Applied::Shown(result)
    }

    fn invalidate_in_flight(&mut self) {
        self.generation += 1;
        self.last_applied_seq = None;
    }

    fn refresh(&mut self) {
        self.transitions = transitions::classify(self.sequence.steps());
        self.block = blocking::evaluate(&self.transitions);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
