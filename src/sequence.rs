//! Ordered, duplicate-free collection of user-selected steps.
use crate::catalog::Step;
use crate::error::SequencerError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceStore {
    steps: Vec<Step>,
}

impl SequenceStore {
    /// Append `step` to the end. Returns `false` (and leaves the store
    /// untouched) when the step is already present.
    pub fn append(&mut self, step: Step) -> bool {
        if self.steps.contains(&step) {
            return false;
        }
        self.steps.push(step);
        true
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// Steps `0..=index`, in order.
    pub fn current_prefix(&self, index: usize) -> Result<Vec<Step>, SequencerError> {
        if index >= self.steps.len() {
            return Err(SequencerError::IndexOutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        Ok(self.steps[..=index].to_vec())
    }

    pub fn position_of(&self, step: Step) -> Option<usize> {
        self.steps.iter().position(|candidate| *candidate == step)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
