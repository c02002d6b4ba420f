//! Blocked-region evaluation.
//!
//! The first reverse transition freezes its target and everything after it.
//! Later transitions are not inspected once a cutoff exists.
use crate::transitions::{Transition, TransitionKind};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockState {
    /// Sequence index at and after which steps are inert; `None` when nothing is blocked.
    pub blocked_from_index: Option<usize>,
}

impl BlockState {
    pub fn blocked(&self) -> bool {
        self.blocked_from_index.is_some()
    }

    pub fn is_blocked(&self, index: usize) -> bool {
        self.blocked_from_index
            .is_some_and(|blocked_from| index >= blocked_from)
    }
}

pub fn evaluate(transitions: &[Transition]) -> BlockState {
    let blocked_from_index = transitions
        .iter()
        .find(|transition| transition.kind == TransitionKind::Reverse)
        .map(|transition| transition.source_index + 1);
    BlockState { blocked_from_index }
}
