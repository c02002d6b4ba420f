//! Classification of adjacent step pairs against the canonical order.
//!
//! Classifications are always recomputed over the whole sequence; nothing is
//! updated incrementally.
use crate::catalog::{rank_of, Step};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    AdjacentForward,
    SkipForward,
    Reverse,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::AdjacentForward => "adjacent_forward",
            TransitionKind::SkipForward => "skip_forward",
            TransitionKind::Reverse => "reverse",
        }
    }

    /// Connector color used by the presenter.
    pub fn color(self) -> &'static str {
        match self {
            TransitionKind::AdjacentForward => "#228B22",
            TransitionKind::SkipForward => "#0070ad",
            TransitionKind::Reverse => "red",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived value for the pair at positions `source_index` and `source_index + 1`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub source_index: usize,
    pub from: Step,
    pub to: Step,
    pub kind: TransitionKind,
    pub rank_delta: i32,
}

pub fn classify_pair(from: Step, to: Step) -> (TransitionKind, i32) {
    let delta = rank_of(to) - rank_of(from);
    let kind = if delta < 0 {
        TransitionKind::Reverse
    } else if delta > 1 {
        TransitionKind::SkipForward
    } else {
        // delta 0 cannot happen without duplicates; treated as adjacent.
        TransitionKind::AdjacentForward
    };
    (kind, delta)
}

/// Produce `n - 1` transitions for a sequence of length `n`.
pub fn classify(steps: &[Step]) -> Vec<Transition> {
    steps
        .windows(2)
        .enumerate()
        .map(|(source_index, pair)| {
            let (kind, rank_delta) = classify_pair(pair[0], pair[1]);
            Transition {
                source_index,
                from: pair[0],
                to: pair[1],
                kind,
                rank_delta,
            }
        })
        .collect()
}
