//! Non-fatal notices derived from the current transitions.
use crate::blocking::BlockState;
use crate::transitions::{Transition, TransitionKind};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    Skip,
    Reverse,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Advisory::Skip => {
                "You skipped steps. Please follow the canonical order: Clean → FD → 1NF → 2NF → 3NF → ER."
            }
            Advisory::Reverse => {
                "You selected a lower-order ETL step after a higher one. Please proceed only upward in the ETL pipeline."
            }
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Advisory::Skip => TransitionKind::SkipForward.color(),
            Advisory::Reverse => TransitionKind::Reverse.color(),
        }
    }
}

/// Advisories currently applicable, each at most once, in display order.
pub fn advisories(transitions: &[Transition], block: &BlockState) -> Vec<Advisory> {
    let mut notices = Vec::new();
    if transitions
        .iter()
        .any(|transition| transition.kind == TransitionKind::SkipForward)
    {
        notices.push(Advisory::Skip);
    }
    let reversed = block.blocked()
        || transitions
            .iter()
            .any(|transition| transition.kind == TransitionKind::Reverse);
    if reversed {
        notices.push(Advisory::Reverse);
    }
    notices
}
