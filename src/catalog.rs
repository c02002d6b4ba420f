//! Canonical pipeline stages and their fixed order.
//!
//! Ranks are the position in `ALL_STEPS` and never change at runtime.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One normalization stage.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    #[serde(rename = "clean")]
    Clean,
    #[serde(rename = "fd")]
    Fd,
    #[serde(rename = "1nf")]
    FirstNf,
    #[serde(rename = "2nf")]
    SecondNf,
    #[serde(rename = "3nf")]
    ThirdNf,
    #[serde(rename = "er")]
    Er,
}

/// Every step in canonical order.
pub const ALL_STEPS: [Step; 6] = [
    Step::Clean,
    Step::Fd,
    Step::FirstNf,
    Step::SecondNf,
    Step::ThirdNf,
    Step::Er,
];

impl Step {
    /// Position of the step in the canonical order (0..=5).
    pub fn rank(self) -> i32 {
        match self {
            Step::Clean => 0,
            Step::Fd => 1,
            Step::FirstNf => 2,
            Step::SecondNf => 3,
            Step::ThirdNf => 4,
            Step::Er => 5,
        }
    }

    /// Return the stable identifier used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Clean => "clean",
            Step::Fd => "fd",
            Step::FirstNf => "1nf",
            Step::SecondNf => "2nf",
            Step::ThirdNf => "3nf",
            Step::Er => "er",
        }
    }

    /// Label shown on pipeline nodes.
    pub fn display_name(self) -> &'static str {
        match self {
            Step::Clean => "Clean",
            Step::Fd => "FD",
            Step::FirstNf => "1NF",
            Step::SecondNf => "2NF",
            Step::ThirdNf => "3NF",
            Step::Er => "ER",
        }
    }
}

/// Rank lookup kept as a free function for call sites that read better that way.
pub fn rank_of(step: Step) -> i32 {
    step.rank()
}

/// All steps in canonical order.
pub fn all_steps() -> &'static [Step] {
    &ALL_STEPS
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        all_steps()
            .iter()
            .copied()
            .find(|step| step.as_str() == wanted)
            .ok_or_else(|| {
                let known = all_steps()
                    .iter()
                    .map(|step| step.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("unknown step {raw:?} (expected one of: {known})")
            })
    }
}

/// Parse a comma separated step list such as `clean,fd,1nf`.
pub fn parse_step_list(raw: &str) -> Result<Vec<Step>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Step::from_str)
        .collect()
}
