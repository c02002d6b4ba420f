//! View model handed to the presenter and the terminal rendering of it.
//!
//! Node positions and dragging belong to whatever front end draws the canvas;
//! the frame only carries order, labels, blocked flags and connector colors.
use crate::advisory::Advisory;
use crate::catalog::Step;
use crate::engine::DataHandle;
use crate::session::{ActiveResult, Session};
use crate::transitions::TransitionKind;
use crate::util::fragment_preview;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

const NO_RESULT_TEXT: &str = "No result for this step.";
const PREVIEW_BYTES: usize = 400;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    Empty,
    Upload { html: String },
    Fragment { step: Step, html: String },
    NoResult { step: Step },
    Error { step: Step, message: String },
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub index: usize,
    pub step: Step,
    pub label: &'static str,
    pub blocked: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ConnectorView {
    pub from: usize,
    pub to: usize,
    pub kind: TransitionKind,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AdvisoryView {
    pub kind: Advisory,
    pub message: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Frame {
    pub result: ResultView,
    pub advisories: Vec<AdvisoryView>,
    pub controls_enabled: bool,
    /// Handle the next request will be sent with.
    pub data_handle: Option<DataHandle>,
    pub blocked_from_index: Option<usize>,
    pub nodes: Vec<NodeView>,
    pub connectors: Vec<ConnectorView>,
}

impl Frame {
    pub fn from_session(session: &Session) -> Self {
        let block = session.block_state();
        let result = match session.active_result() {
            ActiveResult::Empty => ResultView::Empty,
            ActiveResult::Upload { html } => ResultView::Upload { html: html.clone() },
            ActiveResult::Step(result) => match &result.error {
                Some(message) => ResultView::Error {
                    step: result.step,
                    message: message.clone(),
                },
                None if result.fragment.is_empty() => ResultView::NoResult { step: result.step },
                None => ResultView::Fragment {
                    step: result.step,
                    html: result.fragment.clone(),
                },
            },
        };
        let nodes = session
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| NodeView {
                index,
                step: *step,
                label: step.display_name(),
                blocked: block.is_blocked(index),
            })
            .collect();
        let connectors = session
            .transitions()
            .iter()
            .map(|transition| ConnectorView {
                from: transition.source_index,
                to: transition.source_index + 1,
                kind: transition.kind,
                color: transition.kind.color(),
            })
            .collect();
        let advisories = session
            .advisories()
            .into_iter()
            .map(|kind| AdvisoryView {
                kind,
                message: kind.message(),
                color: kind.color(),
            })
            .collect();
        Frame {
            result,
            advisories,
            controls_enabled: session.controls_enabled(),
            data_handle: session.data_handle().cloned(),
            blocked_from_index: block.blocked_from_index,
            nodes,
            connectors,
        }
    }
}

pub trait Presenter: Send + Sync {
    fn present(&self, frame: &Frame) -> Result<()>;

    /// Out-of-band notice, e.g. a remote rejection or an upload failure.
    fn notify(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writes frames to stdout, either as readable text or one JSON object per line.
pub struct TerminalPresenter {
    format: OutputFormat,
    out: Mutex<()>,
}

impl TerminalPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            out: Mutex::new(()),
        }
    }

    fn write(&self, text: &str) -> Result<()> {
        let _guard = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .context("write frame to stdout")?;
        stdout.flush().context("flush stdout")?;
        Ok(())
    }
}

impl Presenter for TerminalPresenter {
    fn present(&self, frame: &Frame) -> Result<()> {
        let text = match self.format {
            OutputFormat::Json => {
                let mut line = serde_json::to_string(frame).context("serialize frame")?;
                line.push('\n');
                line
            }
            OutputFormat::Text => render_text(frame),
        };
        self.write(&text)
    }

    fn notify(&self, message: &str) -> Result<()> {
        let text = match self.format {
            OutputFormat::Json => {
                let mut line = serde_json::to_string(&serde_json::json!({ "notice": message }))
                    .context("serialize notice")?;
                line.push('\n');
                line
            }
            OutputFormat::Text => format!("! {message}\n"),
        };
        self.write(&text)
    }
}

pub fn render_text(frame: &Frame) -> String {
    let mut text = String::new();
    if frame.nodes.is_empty() {
        text.push_str("pipeline: (empty)\n");
    } else {
        let labels = frame
            .nodes
            .iter()
            .map(|node| {
                if node.blocked {
                    format!("[{}]x", node.label)
                } else {
                    format!("[{}]", node.label)
                }
            })
            .collect::<Vec<_>>();
        let mut line = labels[0].clone();
        for (connector, label) in frame.connectors.iter().zip(labels.iter().skip(1)) {
            let arrow = match connector.kind {
                TransitionKind::AdjacentForward => " --> ",
                TransitionKind::SkipForward => " ==> ",
                TransitionKind::Reverse => " <-x ",
            };
            line.push_str(arrow);
            line.push_str(label);
        }
        text.push_str(&format!("pipeline: {line}\n"));
        for connector in &frame.connectors {
            text.push_str(&format!(
                "  {} -> {}: {} ({})\n",
                connector.from, connector.to, connector.kind, connector.color
            ));
        }
    }
    if let Some(blocked_from) = frame.blocked_from_index {
        text.push_str(&format!("blocked from index {blocked_from}\n"));
    }
    for advisory in &frame.advisories {
        text.push_str(&format!("note: {}\n", advisory.message));
    }
    match &frame.result {
        ResultView::Empty => {}
        ResultView::Upload { html } => {
            text.push_str(&format!(
                "dataset: {}\n",
                fragment_preview(html, PREVIEW_BYTES)
            ));
        }
        ResultView::Fragment { step, html } => {
            text.push_str(&format!(
                "result [{}]: {}\n",
                step.display_name(),
                fragment_preview(html, PREVIEW_BYTES)
            ));
        }
        ResultView::NoResult { step } => {
            text.push_str(&format!(
                "result [{}]: {NO_RESULT_TEXT}\n",
                step.display_name()
            ));
        }
        ResultView::Error { step, message } => {
            text.push_str(&format!("error [{}]: {message}\n", step.display_name()));
        }
    }
    if !frame.controls_enabled {
        text.push_str("controls: disabled (upload a dataset first)\n");
    }
    text
}
