use crate::presenter::{Frame, Presenter};
use anyhow::Result;
use std::sync::Mutex;

/// Presenter that keeps everything it is handed.
#[derive(Default)]
pub(crate) struct RecordingPresenter {
    frames: Mutex<Vec<Frame>>,
    notices: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    pub(crate) fn frames(&self) -> Vec<Frame> {
        self.frames.lock().expect("frames lock").clone()
    }

    pub(crate) fn notices(&self) -> Vec<String> {
        self.notices.lock().expect("notices lock").clone()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, frame: &Frame) -> Result<()> {
        self.frames.lock().expect("frames lock").push(frame.clone());
        Ok(())
    }

    fn notify(&self, message: &str) -> Result<()> {
        self.notices
            .lock()
            .expect("notices lock")
            .push(message.to_string());
        Ok(())
    }
}
