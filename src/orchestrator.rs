//! Cumulative prefix execution against the engine.
//!
//! `request_result_for` runs one request to completion on the caller's
//! thread. `Dispatcher` issues requests fire-and-forget on worker threads
//! and serializes every session mutation through one mutex; responses that
//! arrive after a newer one has been applied are dropped by the session.
use crate::engine::{Engine, ExecutionResult};
use crate::error::SequencerError;
use crate::session::{Applied, Session};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Execute the prefix ending at `index` and make its final step's result active.
///
/// Precondition failures (no dataset, empty sequence, blocked index) return
/// before any engine call. Remote failures are shown as an error result and
/// also returned.
pub fn request_result_for(
    session: &mut Session,
    engine: &dyn Engine,
    index: usize,
) -> Result<ExecutionResult, SequencerError> {
    let pending = session.begin_request(index)?;
    let outcome = engine.execute(&pending.request);
    let failure = outcome.as_ref().err().cloned();
    match session.apply_response(&pending, outcome) {
        Applied::Shown(result) => match failure {
            Some(err) => Err(err),
            None => Ok(result),
        },
        // Nothing else can be applied in between on a single thread.
        Applied::Stale => {
            let superseded = SequencerError::remote("engine response superseded");
            Err(failure.unwrap_or(superseded))
        }
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

pub fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

type AppliedCallback = Arc<dyn Fn(&Session, &Applied) + Send + Sync>;

pub struct Dispatcher {
    session: SharedSession,
    engine: Arc<dyn Engine>,
    on_applied: Option<AppliedCallback>,
    in_flight: Vec<JoinHandle<Applied>>,
}

impl Dispatcher {
    pub fn new(session: SharedSession, engine: Arc<dyn Engine>) -> Self {
        Self {
            session,
            engine,
            on_applied: None,
            in_flight: Vec::new(),
        }
    }

    /// Run `callback` under the session lock after each response is applied.
    pub fn on_applied(
        mut self,
        callback: impl Fn(&Session, &Applied) + Send + Sync + 'static,
    ) -> Self {
        self.on_applied = Some(Arc::new(callback));
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Issue the request for `index` without waiting for the response.
    pub fn dispatch(&mut self, index: usize) -> Result<(), SequencerError> {
        let pending = lock_session(&self.session).begin_request(index)?;
        tracing::debug!(
            seq = pending.seq,
            index = pending.index,
            "engine request dispatched"
        );
        let session = Arc::clone(&self.session);
        let engine = Arc::clone(&self.engine);
        let on_applied = self.on_applied.clone();
        let handle = thread::spawn(move || {
            let outcome = engine.execute(&pending.request);
            let mut guard = lock_session(&session);
            let applied = guard.apply_response(&pending, outcome);
            if let Some(callback) = on_applied {
                let current: &Session = &guard;
                callback(current, &applied);
            }
            applied
        });
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.push(handle);
        Ok(())
    }

    /// Block until every outstanding request has been applied or discarded.
    pub fn wait_idle(&mut self) -> Vec<Applied> {
        self.in_flight
            .drain(..)
            .filter_map(|handle| match handle.join() {
                Ok(applied) => Some(applied),
                Err(_) => {
                    tracing::warn!("engine request worker panicked");
                    None
                }
            })
            .collect()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
