//! Single-slot in-flight guard shared by upload and processing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::state::{WorkflowStage, WorkflowState};

pub(crate) fn lock(state: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the busy slot for one request.
///
/// Acquiring sets the busy flag and the active stage before any request is
/// dispatched. Dropping always frees the slot and, unless [`InFlight::commit`]
/// ran, puts the stage back to the fallback. A future dropped mid-request
/// therefore leaves a consistent state behind.
pub(crate) struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    busy: &'a AtomicBool,
    fallback: WorkflowStage,
}

impl<'a> InFlight<'a> {
    /// Take the slot, or `None` when another request holds it.
    ///
    /// `prepare` runs under the state lock right after the stage switch and
    /// may reset fields that must not be observed during the request.
    pub(crate) fn acquire(
        state: &'a Mutex<WorkflowState>,
        busy: &'a AtomicBool,
        active: WorkflowStage,
        prepare: impl FnOnce(&mut WorkflowState),
    ) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        let fallback = {
            let mut state = lock(state);
            let fallback = state.stage;
            state.stage = active;
            prepare(&mut state);
            fallback
        };
        tracing::debug!(from = %fallback, to = %active, "Stage change");

        Some(Self {
            state,
            busy,
            fallback,
        })
    }

    /// Override the stage restored on failure.
    pub(crate) fn fall_back_to(&mut self, stage: WorkflowStage) {
        self.fallback = stage;
    }

    /// Finish successfully: apply `update` and move to `stage`.
    pub(crate) fn commit(mut self, stage: WorkflowStage, update: impl FnOnce(&mut WorkflowState)) {
        {
            let mut state = lock(self.state);
            update(&mut state);
            state.stage = stage;
        }
        tracing::info!(stage = %stage, "Stage change");
        self.fallback = stage;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        {
            let mut state = lock(self.state);
            if state.stage != self.fallback {
                tracing::debug!(from = %state.stage, to = %self.fallback, "Stage restored");
                state.stage = self.fallback;
            }
        }
        self.busy.store(false, Ordering::Release);
    }
}
