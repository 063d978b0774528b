//! Dirty-state tracking with save, apply, and revert.
//!
//! DESIGN
//! ======
//! `Saveable<T>` only owns the baseline. The live value stays with the
//! caller (an editor buffer, a form) and is read through [`Editable`] or
//! passed in explicitly, so the controller never writes to it; revert asks
//! the caller to restore the baseline instead.
//!
//! Saves are asynchronous. While one is in flight a second save is refused
//! and `track` calls are held back until the save settles, so a refresh that
//! lands mid-save cannot overwrite the baseline the save is about to replace.

#[cfg(test)]
#[path = "saveable_test.rs"]
mod tests;

use std::fmt;

/// The editable value as seen by the controller.
pub trait Editable {
    type Value: Clone + PartialEq;

    /// Snapshot of the live value.
    fn current(&self) -> Self::Value;

    /// Replace the live value with `baseline` (revert).
    fn restore(&mut self, baseline: &Self::Value);

    /// Result of the caller's validity predicate for the live value.
    fn is_valid(&self) -> bool;
}

/// Persists a value for the controller.
#[async_trait::async_trait]
pub trait SaveHandler<T: Send + Sync>: Send + Sync {
    type Error: fmt::Display + Send;

    /// Persist `current`. `baseline` is the last known-good value; `is_apply`
    /// is true when the editor should stay open afterwards.
    async fn try_save(&self, baseline: &T, current: &T, is_apply: bool) -> Result<SaveOutcome, Self::Error>;
}

/// Result reported by a save handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted; the saved value becomes the baseline.
    Saved,
    /// Rejected; the live value and baseline are left alone.
    Failed,
    /// Abandoned without an error (e.g. the user cancelled a prompt).
    Aborted,
}

/// Whether a `track` call took effect immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackOutcome {
    Applied,
    Deferred,
}

/// Issued by [`Saveable::begin_save`]; hand it back to [`Saveable::finish_save`].
#[derive(Debug)]
pub struct SaveTicket<T> {
    id: u64,
    pub baseline: T,
    pub current: T,
    pub is_apply: bool,
}

impl<T> SaveTicket<T> {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// How a save settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveSettled {
    pub outcome: SaveOutcome,
    /// The baseline was replaced (by the save or by a deferred track).
    pub rebaselined: bool,
    /// A successful save-and-close: the owner should dismiss the editor.
    pub close_requested: bool,
}

/// Baseline holder and save coordinator for one editable value.
#[derive(Clone, Debug)]
pub struct Saveable<T> {
    baseline: T,
    saving: Option<u64>,
    deferred_track: Option<T>,
    next_ticket: u64,
}

impl<T: Clone + PartialEq> Saveable<T> {
    #[must_use]
    pub fn new(baseline: T) -> Self {
        Self { baseline, saving: None, deferred_track: None, next_ticket: 0 }
    }

    #[must_use]
    pub fn baseline(&self) -> &T {
        &self.baseline
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    #[must_use]
    pub fn is_changed(&self, current: &T) -> bool {
        *current != self.baseline
    }

    #[must_use]
    pub fn is_saveable(&self, current: &T, is_valid: bool) -> bool {
        self.is_changed(current) && is_valid && !self.is_saving()
    }

    /// Make `current` the known-good value.
    ///
    /// Held back while a save is in flight; the most recent held value is
    /// applied when the save settles without replacing the baseline itself.
    pub fn track(&mut self, current: &T) -> TrackOutcome {
        if self.is_saving() {
            tracing::debug!("track deferred until in-flight save settles");
            self.deferred_track = Some(current.clone());
            return TrackOutcome::Deferred;
        }
        self.baseline = current.clone();
        TrackOutcome::Applied
    }

    /// [`Saveable::track`] reading the live value from `editable`.
    pub fn track_editable<E: Editable<Value = T>>(&mut self, editable: &E) -> TrackOutcome {
        self.track(&editable.current())
    }

    /// Ask `editable` to restore the baseline. Returns false when unchanged.
    pub fn revert<E: Editable<Value = T>>(&self, editable: &mut E) -> bool {
        if !self.is_changed(&editable.current()) {
            return false;
        }
        editable.restore(&self.baseline);
        true
    }

    /// Enter the saving state. Returns `None` when not saveable.
    pub fn begin_save(&mut self, current: &T, is_valid: bool, is_apply: bool) -> Option<SaveTicket<T>> {
        if !self.is_saveable(current, is_valid) {
            return None;
        }
        self.next_ticket += 1;
        let id = self.next_ticket;
        self.saving = Some(id);
        Some(SaveTicket { id, baseline: self.baseline.clone(), current: current.clone(), is_apply })
    }

    /// Leave the saving state. `current` is the live value at settle time.
    pub fn finish_save(&mut self, ticket: SaveTicket<T>, outcome: SaveOutcome, current: &T) -> SaveSettled {
        if self.saving != Some(ticket.id) {
            tracing::debug!(ticket = ticket.id, "ignoring settle for stale save ticket");
            return SaveSettled { outcome, rebaselined: false, close_requested: false };
        }
        self.saving = None;
        let deferred = self.deferred_track.take();

        let rebaselined = match (outcome, deferred) {
            (SaveOutcome::Saved, _) => {
                self.baseline = current.clone();
                true
            }
            (_, Some(value)) => {
                self.baseline = value;
                true
            }
            (_, None) => false,
        };

        SaveSettled {
            outcome,
            rebaselined,
            close_requested: outcome == SaveOutcome::Saved && !ticket.is_apply,
        }
    }

    /// Whether `ticket` belongs to the save currently in flight.
    #[must_use]
    pub fn is_current_save(&self, ticket: &SaveTicket<T>) -> bool {
        self.saving == Some(ticket.id)
    }

    /// [`Saveable::abandon_save`] only if save `id` is still the one in
    /// flight. Returns true when it was.
    pub fn abandon_save_id(&mut self, id: u64) -> bool {
        if self.saving != Some(id) {
            return false;
        }
        self.abandon_save();
        true
    }

    /// Drop an in-flight save without settling it. Deferred tracks are
    /// applied.
    pub fn abandon_save(&mut self) {
        if self.saving.take().is_some() {
            if let Some(value) = self.deferred_track.take() {
                self.baseline = value;
            }
        }
    }
}

impl<T> Saveable<T>
where
    T: Clone + PartialEq + Send + Sync,
{
    /// Run a full save through `handler`. Returns `None` when not saveable.
    ///
    /// Handler errors count as [`SaveOutcome::Failed`]. The saving state is
    /// cleared on every path, including when this future is dropped.
    pub async fn save<E, H>(&mut self, editable: &mut E, handler: &H, is_apply: bool) -> Option<SaveSettled>
    where
        E: Editable<Value = T>,
        H: SaveHandler<T> + ?Sized,
    {
        let ticket = self.begin_save(&editable.current(), editable.is_valid(), is_apply)?;
        let mut guard = SavingGuard { saveable: self, settled: false };

        let outcome = match handler.try_save(&ticket.baseline, &ticket.current, is_apply).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "save handler failed");
                SaveOutcome::Failed
            }
        };

        let settled = guard.saveable.finish_save(ticket, outcome, &editable.current());
        guard.settled = true;
        Some(settled)
    }
}

struct SavingGuard<'a, T: Clone + PartialEq> {
    saveable: &'a mut Saveable<T>,
    settled: bool,
}

impl<T: Clone + PartialEq> Drop for SavingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.saveable.abandon_save();
        }
    }
}
