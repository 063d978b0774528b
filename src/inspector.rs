//! Record inspector: the drawer that views, navigates, edits, and deletes
//! one record at a time.
//!
//! DESIGN
//! ======
//! `RecordInspector` is a synchronous state machine. Every remote operation
//! is split in two: a `begin_*` call that validates and hands out a ticket,
//! and a `finish_*`/`apply_*` call that takes the ticket back together with
//! the transport result. `InspectorSession` drives those pairs over a
//! [`QueryExecutor`] and never holds the state lock across an `.await`, so a
//! new navigation can start while an older fetch is still outstanding.
//!
//! RACES
//! =====
//! Fetch results are tagged with a sequence number. Only the latest fetch
//! for the current history entry is applied; anything else is dropped.
//! A fetch that lands while a save is in flight refreshes the record
//! metadata but leaves the editor alone; its body reaches the baseline
//! once the save settles.
//!
//! ERROR HANDLING
//! ==============
//! Nothing escapes to the host. Failed saves and deletes set the inline
//! `error` and keep the editor contents; failed fetches show the record as
//! missing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use queries::QueryResponse;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::InspectorConfig;
use crate::confirm::{Confirm, ConfirmPrompt};
use crate::error::InspectorError;
use crate::events::{ConnectionEvent, EVENT_CHANNEL_CAPACITY, InspectorEvent};
use crate::net::executor::QueryExecutor;
use crate::state::explorer::ExplorerSession;
use crate::state::history::{NavigationHistory, PopPolicy};
use crate::state::record::{ActiveRecord, RecordReference};
use crate::state::saveable::{Editable, SaveOutcome, SaveTicket, Saveable};
use crate::util::resize::{DrawerResizer, PointerSurface, ResizeBounds};
use crate::util::save_controls::{SaveControls, SaveLabels};
use crate::util::value::{ParsedValue, parse_value, validate_body};

pub const DELETE_PROMPT: &str = "You are about to delete this record. This action cannot be undone.";
pub const DELETE_CONFIRM_TEXT: &str = "Delete";

const FETCH_STATEMENTS: usize = 3;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectorPhase {
    /// Drawer hidden.
    Closed,
    /// A fetch for the current reference is outstanding.
    Loading,
    /// Open, but there is no record to edit.
    LoadedMissing,
    /// Open on an existing record.
    LoadedPresent,
}

/// One outstanding fetch. Hand it back to [`RecordInspector::apply_fetch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub reference: RecordReference,
    seq: u64,
}

impl FetchTicket {
    #[must_use]
    pub fn batch(&self) -> queries::QueryBatch {
        queries::fetch_record_batch(&self.reference.to_string())
    }
}

/// One outstanding content update.
#[derive(Debug)]
pub struct UpdateTicket {
    pub reference: RecordReference,
    pub content: Value,
    save: SaveTicket<String>,
}

impl UpdateTicket {
    #[must_use]
    pub fn is_apply(&self) -> bool {
        self.save.is_apply
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.save.id()
    }

    #[must_use]
    pub fn batch(&self) -> queries::QueryBatch {
        queries::update_content_batch(&self.reference.to_string(), self.content.clone())
    }
}

/// One outstanding delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteTicket {
    pub reference: RecordReference,
    seq: u64,
}

impl DeleteTicket {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn batch(&self) -> queries::QueryBatch {
        queries::delete_record_batch(&self.reference.to_string())
    }
}

/// What [`RecordInspector::apply_fetch`] did with a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchApplied {
    /// Superseded or closed; nothing changed.
    Stale,
    Present,
    Missing,
    /// The fetch failed; the record is shown as missing with an error.
    Failed,
}

/// Result of settling a save.
#[derive(Debug, PartialEq, Eq)]
pub struct SaveReport {
    pub outcome: SaveOutcome,
    /// Record written remotely; sibling panes should re-query.
    pub changed: Option<RecordReference>,
    /// Follow-up fetch after a successful apply.
    pub refetch: Option<FetchTicket>,
    /// The drawer closed after a successful save.
    pub closed: bool,
}

/// Result of a delete request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(RecordReference),
    /// The user declined the confirmation.
    Declined,
    /// Nothing deletable is targeted, or another operation is running.
    Unavailable,
    /// The remote delete failed; the message is in `error`.
    Failed,
}

// =============================================================================
// STATE MACHINE
// =============================================================================

pub struct RecordInspector {
    config: InspectorConfig,
    phase: InspectorPhase,
    history: NavigationHistory<RecordReference>,
    record: ActiveRecord,
    body: String,
    record_input: String,
    error: Option<String>,
    saveable: Saveable<String>,
    width: f64,
    resizer: DrawerResizer,
    fetch_seq: u64,
    delete_seq: u64,
    deleting: Option<u64>,
}

impl RecordInspector {
    #[must_use]
    pub fn new(config: InspectorConfig, surface: Box<dyn PointerSurface + Send>) -> Self {
        let bounds = ResizeBounds::new(config.drawer_min_width, config.drawer_max_width);
        Self {
            config,
            phase: InspectorPhase::Closed,
            history: NavigationHistory::new(PopPolicy::AllowEmpty),
            record: ActiveRecord::default(),
            body: String::new(),
            record_input: String::new(),
            error: None,
            saveable: Saveable::new(String::new()),
            width: bounds.clamp(config.drawer_width),
            resizer: DrawerResizer::new(surface, bounds),
            fetch_seq: 0,
            delete_seq: 0,
            deleting: None,
        }
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn phase(&self) -> InspectorPhase {
        self.phase
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase != InspectorPhase::Closed
    }

    #[must_use]
    pub fn history(&self) -> &NavigationHistory<RecordReference> {
        &self.history
    }

    #[must_use]
    pub fn current(&self) -> Option<&RecordReference> {
        self.history.current()
    }

    #[must_use]
    pub fn record(&self) -> &ActiveRecord {
        &self.record
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn record_input(&self) -> &str {
        &self.record_input
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn is_body_valid(&self) -> bool {
        validate_body(&self.body).is_some()
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.saveable.is_changed(&self.body)
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saveable.is_saving()
    }

    #[must_use]
    pub fn is_saveable(&self) -> bool {
        self.phase == InspectorPhase::LoadedPresent && self.saveable.is_saveable(&self.body, self.is_body_valid())
    }

    /// The record-id field is styled invalid when its target does not exist.
    #[must_use]
    pub fn record_input_invalid(&self) -> bool {
        self.phase == InspectorPhase::LoadedMissing && self.history.current().is_some()
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.phase == InspectorPhase::LoadedPresent && self.deleting.is_none() && !self.saveable.is_saving()
    }

    /// Save box state for the editor footer.
    #[must_use]
    pub fn save_controls(&self, labels: &SaveLabels) -> SaveControls {
        let enabled = self.phase == InspectorPhase::LoadedPresent;
        SaveControls::derive(&self.saveable, &self.body, enabled && self.is_body_valid(), labels)
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Show the drawer. Refetches the current record, if any.
    pub fn open(&mut self) -> Option<FetchTicket> {
        match self.history.current().cloned() {
            Some(reference) => Some(self.issue_fetch(reference)),
            None => {
                self.phase = InspectorPhase::LoadedMissing;
                None
            }
        }
    }

    /// Hide the drawer. History is kept for the next `open`. Returns false
    /// when already closed.
    pub fn close(&mut self) -> bool {
        self.resizer.pointer_up();
        if self.phase == InspectorPhase::Closed {
            return false;
        }
        self.phase = InspectorPhase::Closed;
        true
    }

    /// Push `reference` and open the drawer on it.
    pub fn inspect(&mut self, reference: RecordReference) -> FetchTicket {
        self.record_input = reference.to_string();
        self.history.push(reference.clone());
        self.error = None;
        self.issue_fetch(reference)
    }

    /// Navigate to the record typed into the record-id field. Input that is
    /// not a record literal is ignored.
    pub fn goto_record(&mut self, raw: &str) -> Option<FetchTicket> {
        raw.clone_into(&mut self.record_input);
        match parse_value(raw) {
            ParsedValue::Record(reference) => Some(self.inspect(reference)),
            ParsedValue::Value(_) | ParsedValue::Invalid => {
                debug!(input = raw, "record input is not a record literal");
                None
            }
        }
    }

    /// Pop the history. Closes the drawer when it empties. No-op while
    /// closed.
    pub fn go_back(&mut self) -> Option<FetchTicket> {
        if self.phase == InspectorPhase::Closed {
            return None;
        }
        self.history.pop()?;
        self.error = None;
        if let Some(reference) = self.history.current().cloned() {
            self.record_input = reference.to_string();
            return Some(self.issue_fetch(reference));
        }
        self.reset_record();
        self.close();
        None
    }

    /// Refetch the current record. No-op when closed or empty.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if self.phase == InspectorPhase::Closed {
            return None;
        }
        let reference = self.history.current().cloned()?;
        Some(self.issue_fetch(reference))
    }

    fn issue_fetch(&mut self, reference: RecordReference) -> FetchTicket {
        self.fetch_seq += 1;
        self.phase = InspectorPhase::Loading;
        FetchTicket { reference, seq: self.fetch_seq }
    }

    /// Apply a fetch result if `ticket` is still the latest fetch for the
    /// current reference.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<QueryResponse>, InspectorError>,
    ) -> FetchApplied {
        let is_latest = ticket.seq == self.fetch_seq && self.history.current() == Some(&ticket.reference);
        if self.phase == InspectorPhase::Closed || !is_latest {
            debug!(record = %ticket.reference, seq = ticket.seq, latest = self.fetch_seq, "discarding stale fetch");
            return FetchApplied::Stale;
        }

        let responses = match result.and_then(|r| check_responses(r, FETCH_STATEMENTS)) {
            Ok(responses) => responses,
            Err(err) => {
                warn!(record = %ticket.reference, code = err.code(), error = %err, "record fetch failed");
                self.record = ActiveRecord::default();
                self.settle_body(String::new());
                self.error = Some(err.to_string());
                self.phase = InspectorPhase::LoadedMissing;
                return FetchApplied::Failed;
            }
        };

        let record = ActiveRecord::from_fetch(
            &responses[0].result,
            &responses[1].result,
            &responses[2].result,
            self.config.pretty_body,
        );
        let applied = if record.exists { FetchApplied::Present } else { FetchApplied::Missing };
        self.phase = if record.exists { InspectorPhase::LoadedPresent } else { InspectorPhase::LoadedMissing };
        let body = record.initial_body.clone();
        self.record = record;
        self.settle_body(body);
        debug!(record = %ticket.reference, exists = self.record.exists, "record fetched");
        applied
    }

    /// Replace editor contents and baseline with fetched text. While a save
    /// is in flight only the baseline is queued.
    fn settle_body(&mut self, text: String) {
        if !self.saveable.is_saving() {
            self.body.clone_from(&text);
        }
        self.saveable.track(&text);
    }

    fn reset_record(&mut self) {
        self.record = ActiveRecord::default();
        self.error = None;
        self.settle_body(String::new());
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Replace the editor text. Ignored unless an existing record is shown.
    pub fn edit_body(&mut self, text: impl Into<String>) -> bool {
        if self.phase != InspectorPhase::LoadedPresent {
            return false;
        }
        self.body = text.into();
        true
    }

    pub fn set_record_input(&mut self, text: impl Into<String>) {
        self.record_input = text.into();
    }

    /// Restore the body to the last fetched content and clear the inline
    /// error. Returns true when the body changed.
    pub fn revert(&mut self) -> bool {
        self.error = None;
        let mut editor = BodyEditor { body: &mut self.body };
        self.saveable.revert(&mut editor)
    }

    /// Start saving the edited body. `None` when nothing saveable is shown.
    pub fn begin_save(&mut self, is_apply: bool) -> Option<UpdateTicket> {
        let (reference, content) = match self.save_target() {
            Ok(target) => target,
            Err(err) => {
                debug!(code = err.code(), "save skipped");
                return None;
            }
        };
        let save = self.saveable.begin_save(&self.body, true, is_apply)?;
        Some(UpdateTicket { reference, content, save })
    }

    fn save_target(&self) -> Result<(RecordReference, Value), InspectorError> {
        let reference = match (self.phase, self.history.current()) {
            (InspectorPhase::LoadedPresent, Some(reference)) => reference.clone(),
            _ => return Err(InspectorError::NoRecord),
        };
        let content = validate_body(&self.body).ok_or(InspectorError::InvalidBody)?;
        Ok((reference, content))
    }

    /// Settle a save started with [`RecordInspector::begin_save`].
    pub fn finish_save(
        &mut self,
        ticket: UpdateTicket,
        result: Result<Vec<QueryResponse>, InspectorError>,
    ) -> SaveReport {
        let UpdateTicket { reference, save, .. } = ticket;
        let is_apply = save.is_apply;
        let saved_text = save.current.clone();
        let result = result.and_then(|r| check_responses(r, 1));

        let owned = self.saveable.is_current_save(&save);
        if !owned || self.history.current() != Some(&reference) || self.phase == InspectorPhase::Closed {
            debug!(record = %reference, owned, "save settled for a record no longer being edited");
            if owned {
                self.saveable.abandon_save();
                if self.phase != InspectorPhase::Loading {
                    self.body.clone_from(self.saveable.baseline());
                }
            }
            return SaveReport {
                outcome: if result.is_ok() { SaveOutcome::Saved } else { SaveOutcome::Failed },
                changed: result.is_ok().then_some(reference),
                refetch: None,
                closed: false,
            };
        }

        match result {
            Ok(_) => {
                info!(record = %reference, is_apply, "record saved");
                let settled = self.saveable.finish_save(save, SaveOutcome::Saved, &saved_text);
                self.error = None;
                let (refetch, closed) = if settled.close_requested {
                    (None, self.close())
                } else {
                    (Some(self.issue_fetch(reference.clone())), false)
                };
                SaveReport { outcome: SaveOutcome::Saved, changed: Some(reference), refetch, closed }
            }
            Err(err) => {
                warn!(record = %reference, code = err.code(), error = %err, "record save failed");
                self.saveable.finish_save(save, SaveOutcome::Failed, &self.body);
                self.error = Some(display_message(&err));
                SaveReport { outcome: SaveOutcome::Failed, changed: None, refetch: None, closed: false }
            }
        }
    }

    /// Drop save `id` without a result, if it is still in flight.
    pub fn abandon_save(&mut self, id: u64) {
        self.saveable.abandon_save_id(id);
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    pub fn begin_delete(&mut self) -> Option<DeleteTicket> {
        if !self.can_delete() {
            return None;
        }
        let reference = self.history.current().cloned()?;
        self.delete_seq += 1;
        self.deleting = Some(self.delete_seq);
        Some(DeleteTicket { reference, seq: self.delete_seq })
    }

    /// Settle a delete. On success history is cleared and the drawer closes.
    /// A delete outlived by a connection reset only reports its result.
    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<Vec<QueryResponse>, InspectorError>,
    ) -> DeleteOutcome {
        let result = result.and_then(|r| check_responses(r, 1));
        if self.deleting != Some(ticket.seq) {
            debug!(record = %ticket.reference, "delete settled after reset");
            return match result {
                Ok(_) => DeleteOutcome::Deleted(ticket.reference),
                Err(_) => DeleteOutcome::Failed,
            };
        }
        self.deleting = None;
        match result {
            Ok(_) => {
                info!(record = %ticket.reference, "record deleted");
                self.history.clear();
                self.reset_record();
                self.record_input.clear();
                self.close();
                DeleteOutcome::Deleted(ticket.reference)
            }
            Err(err) => {
                warn!(record = %ticket.reference, code = err.code(), error = %err, "record delete failed");
                self.error = Some(display_message(&err));
                DeleteOutcome::Failed
            }
        }
    }

    pub fn abandon_delete(&mut self, id: u64) {
        if self.deleting == Some(id) {
            self.deleting = None;
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle and resize
    // -------------------------------------------------------------------------

    /// Reset on connection changes. Returns true when the drawer closed.
    pub fn handle_connection_event(&mut self, event: ConnectionEvent) -> bool {
        debug!(?event, "resetting inspector");
        self.history.clear();
        self.saveable.abandon_save();
        self.deleting = None;
        self.record_input.clear();
        self.reset_record();
        self.close()
    }

    pub fn begin_resize(&mut self, pointer_x: f64) {
        self.resizer.begin(pointer_x, self.width);
    }

    /// Returns the new width while a resize drag is active.
    pub fn resize_move(&mut self, pointer_x: f64) -> Option<f64> {
        let width = self.resizer.pointer_move(pointer_x)?;
        self.width = width;
        Some(width)
    }

    pub fn end_resize(&mut self) -> bool {
        self.resizer.pointer_up()
    }

    #[must_use]
    pub fn is_resizing(&self) -> bool {
        self.resizer.is_dragging()
    }

    pub fn set_width_bounds(&mut self, min: f64, max: f64) {
        let bounds = ResizeBounds::new(min, max);
        self.resizer.set_bounds(bounds);
        self.width = bounds.clamp(self.width);
    }
}

impl std::fmt::Debug for RecordInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordInspector")
            .field("phase", &self.phase)
            .field("current", &self.history.current())
            .field("width", &self.width)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// The editor text as seen by the saveable.
struct BodyEditor<'a> {
    body: &'a mut String,
}

impl Editable for BodyEditor<'_> {
    type Value = String;

    fn current(&self) -> String {
        self.body.clone()
    }

    fn restore(&mut self, baseline: &String) {
        self.body.clone_from(baseline);
    }

    fn is_valid(&self) -> bool {
        validate_body(self.body.as_str()).is_some()
    }
}

fn check_responses(responses: Vec<QueryResponse>, expected: usize) -> Result<Vec<QueryResponse>, InspectorError> {
    if responses.len() < expected {
        return Err(InspectorError::MalformedResponse { expected, actual: responses.len() });
    }
    if let Some(message) = responses.iter().find_map(QueryResponse::error_message) {
        return Err(InspectorError::Query { message });
    }
    Ok(responses)
}

fn display_message(err: &InspectorError) -> String {
    queries::strip_error_prefix(&err.to_string()).to_owned()
}

// =============================================================================
// ASYNC DRIVER
// =============================================================================

/// Drives a [`RecordInspector`] over a [`QueryExecutor`] and publishes
/// [`InspectorEvent`]s. The explorer session sharing its connection is
/// reset alongside it.
pub struct InspectorSession<E> {
    state: Arc<Mutex<RecordInspector>>,
    explorer: Arc<Mutex<ExplorerSession>>,
    executor: Arc<E>,
    events: broadcast::Sender<InspectorEvent>,
}

impl<E> Clone for InspectorSession<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            explorer: Arc::clone(&self.explorer),
            executor: Arc::clone(&self.executor),
            events: self.events.clone(),
        }
    }
}

impl<E: QueryExecutor> InspectorSession<E> {
    #[must_use]
    pub fn new(inspector: RecordInspector, executor: E) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(inspector)),
            explorer: Arc::new(Mutex::new(ExplorerSession::default())),
            executor: Arc::new(executor),
            events,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<InspectorEvent> {
        self.events.subscribe()
    }

    /// Run `f` against the state machine under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut RecordInspector) -> R) -> R {
        f(&mut self.lock())
    }

    /// Run `f` against the explorer session under its lock.
    pub fn with_explorer<R>(&self, f: impl FnOnce(&mut ExplorerSession) -> R) -> R {
        f(&mut self.explorer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn lock(&self) -> MutexGuard<'_, RecordInspector> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: InspectorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn run(&self, batch: &queries::QueryBatch) -> Result<Vec<QueryResponse>, InspectorError> {
        Ok(self.executor.execute(batch).await?)
    }

    /// Execute a fetch and apply it.
    pub async fn fetch(&self, ticket: FetchTicket) -> FetchApplied {
        let result = self.run(&ticket.batch()).await;
        self.lock().apply_fetch(&ticket, result)
    }

    async fn fetch_opt(&self, ticket: Option<FetchTicket>) -> Option<FetchApplied> {
        match ticket {
            Some(ticket) => Some(self.fetch(ticket).await),
            None => None,
        }
    }

    pub async fn open(&self) -> Option<FetchApplied> {
        let ticket = self.lock().open();
        self.fetch_opt(ticket).await
    }

    pub fn close(&self) {
        if self.lock().close() {
            self.emit(InspectorEvent::Closed);
        }
    }

    pub async fn inspect(&self, reference: RecordReference) -> FetchApplied {
        let ticket = self.lock().inspect(reference);
        self.fetch(ticket).await
    }

    pub async fn goto_record(&self, raw: &str) -> Option<FetchApplied> {
        let ticket = self.lock().goto_record(raw);
        self.fetch_opt(ticket).await
    }

    pub async fn go_back(&self) -> Option<FetchApplied> {
        let (ticket, closed) = {
            let mut state = self.lock();
            let was_open = state.is_open();
            let ticket = state.go_back();
            (ticket, was_open && !state.is_open())
        };
        if closed {
            self.emit(InspectorEvent::Closed);
        }
        self.fetch_opt(ticket).await
    }

    pub async fn refresh(&self) -> Option<FetchApplied> {
        let ticket = self.lock().refresh();
        self.fetch_opt(ticket).await
    }

    /// Save the edited body. `None` when there was nothing to save.
    ///
    /// Dropping the returned future mid-save clears the saving state.
    pub async fn save(&self, is_apply: bool) -> Option<SaveReport> {
        let ticket = self.lock().begin_save(is_apply)?;
        let guard = PendingGuard::new(&self.state, RecordInspector::abandon_save, ticket.id());

        let result = self.run(&ticket.batch()).await;
        let report = self.lock().finish_save(ticket, result);
        guard.disarm();

        if let Some(reference) = &report.changed {
            self.emit(InspectorEvent::RecordsChanged { reference: reference.clone() });
        }
        if report.closed {
            self.emit(InspectorEvent::Closed);
        }
        if let Some(ticket) = report.refetch.clone() {
            self.fetch(ticket).await;
        }
        Some(report)
    }

    /// Delete the current record after `confirm` agrees.
    pub async fn delete_record(&self, confirm: &dyn Confirm) -> DeleteOutcome {
        if !self.lock().can_delete() {
            return DeleteOutcome::Unavailable;
        }
        let prompt = ConfirmPrompt { message: DELETE_PROMPT.to_owned(), confirm_text: DELETE_CONFIRM_TEXT.to_owned() };
        if !confirm.confirm(&prompt).await {
            return DeleteOutcome::Declined;
        }

        let Some(ticket) = self.lock().begin_delete() else {
            return DeleteOutcome::Unavailable;
        };
        let guard = PendingGuard::new(&self.state, RecordInspector::abandon_delete, ticket.id());

        let result = self.run(&ticket.batch()).await;
        let (outcome, closed) = {
            let mut state = self.lock();
            let was_open = state.is_open();
            let outcome = state.finish_delete(ticket, result);
            (outcome, was_open && !state.is_open())
        };
        guard.disarm();

        if let DeleteOutcome::Deleted(reference) = &outcome {
            self.emit(InspectorEvent::RecordsChanged { reference: reference.clone() });
        }
        if closed {
            self.emit(InspectorEvent::Closed);
        }
        outcome
    }

    pub fn handle_connection_event(&self, event: ConnectionEvent) {
        self.with_explorer(|explorer| explorer.handle_event(event));
        if self.lock().handle_connection_event(event) {
            self.emit(InspectorEvent::Closed);
        }
    }

    /// Apply connection events until the sender goes away.
    pub async fn run_events(&self, mut rx: broadcast::Receiver<ConnectionEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => self.handle_connection_event(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connection events lagged; resetting");
                    self.handle_connection_event(ConnectionEvent::Disconnected);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Rolls back a `begin_*` if the driving future is dropped before settling.
struct PendingGuard<'a> {
    state: &'a Mutex<RecordInspector>,
    abandon: fn(&mut RecordInspector, u64),
    id: u64,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a Mutex<RecordInspector>, abandon: fn(&mut RecordInspector, u64), id: u64) -> Self {
        Self { state, abandon, id, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (self.abandon)(&mut state, self.id);
        }
    }
}

#[cfg(test)]
#[path = "inspector_test.rs"]
mod tests;
