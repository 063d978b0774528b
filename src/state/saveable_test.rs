use std::sync::Mutex;
use std::time::Duration;

use super::*;

// =============================================================
// Helpers
// =============================================================

struct Buffer {
    text: String,
    valid: bool,
}

impl Buffer {
    fn new(text: &str) -> Self {
        Self { text: text.to_owned(), valid: true }
    }
}

impl Editable for Buffer {
    type Value = String;

    fn current(&self) -> String {
        self.text.clone()
    }

    fn restore(&mut self, baseline: &String) {
        self.text.clone_from(baseline);
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

struct MockHandler {
    results: Mutex<Vec<Result<SaveOutcome, String>>>,
    calls: Mutex<Vec<(String, String, bool)>>,
}

impl MockHandler {
    fn new(results: Vec<Result<SaveOutcome, String>>) -> Self {
        Self { results: Mutex::new(results), calls: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<(String, String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SaveHandler<String> for MockHandler {
    type Error = String;

    async fn try_save(&self, baseline: &String, current: &String, is_apply: bool) -> Result<SaveOutcome, String> {
        self.calls
            .lock()
            .unwrap()
            .push((baseline.clone(), current.clone(), is_apply));
        let mut results = self.results.lock().unwrap();
        if results.is_empty() { Ok(SaveOutcome::Saved) } else { results.remove(0) }
    }
}

struct PendingHandler;

#[async_trait::async_trait]
impl SaveHandler<String> for PendingHandler {
    type Error = String;

    async fn try_save(&self, _baseline: &String, _current: &String, _is_apply: bool) -> Result<SaveOutcome, String> {
        std::future::pending::<()>().await;
        Ok(SaveOutcome::Saved)
    }
}

// =============================================================
// Derived observations
// =============================================================

#[test]
fn is_changed_follows_structural_equality() {
    let saveable = Saveable::new("a".to_owned());
    assert!(!saveable.is_changed(&"a".to_owned()));
    assert!(saveable.is_changed(&"b".to_owned()));
}

#[test]
fn is_saveable_requires_change_validity_and_idle() {
    let mut saveable = Saveable::new("a".to_owned());
    let edited = "b".to_owned();
    for (current, valid) in [("a", true), ("a", false), ("b", true), ("b", false)] {
        let current = current.to_owned();
        assert_eq!(
            saveable.is_saveable(&current, valid),
            saveable.is_changed(&current) && valid && !saveable.is_saving()
        );
    }

    let ticket = saveable.begin_save(&edited, true, false).expect("ticket");
    assert!(saveable.is_saving());
    assert!(!saveable.is_saveable(&edited, true));
    saveable.finish_save(ticket, SaveOutcome::Failed, &edited);
    assert!(saveable.is_saveable(&edited, true));
}

// =============================================================
// track
// =============================================================

#[test]
fn track_twice_leaves_unchanged() {
    let mut saveable = Saveable::new(String::new());
    let buffer = Buffer::new("fetched");
    assert_eq!(saveable.track_editable(&buffer), TrackOutcome::Applied);
    assert!(!saveable.is_changed(&buffer.current()));
    assert_eq!(saveable.track_editable(&buffer), TrackOutcome::Applied);
    assert!(!saveable.is_changed(&buffer.current()));
}

#[test]
fn track_during_save_is_deferred_and_applied_after_failure() {
    let mut saveable = Saveable::new("server-v1".to_owned());
    let edited = "user edit".to_owned();
    let ticket = saveable.begin_save(&edited, true, true).expect("ticket");

    assert_eq!(saveable.track(&"server-v2".to_owned()), TrackOutcome::Deferred);
    assert_eq!(saveable.baseline(), "server-v1");

    let settled = saveable.finish_save(ticket, SaveOutcome::Failed, &edited);
    assert!(settled.rebaselined);
    assert!(!settled.close_requested);
    assert_eq!(saveable.baseline(), "server-v2");
    assert!(saveable.is_changed(&edited));
}

#[test]
fn successful_save_supersedes_deferred_track() {
    let mut saveable = Saveable::new("server-v1".to_owned());
    let edited = "user edit".to_owned();
    let ticket = saveable.begin_save(&edited, true, true).expect("ticket");
    saveable.track(&"server-v1".to_owned());

    let settled = saveable.finish_save(ticket, SaveOutcome::Saved, &edited);
    assert!(settled.rebaselined);
    assert_eq!(saveable.baseline(), "user edit");
}

// =============================================================
// begin_save / finish_save
// =============================================================

#[test]
fn begin_save_refuses_second_concurrent_save() {
    let mut saveable = Saveable::new("a".to_owned());
    let edited = "b".to_owned();
    let first = saveable.begin_save(&edited, true, false);
    assert!(first.is_some());
    assert!(saveable.begin_save(&edited, true, false).is_none());
}

#[test]
fn begin_save_refuses_invalid_or_unchanged() {
    let mut saveable = Saveable::new("a".to_owned());
    assert!(saveable.begin_save(&"a".to_owned(), true, false).is_none());
    assert!(saveable.begin_save(&"b".to_owned(), false, false).is_none());
    assert!(!saveable.is_saving());
}

#[test]
fn ticket_carries_baseline_and_current() {
    let mut saveable = Saveable::new("a".to_owned());
    let ticket = saveable.begin_save(&"b".to_owned(), true, true).expect("ticket");
    assert_eq!(ticket.baseline, "a");
    assert_eq!(ticket.current, "b");
    assert!(ticket.is_apply);
}

#[test]
fn abandon_save_clears_saving_and_applies_deferred_track() {
    let mut saveable = Saveable::new("a".to_owned());
    let _ticket = saveable.begin_save(&"b".to_owned(), true, false).expect("ticket");
    saveable.track(&"c".to_owned());
    saveable.abandon_save();
    assert!(!saveable.is_saving());
    assert_eq!(saveable.baseline(), "c");
}

#[test]
fn stale_ticket_does_not_settle_newer_save() {
    let mut saveable = Saveable::new("a".to_owned());
    let old = saveable.begin_save(&"b".to_owned(), true, false).expect("ticket");
    saveable.abandon_save();
    let _new = saveable.begin_save(&"b".to_owned(), true, false).expect("ticket");

    let settled = saveable.finish_save(old, SaveOutcome::Saved, &"b".to_owned());
    assert!(!settled.rebaselined);
    assert!(saveable.is_saving());
    assert_eq!(saveable.baseline(), "a");
}

#[test]
fn abandon_save_id_ignores_other_saves() {
    let mut saveable = Saveable::new("a".to_owned());
    let old = saveable.begin_save(&"b".to_owned(), true, false).expect("ticket");
    let old_id = old.id();
    saveable.abandon_save();
    let new = saveable.begin_save(&"b".to_owned(), true, false).expect("ticket");

    assert!(!saveable.is_current_save(&old));
    assert!(saveable.is_current_save(&new));
    assert!(!saveable.abandon_save_id(old_id));
    assert!(saveable.is_saving());
    assert!(saveable.abandon_save_id(new.id()));
    assert!(!saveable.is_saving());
}

// =============================================================
// revert
// =============================================================

#[test]
fn revert_restores_baseline_through_editable() {
    let saveable = Saveable::new("orig".to_owned());
    let mut buffer = Buffer::new("edited");
    assert!(saveable.revert(&mut buffer));
    assert_eq!(buffer.text, "orig");
}

#[test]
fn revert_is_noop_when_unchanged() {
    let saveable = Saveable::new("orig".to_owned());
    let mut buffer = Buffer::new("orig");
    assert!(!saveable.revert(&mut buffer));
}

// =============================================================
// save
// =============================================================

#[tokio::test]
async fn save_without_apply_rebaselines_and_requests_close() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer::new("b");
    let handler = MockHandler::new(vec![]);

    let settled = saveable.save(&mut buffer, &handler, false).await.expect("settled");
    assert_eq!(settled.outcome, SaveOutcome::Saved);
    assert!(settled.close_requested);
    assert!(!saveable.is_changed(&buffer.current()));
    assert!(!saveable.is_saving());
    assert_eq!(handler.calls(), vec![("a".to_owned(), "b".to_owned(), false)]);
}

#[tokio::test]
async fn save_with_apply_rebaselines_without_close() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer::new("b");
    let handler = MockHandler::new(vec![Ok(SaveOutcome::Saved)]);

    let settled = saveable.save(&mut buffer, &handler, true).await.expect("settled");
    assert!(settled.rebaselined);
    assert!(!settled.close_requested);
    assert_eq!(saveable.baseline(), "b");
}

#[tokio::test]
async fn failed_save_keeps_current_and_clears_saving() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer::new("b");
    let handler = MockHandler::new(vec![Ok(SaveOutcome::Failed), Err("boom".to_owned())]);

    for _ in 0..2 {
        let settled = saveable.save(&mut buffer, &handler, false).await.expect("settled");
        assert_eq!(settled.outcome, SaveOutcome::Failed);
        assert!(!settled.rebaselined);
        assert!(!settled.close_requested);
        assert_eq!(buffer.text, "b");
        assert!(!saveable.is_saving());
        assert!(saveable.is_changed(&buffer.current()));
    }
}

#[tokio::test]
async fn aborted_save_changes_nothing() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer::new("b");
    let handler = MockHandler::new(vec![Ok(SaveOutcome::Aborted)]);

    let settled = saveable.save(&mut buffer, &handler, false).await.expect("settled");
    assert_eq!(settled.outcome, SaveOutcome::Aborted);
    assert!(!settled.close_requested);
    assert_eq!(saveable.baseline(), "a");
}

#[tokio::test]
async fn save_is_skipped_when_invalid() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer { text: "b".to_owned(), valid: false };
    let handler = MockHandler::new(vec![]);

    assert!(saveable.save(&mut buffer, &handler, false).await.is_none());
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn dropping_save_future_clears_saving() {
    let mut saveable = Saveable::new("a".to_owned());
    let mut buffer = Buffer::new("b");

    let result = tokio::time::timeout(Duration::from_millis(10), saveable.save(&mut buffer, &PendingHandler, false)).await;
    assert!(result.is_err());
    assert!(!saveable.is_saving());
    assert_eq!(saveable.baseline(), "a");
}
