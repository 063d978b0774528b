//! Lifecycle events consumed by the inspector and notifications it produces.

use crate::state::record::RecordReference;

/// Buffer size of the inspector notification channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Connection lifecycle events. Both reset the inspector and explorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Disconnected,
    ActiveDatabaseChanged,
}

/// Notifications for sibling panes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InspectorEvent {
    /// A record was saved or deleted; record lists should re-query.
    RecordsChanged { reference: RecordReference },
    /// The drawer closed.
    Closed,
}
