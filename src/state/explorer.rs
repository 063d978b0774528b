//! Explorer view session: which table is browsed and the record creator.
//!
//! Both are connection-scoped and dropped when the connection goes away or
//! a different database is activated.

use serde_json::Value;

use crate::events::ConnectionEvent;

/// Record creator drawer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatorState {
    pub open: bool,
    pub table: Option<String>,
    /// Prefilled content.
    pub content: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExplorerSession {
    active_table: Option<String>,
    creator: CreatorState,
    /// Stored per connection; the list is forced visible without a table.
    table_list_pref: bool,
}

impl Default for ExplorerSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ExplorerSession {
    #[must_use]
    pub fn new(table_list_pref: bool) -> Self {
        Self { active_table: None, creator: CreatorState::default(), table_list_pref }
    }

    #[must_use]
    pub fn active_table(&self) -> Option<&str> {
        self.active_table.as_deref()
    }

    #[must_use]
    pub fn creator(&self) -> &CreatorState {
        &self.creator
    }

    #[must_use]
    pub fn show_table_list(&self) -> bool {
        self.table_list_pref || self.active_table.is_none()
    }

    /// The table list can only be closed once a table is selected.
    #[must_use]
    pub fn can_close_table_list(&self) -> bool {
        self.active_table.is_some()
    }

    pub fn select_table(&mut self, table: impl Into<String>) {
        self.active_table = Some(table.into());
    }

    /// Handle an `explore-table` intent from elsewhere in the app.
    pub fn explore_table(&mut self, table: impl Into<String>) {
        let table = table.into();
        tracing::debug!(%table, "explore table intent");
        self.select_table(table);
    }

    /// Open the creator for `table`, falling back to the active table.
    pub fn open_creator(&mut self, table: Option<&str>, content: Option<Value>) {
        let table = table.filter(|t| !t.is_empty()).map(str::to_owned).or_else(|| self.active_table.clone());
        self.creator = CreatorState { open: true, table, content };
    }

    pub fn close_creator(&mut self) {
        self.creator.open = false;
    }

    pub fn close_table_list(&mut self) {
        self.table_list_pref = false;
    }

    pub fn open_table_list(&mut self) {
        self.table_list_pref = true;
    }

    pub fn handle_event(&mut self, event: ConnectionEvent) {
        tracing::debug!(?event, "resetting explorer");
        self.creator.open = false;
        self.active_table = None;
    }
}

#[cfg(test)]
#[path = "explorer_test.rs"]
mod tests;
