//! recordscope: view, navigate, edit, and delete individual database
//! records.
//!
//! ARCHITECTURE
//! ============
//! - `state`: navigation history, the `Saveable` dirty-state controller,
//!   record references and the explorer session.
//! - `util`: drawer resize controller, value formatting, save box model.
//! - `net`: the `QueryExecutor` seam and its HTTP JSON-RPC implementation.
//! - `inspector`: the record inspector state machine and its async driver.
//!
//! Statement text and the RPC envelope live in the `queries` crate.

pub mod config;
pub mod confirm;
pub mod error;
pub mod events;
pub mod inspector;
pub mod net;
pub mod state;
pub mod util;
