//! Query transport.
//!
//! SYSTEM CONTEXT
//! ==============
//! The inspector never talks to the database directly. It hands a
//! [`queries::QueryBatch`] to a [`QueryExecutor`] and gets one response per
//! statement back. `RpcExecutor` is the HTTP implementation; tests supply
//! in-memory executors.

pub mod executor;
pub mod rpc;

pub use executor::{QueryExecutor, TransportError};
pub use rpc::RpcExecutor;
