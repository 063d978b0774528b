//! Inspector state: navigation, dirty tracking, and record view models.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything here is synchronous and transport-agnostic. The inspector
//! composes these pieces; the async session drives them over the network.

pub mod explorer;
pub mod history;
pub mod record;
pub mod saveable;
