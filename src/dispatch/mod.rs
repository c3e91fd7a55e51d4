//! Event dispatch.
//!
//! Handlers are keyed by event and ordered by sequence in a
//! [`HandlerTable`]. [`dispatch`] runs one message through the table
//! against the active state, applying transitions as handlers request them.

mod dispatcher;
pub mod handler;
mod table;

pub use dispatcher::{dispatch, DispatchReport};
pub use handler::{Handler, HandlerEntry, Scope, Sequence};
pub use table::HandlerTable;
