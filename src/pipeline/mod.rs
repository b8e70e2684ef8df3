//! Voice-capture-to-result pipeline
//!
//! A single actor task owns the session store, the capture controller and
//! the query session. Everything that mutates them arrives as a message:
//! client commands, recognizer events, and finished searches. Searches
//! themselves run as separate tasks so a slow query never blocks capture.

mod actor;
mod handle;
mod query;

pub use actor::{Pipeline, Snapshot};
pub use handle::PipelineHandle;
