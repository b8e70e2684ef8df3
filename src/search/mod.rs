//! Search module
//!
//! Classifies a spoken query into a fixed set of intents and synthesizes
//! canned result records for it. There is no real search backend; the
//! service only simulates network latency before answering.

mod classifier;
mod record;
mod service;

pub use record::{ResultKind, ResultRecord};
pub use service::{error_result, SearchService};
