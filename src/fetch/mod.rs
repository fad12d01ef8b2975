//! Fetch Module
//!
//! Tiered orchestration of a page's fetch sources over a shared TTL cache.
//!
//! A session runs the Critical tier first, delivers its results, yields, and
//! only then starts the Deferred tier (and Background, when registered).
//! Within a tier sources run concurrently and fail independently.

mod orchestrator;
mod session;
mod source;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use session::{Discard, FetchSession, SessionState, TierReport, TierResults, TierSink};
pub use source::{FetchSource, Fetcher, Tier};
