//! Background Tasks Module
//!
//! Background dashboard sessions started by page mount and manual refresh.

mod session;

pub use session::{spawn_load, spawn_refresh, SpawnedSession};
