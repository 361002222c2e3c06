//! Foreground coordination of background tasks.
//!
//! The [`Coordinator`] owns the session (bearer token, current product list) and is the
//! only writer to it. Worker threads get read-only snapshots and talk back through an
//! [`Event`] channel that the foreground drains with `poll` or `next_event`.
pub mod coordinator;
pub mod events;

pub use coordinator::Coordinator;
pub use events::{Event, LogEntry, Reporter, TaskKind};
