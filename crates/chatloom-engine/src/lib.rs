//! Turn engine for the chatloom backend.
//!
//! Given a thread and an inbound user message, the engine produces a
//! lazy, ordered sequence of stream events and mirrors every item
//! snapshot into the store at the same points a client observes them, so
//! a concurrent store read reflects exactly what has been streamed so
//! far. Production is cooperative: dropping the consumer stops the
//! producer at its next suspension point.

mod engine;
mod error;
mod scenario;

pub use engine::{EventStream, StreamOptions, TurnEngine};
pub use error::TurnError;
pub use scenario::Scenario;
