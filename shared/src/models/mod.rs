//! Domain models for the estate irrigation monitor

pub mod observation;
pub mod plot;
pub mod schedule;
pub mod snapshot;
pub mod soil;
pub mod weather;

pub use observation::*;
pub use plot::*;
pub use schedule::*;
pub use snapshot::*;
pub use soil::*;
pub use weather::*;
