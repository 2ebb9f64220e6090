pub mod collector;
pub use collector::{Collector, CollectorKind};

mod error;
pub use error::CoreError;

pub mod events;

pub mod poll;
pub use poll::{PollConfig, PollLoop, PollState, Termination};

pub mod supervisor;
pub use supervisor::{Supervisor, WorkerExit, WorkerId, WorkerReport};
