// Application layer - Pipeline stages and job orchestration

pub mod acquirer;
pub mod container;
pub mod job_coordinator;
pub mod trimmer;

// Re-export interactors
pub use acquirer::{AcquiredMedia, Acquirer};
pub use container::{AppContainer, DefaultAppContainer};
pub use job_coordinator::{JobCoordinator, JobSettings};
pub use trimmer::{TrimmedMedia, Trimmer};
