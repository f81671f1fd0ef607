use thiserror::Error;

/// Fatal simulation failures. None of these are retried.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The shared particle buffer could not be reserved.
    #[error("cannot allocate particle buffer for {capacity} particles ({bytes} bytes): {reason}")]
    Allocation {
        capacity: u32,
        bytes: u64,
        reason: String,
    },
    /// The parallel update could not be launched.
    #[error("cannot dispatch particle update: {0}")]
    Dispatch(String),
    /// Waiting for the parallel update reported a fault; buffer contents are no longer trusted.
    #[error("particle update failed before synchronization: {0}")]
    Synchronization(String),
}
