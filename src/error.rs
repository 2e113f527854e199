use std::io;

/// Errors of the [`TrafficLight`] lifecycle.
///
/// [`TrafficLight`]: crate::traffic_light::TrafficLight
#[derive(Debug, thiserror::Error)]
pub enum TrafficLightError {
    /// `simulate()` was called on a light that was already started.
    #[error("simulation has already been started")]
    AlreadyStarted,

    /// The OS refused to create the toggle loop thread.
    #[error("failed to spawn toggle loop thread: {0}")]
    Spawn(#[from] io::Error),

    /// The toggle loop thread panicked before it could be stopped.
    #[error("toggle loop thread panicked")]
    LoopPanicked,
}
