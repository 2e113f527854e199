#![deny(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::must_use_candidate,
    clippy::perf
    // clippy::restriction,
    // clippy::pedantic
)]
// now allow a few rules which are denied by the above statement
// --> they are ridiculous and not necessary
#![allow(
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::fallible_impl_from
)]
#![deny(missing_debug_implementations)]

pub mod error;
pub mod interval;
pub mod logging;
pub mod message_queue;
pub mod phase;
pub mod synchronization;
mod toggle_loop;
pub mod traffic_light;

pub use error::TrafficLightError;
pub use interval::{IntervalSource, RandomInterval};
pub use message_queue::MessageQueue;
pub use phase::Phase;
pub use traffic_light::TrafficLight;

/// Why a sleep on a [`StopSignal`] ended.
///
/// [`StopSignal`]: synchronization::StopSignal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupReason {
    /// The deadline passed.
    Timeout,
    /// The signal was raised before the deadline.
    Stopped,
}
