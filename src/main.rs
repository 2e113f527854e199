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

use std::sync::Arc;
use std::thread;
use std::time::Instant;
use traffic_light::logging::init_logging;
use traffic_light::{Phase, TrafficLight, TrafficLightError};

const VEHICLES: usize = 4;
const CROSSINGS_PER_VEHICLE: usize = 2;

/// A vehicle approaching the intersection `crossings` times. Each time it
/// stops at the light and drives on once it shows green.
fn drive(id: usize, light: &TrafficLight, crossings: usize) {
    for round in 1..=crossings {
        let arrived = Instant::now();
        tracing::info!(vehicle = id, round, phase = %light.current_phase(), "waiting at intersection");

        // A stale green from the backlog doesn't let anyone through.
        loop {
            light.wait_for_green();
            if light.current_phase() == Phase::Green {
                break;
            }
            tracing::debug!(vehicle = id, round, "released by stale green, still red");
        }

        tracing::info!(
            vehicle = id,
            round,
            waited_ms = arrived.elapsed().as_millis(),
            "crossing intersection"
        );
    }
}

fn main() -> Result<(), TrafficLightError> {
    init_logging(1);

    let light = Arc::new(TrafficLight::new());
    light.simulate()?;

    let vehicles = (0..VEHICLES)
        .map(|id| {
            let light = light.clone();
            thread::spawn(move || drive(id, &light, CROSSINGS_PER_VEHICLE))
        })
        .collect::<Vec<_>>();

    for vehicle in vehicles {
        if vehicle.join().is_err() {
            tracing::error!("vehicle thread panicked");
        }
    }

    light.stop()
}
