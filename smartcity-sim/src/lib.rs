//! Deterministic journey simulation.
//!
//! A [`JourneySimulator`] advances an explicit [`JourneyState`] one tick at a
//! time; an [`EventFactory`] turns each tick into the four telemetry records.
//! Both draw from their own seeded generators, so a seed fixes the whole run.
//!
//! ```rust,ignore
//! let route = Route::reference();
//! let mut simulator = JourneySimulator::new(42, SimulatorConfig::default());
//! let mut factory = EventFactory::new(43, "vehicle-car-1", VehicleProfile::default())
//!     .heading(route.heading());
//! let mut state = simulator.start(&route, Utc::now())?;
//!
//! loop {
//!     let (position, timestamp) = simulator.tick(&mut state);
//!     if simulator.has_arrived(&state) {
//!         break;
//!     }
//!     let events = factory.tick(position, timestamp);
//! }
//! ```

#![forbid(unsafe_code)]

mod factory;
mod route;
mod simulator;
mod state;

pub use factory::*;
pub use route::*;
pub use simulator::*;
pub use state::*;
