// SPDX-License-Identifier: AGPL-3.0-only

//! longitrack: longitudinal multi-turn beam tracking in synchrotrons
//!
//! Macro-particles are tracked turn by turn through an ordered sequence of
//! maps: RF kick-drift per ring section, synchrotron-radiation damping with
//! optional quantum excitation, and a time profile. Every elementwise map
//! ships a reference kernel and an optimized rayon kernel that must agree
//! within the bounds in [`tolerances`].
//!
//! ## Modules
//!   - `ring`: particle species, synchronous-data programs, ring model
//!   - `rf`: per-turn RF station of one section
//!   - `beam`: macro-particle ensemble, statistics, bi-Gaussian generator
//!   - `tracker`: `TurnMap`, kick-drift tracker, turn sequence driver
//!   - `synchrotron_radiation`: radiation map with two kernels
//!   - `profile`: time histogram map
//!   - `random`, `kernel`: injectable normal source, kernel selection
//!   - `config`: JSON simulation configuration and presets
//!   - `parity`: paired reference/optimized radiation runs
//!   - `validation`, `tolerances`: pass/fail harness and parity bounds
//!
//! ## Validation binaries
//!   - `validate_ring`: ring model construction and conversion properties
//!   - `validate_kernel_parity`: reference vs optimized radiation kernels
//!   - `track_ring`: run a configured simulation and log beam statistics

pub mod beam;
pub mod config;
pub mod constants;
pub mod error;
pub mod kernel;
pub mod parity;
pub mod profile;
pub mod random;
pub mod rf;
pub mod ring;
pub mod synchrotron_radiation;
pub mod tolerances;
pub mod tracker;
pub mod validation;

pub use beam::{Beam, BeamStatistics};
pub use config::{Simulation, SimulationConfig};
pub use error::TrackError;
pub use kernel::{Kernel, Parallelism};
pub use rf::RfStation;
pub use ring::{Particle, Ring};
pub use synchrotron_radiation::{RadiationMode, SynchrotronRadiation};
pub use tracker::sequence::{TrackingMap, TurnSequence};
pub use tracker::{RingAndRfTracker, TurnMap};
