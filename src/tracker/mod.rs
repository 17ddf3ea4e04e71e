// SPDX-License-Identifier: AGPL-3.0-only

//! Per-turn maps and the RF kick-drift tracker.
//!
//! Every map implements [`TurnMap`]: one in-place update of the beam for a
//! given turn. A ring with several sections runs one [`RingAndRfTracker`]
//! per section; the order of maps within a turn belongs to the caller
//! (see [`sequence::TurnSequence`]).

pub mod kernels;
pub mod sequence;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::error::KernelError;
use crate::kernel::{Executor, Kernel};
use crate::rf::RfStation;

pub use kernels::DriftSolver;
use kernels::{DriftCoefficients, KickCoefficients};

/// One ordered step of the turn loop.
pub trait TurnMap: Send {
    /// Advance `beam` through this map at `turn`.
    fn track(&mut self, beam: &mut Beam, turn: usize);
}

/// Which halves of the kick-drift map run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStep {
    #[default]
    KickDrift,
    KickOnly,
    DriftOnly,
}

/// RF kick followed by the drift to the next section.
#[derive(Debug)]
pub struct RingAndRfTracker {
    rf: Arc<RfStation>,
    solver: DriftSolver,
    step: TrackerStep,
    kernel: Kernel,
    executor: Executor,
}

impl RingAndRfTracker {
    /// Kick-drift tracker with the simple drift solver.
    ///
    /// # Errors
    /// [`KernelError`] if a dedicated thread pool cannot be built.
    pub fn new(rf: Arc<RfStation>, kernel: Kernel) -> Result<Self, KernelError> {
        Ok(Self {
            rf,
            solver: DriftSolver::default(),
            step: TrackerStep::default(),
            kernel,
            executor: Executor::new(kernel)?,
        })
    }

    #[must_use]
    pub const fn with_solver(mut self, solver: DriftSolver) -> Self {
        self.solver = solver;
        self
    }

    #[must_use]
    pub const fn with_step(mut self, step: TrackerStep) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn rf(&self) -> &RfStation {
        &self.rf
    }

    #[must_use]
    pub const fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[must_use]
    pub const fn solver(&self) -> DriftSolver {
        self.solver
    }

    /// Kick coefficients at `turn`.
    #[must_use]
    pub fn kick_coefficients(&self, turn: usize) -> KickCoefficients {
        let rf = &*self.rf;
        KickCoefficients {
            voltage: rf.voltage.iter().map(|v| rf.charge * v[turn]).collect(),
            omega_rf: rf.omega_rf.iter().map(|w| w[turn]).collect(),
            phi_rf: rf.phi_rf.iter().map(|p| p[turn]).collect(),
            acceleration: rf.delta_e()[turn],
        }
    }

    /// Drift coefficients for the drift that ends `turn`.
    ///
    /// The particle arrives at the next station with turn `turn + 1`
    /// quantities.
    #[must_use]
    pub fn drift_coefficients(&self, turn: usize) -> DriftCoefficients {
        let rf = &*self.rf;
        let next = turn + 1;
        DriftCoefficients {
            solver: self.solver,
            period: rf.t_rev()[next] * rf.length_ratio,
            beta: rf.beta()[next],
            energy: rf.energy()[next],
            eta: [rf.eta_0()[next], rf.eta_1()[next], rf.eta_2()[next]],
            alpha: rf.alpha(),
        }
    }

    /// RF kick at `turn`.
    pub fn kick(&self, beam: &mut Beam, turn: usize) {
        let c = self.kick_coefficients(turn);
        match self.kernel {
            Kernel::Reference => kernels::kick_reference(&beam.dt, &mut beam.de, &c),
            Kernel::Optimized(_) => {
                let (dt, de) = (&beam.dt, &mut beam.de);
                self.executor.install(|| kernels::kick_optimized(dt, de, &c));
            }
        }
    }

    /// Drift over the section at `turn`.
    pub fn drift(&self, beam: &mut Beam, turn: usize) {
        let c = self.drift_coefficients(turn);
        match self.kernel {
            Kernel::Reference => kernels::drift_reference(&mut beam.dt, &beam.de, &c),
            Kernel::Optimized(_) => {
                let (dt, de) = (&mut beam.dt, &beam.de);
                self.executor.install(|| kernels::drift_optimized(dt, de, &c));
            }
        }
    }
}

impl TurnMap for RingAndRfTracker {
    /// # Panics
    /// If `turn` is not below the ring's programmed turn count. Debug builds
    /// name the turn and the program length.
    fn track(&mut self, beam: &mut Beam, turn: usize) {
        debug_assert!(
            turn < self.rf.n_turns(),
            "kick-drift map tracked at turn {turn} past the {}-turn program",
            self.rf.n_turns()
        );
        match self.step {
            TrackerStep::KickDrift => {
                self.kick(beam, turn);
                self.drift(beam, turn);
            }
            TrackerStep::KickOnly => self.kick(beam, turn),
            TrackerStep::DriftOnly => self.drift(beam, turn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{DataType, Particle, Ring, SynchronousData, SynchronousProgram};

    fn station(n_turns: usize) -> Arc<RfStation> {
        let ring = Ring::single_section(
            n_turns,
            110.4,
            0.0082,
            &SynchronousData::new(DataType::TotalEnergy, SynchronousProgram::Constant(2.5e9)),
            Particle::positron(),
        )
        .expect("ring");
        Arc::new(RfStation::single(Arc::new(ring), 184.0, 800e3, 0.0, 0).expect("rf"))
    }

    #[test]
    fn synchronous_particle_is_fixed_point() {
        let rf = station(10);
        let t_s = rf.phi_s[0] / rf.omega_rf[0][0];
        let mut beam = Beam::from_coordinates(vec![t_s], vec![0.0], 1e9).expect("beam");
        let mut tracker = RingAndRfTracker::new(rf, Kernel::Reference).expect("tracker");
        for turn in 0..10 {
            tracker.track(&mut beam, turn);
        }
        assert!((beam.dt[0] - t_s).abs() < 1e-20);
        assert!(beam.de[0].abs() < 1e-6);
    }

    #[test]
    fn kick_only_leaves_time_untouched() {
        let rf = station(2);
        let mut beam = Beam::from_coordinates(vec![0.9e-9], vec![1e5], 1e9).expect("beam");
        let mut tracker = RingAndRfTracker::new(rf, Kernel::Reference)
            .expect("tracker")
            .with_step(TrackerStep::KickOnly);
        tracker.track(&mut beam, 0);
        assert_eq!(beam.dt[0], 0.9e-9);
        assert!((beam.de[0] - 1e5).abs() > 1.0);
    }

    #[test]
    fn drift_only_leaves_energy_untouched() {
        let rf = station(2);
        let mut beam = Beam::from_coordinates(vec![0.9e-9], vec![1e5], 1e9).expect("beam");
        let mut tracker = RingAndRfTracker::new(rf, Kernel::Reference)
            .expect("tracker")
            .with_step(TrackerStep::DriftOnly);
        tracker.track(&mut beam, 0);
        assert_eq!(beam.de[0], 1e5);
        // Above transition a positive energy offset arrives later
        assert!(beam.dt[0] > 0.9e-9);
    }

    #[test]
    fn small_oscillation_follows_synchrotron_tune() {
        let rf = station(200);
        let t_s = rf.phi_s[0] / rf.omega_rf[0][0];
        let q_s = rf.q_s[0];
        let mut beam = Beam::from_coordinates(vec![t_s + 1e-12], vec![0.0], 1e9).expect("beam");
        let mut tracker =
            RingAndRfTracker::new(Arc::clone(&rf), Kernel::Reference).expect("tracker");
        let mut crossings = 0;
        let mut last = beam.dt[0] - t_s;
        for turn in 0..200 {
            tracker.track(&mut beam, turn);
            let x = beam.dt[0] - t_s;
            if x.signum() != last.signum() {
                crossings += 1;
            }
            last = x;
        }
        // Two zero crossings per synchrotron period
        let expected = 2.0 * 200.0 * q_s;
        assert!(
            (f64::from(crossings) - expected).abs() <= 2.0,
            "crossings {crossings}, expected about {expected:.1}"
        );
    }

    #[test]
    fn reference_and_optimized_trackers_agree() {
        let rf = station(20);
        let t_s = rf.phi_s[0] / rf.omega_rf[0][0];
        let n = 3000;
        let dt: Vec<f64> = (0..n).map(|i| t_s + (i as f64 / n as f64 - 0.5) * 4e-11).collect();
        let de: Vec<f64> = (0..n).map(|i| (i as f64 / n as f64 - 0.5) * 1e6).collect();
        let mut a = Beam::from_coordinates(dt.clone(), de.clone(), 1e9).expect("beam");
        let mut b = Beam::from_coordinates(dt, de, 1e9).expect("beam");
        let mut ref_tracker =
            RingAndRfTracker::new(Arc::clone(&rf), Kernel::Reference).expect("ref");
        let mut opt_tracker = RingAndRfTracker::new(rf, Kernel::optimized()).expect("opt");
        for turn in 0..20 {
            ref_tracker.track(&mut a, turn);
            opt_tracker.track(&mut b, turn);
        }
        let sa = a.statistics();
        let sb = b.statistics();
        assert!((sa.mean_dt - sb.mean_dt).abs() / sa.mean_dt.abs() < 1e-12);
        assert!((sa.sigma_de - sb.sigma_de).abs() / sa.sigma_de < 1e-9);
    }

    #[test]
    fn last_programmed_turn_tracks() {
        let rf = station(3);
        let t_s = rf.phi_s[0] / rf.omega_rf[0][0];
        let mut beam = Beam::from_coordinates(vec![t_s], vec![0.0], 1e9).expect("beam");
        let mut tracker = RingAndRfTracker::new(rf, Kernel::Reference).expect("tracker");
        tracker.track(&mut beam, 2);
        assert!(beam.dt[0].is_finite());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "turn 3 past the 3-turn program")]
    fn tracking_past_the_program_names_the_turn() {
        let rf = station(3);
        let mut beam = Beam::from_coordinates(vec![1e-9], vec![0.0], 1e9).expect("beam");
        let mut tracker = RingAndRfTracker::new(rf, Kernel::Reference).expect("tracker");
        tracker.track(&mut beam, 3);
    }
}
