// SPDX-License-Identifier: AGPL-3.0-only

//! Synchrotron radiation damping and quantum excitation.
//!
//! Each instance applies the radiation of one full turn of an isomagnetic
//! lattice with bending radius ρ, split into `n_kicks` equal sub-kicks:
//!
//!   - U₀ = C_γ β³ E⁴ / ρ (energy lost per turn)
//!   - J_z = 2 + α₀ R / ρ (longitudinal partition number)
//!   - τ_z = 2 E / (J_z U₀) (damping time, turns)
//!   - σ_δ = √(C_q γ² / (J_z ρ)) (equilibrium relative energy spread)
//!
//! The map tracked at turn `n` follows the RF map that already moved the
//! beam to turn `n + 1`, so it reads program index `n + 1`. The constants
//! are recomputed only when that program energy changes; the optional beam
//! shift is re-evaluated every turn against the RF program at that index.
//!
//! Unphysical inputs are not rejected at track time: NaN constants are
//! logged once and propagate into the affected particles.

pub mod kernels;

use std::f64::consts::PI;
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::error::{RadiationError, TrackError};
use crate::kernel::{Executor, Kernel};
use crate::random::{NormalSource, SeededNormal};
use crate::rf::RfStation;
use crate::tracker::kernels::MIN_PARTICLES_PER_TASK;
use crate::tracker::TurnMap;
use kernels::SubKick;

/// Deterministic damping only, or damping plus stochastic excitation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiationMode {
    #[default]
    DampingOnly,
    QuantumExcitation,
}

/// Radiation constants at one program index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RadiationParams {
    /// Program index the constants were evaluated at
    pub index: usize,
    /// Synchronous total energy (eV)
    pub energy: f64,
    /// Energy loss per turn (eV)
    pub u0: f64,
    pub jz: f64,
    /// Damping time (turns)
    pub tau_z: f64,
    /// Equilibrium relative energy spread
    pub sigma_dp: f64,
}

impl RadiationParams {
    #[must_use]
    pub fn compute(rf: &RfStation, bending_radius: f64, index: usize) -> Self {
        let ring = rf.ring();
        let particle = ring.particle;
        let energy = rf.energy()[index];
        let beta = rf.beta()[index];
        let gamma = rf.gamma()[index];
        let u0 = particle.c_gamma() * beta.powi(3) * energy.powi(4) / bending_radius;
        let jz = 2.0 + rf.alpha()[0] * ring.ring_radius / bending_radius;
        Self {
            index,
            energy,
            u0,
            jz,
            tau_z: 2.0 * energy / (jz * u0),
            sigma_dp: (particle.c_q() * gamma * gamma / (jz * bending_radius)).sqrt(),
        }
    }

    /// Equilibrium absolute energy spread (eV).
    #[must_use]
    pub fn sigma_de(&self) -> f64 {
        self.sigma_dp * self.energy
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.u0.is_finite() && self.tau_z.is_finite() && self.sigma_dp.is_finite()
    }
}

/// Builder for [`SynchrotronRadiation`].
pub struct SynchrotronRadiationBuilder {
    rf: Arc<RfStation>,
    bending_radius: f64,
    n_kicks: usize,
    shift_beam: bool,
    mode: RadiationMode,
    kernel: Kernel,
    seed: Option<u64>,
    source: Option<Box<dyn NormalSource>>,
}

impl SynchrotronRadiationBuilder {
    #[must_use]
    pub const fn n_kicks(mut self, n_kicks: usize) -> Self {
        self.n_kicks = n_kicks;
        self
    }

    /// Displace the bunch onto the synchronous phase that compensates U₀.
    #[must_use]
    pub const fn shift_beam(mut self, shift: bool) -> Self {
        self.shift_beam = shift;
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: RadiationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn quantum_excitation(self, enabled: bool) -> Self {
        self.mode(if enabled {
            RadiationMode::QuantumExcitation
        } else {
            RadiationMode::DampingOnly
        })
    }

    #[must_use]
    pub const fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Seed of the default ChaCha normal source. Without one the source is
    /// seeded from OS entropy.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the default normal source. Overrides [`Self::seed`].
    #[must_use]
    pub fn normal_source(mut self, source: Box<dyn NormalSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate, evaluate the program-start constants and attach to `beam`.
    ///
    /// With `shift_beam` the bunch is displaced here.
    ///
    /// # Errors
    /// [`RadiationError`] for zero sub-kicks or a bad bending radius,
    /// [`crate::error::KernelError`] if the thread pool cannot be built.
    pub fn build(self, beam: &mut Beam) -> Result<SynchrotronRadiation, TrackError> {
        if self.n_kicks == 0 {
            return Err(RadiationError::NoKicks.into());
        }
        if !(self.bending_radius > 0.0 && self.bending_radius.is_finite()) {
            return Err(RadiationError::InvalidBendingRadius(self.bending_radius).into());
        }
        let executor = Executor::new(self.kernel)?;
        let source = match (self.source, self.seed) {
            (Some(source), _) => source,
            (None, Some(seed)) => Box::new(SeededNormal::new(seed)),
            (None, None) => Box::new(SeededNormal::from_entropy()),
        };

        let params = RadiationParams::compute(&self.rf, self.bending_radius, 0);
        debug!(
            "synchrotron radiation: rho = {} m, U0 = {:.6e} eV, Jz = {:.6}, \
             tau_z = {:.4} turns, sigma_dE = {:.6e} eV",
            self.bending_radius,
            params.u0,
            params.jz,
            params.tau_z,
            params.sigma_de()
        );

        let mut sr = SynchrotronRadiation {
            rf: self.rf,
            bending_radius: self.bending_radius,
            n_kicks: self.n_kicks,
            shift_beam: self.shift_beam,
            mode: self.mode,
            kernel: self.kernel,
            executor,
            source,
            params,
            displacement: 0.0,
            noise: Vec::new(),
            warned_nonfinite: false,
        };
        sr.check_finite();
        if sr.shift_beam {
            sr.apply_displacement(beam, 0);
        }
        Ok(sr)
    }
}

/// Radiation map for one bending location.
pub struct SynchrotronRadiation {
    rf: Arc<RfStation>,
    bending_radius: f64,
    n_kicks: usize,
    shift_beam: bool,
    mode: RadiationMode,
    kernel: Kernel,
    executor: Executor,
    source: Box<dyn NormalSource>,
    params: RadiationParams,
    /// Time displacement currently applied to the bunch (s)
    displacement: f64,
    noise: Vec<f64>,
    warned_nonfinite: bool,
}

impl std::fmt::Debug for SynchrotronRadiation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynchrotronRadiation")
            .field("bending_radius", &self.bending_radius)
            .field("n_kicks", &self.n_kicks)
            .field("shift_beam", &self.shift_beam)
            .field("mode", &self.mode)
            .field("kernel", &self.kernel)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl SynchrotronRadiation {
    /// Start building radiation for the section of `rf`.
    ///
    /// Defaults: one sub-kick, no beam shift, damping only, reference kernel.
    #[must_use]
    pub fn builder(rf: Arc<RfStation>, bending_radius: f64) -> SynchrotronRadiationBuilder {
        SynchrotronRadiationBuilder {
            rf,
            bending_radius,
            n_kicks: 1,
            shift_beam: false,
            mode: RadiationMode::default(),
            kernel: Kernel::default(),
            seed: None,
            source: None,
        }
    }

    #[must_use]
    pub const fn params(&self) -> &RadiationParams {
        &self.params
    }

    #[must_use]
    pub const fn mode(&self) -> RadiationMode {
        self.mode
    }

    #[must_use]
    pub const fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[must_use]
    pub const fn n_kicks(&self) -> usize {
        self.n_kicks
    }

    /// Time displacement applied to the bunch so far (s).
    #[must_use]
    pub const fn displacement(&self) -> f64 {
        self.displacement
    }

    /// Bunch displacement matching the current constants and the RF
    /// program at `index`: |arcsin(U₀ / qV₀)| · t_rf / 2π.
    fn target_displacement(&self, index: usize) -> f64 {
        let rf = &*self.rf;
        let qv = rf.charge * rf.voltage[0][index];
        (self.params.u0 / qv).asin().abs() * rf.t_rf[0][index] / (2.0 * PI)
    }

    fn apply_displacement(&mut self, beam: &mut Beam, index: usize) {
        let target = self.target_displacement(index);
        let current = self.displacement;
        if target.to_bits() == current.to_bits() || (target.is_nan() && current.is_nan()) {
            return;
        }
        if !target.is_finite() {
            warn!(
                "synchrotron radiation: U0 = {:.4e} eV exceeds the main RF voltage, \
                 beam shift is NaN",
                self.params.u0
            );
        }
        let step = target - current;
        for t in &mut beam.dt {
            *t -= step;
        }
        self.displacement = target;
    }

    fn check_finite(&mut self) {
        if !self.params.is_finite() && !self.warned_nonfinite {
            warn!(
                "synchrotron radiation: non-finite constants at index {} \
                 (U0 = {}, tau_z = {}, sigma = {})",
                self.params.index, self.params.u0, self.params.tau_z, self.params.sigma_dp
            );
            self.warned_nonfinite = true;
        }
    }

    fn update_params(&mut self, index: usize) {
        let energy = self.rf.energy()[index];
        if energy.to_bits() == self.params.energy.to_bits() {
            return;
        }
        self.params = RadiationParams::compute(&self.rf, self.bending_radius, index);
        debug!(
            "synchrotron radiation: index {index}, U0 = {:.6e} eV, tau_z = {:.4} turns",
            self.params.u0, self.params.tau_z
        );
        self.check_finite();
    }

    fn sub_kick(&self) -> SubKick {
        SubKick {
            tau_z: self.params.tau_z,
            u0: self.params.u0,
            sigma_dp: self.params.sigma_dp,
            energy: self.params.energy,
            n_kicks: self.n_kicks,
        }
    }
}

impl TurnMap for SynchrotronRadiation {
    fn track(&mut self, beam: &mut Beam, turn: usize) {
        let index = (turn + 1).min(self.rf.n_turns());
        self.update_params(index);
        if self.shift_beam {
            self.apply_displacement(beam, index);
        }
        let p = self.sub_kick();
        let de = &mut beam.de;
        match (self.kernel, self.mode) {
            (Kernel::Reference, RadiationMode::DampingOnly) => kernels::damping_reference(de, &p),
            (Kernel::Reference, RadiationMode::QuantumExcitation) => {
                kernels::excitation_reference(de, &p, self.source.as_mut());
            }
            (Kernel::Optimized(_), RadiationMode::DampingOnly) => {
                self.executor.install(|| kernels::damping_optimized(de, &p));
            }
            (Kernel::Optimized(_), RadiationMode::QuantumExcitation) => {
                let (source, noise) = (self.source.as_mut(), &mut self.noise);
                // Draws stay sequential; only the update is parallel
                self.executor
                    .install(|| kernels::excitation_optimized(de, &p, source, noise));
            }
        }
    }
}

/// Mean energy offset of alive particles, in units of U₀.
///
/// Diagnostic used by the driver binaries.
#[must_use]
pub fn mean_offset_in_losses(beam: &Beam, params: &RadiationParams) -> f64 {
    let alive = beam.alive();
    let (sum, n) = beam
        .de
        .par_iter()
        .zip(alive.par_iter())
        .filter(|(_, &a)| a)
        .map(|(&e, _)| (e, 1usize))
        .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
    sum / n as f64 / params.u0
}
