// SPDX-License-Identifier: AGPL-3.0-only

//! Particle species: rest energy, charge, and radiation constants.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::{C_LIGHT, E_CHARGE, EPS0, HBAR, M_ELECTRON_EV, M_PROTON_EV};

/// A charged particle species.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Rest energy m c² (eV)
    pub mass: f64,
    /// Charge in units of the elementary charge
    pub charge: f64,
}

impl Particle {
    /// Custom species from rest energy (eV) and charge (e).
    #[must_use]
    pub const fn custom(mass: f64, charge: f64) -> Self {
        Self { mass, charge }
    }

    #[must_use]
    pub const fn electron() -> Self {
        Self::custom(M_ELECTRON_EV, -1.0)
    }

    #[must_use]
    pub const fn positron() -> Self {
        Self::custom(M_ELECTRON_EV, 1.0)
    }

    #[must_use]
    pub const fn proton() -> Self {
        Self::custom(M_PROTON_EV, 1.0)
    }

    /// Classical particle radius (m): q² e² / (4π ε₀ m c²)
    #[must_use]
    pub fn classical_radius(&self) -> f64 {
        0.25 / (PI * EPS0) * E_CHARGE * E_CHARGE * self.charge * self.charge
            / (self.mass * E_CHARGE)
    }

    /// Sands radiation constant C_γ = 4π/3 · r_cl / (m c²)³ in m/eV³.
    ///
    /// Energy radiated per turn in an isomagnetic ring is
    /// U₀ = C_γ β³ E⁴ / ρ.
    #[must_use]
    pub fn c_gamma(&self) -> f64 {
        4.0 * PI / 3.0 * self.classical_radius() / self.mass.powi(3)
    }

    /// Quantum excitation constant C_q = 55/(32√3) · ħc / (m c²) in m.
    #[must_use]
    pub fn c_q(&self) -> f64 {
        55.0 / (32.0 * 3.0_f64.sqrt()) * HBAR * C_LIGHT / (self.mass * E_CHARGE)
    }
}
