// SPDX-License-Identifier: AGPL-3.0-only

//! Ring model: machine layout and synchronous energy program.
//!
//! Built once per simulation and immutable afterwards. All derived
//! quantities are stored `[section][turn]` with `n_turns + 1` turn entries
//! (index 0 is injection).
//!
//! | Quantity | Relation |
//! |----------|----------|
//! | β | 1/√(1 + (m/p)²) |
//! | γ | √(1 + (p/m)²) |
//! | E | √(p² + m²) |
//! | `t_rev` | Σ_s L_s / (β_s c) |
//! | η₀ | α₀ − 1/γ² |

pub mod particle;
pub mod program;

use log::debug;

use crate::constants::C_LIGHT;
use crate::error::RingError;

pub use particle::Particle;
pub use program::{to_momentum, DataType, SynchronousData, SynchronousProgram};

/// Highest momentum-compaction expansion order modelled.
pub const MAX_ALPHA_ORDER: usize = 2;

/// Immutable ring model.
#[derive(Clone, Debug)]
pub struct Ring {
    /// Number of turns tracked
    pub n_turns: usize,
    /// Number of ring sections
    pub n_sections: usize,
    /// Section lengths (m)
    pub ring_length: Vec<f64>,
    /// Total circumference (m)
    pub ring_circumference: f64,
    /// Average radius C / 2π (m)
    pub ring_radius: f64,
    /// Momentum-compaction expansion order (0..=2)
    pub alpha_order: usize,
    /// α₀, α₁, α₂ per section; orders above `alpha_order` are zero
    pub alpha: Vec<[f64; 3]>,
    /// Particle species
    pub particle: Particle,
    /// Synchronous momentum (eV) `[section][turn]`
    pub momentum: Vec<Vec<f64>>,
    /// Relativistic β `[section][turn]`
    pub beta: Vec<Vec<f64>>,
    /// Relativistic γ `[section][turn]`
    pub gamma: Vec<Vec<f64>>,
    /// Total energy (eV) `[section][turn]`
    pub energy: Vec<Vec<f64>>,
    /// Kinetic energy (eV) `[section][turn]`
    pub kin_energy: Vec<Vec<f64>>,
    /// Energy gain per turn E[t+1] − E[t] (eV) `[section][turn]`, `n_turns` entries
    pub delta_e: Vec<Vec<f64>>,
    /// Slip factor orders 0, 1, 2 `[section][turn]`
    pub eta_0: Vec<Vec<f64>>,
    pub eta_1: Vec<Vec<f64>>,
    pub eta_2: Vec<Vec<f64>>,
    /// Revolution period (s) per turn
    pub t_rev: Vec<f64>,
    /// Revolution frequency (Hz) per turn
    pub f_rev: Vec<f64>,
    /// Angular revolution frequency (rad/s) per turn
    pub omega_rev: Vec<f64>,
    /// Cumulative time at the end of each turn (s); `cycle_time[0] == t_rev[0]`
    pub cycle_time: Vec<f64>,
}

impl Ring {
    /// Build and validate a ring.
    ///
    /// `alpha[s]` holds the momentum-compaction coefficients of section `s`
    /// starting at α₀; at least `alpha_order + 1` are required.
    ///
    /// # Errors
    /// Returns the [`RingError`] naming the first shape invariant violated.
    pub fn new(
        n_turns: usize,
        ring_length: Vec<f64>,
        alpha: Vec<Vec<f64>>,
        synchronous_data: &SynchronousData,
        particle: Particle,
        n_sections: usize,
        alpha_order: usize,
    ) -> Result<Self, RingError> {
        if n_turns == 0 {
            return Err(RingError::NoTurns);
        }
        if n_sections == 0 {
            return Err(RingError::NoSections);
        }
        if ring_length.len() != n_sections {
            return Err(RingError::RingLengthMismatch {
                n_sections,
                n_lengths: ring_length.len(),
            });
        }
        if alpha.len() != n_sections {
            return Err(RingError::AlphaSectionMismatch {
                n_sections,
                n_alpha: alpha.len(),
            });
        }
        if alpha_order > MAX_ALPHA_ORDER {
            return Err(RingError::UnsupportedAlphaOrder(alpha_order));
        }
        let mut alpha_fixed = Vec::with_capacity(n_sections);
        for (section, coeffs) in alpha.iter().enumerate() {
            if coeffs.len() < alpha_order + 1 {
                return Err(RingError::AlphaOrderMismatch {
                    section,
                    alpha_order,
                    found: coeffs.len(),
                });
            }
            let mut a = [0.0; 3];
            a[..=alpha_order].copy_from_slice(&coeffs[..=alpha_order]);
            alpha_fixed.push(a);
        }

        let ring_circumference: f64 = ring_length.iter().sum();
        let mass = particle.mass;
        let momentum =
            synchronous_data.momentum_program(n_turns, n_sections, ring_circumference, mass)?;

        let map2 = |f: &dyn Fn(f64) -> f64| -> Vec<Vec<f64>> {
            momentum
                .iter()
                .map(|row| row.iter().map(|&p| f(p)).collect())
                .collect()
        };
        let beta = map2(&|p| 1.0 / (1.0 + (mass / p).powi(2)).sqrt());
        let gamma = map2(&|p| (1.0 + (p / mass).powi(2)).sqrt());
        let energy = map2(&|p| (p * p + mass * mass).sqrt());
        let kin_energy: Vec<Vec<f64>> = energy
            .iter()
            .map(|row| row.iter().map(|&e| e - mass).collect())
            .collect();
        let delta_e: Vec<Vec<f64>> = energy
            .iter()
            .map(|row| row.windows(2).map(|w| w[1] - w[0]).collect())
            .collect();

        let t_rev: Vec<f64> = (0..=n_turns)
            .map(|turn| {
                ring_length
                    .iter()
                    .zip(&beta)
                    .map(|(l, b)| l / (b[turn] * C_LIGHT))
                    .sum()
            })
            .collect();
        let f_rev: Vec<f64> = t_rev.iter().map(|t| 1.0 / t).collect();
        let omega_rev: Vec<f64> = f_rev
            .iter()
            .map(|f| 2.0 * std::f64::consts::PI * f)
            .collect();
        let cycle_time: Vec<f64> = t_rev
            .iter()
            .scan(0.0, |acc, &t| {
                *acc += t;
                Some(*acc)
            })
            .collect();

        let (eta_0, eta_1, eta_2) = slip_factors(&alpha_fixed, alpha_order, &beta, &gamma);

        debug!(
            "ring: {n_sections} section(s), C = {ring_circumference:.4} m, {n_turns} turns, \
             E0 = {:.6e} eV, t_rev0 = {:.6e} s",
            energy[0][0], t_rev[0]
        );

        Ok(Self {
            n_turns,
            n_sections,
            ring_length,
            ring_circumference,
            ring_radius: ring_circumference / (2.0 * std::f64::consts::PI),
            alpha_order,
            alpha: alpha_fixed,
            particle,
            momentum,
            beta,
            gamma,
            energy,
            kin_energy,
            delta_e,
            eta_0,
            eta_1,
            eta_2,
            t_rev,
            f_rev,
            omega_rev,
            cycle_time,
        })
    }

    /// Single-section ring with only α₀.
    ///
    /// # Errors
    /// See [`Ring::new`].
    pub fn single_section(
        n_turns: usize,
        circumference: f64,
        alpha_0: f64,
        synchronous_data: &SynchronousData,
        particle: Particle,
    ) -> Result<Self, RingError> {
        Self::new(
            n_turns,
            vec![circumference],
            vec![vec![alpha_0]],
            synchronous_data,
            particle,
            1,
            0,
        )
    }

    /// Convert a value given under a representation label to momentum (eV).
    ///
    /// Unphysical values yield NaN rather than an error; only an unknown
    /// label is rejected.
    ///
    /// # Errors
    /// [`RingError::UnknownDataType`] for an unrecognized label.
    pub fn convert_data(&self, value: f64, label: &str) -> Result<f64, RingError> {
        let data_type: DataType = label.parse()?;
        Ok(to_momentum(value, data_type, self.particle.mass))
    }

    /// Elementwise [`Ring::convert_data`] over a program.
    #[must_use]
    pub fn convert_program(&self, values: &[f64], data_type: DataType) -> Vec<f64> {
        values
            .iter()
            .map(|&v| to_momentum(v, data_type, self.particle.mass))
            .collect()
    }
}

type SlipFactors = (Vec<Vec<f64>>, Vec<Vec<f64>>, Vec<Vec<f64>>);

fn slip_factors(
    alpha: &[[f64; 3]],
    alpha_order: usize,
    beta: &[Vec<f64>],
    gamma: &[Vec<f64>],
) -> SlipFactors {
    let mut eta_0 = Vec::with_capacity(alpha.len());
    let mut eta_1 = Vec::with_capacity(alpha.len());
    let mut eta_2 = Vec::with_capacity(alpha.len());

    for ((a, b_row), g_row) in alpha.iter().zip(beta).zip(gamma) {
        let [a0, a1, a2] = *a;
        let mut e0 = Vec::with_capacity(b_row.len());
        let mut e1 = Vec::with_capacity(b_row.len());
        let mut e2 = Vec::with_capacity(b_row.len());
        for (&b, &g) in b_row.iter().zip(g_row) {
            let inv_g2 = 1.0 / (g * g);
            let b2 = b * b;
            let n0 = a0 - inv_g2;
            e0.push(n0);
            e1.push(if alpha_order >= 1 {
                1.5 * b2 * inv_g2 + a1 - a0 * n0
            } else {
                0.0
            });
            e2.push(if alpha_order >= 2 {
                -b2 * (5.0 * b2 - 1.0) * 0.5 * inv_g2 + a2 - 2.0 * a0 * a1
                    + a1 * inv_g2
                    + a0 * a0 * n0
                    - 1.5 * b2 * a0 * inv_g2
            } else {
                0.0
            });
        }
        eta_0.push(e0);
        eta_1.push(e1);
        eta_2.push(e2);
    }
    (eta_0, eta_1, eta_2)
}
