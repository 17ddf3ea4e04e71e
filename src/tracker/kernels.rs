// SPDX-License-Identifier: AGPL-3.0-only

//! Elementwise RF kick and drift kernels.
//!
//! Reference kernels are sequential and follow the formulas literally. The
//! optimized kernels fold the per-turn coefficients once, then update
//! particles in parallel. Neither has cross-particle dependencies.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Particles per rayon task; below this the split overhead dominates.
pub const MIN_PARTICLES_PER_TASK: usize = 1024;

/// Slippage model used by the drift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSolver {
    /// First order in δ with η₀ only.
    #[default]
    Simple,
    /// Slip-factor expansion to η₂.
    Legacy,
    /// Exact relativistic path-length relation with α up to second order.
    Exact,
}

/// RF kick coefficients of one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct KickCoefficients {
    /// q·V per RF system (eV)
    pub voltage: Vec<f64>,
    /// ω_rf per RF system (rad/s)
    pub omega_rf: Vec<f64>,
    /// φ_rf per RF system (rad)
    pub phi_rf: Vec<f64>,
    /// Energy gained by the synchronous particle, subtracted from every particle (eV)
    pub acceleration: f64,
}

/// Drift coefficients of one turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftCoefficients {
    pub solver: DriftSolver,
    /// Time spent in the section by the synchronous particle (s)
    pub period: f64,
    pub beta: f64,
    /// Synchronous total energy (eV)
    pub energy: f64,
    pub eta: [f64; 3],
    pub alpha: [f64; 3],
}

pub fn kick_reference(dt: &[f64], de: &mut [f64], c: &KickCoefficients) {
    for k in 0..c.voltage.len() {
        for (e, &t) in de.iter_mut().zip(dt) {
            *e += c.voltage[k] * (c.omega_rf[k] * t + c.phi_rf[k]).sin();
        }
    }
    for e in de.iter_mut() {
        *e -= c.acceleration;
    }
}

pub fn kick_optimized(dt: &[f64], de: &mut [f64], c: &KickCoefficients) {
    let systems: Vec<(f64, f64, f64)> = c
        .voltage
        .iter()
        .zip(&c.omega_rf)
        .zip(&c.phi_rf)
        .map(|((&v, &w), &p)| (v, w, p))
        .collect();
    let acc = c.acceleration;
    de.par_iter_mut()
        .zip(dt.par_iter())
        .with_min_len(MIN_PARTICLES_PER_TASK)
        .for_each(|(e, &t)| {
            let gain: f64 = systems
                .iter()
                .map(|&(v, w, p)| v * w.mul_add(t, p).sin())
                .sum();
            *e += gain - acc;
        });
}

pub fn drift_reference(dt: &mut [f64], de: &[f64], c: &DriftCoefficients) {
    let t = c.period;
    let e0 = c.energy;
    let b2 = c.beta * c.beta;
    let [eta0, eta1, eta2] = c.eta;
    let [a0, a1, a2] = c.alpha;

    match c.solver {
        DriftSolver::Simple => {
            for (x, &e) in dt.iter_mut().zip(de) {
                *x += t * eta0 * e / (b2 * e0);
            }
        }
        DriftSolver::Legacy => {
            for (x, &e) in dt.iter_mut().zip(de) {
                let delta = e / (b2 * e0);
                *x += t
                    * (1.0 / (1.0 - eta0 * delta - eta1 * delta * delta - eta2 * delta.powi(3))
                        - 1.0);
            }
        }
        DriftSolver::Exact => {
            for (x, &e) in dt.iter_mut().zip(de) {
                let r = e / e0;
                let delta = (1.0 + (r * r + 2.0 * r) / b2).sqrt() - 1.0;
                *x += t
                    * ((1.0 + a0 * delta + a1 * delta * delta + a2 * delta.powi(3)) * (1.0 + r)
                        / (1.0 + delta)
                        - 1.0);
            }
        }
    }
}

pub fn drift_optimized(dt: &mut [f64], de: &[f64], c: &DriftCoefficients) {
    let t = c.period;
    let inv_e = 1.0 / c.energy;
    let inv_b2 = 1.0 / (c.beta * c.beta);
    let [eta0, eta1, eta2] = c.eta;
    let [a0, a1, a2] = c.alpha;
    let particles = dt
        .par_iter_mut()
        .zip(de.par_iter())
        .with_min_len(MIN_PARTICLES_PER_TASK);

    match c.solver {
        DriftSolver::Simple => {
            let coeff = t * eta0 * inv_b2 * inv_e;
            particles.for_each(|(x, &e)| *x = coeff.mul_add(e, *x));
        }
        DriftSolver::Legacy => {
            let scale = inv_b2 * inv_e;
            particles.for_each(|(x, &e)| {
                let d = e * scale;
                let slip = d * eta2.mul_add(d, eta1).mul_add(d, eta0);
                *x += t * (1.0 / (1.0 - slip) - 1.0);
            });
        }
        DriftSolver::Exact => {
            particles.for_each(|(x, &e)| {
                let r = e * inv_e;
                let delta = r.mul_add(r, 2.0 * r).mul_add(inv_b2, 1.0).sqrt() - 1.0;
                let path = a2.mul_add(delta, a1).mul_add(delta, a0).mul_add(delta, 1.0);
                *x += t * (path * (1.0 + r) / (1.0 + delta) - 1.0);
            });
        }
    }
}
