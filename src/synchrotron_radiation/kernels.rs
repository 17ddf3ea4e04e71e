// SPDX-License-Identifier: AGPL-3.0-only

//! Radiation sub-kick kernels.
//!
//! One sub-kick of `n_kicks` maps
//!
//! ```text
//! dE <- dE - 2 dE / (τ_z k) - U₀ / k + 2 σ_δ E / √(τ_z k) · ξ
//! ```
//!
//! with the noise term only under quantum excitation. Both kernels take one
//! ξ per macro-particle per sub-kick from the source in storage order.

use rayon::prelude::*;

use crate::random::NormalSource;
use crate::tracker::kernels::MIN_PARTICLES_PER_TASK;

/// Per-turn radiation inputs shared by both kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubKick {
    /// Longitudinal damping time (turns)
    pub tau_z: f64,
    /// Energy lost per turn (eV)
    pub u0: f64,
    /// Equilibrium relative energy spread
    pub sigma_dp: f64,
    /// Synchronous total energy (eV)
    pub energy: f64,
    pub n_kicks: usize,
}

pub fn damping_reference(de: &mut [f64], p: &SubKick) {
    let k = p.n_kicks as f64;
    for _ in 0..p.n_kicks {
        for e in de.iter_mut() {
            *e = *e - 2.0 * *e / (p.tau_z * k) - p.u0 / k;
        }
    }
}

pub fn excitation_reference(de: &mut [f64], p: &SubKick, source: &mut dyn NormalSource) {
    let k = p.n_kicks as f64;
    for _ in 0..p.n_kicks {
        for e in de.iter_mut() {
            *e = *e - 2.0 * *e / (p.tau_z * k) - p.u0 / k
                + 2.0 * p.sigma_dp / (p.tau_z * k).sqrt() * p.energy * source.next_normal();
        }
    }
}

pub fn damping_optimized(de: &mut [f64], p: &SubKick) {
    let k = p.n_kicks as f64;
    let keep = 1.0 - 2.0 / (p.tau_z * k);
    let loss = p.u0 / k;
    for _ in 0..p.n_kicks {
        de.par_iter_mut()
            .with_min_len(MIN_PARTICLES_PER_TASK)
            .for_each(|e| *e = e.mul_add(keep, -loss));
    }
}

/// `noise` is scratch space, resized to the beam.
pub fn excitation_optimized(
    de: &mut [f64],
    p: &SubKick,
    source: &mut dyn NormalSource,
    noise: &mut Vec<f64>,
) {
    let k = p.n_kicks as f64;
    let keep = 1.0 - 2.0 / (p.tau_z * k);
    let loss = p.u0 / k;
    let amplitude = 2.0 * p.sigma_dp / (p.tau_z * k).sqrt() * p.energy;
    noise.resize(de.len(), 0.0);
    for _ in 0..p.n_kicks {
        source.fill_normal(noise);
        de.par_iter_mut()
            .zip(noise.par_iter())
            .with_min_len(MIN_PARTICLES_PER_TASK)
            .for_each(|(e, &xi)| *e = e.mul_add(keep, amplitude.mul_add(xi, -loss)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededNormal;

    fn params(n_kicks: usize) -> SubKick {
        SubKick {
            tau_z: 1500.0,
            u0: 1.7e5,
            sigma_dp: 6.6e-4,
            energy: 2.5e9,
            n_kicks,
        }
    }

    fn spread() -> Vec<f64> {
        (0..4096).map(|i| (f64::from(i) - 2048.0) * 250.0).collect()
    }

    #[test]
    fn damping_kernels_agree() {
        for n_kicks in [1, 2, 5] {
            let mut a = spread();
            let mut b = spread();
            damping_reference(&mut a, &params(n_kicks));
            damping_optimized(&mut b, &params(n_kicks));
            for (x, y) in a.iter().zip(&b) {
                assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{x} vs {y}");
            }
        }
    }

    #[test]
    fn excitation_kernels_draw_the_same_stream() {
        let mut a = spread();
        let mut b = spread();
        let mut noise = Vec::new();
        excitation_reference(&mut a, &params(2), &mut SeededNormal::new(1234));
        excitation_optimized(&mut b, &params(2), &mut SeededNormal::new(1234), &mut noise);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{x} vs {y}");
        }
    }

    #[test]
    fn single_damping_kick_matches_closed_form() {
        let mut de = vec![1e6];
        let p = params(1);
        damping_reference(&mut de, &p);
        let expected = 1e6 * (1.0 - 2.0 / p.tau_z) - p.u0;
        assert!((de[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn nan_constants_propagate() {
        let mut de = vec![1.0, 2.0];
        let p = SubKick {
            u0: f64::NAN,
            ..params(1)
        };
        damping_optimized(&mut de, &p);
        assert!(de.iter().all(|e| e.is_nan()));
    }
}
