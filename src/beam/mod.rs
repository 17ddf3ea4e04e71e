// SPDX-License-Identifier: AGPL-3.0-only

//! Macro-particle ensemble.
//!
//! Coordinates are offsets from the synchronous particle: arrival time `dt`
//! (s) and energy `de` (eV). Every macro-particle carries the same weight,
//! `intensity / n_macroparticles` real particles.
//!
//! Lost particles stay in storage and keep being mapped; they are only
//! excluded from [`Beam::statistics`].

pub mod distributions;

use serde::Serialize;

use crate::error::BeamError;

/// Mean and population standard deviation over alive particles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BeamStatistics {
    pub mean_dt: f64,
    pub sigma_dt: f64,
    pub mean_de: f64,
    pub sigma_de: f64,
    pub n_alive: usize,
}

/// Particle ensemble, mutated in place by each map of the turn sequence.
#[derive(Clone, Debug)]
pub struct Beam {
    /// Arrival-time offsets (s)
    pub dt: Vec<f64>,
    /// Energy offsets (eV)
    pub de: Vec<f64>,
    alive: Vec<bool>,
    intensity: f64,
}

impl Beam {
    /// Beam of `n_macroparticles` at the synchronous point.
    ///
    /// # Errors
    /// Zero macro-particles or a non-positive intensity.
    pub fn new(n_macroparticles: usize, intensity: f64) -> Result<Self, BeamError> {
        Self::from_coordinates(
            vec![0.0; n_macroparticles],
            vec![0.0; n_macroparticles],
            intensity,
        )
    }

    /// Beam from explicit coordinates.
    ///
    /// # Errors
    /// Empty or mismatched arrays, or a non-positive intensity.
    pub fn from_coordinates(dt: Vec<f64>, de: Vec<f64>, intensity: f64) -> Result<Self, BeamError> {
        if dt.len() != de.len() {
            return Err(BeamError::CoordinateLengthMismatch {
                dt: dt.len(),
                de: de.len(),
            });
        }
        if dt.is_empty() {
            return Err(BeamError::NoMacroparticles);
        }
        validate_intensity(intensity)?;
        let alive = vec![true; dt.len()];
        Ok(Self {
            dt,
            de,
            alive,
            intensity,
        })
    }

    #[must_use]
    pub fn n_macroparticles(&self) -> usize {
        self.dt.len()
    }

    /// Real particles represented by the whole beam.
    #[must_use]
    pub const fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Real particles per macro-particle.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.intensity / self.dt.len() as f64
    }

    /// Reweight all macro-particles uniformly.
    ///
    /// # Errors
    /// [`BeamError::InvalidIntensity`] for a non-positive or non-finite value.
    pub fn set_intensity(&mut self, intensity: f64) -> Result<(), BeamError> {
        validate_intensity(intensity)?;
        self.intensity = intensity;
        Ok(())
    }

    #[must_use]
    pub fn is_alive(&self, i: usize) -> bool {
        self.alive[i]
    }

    #[must_use]
    pub fn alive(&self) -> &[bool] {
        &self.alive
    }

    #[must_use]
    pub fn n_alive(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    /// Flag particles with `dt` outside `[dt_min, dt_max]` as lost.
    pub fn losses_longitudinal_cut(&mut self, dt_min: f64, dt_max: f64) {
        for (a, &t) in self.alive.iter_mut().zip(&self.dt) {
            if !(dt_min..=dt_max).contains(&t) {
                *a = false;
            }
        }
    }

    /// Flag particles with `de` outside `[de_min, de_max]` as lost.
    pub fn losses_energy_cut(&mut self, de_min: f64, de_max: f64) {
        for (a, &e) in self.alive.iter_mut().zip(&self.de) {
            if !(de_min..=de_max).contains(&e) {
                *a = false;
            }
        }
    }

    /// Moments over alive particles; all NaN when none are alive.
    #[must_use]
    pub fn statistics(&self) -> BeamStatistics {
        let n_alive = self.n_alive();
        if n_alive == 0 {
            return BeamStatistics {
                mean_dt: f64::NAN,
                sigma_dt: f64::NAN,
                mean_de: f64::NAN,
                sigma_de: f64::NAN,
                n_alive,
            };
        }
        let (mean_dt, sigma_dt) = masked_moments(&self.dt, &self.alive, n_alive);
        let (mean_de, sigma_de) = masked_moments(&self.de, &self.alive, n_alive);
        BeamStatistics {
            mean_dt,
            sigma_dt,
            mean_de,
            sigma_de,
            n_alive,
        }
    }
}

fn validate_intensity(intensity: f64) -> Result<(), BeamError> {
    if intensity > 0.0 && intensity.is_finite() {
        Ok(())
    } else {
        Err(BeamError::InvalidIntensity(intensity))
    }
}

/// Two-pass mean and population standard deviation over `mask`.
fn masked_moments(values: &[f64], mask: &[bool], n: usize) -> (f64, f64) {
    let n_f = n as f64;
    let mean = values
        .iter()
        .zip(mask)
        .filter(|(_, &m)| m)
        .map(|(v, _)| v)
        .sum::<f64>()
        / n_f;
    let var = values
        .iter()
        .zip(mask)
        .filter(|(_, &m)| m)
        .map(|(v, _)| (v - mean).powi(2))
        .sum::<f64>()
        / n_f;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_intensity_per_macroparticle() {
        let beam = Beam::new(100, 2.299e9).expect("beam");
        assert!((beam.ratio() - 2.299e7).abs() < 1e-3);
        assert_eq!(beam.n_alive(), 100);
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert_eq!(Beam::new(0, 1e9).unwrap_err(), BeamError::NoMacroparticles);
        assert_eq!(
            Beam::new(10, 0.0).unwrap_err(),
            BeamError::InvalidIntensity(0.0)
        );
        assert!(Beam::new(10, f64::NAN).is_err());
        assert_eq!(
            Beam::from_coordinates(vec![0.0; 3], vec![0.0; 2], 1.0).unwrap_err(),
            BeamError::CoordinateLengthMismatch { dt: 3, de: 2 }
        );
    }

    #[test]
    fn statistics_population_moments() {
        let beam =
            Beam::from_coordinates(vec![1.0, 2.0, 3.0, 4.0], vec![-1.0, 1.0, -1.0, 1.0], 4.0)
                .expect("beam");
        let s = beam.statistics();
        assert!((s.mean_dt - 2.5).abs() < 1e-15);
        assert!((s.sigma_dt - 1.25_f64.sqrt()).abs() < 1e-15);
        assert!(s.mean_de.abs() < 1e-15);
        assert!((s.sigma_de - 1.0).abs() < 1e-15);
    }

    #[test]
    fn lost_particles_excluded_but_retained() {
        let mut beam =
            Beam::from_coordinates(vec![0.0, 1.0, 100.0], vec![0.0, 2.0, 50.0], 3.0).expect("beam");
        beam.losses_longitudinal_cut(-10.0, 10.0);
        assert_eq!(beam.n_macroparticles(), 3, "storage is never shrunk");
        assert_eq!(beam.n_alive(), 2);
        assert!(!beam.is_alive(2));
        let s = beam.statistics();
        assert!((s.mean_dt - 0.5).abs() < 1e-15);
        assert!((s.mean_de - 1.0).abs() < 1e-15);
    }

    #[test]
    fn energy_cut_flags_outliers() {
        let mut beam =
            Beam::from_coordinates(vec![0.0; 3], vec![-5.0, 0.0, 5.0], 3.0).expect("beam");
        beam.losses_energy_cut(-1.0, 1.0);
        assert_eq!(beam.alive(), &[false, true, false]);
    }

    #[test]
    fn nan_coordinates_are_lost_by_cuts() {
        let mut beam =
            Beam::from_coordinates(vec![f64::NAN, 0.0], vec![0.0, 0.0], 2.0).expect("beam");
        beam.losses_longitudinal_cut(-1.0, 1.0);
        assert_eq!(beam.n_alive(), 1);
    }

    #[test]
    fn all_lost_gives_nan_statistics() {
        let mut beam = Beam::new(4, 1.0).expect("beam");
        beam.losses_energy_cut(1.0, 2.0);
        let s = beam.statistics();
        assert_eq!(s.n_alive, 0);
        assert!(s.mean_dt.is_nan() && s.sigma_de.is_nan());
    }

    #[test]
    fn reweight_keeps_uniform_ratio() {
        let mut beam = Beam::new(10, 1e10).expect("beam");
        beam.set_intensity(2e10).expect("reweight");
        assert!((beam.ratio() - 2e9).abs() < 1e-3);
        assert!(beam.set_intensity(-1.0).is_err());
    }
}
