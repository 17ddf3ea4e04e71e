// SPDX-License-Identifier: AGPL-3.0-only

//! Uniform time histogram of the bunch.

use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::error::ProfileError;
use crate::tracker::TurnMap;

/// Histogram window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CutOptions {
    /// Left edge (s)
    pub cut_left: f64,
    /// Right edge (s)
    pub cut_right: f64,
    pub n_slices: usize,
}

/// Alive-particle counts per time slice, refreshed on every track.
#[derive(Clone, Debug)]
pub struct Profile {
    cuts: CutOptions,
    bin_size: f64,
    bin_centers: Vec<f64>,
    n_macroparticles: Vec<f64>,
}

impl Profile {
    /// # Errors
    /// [`ProfileError`] for zero slices or an empty window.
    pub fn new(cuts: CutOptions) -> Result<Self, ProfileError> {
        if cuts.n_slices == 0 {
            return Err(ProfileError::NoSlices);
        }
        if !(cuts.cut_right > cuts.cut_left) {
            return Err(ProfileError::InvalidCuts {
                left: cuts.cut_left,
                right: cuts.cut_right,
            });
        }
        let bin_size = (cuts.cut_right - cuts.cut_left) / cuts.n_slices as f64;
        let bin_centers = (0..cuts.n_slices)
            .map(|i| (i as f64 + 0.5).mul_add(bin_size, cuts.cut_left))
            .collect();
        Ok(Self {
            cuts,
            bin_size,
            bin_centers,
            n_macroparticles: vec![0.0; cuts.n_slices],
        })
    }

    #[must_use]
    pub const fn cuts(&self) -> &CutOptions {
        &self.cuts
    }

    #[must_use]
    pub const fn bin_size(&self) -> f64 {
        self.bin_size
    }

    #[must_use]
    pub fn bin_centers(&self) -> &[f64] {
        &self.bin_centers
    }

    /// Macro-particles per slice from the latest track.
    #[must_use]
    pub fn n_macroparticles(&self) -> &[f64] {
        &self.n_macroparticles
    }

    /// Alive particles inside the window. The right edge belongs to the
    /// last slice.
    pub fn histogram(&mut self, beam: &Beam) {
        self.n_macroparticles.fill(0.0);
        let CutOptions {
            cut_left,
            cut_right,
            n_slices,
        } = self.cuts;
        for (&t, &alive) in beam.dt.iter().zip(beam.alive()) {
            if !alive || !(cut_left..=cut_right).contains(&t) {
                continue;
            }
            let bin = (((t - cut_left) / self.bin_size) as usize).min(n_slices - 1);
            self.n_macroparticles[bin] += 1.0;
        }
    }

    /// Histogram centroid (s); NaN when the window is empty.
    #[must_use]
    pub fn bunch_position(&self) -> f64 {
        let total: f64 = self.n_macroparticles.iter().sum();
        self.weighted(|t| t) / total
    }

    /// Histogram RMS width (s); NaN when the window is empty.
    #[must_use]
    pub fn bunch_length_rms(&self) -> f64 {
        let total: f64 = self.n_macroparticles.iter().sum();
        let mean = self.weighted(|t| t) / total;
        (self.weighted(|t| (t - mean).powi(2)) / total).sqrt()
    }

    fn weighted(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.bin_centers
            .iter()
            .zip(&self.n_macroparticles)
            .map(|(&t, &n)| f(t) * n)
            .sum()
    }
}

impl TurnMap for Profile {
    fn track(&mut self, beam: &mut Beam, _turn: usize) {
        self.histogram(beam);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuts(n_slices: usize) -> CutOptions {
        CutOptions {
            cut_left: 0.0,
            cut_right: 1.0,
            n_slices,
        }
    }

    #[test]
    fn bins_are_uniform() {
        let p = Profile::new(cuts(4)).expect("profile");
        assert_eq!(p.bin_centers(), &[0.125, 0.375, 0.625, 0.875]);
        assert!((p.bin_size() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn counts_alive_particles_in_window() {
        let mut beam = Beam::from_coordinates(
            vec![0.1, 0.1, 0.6, 1.0, 1.5, -0.2, 0.9],
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0],
            7.0,
        )
        .expect("beam");
        beam.losses_energy_cut(-1.0, 1.0);
        let mut p = Profile::new(cuts(4)).expect("profile");
        p.track(&mut beam, 0);
        // Right edge joins the last slice; the lost particle at 0.9 is skipped
        assert_eq!(p.n_macroparticles(), &[2.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn moments_of_symmetric_profile() {
        let mut beam =
            Beam::from_coordinates(vec![0.125, 0.875], vec![0.0, 0.0], 2.0).expect("beam");
        let mut p = Profile::new(cuts(4)).expect("profile");
        p.track(&mut beam, 0);
        assert!((p.bunch_position() - 0.5).abs() < 1e-15);
        assert!((p.bunch_length_rms() - 0.375).abs() < 1e-15);
    }

    #[test]
    fn invalid_cuts_rejected() {
        assert_eq!(Profile::new(cuts(0)).unwrap_err(), ProfileError::NoSlices);
        let err = Profile::new(CutOptions {
            cut_left: 1.0,
            cut_right: 1.0,
            n_slices: 10,
        })
        .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidCuts { .. }));
    }
}
