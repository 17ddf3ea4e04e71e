// SPDX-License-Identifier: AGPL-3.0-only

//! RF station: per-turn cavity programs for one ring section.
//!
//! Harmonic, voltage and phase offset are given per RF system, either as a
//! constant or as `n_turns + 1` per-turn values. The first system is the
//! main harmonic used for the synchronous phase and synchrotron tune.

use std::f64::consts::PI;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::C_LIGHT;
use crate::error::RfError;
use crate::ring::Ring;

/// A per-turn RF program value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RfProgram {
    Constant(f64),
    PerTurn(Vec<f64>),
}

impl From<f64> for RfProgram {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

impl From<Vec<f64>> for RfProgram {
    fn from(v: Vec<f64>) -> Self {
        Self::PerTurn(v)
    }
}

impl RfProgram {
    fn expand(
        &self,
        quantity: &'static str,
        system: usize,
        n_points: usize,
    ) -> Result<Vec<f64>, RfError> {
        match self {
            Self::Constant(v) => Ok(vec![*v; n_points]),
            Self::PerTurn(v) if v.len() == 1 => Ok(vec![v[0]; n_points]),
            Self::PerTurn(v) if v.len() == n_points => Ok(v.clone()),
            Self::PerTurn(v) => Err(RfError::ProgramLengthMismatch {
                quantity,
                system,
                found: v.len(),
                expected: n_points,
            }),
        }
    }
}

/// RF parameters of one section, expanded to `[system][turn]`.
#[derive(Clone, Debug)]
pub struct RfStation {
    ring: Arc<Ring>,
    /// Zero-based ring section this station sits in
    pub section_index: usize,
    /// Number of superimposed RF systems
    pub n_rf: usize,
    /// Particle charge (e)
    pub charge: f64,
    /// Section length over circumference
    pub length_ratio: f64,
    pub harmonic: Vec<Vec<f64>>,
    /// Peak voltage (V)
    pub voltage: Vec<Vec<f64>>,
    pub phi_offset: Vec<Vec<f64>>,
    /// RF phase used by the kick (rad)
    pub phi_rf: Vec<Vec<f64>>,
    /// RF angular frequency ω = 2π β c h / C (rad/s)
    pub omega_rf: Vec<Vec<f64>>,
    /// RF period 2π / ω (s)
    pub t_rf: Vec<Vec<f64>>,
    /// Synchronous phase of the main harmonic (rad) per turn
    pub phi_s: Vec<f64>,
    /// Small-amplitude synchrotron tune per turn
    pub q_s: Vec<f64>,
}

impl RfStation {
    /// Build a station for `section_index` of `ring`.
    ///
    /// # Errors
    /// Mismatched system counts, bad program lengths, or an out-of-range
    /// section.
    pub fn new(
        ring: Arc<Ring>,
        harmonic: &[RfProgram],
        voltage: &[RfProgram],
        phi_offset: &[RfProgram],
        section_index: usize,
    ) -> Result<Self, RfError> {
        if section_index >= ring.n_sections {
            return Err(RfError::SectionOutOfRange {
                index: section_index,
                n_sections: ring.n_sections,
            });
        }
        let n_rf = harmonic.len();
        if voltage.len() != n_rf || phi_offset.len() != n_rf {
            return Err(RfError::SystemCountMismatch {
                harmonic: n_rf,
                voltage: voltage.len(),
                phi_offset: phi_offset.len(),
            });
        }
        if n_rf == 0 {
            return Err(RfError::NoSystems);
        }

        let n_points = ring.n_turns + 1;
        let expand_all =
            |progs: &[RfProgram], quantity: &'static str| -> Result<Vec<Vec<f64>>, RfError> {
                progs
                    .iter()
                    .enumerate()
                    .map(|(k, p)| p.expand(quantity, k, n_points))
                    .collect()
            };
        let harmonic = expand_all(harmonic, "harmonic")?;
        let voltage = expand_all(voltage, "voltage")?;
        let phi_offset = expand_all(phi_offset, "phase offset")?;

        let s = section_index;
        let beta = &ring.beta[s];
        let omega_rf: Vec<Vec<f64>> = harmonic
            .iter()
            .map(|h| {
                h.iter()
                    .zip(beta)
                    .map(|(h, b)| 2.0 * PI * b * C_LIGHT * h / ring.ring_circumference)
                    .collect()
            })
            .collect();
        let t_rf = omega_rf
            .iter()
            .map(|w| w.iter().map(|w| 2.0 * PI / w).collect())
            .collect();
        let phi_rf = phi_offset.clone();

        let charge = ring.particle.charge;
        let (phi_s, q_s) = synchronous_phase_and_tune(&ring, s, charge, &harmonic[0], &voltage[0]);

        debug!(
            "rf station: section {s}, {n_rf} system(s), h0 = {}, V0 = {:.4e} V, \
             phi_s0 = {:.6} rad, Q_s0 = {:.4e}",
            harmonic[0][0], voltage[0][0], phi_s[0], q_s[0]
        );

        Ok(Self {
            section_index,
            n_rf,
            charge,
            length_ratio: ring.ring_length[s] / ring.ring_circumference,
            harmonic,
            voltage,
            phi_offset,
            phi_rf,
            omega_rf,
            t_rf,
            phi_s,
            q_s,
            ring,
        })
    }

    /// Single RF system with constant parameters.
    ///
    /// # Errors
    /// See [`RfStation::new`].
    pub fn single(
        ring: Arc<Ring>,
        harmonic: f64,
        voltage: f64,
        phi_offset: f64,
        section_index: usize,
    ) -> Result<Self, RfError> {
        Self::new(
            ring,
            &[harmonic.into()],
            &[voltage.into()],
            &[phi_offset.into()],
            section_index,
        )
    }

    #[must_use]
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    #[must_use]
    pub fn ring_arc(&self) -> Arc<Ring> {
        Arc::clone(&self.ring)
    }

    /// Number of turns of the underlying program.
    #[must_use]
    pub fn n_turns(&self) -> usize {
        self.ring.n_turns
    }

    // Section views of the ring program.

    #[must_use]
    pub fn beta(&self) -> &[f64] {
        &self.ring.beta[self.section_index]
    }

    #[must_use]
    pub fn gamma(&self) -> &[f64] {
        &self.ring.gamma[self.section_index]
    }

    #[must_use]
    pub fn energy(&self) -> &[f64] {
        &self.ring.energy[self.section_index]
    }

    #[must_use]
    pub fn delta_e(&self) -> &[f64] {
        &self.ring.delta_e[self.section_index]
    }

    #[must_use]
    pub fn eta_0(&self) -> &[f64] {
        &self.ring.eta_0[self.section_index]
    }

    #[must_use]
    pub fn eta_1(&self) -> &[f64] {
        &self.ring.eta_1[self.section_index]
    }

    #[must_use]
    pub fn eta_2(&self) -> &[f64] {
        &self.ring.eta_2[self.section_index]
    }

    #[must_use]
    pub fn alpha(&self) -> [f64; 3] {
        self.ring.alpha[self.section_index]
    }

    #[must_use]
    pub fn t_rev(&self) -> &[f64] {
        &self.ring.t_rev
    }
}

/// φ_s from the energy gain per turn and Q_s from the bucket linearization.
///
/// φ_s = arcsin(ΔE / qV), mirrored to π − arcsin(ΔE / qV) when qV·η₀ > 0
/// (above transition for positive charge).
fn synchronous_phase_and_tune(
    ring: &Ring,
    s: usize,
    charge: f64,
    harmonic: &[f64],
    voltage: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let n_points = ring.n_turns + 1;
    let mut phi_s = Vec::with_capacity(n_points);
    let mut q_s = Vec::with_capacity(n_points);
    let mut warned = false;

    for turn in 0..n_points {
        // ΔE has n_turns entries; the last one repeats for the final point
        let de = ring.delta_e[s][turn.min(ring.n_turns - 1)];
        let qv = charge * voltage[turn];
        let eta0 = ring.eta_0[s][turn];

        let phi = if qv == 0.0 {
            if !warned {
                warn!("rf station: zero main-harmonic voltage at turn {turn}, phi_s set to 0");
                warned = true;
            }
            0.0
        } else {
            let raw = (de / qv).asin();
            // Stable when qV·η·cos φ_s < 0
            if qv * eta0 > 0.0 {
                PI - raw
            } else {
                raw
            }
        };
        phi_s.push(phi);

        let b = ring.beta[s][turn];
        let e = ring.energy[s][turn];
        q_s.push((harmonic[turn] * (qv * eta0 * phi.cos()).abs() / (2.0 * PI * b * b * e)).sqrt());
    }
    (phi_s, q_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{Particle, SynchronousData};

    fn ring(n_turns: usize) -> Arc<Ring> {
        Arc::new(
            Ring::single_section(
                n_turns,
                110.4,
                0.0082,
                &SynchronousData::new(
                    crate::ring::DataType::TotalEnergy,
                    crate::ring::SynchronousProgram::Constant(2.5e9),
                ),
                Particle::positron(),
            )
            .expect("ring"),
        )
    }

    #[test]
    fn constant_programs_expand() {
        let rf = RfStation::single(ring(5), 184.0, 800e3, 0.0, 0).expect("rf");
        assert_eq!(rf.harmonic[0].len(), 6);
        assert!(rf.voltage[0].iter().all(|&v| (v - 800e3).abs() < 1e-9));
    }

    #[test]
    fn rf_period_is_revolution_over_harmonic() {
        let rf = RfStation::single(ring(2), 184.0, 800e3, 0.0, 0).expect("rf");
        let expected = rf.t_rev()[0] / 184.0;
        assert!((rf.t_rf[0][0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn above_transition_phase_is_pi_without_acceleration() {
        let rf = RfStation::single(ring(2), 184.0, 800e3, 0.0, 0).expect("rf");
        assert!(rf.eta_0()[0] > 0.0);
        assert!((rf.phi_s[0] - PI).abs() < 1e-12);
        assert!(rf.q_s[0] > 0.0 && rf.q_s[0] < 0.1);
    }

    #[test]
    fn per_turn_length_checked() {
        let err = RfStation::new(
            ring(5),
            &[184.0.into()],
            &[vec![800e3; 4].into()],
            &[0.0.into()],
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RfError::ProgramLengthMismatch {
                quantity: "voltage",
                system: 0,
                found: 4,
                expected: 6
            }
        );
    }

    #[test]
    fn system_counts_must_match() {
        let err = RfStation::new(
            ring(5),
            &[184.0.into(), 368.0.into()],
            &[800e3.into()],
            &[0.0.into()],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, RfError::SystemCountMismatch { .. }));
    }

    #[test]
    fn section_index_checked() {
        let err = RfStation::single(ring(5), 184.0, 800e3, 0.0, 1).unwrap_err();
        assert_eq!(
            err,
            RfError::SectionOutOfRange {
                index: 1,
                n_sections: 1
            }
        );
    }

    #[test]
    fn single_element_per_turn_is_constant() {
        let rf = RfStation::new(ring(3), &[vec![184.0].into()], &[800e3.into()], &[0.0.into()], 0)
            .expect("rf");
        assert_eq!(rf.harmonic[0].len(), 4);
    }
}
