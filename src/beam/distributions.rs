// SPDX-License-Identifier: AGPL-3.0-only

//! Seeded initial distributions.

use std::f64::consts::PI;

use log::debug;

use super::Beam;
use crate::error::BeamError;
use crate::random::{NormalSource, SeededNormal};
use crate::rf::RfStation;

/// Fill `beam` with an uncorrelated bi-Gaussian bunch at turn 0.
///
/// The bunch is centred on the synchronous phase of the main harmonic,
/// folded into the first RF period. When `sigma_de` is `None` the energy
/// spread is matched to `sigma_dt` through the single-harmonic Hamiltonian.
/// All `dt` draws precede all `dE` draws. Every particle is marked alive.
///
/// Returns the energy spread used.
///
/// # Errors
/// [`BeamError::InvalidWidth`] for a non-positive or non-finite width,
/// including a derived energy spread that is not finite.
pub fn bigaussian(
    rf: &RfStation,
    beam: &mut Beam,
    sigma_dt: f64,
    sigma_de: Option<f64>,
    seed: u64,
) -> Result<f64, BeamError> {
    check_width(sigma_dt)?;

    let omega = rf.omega_rf[0][0];
    let phi_s = rf.phi_s[0];
    let phi_rf = rf.phi_rf[0][0];

    let sigma_de = match sigma_de {
        Some(s) => s,
        None => {
            let qv = rf.charge * rf.voltage[0][0];
            let phi_b = omega * sigma_dt + phi_s;
            let well = phi_b.cos() - phi_s.cos() + (phi_b - phi_s) * phi_s.sin();
            let b = rf.beta()[0];
            (((qv * well).abs() * rf.energy()[0] * b * b)
                / (PI * rf.harmonic[0][0] * rf.eta_0()[0].abs()))
            .sqrt()
        }
    };
    check_width(sigma_de)?;

    let centre = (phi_s - phi_rf).rem_euclid(2.0 * PI) / omega;
    debug!(
        "bigaussian: centre {centre:.6e} s, sigma_dt {sigma_dt:.4e} s, sigma_dE {sigma_de:.4e} eV"
    );

    let mut normal = SeededNormal::new(seed);
    normal.fill_normal(&mut beam.dt);
    normal.fill_normal(&mut beam.de);
    for t in &mut beam.dt {
        *t = sigma_dt.mul_add(*t, centre);
    }
    for e in &mut beam.de {
        *e *= sigma_de;
    }
    beam.alive.fill(true);
    Ok(sigma_de)
}

fn check_width(sigma: f64) -> Result<(), BeamError> {
    if sigma > 0.0 && sigma.is_finite() {
        Ok(())
    } else {
        Err(BeamError::InvalidWidth(sigma))
    }
}
