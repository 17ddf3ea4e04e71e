// SPDX-License-Identifier: AGPL-3.0-only

//! Physical constants (CODATA 2018, SI units)

/// Speed of light in vacuum (m/s)
pub const C_LIGHT: f64 = 299_792_458.0;
/// Elementary charge (C)
pub const E_CHARGE: f64 = 1.602_176_634e-19;
/// Vacuum permittivity (F/m)
pub const EPS0: f64 = 8.854_187_812_8e-12;
/// Reduced Planck constant (J·s)
pub const HBAR: f64 = 1.054_571_817e-34;
/// Electron mass (kg)
pub const M_ELECTRON_KG: f64 = 9.109_383_701_5e-31;
/// Proton mass (kg)
pub const M_PROTON_KG: f64 = 1.672_621_923_69e-27;

/// Electron rest energy (eV): m_e c² / e
pub const M_ELECTRON_EV: f64 = M_ELECTRON_KG * C_LIGHT * C_LIGHT / E_CHARGE;
/// Proton rest energy (eV): m_p c² / e
pub const M_PROTON_EV: f64 = M_PROTON_KG * C_LIGHT * C_LIGHT / E_CHARGE;
