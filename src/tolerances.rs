// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized kernel-parity tolerances.
//!
//! Every threshold used by the parity tests and the validation binaries is
//! defined here. The damping-only and quantum-excitation contracts are
//! asymmetric and stay so: the excitation bounds are statistical and must
//! hold for any kernel that re-blocks the draws.

// ═══════════════════════════════════════════════════════════════════
// Deterministic maps
// ═══════════════════════════════════════════════════════════════════

/// Single radiation turn, reference vs optimized, absolute dE (eV).
///
/// Same as eight-decimal agreement: |a − b| < 1.5e-8 eV.
pub const SINGLE_TURN_DE_ABS: f64 = 1.5e-8;

/// Damping-only radiation, per-turn mean and RMS of dt and dE, relative.
///
/// Holds at 10 and 100 turns for a two-section ring with one sub-kick.
pub const DAMPING_PARITY_REL: f64 = 1e-7;

/// Kick-drift tracker, reference vs optimized, relative.
///
/// Fused multiply-add and summation order differ by a few ulp per turn.
pub const TRACKER_PARITY_REL: f64 = 1e-9;

// ═══════════════════════════════════════════════════════════════════
// Stochastic maps (quantum excitation)
// ═══════════════════════════════════════════════════════════════════

/// Per-turn mean of dt and dE with quantum excitation active, relative.
pub const EXCITATION_MEAN_REL: f64 = 1e-2;

/// Per-turn RMS of dt and dE with quantum excitation, up to 10 turns.
pub const EXCITATION_STD_REL_SHORT: f64 = 1e-1;

/// Per-turn RMS of dt and dE with quantum excitation, up to 100 turns.
///
/// The excitation random walk decorrelates the two runs over a damping
/// time; the spread is bounded, not convergent.
pub const EXCITATION_STD_REL_LONG: f64 = 1.0;

/// Turn count separating the short and long excitation windows.
pub const EXCITATION_SHORT_TURNS: usize = 10;

/// RMS tolerance for a quantum-excitation run of `turns` turns.
#[must_use]
pub const fn excitation_std_rel(turns: usize) -> f64 {
    if turns <= EXCITATION_SHORT_TURNS {
        EXCITATION_STD_REL_SHORT
    } else {
        EXCITATION_STD_REL_LONG
    }
}
