// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for ring construction, RF programs, and tracking setup.
//!
//! Construction problems are fatal and raised before the first turn is
//! tracked. Each variant names the invariant that failed so callers can
//! pattern-match on the failure mode rather than parse the message.
//!
//! Unphysical numeric input (energy below rest mass, negative kinetic
//! energy) is *not* an error: it propagates as NaN through the affected
//! turns and particles.

use thiserror::Error;

/// Ring model construction and conversion errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RingError {
    /// A ring needs at least one turn to track.
    #[error("Ring: number of turns must be at least 1")]
    NoTurns,

    /// A ring needs at least one section.
    #[error("Ring: number of sections must be at least 1")]
    NoSections,

    /// `ring_length` has a different number of entries than `n_sections`.
    #[error(
        "Ring: number of sections ({n_sections}) and ring length size ({n_lengths}) do not match"
    )]
    RingLengthMismatch { n_sections: usize, n_lengths: usize },

    /// Momentum-compaction coefficients given for the wrong number of sections.
    #[error(
        "Ring: number of sections ({n_sections}) and size of momentum compaction \
         ({n_alpha}) do not match"
    )]
    AlphaSectionMismatch { n_sections: usize, n_alpha: usize },

    /// A section lacks coefficients up to the requested expansion order.
    #[error(
        "Ring: section {section} has {found} momentum compaction coefficients, \
         alpha order {alpha_order} needs {needed}",
        needed = .alpha_order + 1
    )]
    AlphaOrderMismatch {
        section: usize,
        alpha_order: usize,
        found: usize,
    },

    /// Only orders 0, 1, 2 of the momentum-compaction expansion are modelled.
    #[error("Ring: alpha order {0} not supported (maximum 2)")]
    UnsupportedAlphaOrder(usize),

    /// Synchronous data given for a different number of sections.
    #[error(
        "Ring: number of sections ({n_sections}) and number of synchronous data arrays \
         ({n_arrays}) do not match"
    )]
    SynchronousSectionMismatch { n_sections: usize, n_arrays: usize },

    /// Time/value series arrays disagree in count or length.
    #[error("Ring: synchronous data does not match the time data")]
    SynchronousTimeMismatch,

    /// A per-turn program does not have `n_turns + 1` entries.
    #[error(
        "Ring: the momentum program does not match the proper length \
         (n_turns+1 = {expected}, got {found})"
    )]
    MomentumLengthMismatch { expected: usize, found: usize },

    /// Representation label is none of momentum / total energy / kinetic energy.
    #[error("Ring: synchronous data type not recognized: {0:?}")]
    UnknownDataType(String),
}

/// RF station construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RfError {
    /// An RF station needs at least one RF system.
    #[error("RF station: at least one RF system is required")]
    NoSystems,

    /// Harmonic, voltage and phase arrays have different system counts.
    #[error(
        "RF station: {harmonic} harmonic, {voltage} voltage and {phi_offset} phase programs \
         given; counts must match"
    )]
    SystemCountMismatch {
        harmonic: usize,
        voltage: usize,
        phi_offset: usize,
    },

    /// A per-turn program is neither constant nor `n_turns + 1` long.
    #[error(
        "RF station: {quantity} program of system {system} has length {found}, \
         expected 1 or {expected}"
    )]
    ProgramLengthMismatch {
        quantity: &'static str,
        system: usize,
        found: usize,
        expected: usize,
    },

    /// Section index beyond the ring's section count.
    #[error("RF station: section index {index} out of range for {n_sections} section(s)")]
    SectionOutOfRange { index: usize, n_sections: usize },
}

/// Particle ensemble construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeamError {
    /// Zero macro-particles requested.
    #[error("Beam: number of macro-particles must be positive")]
    NoMacroparticles,

    /// Intensity must be a positive finite number of real particles.
    #[error("Beam: intensity must be positive and finite, got {0}")]
    InvalidIntensity(f64),

    /// `dt` and `dE` coordinate arrays disagree in length.
    #[error("Beam: coordinate arrays differ in length (dt {dt}, dE {de})")]
    CoordinateLengthMismatch { dt: usize, de: usize },

    /// The distribution width must be positive and finite.
    #[error("Beam: distribution width must be positive and finite, got {0}")]
    InvalidWidth(f64),
}

/// Profile (time histogram) construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// At least one slice is required.
    #[error("Profile: number of slices must be positive")]
    NoSlices,

    /// `cut_right` must exceed `cut_left`.
    #[error("Profile: cut_right ({right}) must exceed cut_left ({left})")]
    InvalidCuts { left: f64, right: f64 },
}

/// Synchrotron radiation construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RadiationError {
    /// Zero sub-kicks were requested.
    #[error("Synchrotron radiation: number of kicks must be at least 1")]
    NoKicks,

    /// The bending radius must be positive and finite.
    #[error("Synchrotron radiation: bending radius must be positive and finite, got {0}")]
    InvalidBendingRadius(f64),
}

/// Kernel execution setup errors.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The dedicated rayon thread pool could not be built.
    #[error("Kernel: failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Umbrella error for building and driving a full simulation.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error(transparent)]
    Rf(#[from] RfError),

    #[error(transparent)]
    Beam(#[from] BeamError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Radiation(#[from] RadiationError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Configuration file could not be parsed.
    #[error("Configuration parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("Configuration read failed: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The driver was asked to track beyond the last programmed turn.
    #[error("Tracking: turn {turn} requested but the program ends after {n_turns} turns")]
    ProgramExhausted { turn: usize, n_turns: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_ring_length_mismatch() {
        let err = RingError::RingLengthMismatch {
            n_sections: 1,
            n_lengths: 2,
        };
        assert!(err
            .to_string()
            .contains("number of sections (1) and ring length size (2) do not match"));
    }

    #[test]
    fn display_alpha_section_mismatch() {
        let err = RingError::AlphaSectionMismatch {
            n_sections: 2,
            n_alpha: 1,
        };
        assert!(err.to_string().contains("size of momentum compaction"));
    }

    #[test]
    fn display_alpha_order_names_requirement() {
        let err = RingError::AlphaOrderMismatch {
            section: 1,
            alpha_order: 2,
            found: 1,
        };
        assert!(err.to_string().contains("needs 3"));
    }

    #[test]
    fn display_momentum_length() {
        let err = RingError::MomentumLengthMismatch {
            expected: 11,
            found: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("n_turns+1"));
        assert!(msg.contains("11"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn wrapped_messages_read_as_one_line() {
        let err = RingError::SynchronousSectionMismatch {
            n_sections: 1,
            n_arrays: 2,
        };
        assert_eq!(
            err.to_string(),
            "Ring: number of sections (1) and number of synchronous data arrays (2) do not match"
        );
        let err = RingError::AlphaOrderMismatch {
            section: 0,
            alpha_order: 1,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Ring: section 0 has 1 momentum compaction coefficients, alpha order 1 needs 2"
        );
        let err = RfError::SystemCountMismatch {
            harmonic: 2,
            voltage: 1,
            phi_offset: 1,
        };
        assert!(!err.to_string().contains("  "));
        assert!(err.to_string().contains("programs given; counts must match"));
    }

    #[test]
    fn display_unknown_data_type() {
        let err = RingError::UnknownDataType("somethingCompletelyDifferent".into());
        assert!(err.to_string().contains("not recognized"));
        assert!(err.to_string().contains("somethingCompletelyDifferent"));
    }

    #[test]
    fn umbrella_wraps_transparently() {
        let err: TrackError = RingError::SynchronousTimeMismatch.into();
        assert_eq!(
            err.to_string(),
            "Ring: synchronous data does not match the time data"
        );
        assert!(matches!(
            err,
            TrackError::Ring(RingError::SynchronousTimeMismatch)
        ));
    }

    #[test]
    fn error_trait_works() {
        let err = RadiationError::NoKicks;
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.to_string().contains("at least 1"));
    }

    #[test]
    fn program_exhausted_reports_turns() {
        let err = TrackError::ProgramExhausted {
            turn: 10,
            n_turns: 10,
        };
        assert!(err.to_string().contains("turn 10"));
    }
}
