// SPDX-License-Identifier: AGPL-3.0-only

//! Synchronous-data programs and their conversion to momentum.
//!
//! A program can be supplied as momentum, total energy, or kinetic energy,
//! and in one of four shapes: constant, one per-turn array (single section),
//! one per-turn array per section, or a per-section time/value series that
//! is resampled onto the turn grid.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::C_LIGHT;
use crate::error::RingError;

/// Which physical quantity a synchronous-data program carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Momentum p c (eV)
    Momentum,
    /// Total energy E (eV)
    TotalEnergy,
    /// Kinetic energy E − m c² (eV)
    KineticEnergy,
}

impl FromStr for DataType {
    type Err = RingError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "momentum" => Ok(Self::Momentum),
            "total energy" | "total_energy" => Ok(Self::TotalEnergy),
            "kinetic energy" | "kinetic_energy" => Ok(Self::KineticEnergy),
            other => Err(RingError::UnknownDataType(other.to_string())),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Momentum => write!(f, "momentum"),
            Self::TotalEnergy => write!(f, "total energy"),
            Self::KineticEnergy => write!(f, "kinetic energy"),
        }
    }
}

/// Convert one value of the given representation to momentum (eV).
///
/// Never fails: a total energy below `mass` or a negative kinetic energy
/// yields NaN, so batch conversions can be screened afterwards.
#[must_use]
pub fn to_momentum(value: f64, data_type: DataType, mass: f64) -> f64 {
    match data_type {
        DataType::Momentum => value,
        DataType::TotalEnergy => (value * value - mass * mass).sqrt(),
        DataType::KineticEnergy => {
            if value < 0.0 {
                return f64::NAN;
            }
            let energy = value + mass;
            (energy * energy - mass * mass).sqrt()
        }
    }
}

/// Shape of a synchronous-data program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynchronousProgram {
    /// Same value for every section and turn.
    Constant(f64),
    /// One per-turn array; only valid for a single-section ring.
    PerTurn(Vec<f64>),
    /// One per-turn array per section.
    PerSection(Vec<Vec<f64>>),
    /// Per-section (time, value) series, resampled onto the turn grid.
    TimeSeries {
        time: Vec<Vec<f64>>,
        values: Vec<Vec<f64>>,
    },
}

/// Synchronous-data program: representation plus shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynchronousData {
    pub data_type: DataType,
    pub program: SynchronousProgram,
}

impl SynchronousData {
    #[must_use]
    pub const fn new(data_type: DataType, program: SynchronousProgram) -> Self {
        Self { data_type, program }
    }

    /// Constant momentum for every section and turn.
    #[must_use]
    pub const fn constant_momentum(momentum: f64) -> Self {
        Self::new(DataType::Momentum, SynchronousProgram::Constant(momentum))
    }

    /// Expand to a per-section momentum program of `n_turns + 1` entries.
    ///
    /// `circumference` is only used to step through time series.
    ///
    /// # Errors
    /// Array-count and array-length mismatches (see [`RingError`]).
    pub fn momentum_program(
        &self,
        n_turns: usize,
        n_sections: usize,
        circumference: f64,
        mass: f64,
    ) -> Result<Vec<Vec<f64>>, RingError> {
        let expected = n_turns + 1;
        let raw: Vec<Vec<f64>> = match &self.program {
            SynchronousProgram::Constant(v) => vec![vec![*v; expected]; n_sections],
            SynchronousProgram::PerTurn(v) => {
                if v.len() != expected {
                    return Err(RingError::MomentumLengthMismatch {
                        expected,
                        found: v.len(),
                    });
                }
                if n_sections != 1 {
                    return Err(RingError::SynchronousSectionMismatch {
                        n_sections,
                        n_arrays: 1,
                    });
                }
                vec![v.clone()]
            }
            SynchronousProgram::PerSection(vv) => {
                if vv.len() != n_sections {
                    return Err(RingError::SynchronousSectionMismatch {
                        n_sections,
                        n_arrays: vv.len(),
                    });
                }
                if let Some(bad) = vv.iter().find(|v| v.len() != expected) {
                    return Err(RingError::MomentumLengthMismatch {
                        expected,
                        found: bad.len(),
                    });
                }
                vv.clone()
            }
            SynchronousProgram::TimeSeries { time, values } => {
                // Every series is checked, not only the number of series.
                if time.len() != values.len()
                    || time
                        .iter()
                        .zip(values)
                        .any(|(t, v)| t.is_empty() || t.len() != v.len())
                {
                    return Err(RingError::SynchronousTimeMismatch);
                }
                if values.len() != n_sections {
                    return Err(RingError::SynchronousSectionMismatch {
                        n_sections,
                        n_arrays: values.len(),
                    });
                }
                let momentum = time
                    .iter()
                    .zip(values)
                    .map(|(t, v)| {
                        let p: Vec<f64> =
                            v.iter().map(|&x| to_momentum(x, self.data_type, mass)).collect();
                        resample_on_turns(t, &p, n_turns, circumference, mass)
                    })
                    .collect();
                return Ok(momentum);
            }
        };

        Ok(raw
            .into_iter()
            .map(|v| {
                v.into_iter()
                    .map(|x| to_momentum(x, self.data_type, mass))
                    .collect()
            })
            .collect())
    }
}

/// Linear interpolation, clamped to the end values outside `[xs[0], xs[last]]`.
///
/// A NaN abscissa gives NaN.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let hi = xs.partition_point(|&xi| xi <= x).min(last);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[hi];
    }
    let frac = (x - xs[lo]) / span;
    frac.mul_add(ys[hi] - ys[lo], ys[lo])
}

/// Follow the synchronous particle through a momentum-vs-time program.
///
/// Starting at `time[0]`, each turn reads the interpolated momentum and
/// advances the clock by the revolution period at that momentum.
fn resample_on_turns(
    time: &[f64],
    momentum: &[f64],
    n_turns: usize,
    circumference: f64,
    mass: f64,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(n_turns + 1);
    let mut t = time[0];
    for _ in 0..=n_turns {
        let p = interp(t, time, momentum);
        out.push(p);
        let beta = 1.0 / (1.0 + (mass / p).powi(2)).sqrt();
        t += circumference / (beta * C_LIGHT);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::M_ELECTRON_EV;

    #[test]
    fn labels_parse() {
        assert_eq!("momentum".parse::<DataType>(), Ok(DataType::Momentum));
        assert_eq!(
            "total energy".parse::<DataType>(),
            Ok(DataType::TotalEnergy)
        );
        assert_eq!(
            "kinetic_energy".parse::<DataType>(),
            Ok(DataType::KineticEnergy)
        );
        assert!(matches!(
            "somethingCompletelyDifferent".parse::<DataType>(),
            Err(RingError::UnknownDataType(_))
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for dt in [
            DataType::Momentum,
            DataType::TotalEnergy,
            DataType::KineticEnergy,
        ] {
            assert_eq!(dt.to_string().parse::<DataType>(), Ok(dt));
        }
    }

    #[test]
    #[allow(clippy::float_cmp)] // exact: E == m gives p == 0
    fn rest_mass_total_energy_gives_zero() {
        assert_eq!(
            to_momentum(M_ELECTRON_EV, DataType::TotalEnergy, M_ELECTRON_EV),
            0.0
        );
    }

    #[test]
    fn unphysical_inputs_give_nan() {
        assert!(to_momentum(25.0, DataType::TotalEnergy, M_ELECTRON_EV).is_nan());
        assert!(to_momentum(-25.0, DataType::KineticEnergy, M_ELECTRON_EV).is_nan());
        // Far below -2m the square would be positive again; still NaN.
        assert!(to_momentum(-1e9, DataType::KineticEnergy, M_ELECTRON_EV).is_nan());
    }

    #[test]
    fn kinetic_and_total_agree() {
        let p = 450e9;
        let e = (p * p + M_ELECTRON_EV * M_ELECTRON_EV).sqrt();
        let from_total = to_momentum(e, DataType::TotalEnergy, M_ELECTRON_EV);
        let from_kin = to_momentum(e - M_ELECTRON_EV, DataType::KineticEnergy, M_ELECTRON_EV);
        assert!((from_total - p).abs() / p < 1e-12);
        assert!((from_kin - p).abs() / p < 1e-12);
    }

    #[test]
    fn interp_clamps_and_interpolates() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [10.0, 20.0, 40.0];
        assert!((interp(-1.0, &xs, &ys) - 10.0).abs() < 1e-12);
        assert!((interp(0.5, &xs, &ys) - 15.0).abs() < 1e-12);
        assert!((interp(1.5, &xs, &ys) - 30.0).abs() < 1e-12);
        assert!((interp(5.0, &xs, &ys) - 40.0).abs() < 1e-12);
        assert!(interp(f64::NAN, &xs, &ys).is_nan());
    }

    #[test]
    fn constant_program_broadcasts() {
        let data = SynchronousData::constant_momentum(450e9);
        let p = data
            .momentum_program(10, 2, 26_659.0, M_ELECTRON_EV)
            .expect("constant program");
        assert_eq!(p.len(), 2);
        assert!(p.iter().all(|s| s.len() == 11));
    }

    #[test]
    fn per_turn_length_checked_before_sections() {
        let data =
            SynchronousData::new(DataType::Momentum, SynchronousProgram::PerTurn(vec![450e9; 10]));
        assert_eq!(
            data.momentum_program(10, 2, 26_659.0, M_ELECTRON_EV),
            Err(RingError::MomentumLengthMismatch {
                expected: 11,
                found: 10
            })
        );
    }

    #[test]
    fn time_series_lengths_checked_per_array() {
        let t = vec![0.0, 0.5, 1.0];
        let data = SynchronousData::new(
            DataType::Momentum,
            SynchronousProgram::TimeSeries {
                time: vec![t.clone(), t],
                values: vec![vec![1e9; 3], vec![1e9; 2]],
            },
        );
        assert_eq!(
            data.momentum_program(10, 2, 100.0, M_ELECTRON_EV),
            Err(RingError::SynchronousTimeMismatch)
        );
    }

    #[test]
    fn time_series_ramp_is_monotonic() {
        let data = SynchronousData::new(
            DataType::Momentum,
            SynchronousProgram::TimeSeries {
                time: vec![vec![0.0, 1e-3]],
                values: vec![vec![1e9, 2e9]],
            },
        );
        let p = data
            .momentum_program(100, 1, 100.0, M_ELECTRON_EV)
            .expect("ramp");
        assert_eq!(p[0].len(), 101);
        assert!((p[0][0] - 1e9).abs() < 1e-6);
        assert!(p[0].windows(2).all(|w| w[1] >= w[0]));
        assert!(p[0][100] > 1e9);
    }
}
