// SPDX-License-Identifier: AGPL-3.0-only

//! Paired reference/optimized radiation runs.
//!
//! Both runs are built from the same configuration and seeds; only the
//! radiation kernel differs. The kick-drift maps use the configured kernel
//! in both runs.

use log::info;
use serde::Serialize;

use crate::beam::BeamStatistics;
use crate::config::SimulationConfig;
use crate::error::TrackError;
use crate::kernel::Kernel;
use crate::synchrotron_radiation::SynchrotronRadiation;
use crate::tracker::TurnMap;
use crate::validation::max_relative_error;

/// Per-turn beam moments of one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatisticsSeries {
    pub mean_dt: Vec<f64>,
    pub sigma_dt: Vec<f64>,
    pub mean_de: Vec<f64>,
    pub sigma_de: Vec<f64>,
}

impl From<&[BeamStatistics]> for StatisticsSeries {
    fn from(history: &[BeamStatistics]) -> Self {
        Self {
            mean_dt: history.iter().map(|s| s.mean_dt).collect(),
            sigma_dt: history.iter().map(|s| s.sigma_dt).collect(),
            mean_de: history.iter().map(|s| s.mean_de).collect(),
            sigma_de: history.iter().map(|s| s.sigma_de).collect(),
        }
    }
}

/// Worst per-turn relative deviation of the optimized run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParityErrors {
    pub mean_dt: f64,
    pub sigma_dt: f64,
    pub mean_de: f64,
    pub sigma_de: f64,
}

/// Reference and optimized histories plus final energy offsets.
#[derive(Clone, Debug)]
pub struct ParityRun {
    pub turns: usize,
    pub reference: StatisticsSeries,
    pub optimized: StatisticsSeries,
    pub reference_de: Vec<f64>,
    pub optimized_de: Vec<f64>,
}

impl ParityRun {
    #[must_use]
    pub fn errors(&self) -> ParityErrors {
        let (r, o) = (&self.reference, &self.optimized);
        ParityErrors {
            mean_dt: max_relative_error(&o.mean_dt, &r.mean_dt),
            sigma_dt: max_relative_error(&o.sigma_dt, &r.sigma_dt),
            mean_de: max_relative_error(&o.mean_de, &r.mean_de),
            sigma_de: max_relative_error(&o.sigma_de, &r.sigma_de),
        }
    }

    /// Worst per-particle relative deviation of the final energy offsets.
    #[must_use]
    pub fn particle_error(&self) -> f64 {
        max_relative_error(&self.optimized_de, &self.reference_de)
    }
}

/// Track `turns` turns with the reference and then the optimized radiation
/// kernel.
///
/// # Errors
/// Any construction error of `config`, or a run past its program.
pub fn radiation_parity(
    config: &SimulationConfig,
    turns: usize,
    optimized: Kernel,
) -> Result<ParityRun, TrackError> {
    let run = |kernel: Kernel| -> Result<(Vec<BeamStatistics>, Vec<f64>), TrackError> {
        let mut cfg = config.clone();
        cfg.radiation_kernel = Some(kernel);
        let mut sim = cfg.build()?;
        let history = sim.run_statistics(turns)?;
        Ok((history, sim.beam.de))
    };
    let (ref_history, reference_de) = run(Kernel::Reference)?;
    let (opt_history, optimized_de) = run(optimized)?;
    info!("radiation parity: {turns} turn(s), optimized kernel {optimized:?}");
    Ok(ParityRun {
        turns,
        reference: StatisticsSeries::from(ref_history.as_slice()),
        optimized: StatisticsSeries::from(opt_history.as_slice()),
        reference_de,
        optimized_de,
    })
}

/// Largest |a − b| of the energy offsets after one damping-only radiation
/// turn with `n_kicks` sub-kicks, reference vs `optimized`.
///
/// The beam is generated from `config` and the radiation map is attached to
/// its first RF station.
///
/// # Errors
/// Any construction error of `config` or of the radiation map.
pub fn single_turn_radiation(
    config: &SimulationConfig,
    bending_radius: f64,
    n_kicks: usize,
    optimized: Kernel,
) -> Result<f64, TrackError> {
    let sim = config.build()?;
    let rf = &sim.stations[0];
    let kick = |kernel: Kernel| -> Result<Vec<f64>, TrackError> {
        let mut beam = sim.beam.clone();
        let mut sr = SynchrotronRadiation::builder(rf.clone(), bending_radius)
            .n_kicks(n_kicks)
            .kernel(kernel)
            .build(&mut beam)?;
        sr.track(&mut beam, 0);
        Ok(beam.de)
    };
    let reference = kick(Kernel::Reference)?;
    let fast = kick(optimized)?;
    Ok(reference
        .iter()
        .zip(&fast)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_runs_have_zero_error() {
        let cfg = SimulationConfig::positron_storage_ring(3);
        let run = radiation_parity(&cfg, 3, Kernel::Reference).expect("parity");
        let e = run.errors();
        assert_eq!(run.reference, run.optimized);
        assert_eq!(e.mean_de, 0.0);
        assert_eq!(run.particle_error(), 0.0);
    }

    #[test]
    fn series_built_per_turn() {
        let cfg = SimulationConfig::positron_storage_ring(4);
        let run = radiation_parity(&cfg, 4, Kernel::optimized()).expect("parity");
        assert_eq!(run.reference.mean_de.len(), 4);
        assert_eq!(run.optimized.sigma_dt.len(), 4);
        assert_eq!(run.reference_de.len(), 100);
    }

    #[test]
    fn single_turn_kernels_agree() {
        let cfg = SimulationConfig::positron_storage_ring(1);
        for n_kicks in [1, 2] {
            let diff =
                single_turn_radiation(&cfg, 5.559, n_kicks, Kernel::optimized()).expect("kick");
            assert!(diff < crate::tolerances::SINGLE_TURN_DE_ABS, "{n_kicks} kicks: {diff}");
        }
    }
}
