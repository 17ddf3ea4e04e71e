// SPDX-License-Identifier: AGPL-3.0-only

//! Simulation configuration
//!
//! A JSON-loadable description of a whole run: ring sections, RF systems,
//! optional radiation, beam, profile and kernel choice. [`SimulationConfig::build`]
//! validates everything before the first turn is tracked.

use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::beam::distributions::bigaussian;
use crate::beam::{Beam, BeamStatistics};
use crate::constants::C_LIGHT;
use crate::error::TrackError;
use crate::kernel::Kernel;
use crate::profile::{CutOptions, Profile};
use crate::rf::{RfProgram, RfStation};
use crate::ring::{DataType, Particle, Ring, SynchronousData, SynchronousProgram};
use crate::synchrotron_radiation::SynchrotronRadiation;
use crate::tracker::sequence::TurnSequence;
use crate::tracker::{DriftSolver, RingAndRfTracker};

/// Particle species by name, or explicit mass (eV) and charge (e).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Electron,
    Positron,
    Proton,
    Custom { mass: f64, charge: f64 },
}

impl From<ParticleKind> for Particle {
    fn from(kind: ParticleKind) -> Self {
        match kind {
            ParticleKind::Electron => Self::electron(),
            ParticleKind::Positron => Self::positron(),
            ParticleKind::Proton => Self::proton(),
            ParticleKind::Custom { mass, charge } => Self::custom(mass, charge),
        }
    }
}

/// One superimposed RF system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfSystemConfig {
    pub harmonic: RfProgram,
    /// Peak voltage (V)
    pub voltage: RfProgram,
    /// Phase offset (rad)
    pub phi_offset: RfProgram,
}

const fn one() -> usize {
    1
}

/// Radiation at the end of a section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadiationConfig {
    /// Bending radius (m)
    pub bending_radius: f64,
    #[serde(default = "one")]
    pub n_kicks: usize,
    #[serde(default)]
    pub shift_beam: bool,
    #[serde(default)]
    pub quantum_excitation: bool,
    /// Excitation seed; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One ring section followed by its RF station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section length (m)
    pub length: f64,
    /// Momentum compaction α₀, α₁, ...
    pub alpha: Vec<f64>,
    pub rf: Vec<RfSystemConfig>,
    #[serde(default)]
    pub radiation: Option<RadiationConfig>,
}

/// Initial bi-Gaussian bunch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamConfig {
    pub n_macroparticles: usize,
    /// Real particles in the bunch
    pub intensity: f64,
    /// RMS bunch length (s)
    pub sigma_dt: f64,
    /// RMS energy spread (eV); matched to `sigma_dt` when absent
    #[serde(default)]
    pub sigma_de: Option<f64>,
    pub seed: u64,
}

/// Full simulation description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct SimulationConfig {
    pub n_turns: usize,
    pub particle: ParticleKind,
    pub synchronous_data: SynchronousData,
    #[serde(default)]
    pub alpha_order: usize,
    pub sections: Vec<SectionConfig>,
    pub beam: BeamConfig,
    #[serde(default)]
    pub profile: Option<CutOptions>,
    /// Kernel of the kick-drift maps
    #[serde(default)]
    pub kernel: Kernel,
    /// Kernel of the radiation maps; follows `kernel` when absent
    #[serde(default)]
    pub radiation_kernel: Option<Kernel>,
    #[serde(default)]
    pub drift_solver: DriftSolver,
}

/// Built simulation, ready to track from turn 0.
#[derive(Debug)]
pub struct Simulation {
    pub ring: Arc<Ring>,
    /// One station per section
    pub stations: Vec<Arc<RfStation>>,
    pub beam: Beam,
    pub sequence: TurnSequence,
}

impl Simulation {
    /// Track `turns` turns, calling `observer` after each.
    ///
    /// # Errors
    /// [`TrackError::ProgramExhausted`] if the program is too short.
    pub fn run<F>(&mut self, turns: usize, observer: F) -> Result<(), TrackError>
    where
        F: FnMut(usize, &Beam),
    {
        self.sequence.run(&mut self.beam, turns, observer)
    }

    /// Track `turns` turns and collect the beam statistics after each.
    ///
    /// # Errors
    /// See [`Simulation::run`].
    pub fn run_statistics(&mut self, turns: usize) -> Result<Vec<BeamStatistics>, TrackError> {
        let mut history = Vec::with_capacity(turns);
        self.run(turns, |_, beam| history.push(beam.statistics()))?;
        Ok(history)
    }
}

impl SimulationConfig {
    /// Parse from JSON text.
    ///
    /// # Errors
    /// [`TrackError::ConfigParse`] on malformed or incomplete JSON.
    pub fn from_json_str(json: &str) -> Result<Self, TrackError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    /// [`TrackError::ConfigRead`] or [`TrackError::ConfigParse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// [`TrackError::ConfigParse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TrackError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build ring, stations, beam and turn sequence.
    ///
    /// Per section the sequence holds the kick-drift map followed by its
    /// radiation map if any; a profile, if configured, closes the turn.
    ///
    /// # Errors
    /// The first construction error encountered.
    pub fn build(&self) -> Result<Simulation, TrackError> {
        let n_sections = self.sections.len();
        let ring = Arc::new(Ring::new(
            self.n_turns,
            self.sections.iter().map(|s| s.length).collect(),
            self.sections.iter().map(|s| s.alpha.clone()).collect(),
            &self.synchronous_data,
            self.particle.into(),
            n_sections,
            self.alpha_order,
        )?);

        let stations = self
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let harmonic: Vec<RfProgram> = s.rf.iter().map(|r| r.harmonic.clone()).collect();
                let voltage: Vec<RfProgram> = s.rf.iter().map(|r| r.voltage.clone()).collect();
                let phi: Vec<RfProgram> = s.rf.iter().map(|r| r.phi_offset.clone()).collect();
                RfStation::new(Arc::clone(&ring), &harmonic, &voltage, &phi, i).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut beam = Beam::new(self.beam.n_macroparticles, self.beam.intensity)?;
        bigaussian(
            &stations[0],
            &mut beam,
            self.beam.sigma_dt,
            self.beam.sigma_de,
            self.beam.seed,
        )?;

        let radiation_kernel = self.radiation_kernel.unwrap_or(self.kernel);
        let mut sequence = TurnSequence::new(self.n_turns);
        for (section, station) in self.sections.iter().zip(&stations) {
            sequence.push(
                RingAndRfTracker::new(Arc::clone(station), self.kernel)?
                    .with_solver(self.drift_solver),
            );
            if let Some(rad) = &section.radiation {
                let mut builder =
                    SynchrotronRadiation::builder(Arc::clone(station), rad.bending_radius)
                        .n_kicks(rad.n_kicks)
                        .shift_beam(rad.shift_beam)
                        .quantum_excitation(rad.quantum_excitation)
                        .kernel(radiation_kernel);
                if let Some(seed) = rad.seed {
                    builder = builder.seed(seed);
                }
                sequence.push(builder.build(&mut beam)?);
            }
        }
        if let Some(cuts) = self.profile {
            let mut profile = Profile::new(cuts)?;
            profile.histogram(&beam);
            sequence.push(profile);
        }

        info!(
            "simulation built: {} turn(s), {n_sections} section(s), \
             {} macro-particle(s), {} map(s)",
            self.n_turns,
            beam.n_macroparticles(),
            sequence.maps().len()
        );
        Ok(Simulation {
            ring,
            stations,
            beam,
            sequence,
        })
    }

    /// 2.5 GeV, 110.4 m positron storage ring with one bending radius.
    pub fn positron_storage_ring(n_turns: usize) -> Self {
        Self {
            n_turns,
            particle: ParticleKind::Positron,
            synchronous_data: SynchronousData::new(
                DataType::TotalEnergy,
                SynchronousProgram::Constant(2.5e9),
            ),
            alpha_order: 0,
            sections: vec![SectionConfig {
                length: 110.4,
                alpha: vec![0.0082],
                rf: vec![RfSystemConfig {
                    harmonic: 184.0.into(),
                    voltage: 800e3.into(),
                    phi_offset: 0.0.into(),
                }],
                radiation: Some(RadiationConfig {
                    bending_radius: 5.559,
                    n_kicks: 1,
                    shift_beam: false,
                    quantum_excitation: false,
                    seed: Some(1234),
                }),
            }],
            beam: BeamConfig {
                n_macroparticles: 100,
                intensity: 2.299e9,
                sigma_dt: 10e-12,
                sigma_de: None,
                seed: 1234,
            },
            profile: None,
            kernel: Kernel::Reference,
            radiation_kernel: None,
            drift_solver: DriftSolver::Simple,
        }
    }

    /// Two-section 175 GeV/c electron ring, 10 GV shared by the stations.
    pub fn electron_two_section(n_turns: usize) -> Self {
        const N_SECTIONS: usize = 2;
        let radius = 15_915.49;
        let circumference = 2.0 * PI * radius;
        let gamma_t: f64 = 377.964_47;
        let harmonic = 133_650.0;
        let bucket_length = circumference / C_LIGHT / harmonic;

        let sections = (0..N_SECTIONS)
            .map(|s| SectionConfig {
                length: circumference / N_SECTIONS as f64,
                alpha: vec![1.0 / (gamma_t * gamma_t)],
                rf: vec![RfSystemConfig {
                    harmonic: harmonic.into(),
                    voltage: (10e9 / N_SECTIONS as f64).into(),
                    phi_offset: PI.into(),
                }],
                radiation: Some(RadiationConfig {
                    bending_radius: 11e3,
                    n_kicks: 1,
                    shift_beam: false,
                    quantum_excitation: false,
                    seed: Some(1000 + s as u64),
                }),
            })
            .collect();

        Self {
            n_turns,
            particle: ParticleKind::Electron,
            synchronous_data: SynchronousData::constant_momentum(175e9),
            alpha_order: 0,
            sections,
            beam: BeamConfig {
                n_macroparticles: 10_000,
                intensity: 1.7e11,
                sigma_dt: 50e-12,
                sigma_de: None,
                seed: 1000,
            },
            profile: Some(CutOptions {
                cut_left: 0.0,
                cut_right: bucket_length,
                n_slices: 500,
            }),
            kernel: Kernel::Reference,
            radiation_kernel: None,
            drift_solver: DriftSolver::Simple,
        }
    }

    /// Switch every radiation map to quantum excitation.
    pub fn with_quantum_excitation(mut self, enabled: bool) -> Self {
        for rad in self.sections.iter_mut().filter_map(|s| s.radiation.as_mut()) {
            rad.quantum_excitation = enabled;
        }
        self
    }
}
