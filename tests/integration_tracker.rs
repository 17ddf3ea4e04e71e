// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: turn sequence, configuration-built simulations and
//! kick-drift kernel agreement.

use std::sync::{Arc, Mutex};

use longitrack::error::TrackError;
use longitrack::tolerances;
use longitrack::tracker::sequence::TrackingMap;
use longitrack::{Beam, BeamStatistics, Kernel, SimulationConfig, TurnMap};

/// Records the turn index each time it runs.
struct TurnLog(Arc<Mutex<Vec<usize>>>);

impl TurnMap for TurnLog {
    fn track(&mut self, _beam: &mut Beam, turn: usize) {
        if let Ok(mut turns) = self.0.lock() {
            turns.push(turn);
        }
    }
}

/// Positron ring without radiation: pure synchrotron motion.
fn positron_without_radiation(n_turns: usize) -> SimulationConfig {
    let mut cfg = SimulationConfig::positron_storage_ring(n_turns);
    for section in &mut cfg.sections {
        section.radiation = None;
    }
    cfg
}

fn assert_close_series(label: &str, a: &[f64], b: &[f64], scale: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "{label}: length");
    for (turn, ((x, y), s)) in a.iter().zip(b).zip(scale).enumerate() {
        let bound = tol * y.abs().max(*s);
        assert!((x - y).abs() <= bound, "{label} turn {turn}: {x} vs {y} (bound {bound})");
    }
}

fn history(cfg: &SimulationConfig, turns: usize) -> Vec<BeamStatistics> {
    cfg.build()
        .expect("build")
        .run_statistics(turns)
        .expect("run")
}

#[test]
fn custom_map_sees_every_turn_in_order() {
    let mut sim = positron_without_radiation(6).build().expect("build");
    let log = Arc::new(Mutex::new(Vec::new()));
    sim.sequence
        .push(TrackingMap::Custom(Box::new(TurnLog(Arc::clone(&log)))));
    sim.run(4, |_, _| {}).expect("first run");
    sim.run(2, |_, _| {}).expect("second run");
    let turns = log.lock().map(|t| t.clone()).unwrap_or_default();
    assert_eq!(turns, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(sim.sequence.turn(), 6);
}

#[test]
fn running_past_the_program_fails_before_tracking() {
    let mut sim = positron_without_radiation(5).build().expect("build");
    let before = sim.beam.dt.clone();
    let err = sim.run(6, |_, _| {}).unwrap_err();
    assert!(matches!(err, TrackError::ProgramExhausted { n_turns: 5, .. }));
    assert_eq!(sim.beam.dt, before);
    assert_eq!(sim.sequence.turn(), 0);
}

#[test]
fn observer_receives_the_tracked_turn() {
    let mut sim = positron_without_radiation(3).build().expect("build");
    let mut turns = Vec::new();
    sim.run(3, |turn, beam| {
        assert_eq!(beam.n_alive(), beam.n_macroparticles());
        turns.push(turn);
    })
    .expect("run");
    assert_eq!(turns, vec![0, 1, 2]);
}

#[test]
fn identical_damping_runs_are_bit_identical() {
    let cfg = SimulationConfig::electron_two_section(20);
    let mut a = cfg.build().expect("build a");
    let mut b = cfg.build().expect("build b");
    let ha = a.run_statistics(20).expect("run a");
    let hb = b.run_statistics(20).expect("run b");
    assert_eq!(ha, hb);
    assert!(a.beam.de.iter().zip(&b.beam.de).all(|(x, y)| x.to_bits() == y.to_bits()));
    assert!(a.beam.dt.iter().zip(&b.beam.dt).all(|(x, y)| x.to_bits() == y.to_bits()));
}

#[test]
fn synchrotron_motion_stays_bounded() {
    let stats = history(&positron_without_radiation(200), 200);
    let initial = stats[0].sigma_de;
    assert!(stats.iter().all(|s| s.sigma_de < 3.0 * initial && s.sigma_de > initial / 3.0));
    assert!(stats.iter().all(|s| s.mean_dt.is_finite()));
}

#[test]
fn tracker_kernels_agree_without_radiation() {
    let turns = 100;
    let reference = positron_without_radiation(turns);
    let mut optimized = reference.clone();
    optimized.kernel = Kernel::optimized();
    let r = history(&reference, turns);
    let o = history(&optimized, turns);

    let pick = |h: &[BeamStatistics], f: fn(&BeamStatistics) -> f64| -> Vec<f64> {
        h.iter().map(f).collect()
    };
    let sigma_dt = pick(&r, |s| s.sigma_dt);
    let sigma_de = pick(&r, |s| s.sigma_de);
    let tol = tolerances::TRACKER_PARITY_REL;
    let (mean_dt, ref_mean_dt) = (pick(&o, |s| s.mean_dt), pick(&r, |s| s.mean_dt));
    let (mean_de, ref_mean_de) = (pick(&o, |s| s.mean_de), pick(&r, |s| s.mean_de));
    assert_close_series("mean dt", &mean_dt, &ref_mean_dt, &sigma_dt, tol);
    assert_close_series("mean dE", &mean_de, &ref_mean_de, &sigma_de, tol);
    assert_close_series("sigma dt", &pick(&o, |s| s.sigma_dt), &sigma_dt, &sigma_dt, tol);
    assert_close_series("sigma dE", &pick(&o, |s| s.sigma_de), &sigma_de, &sigma_de, tol);
}

#[test]
fn tracker_kernels_agree_on_the_electron_ring() {
    let turns = 20;
    let mut reference = SimulationConfig::electron_two_section(turns);
    reference.radiation_kernel = Some(Kernel::Reference);
    let mut optimized = reference.clone();
    optimized.kernel = Kernel::optimized();
    let r = history(&reference, turns);
    let o = history(&optimized, turns);
    for (turn, (x, y)) in o.iter().zip(&r).enumerate() {
        let tol = tolerances::TRACKER_PARITY_REL;
        let dt_scale = y.mean_dt.abs().max(y.sigma_dt);
        let de_scale = y.mean_de.abs().max(y.sigma_de);
        assert!((x.mean_dt - y.mean_dt).abs() <= tol * dt_scale, "turn {turn}");
        assert!((x.mean_de - y.mean_de).abs() <= tol * de_scale, "turn {turn}");
        assert!((x.sigma_de - y.sigma_de).abs() <= tol * y.sigma_de, "turn {turn}");
    }
}

#[test]
fn json_configuration_runs_like_the_preset() {
    let preset = positron_without_radiation(10);
    let parsed = SimulationConfig::from_json_str(&preset.to_json().expect("json")).expect("parse");
    assert_eq!(parsed, preset);
    assert_eq!(history(&parsed, 10), history(&preset, 10));
}
