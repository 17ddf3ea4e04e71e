// SPDX-License-Identifier: AGPL-3.0-only

//! Radiation Kernel Parity: reference vs optimized
//!
//! Tracks the two-section 175 GeV/c electron ring twice from identical
//! seeds, once per radiation kernel, and compares the per-turn mean and RMS
//! of dt and dE. Damping-only runs must agree within
//! `DAMPING_PARITY_REL`; quantum-excitation runs only statistically.
//! A single radiation turn on the positron ring is compared in absolute dE.
//!
//! Exit code 0 = all checks pass, exit code 1 = any check fails.

use longitrack::config::SimulationConfig;
use longitrack::kernel::Kernel;
use longitrack::parity::{radiation_parity, single_turn_radiation, ParityRun};
use longitrack::tolerances;
use longitrack::validation::ValidationHarness;

const TURN_COUNTS: [usize; 2] = [10, 100];
const POSITRON_BENDING_RADIUS: f64 = 5.559;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Radiation Kernel Parity: reference vs optimized            ║");
    println!("║  2 sections, 175 GeV/c electrons, 1 sub-kick                ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("kernel_parity");
    let optimized = Kernel::optimized();

    // ── Damping only ──
    println!("═══ Damping only ═════════════════════════════════════════════");
    for turns in TURN_COUNTS {
        let config = SimulationConfig::electron_two_section(turns);
        match radiation_parity(&config, turns, optimized) {
            Ok(run) => {
                print_errors(&run);
                let tol = tolerances::DAMPING_PARITY_REL;
                check_series(&mut harness, &run, "damping", tol, tol);
                harness.check_upper(
                    &format!("damping {turns} turns: per-particle dE"),
                    run.particle_error(),
                    tol,
                );
            }
            Err(e) => {
                println!("  {turns} turns: run failed: {e}");
                harness.check_bool(&format!("damping {turns} turns runs"), false);
            }
        }
    }
    println!();

    // ── Quantum excitation ──
    println!("═══ Quantum excitation ═══════════════════════════════════════");
    for turns in TURN_COUNTS {
        let config = SimulationConfig::electron_two_section(turns).with_quantum_excitation(true);
        match radiation_parity(&config, turns, optimized) {
            Ok(run) => {
                print_errors(&run);
                check_series(
                    &mut harness,
                    &run,
                    "excitation",
                    tolerances::EXCITATION_MEAN_REL,
                    tolerances::excitation_std_rel(turns),
                );
            }
            Err(e) => {
                println!("  {turns} turns: run failed: {e}");
                harness.check_bool(&format!("excitation {turns} turns runs"), false);
            }
        }
    }
    println!();

    // ── Single turn ──
    println!("═══ Single radiation turn, 2.5 GeV positrons ═════════════════");
    let config = SimulationConfig::positron_storage_ring(1);
    for n_kicks in [1, 2] {
        match single_turn_radiation(&config, POSITRON_BENDING_RADIUS, n_kicks, optimized) {
            Ok(diff) => {
                println!("  {n_kicks} sub-kick(s): max |ΔdE| = {diff:.3e} eV");
                harness.check_upper(
                    &format!("single turn, {n_kicks} sub-kick(s): max |ΔdE| (eV)"),
                    diff,
                    tolerances::SINGLE_TURN_DE_ABS,
                );
            }
            Err(e) => {
                println!("  {n_kicks} sub-kick(s): failed: {e}");
                harness.check_bool(&format!("single turn, {n_kicks} sub-kick(s) runs"), false);
            }
        }
    }

    harness.finish();
}

fn print_errors(run: &ParityRun) {
    let e = run.errors();
    println!(
        "  {:>3} turns: mean_dt {:.2e}  sigma_dt {:.2e}  mean_dE {:.2e}  sigma_dE {:.2e}",
        run.turns, e.mean_dt, e.sigma_dt, e.mean_de, e.sigma_de
    );
}

fn check_series(
    harness: &mut ValidationHarness,
    run: &ParityRun,
    label: &str,
    mean_tol: f64,
    std_tol: f64,
) {
    let (r, o) = (&run.reference, &run.optimized);
    let series = [
        ("mean dt", &o.mean_dt, &r.mean_dt, mean_tol),
        ("mean dE", &o.mean_de, &r.mean_de, mean_tol),
        ("sigma dt", &o.sigma_dt, &r.sigma_dt, std_tol),
        ("sigma dE", &o.sigma_de, &r.sigma_de, std_tol),
    ];
    for (name, observed, expected, tol) in series {
        let check = format!("{label} {} turns: {name}", run.turns);
        harness.check_series_rel(&check, observed, expected, tol);
    }
}
