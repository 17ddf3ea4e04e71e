// SPDX-License-Identifier: AGPL-3.0-only

//! Multi-turn tracking driver.
//!
//! Usage: `track_ring [CONFIG.json] [TURNS]`
//!
//! Without a configuration file the two-section 175 GeV/c electron ring is
//! tracked. Beam moments are logged every tenth turn; the closing summary
//! reports the energy offset in units of U₀ and the profile moments.

use std::process;

use log::{error, info};

use longitrack::config::SimulationConfig;
use longitrack::synchrotron_radiation::mean_offset_in_losses;
use longitrack::TrackError;

const DEFAULT_TURNS: usize = 100;
const REPORT_EVERY: usize = 10;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<(), TrackError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            info!("loading configuration from {path}");
            SimulationConfig::from_file(&path)?
        }
        None => SimulationConfig::electron_two_section(DEFAULT_TURNS),
    };
    let turns = args
        .next()
        .and_then(|t| t.parse().ok())
        .unwrap_or(config.n_turns);

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Longitudinal Tracking                                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut sim = config.build()?;
    let ring = &sim.ring;
    println!(
        "  {} section(s), C = {:.3} m, {} turns programmed, E0 = {:.6e} eV",
        ring.n_sections, ring.ring_circumference, ring.n_turns, ring.energy[0][0]
    );
    println!(
        "  {} macro-particles, {} map(s) per turn",
        sim.beam.n_macroparticles(),
        sim.sequence.maps().len()
    );
    println!();

    println!("═══ Tracking ═════════════════════════════════════════════════");
    sim.run(turns, |turn, beam| {
        if (turn + 1) % REPORT_EVERY == 0 || turn == 0 {
            let s = beam.statistics();
            info!(
                "turn {:>5}: <dt> = {:.6e} s, σdt = {:.4e} s, <dE> = {:.6e} eV, \
                 σdE = {:.4e} eV, alive {}",
                turn + 1,
                s.mean_dt,
                s.sigma_dt,
                s.mean_de,
                s.sigma_de,
                s.n_alive
            );
        }
    })?;
    println!();

    println!("═══ Summary ══════════════════════════════════════════════════");
    let s = sim.beam.statistics();
    println!("  <dt> = {:.6e} s, σdt = {:.4e} s", s.mean_dt, s.sigma_dt);
    println!("  <dE> = {:.6e} eV, σdE = {:.4e} eV", s.mean_de, s.sigma_de);
    for (i, sr) in sim
        .sequence
        .maps()
        .iter()
        .filter_map(|m| m.as_radiation())
        .enumerate()
    {
        let p = sr.params();
        println!(
            "  radiation {i}: U0 = {:.6e} eV, τz = {:.3} turns, <dE>/U0 = {:.4}",
            p.u0,
            p.tau_z,
            mean_offset_in_losses(&sim.beam, p)
        );
    }
    if let Some(profile) = sim.sequence.profile() {
        println!(
            "  profile: position = {:.6e} s, rms length = {:.4e} s, {} slices",
            profile.bunch_position(),
            profile.bunch_length_rms(),
            profile.cuts().n_slices
        );
    }
    Ok(())
}
