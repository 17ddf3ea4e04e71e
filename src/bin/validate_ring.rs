// SPDX-License-Identifier: AGPL-3.0-only

//! Ring Model Validation
//!
//! Construction rejects every malformed input with the matching named
//! error; a valid program yields non-negative kinetic energy and an exact
//! turn-0 cycle time; conversions return NaN sentinels instead of failing.
//!
//! Exit code 0 = all checks pass, exit code 1 = any check fails.

use longitrack::error::RingError;
use longitrack::ring::{DataType, Particle, Ring, SynchronousData, SynchronousProgram};
use longitrack::validation::ValidationHarness;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Ring Model Validation                                      ║");
    println!("║  Shape errors, energy program, momentum conversion          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("ring");

    // ── Malformed inputs ──
    println!("═══ Construction errors ═══════════════════════════════════════");
    let constant = SynchronousData::constant_momentum(450e9);

    let err = Ring::new(
        10,
        vec![1000.0, 1000.0],
        vec![vec![1e-3]],
        &constant,
        Particle::proton(),
        1,
        0,
    );
    report(&mut harness, "section/length mismatch", &err, |e| {
        matches!(e, RingError::RingLengthMismatch { .. })
    });

    let err = Ring::new(
        10,
        vec![1000.0, 1000.0],
        vec![vec![1e-3]],
        &constant,
        Particle::proton(),
        2,
        0,
    );
    report(&mut harness, "section/alpha count mismatch", &err, |e| {
        matches!(e, RingError::AlphaSectionMismatch { .. })
    });

    let series = SynchronousData::new(
        DataType::Momentum,
        SynchronousProgram::TimeSeries {
            time: vec![vec![0.0, 1.0, 2.0]],
            values: vec![vec![450e9, 451e9]],
        },
    );
    let err = Ring::single_section(10, 2000.0, 1e-3, &series, Particle::proton());
    report(&mut harness, "time/array length mismatch", &err, |e| {
        matches!(e, RingError::SynchronousTimeMismatch)
    });

    let short =
        SynchronousData::new(DataType::Momentum, SynchronousProgram::PerTurn(vec![450e9; 5]));
    let err = Ring::single_section(10, 2000.0, 1e-3, &short, Particle::proton());
    report(&mut harness, "momentum length mismatch", &err, |e| {
        matches!(e, RingError::MomentumLengthMismatch { expected: 11, found: 5 })
    });

    let label: Result<DataType, RingError> = "rest energy".parse();
    harness.check_bool(
        "unknown data type label rejected",
        matches!(label, Err(RingError::UnknownDataType(_))),
    );
    println!();

    // ── Valid program ──
    println!("═══ 450 GeV/c electron, 1 section, 10 turns ══════════════════");
    match Ring::single_section(10, 2000.0, 1e-3, &constant, Particle::electron()) {
        Ok(ring) => {
            let min_kin = ring.kin_energy[0].iter().copied().fold(f64::INFINITY, f64::min);
            println!("  E_kin min = {min_kin:.6e} eV");
            println!(
                "  t_rev[0] = {:.12e} s, cycle_time[0] = {:.12e} s",
                ring.t_rev[0], ring.cycle_time[0]
            );
            harness.check_bool("kinetic energy >= 0 every turn", min_kin >= 0.0);
            harness.check_exact("cycle_time[0] == t_rev[0]", ring.cycle_time[0], ring.t_rev[0]);
            harness.check_bool(
                "cycle time strictly increasing",
                ring.cycle_time.windows(2).all(|w| w[1] > w[0]),
            );

            // ── Conversions ──
            let m = ring.particle.mass;
            let at_rest = ring.convert_data(m, "total energy").unwrap_or(f64::NAN);
            harness.check_exact("total energy == rest mass -> momentum 0", at_rest, 0.0);
            let below = ring.convert_data(0.5 * m, "total energy").unwrap_or(0.0);
            harness.check_bool("total energy below rest mass -> NaN", below.is_nan());
            let negative = ring.convert_data(-1.0, "kinetic energy").unwrap_or(0.0);
            harness.check_bool("negative kinetic energy -> NaN", negative.is_nan());
            let round_trip = ring
                .convert_data(ring.kin_energy[0][0], "kinetic energy")
                .unwrap_or(f64::NAN);
            harness.check_rel("kinetic energy round trip", round_trip, ring.momentum[0][0], 1e-12);
        }
        Err(e) => {
            println!("  construction failed: {e}");
            harness.check_bool("valid ring constructs", false);
        }
    }

    harness.finish();
}

fn report(
    harness: &mut ValidationHarness,
    label: &str,
    result: &Result<Ring, RingError>,
    expected: impl Fn(&RingError) -> bool,
) {
    match result {
        Ok(_) => {
            println!("  {label}: constructed (expected an error)");
            harness.check_bool(label, false);
        }
        Err(e) => {
            println!("  {label}: {e}");
            harness.check_bool(label, expected(e));
        }
    }
}
