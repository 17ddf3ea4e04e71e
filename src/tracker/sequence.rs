// SPDX-License-Identifier: AGPL-3.0-only

//! Ordered turn map with the turn counter.
//!
//! The sequence owns its maps and applies each one exactly once per turn,
//! in insertion order. A ring of N sections is typically
//! `[tracker_0, radiation_0, .., tracker_{N-1}, radiation_{N-1}, profile]`.

use log::info;

use super::{RingAndRfTracker, TurnMap};
use crate::beam::Beam;
use crate::error::TrackError;
use crate::profile::Profile;
use crate::synchrotron_radiation::SynchrotronRadiation;

/// One entry of the turn sequence.
pub enum TrackingMap {
    KickDrift(RingAndRfTracker),
    Radiation(SynchrotronRadiation),
    Profiling(Profile),
    Custom(Box<dyn TurnMap>),
}

impl TrackingMap {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::KickDrift(_) => "kick_drift",
            Self::Radiation(_) => "radiation",
            Self::Profiling(_) => "profiling",
            Self::Custom(_) => "custom",
        }
    }

    #[must_use]
    pub const fn as_profile(&self) -> Option<&Profile> {
        match self {
            Self::Profiling(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_radiation(&self) -> Option<&SynchrotronRadiation> {
        match self {
            Self::Radiation(r) => Some(r),
            _ => None,
        }
    }
}

impl std::fmt::Debug for TrackingMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TurnMap for TrackingMap {
    fn track(&mut self, beam: &mut Beam, turn: usize) {
        match self {
            Self::KickDrift(m) => m.track(beam, turn),
            Self::Radiation(m) => m.track(beam, turn),
            Self::Profiling(m) => m.track(beam, turn),
            Self::Custom(m) => m.track(beam, turn),
        }
    }
}

impl From<RingAndRfTracker> for TrackingMap {
    fn from(m: RingAndRfTracker) -> Self {
        Self::KickDrift(m)
    }
}

impl From<SynchrotronRadiation> for TrackingMap {
    fn from(m: SynchrotronRadiation) -> Self {
        Self::Radiation(m)
    }
}

impl From<Profile> for TrackingMap {
    fn from(m: Profile) -> Self {
        Self::Profiling(m)
    }
}

/// Maps replayed once per turn for at most `n_turns` turns.
#[derive(Debug)]
pub struct TurnSequence {
    maps: Vec<TrackingMap>,
    turn: usize,
    n_turns: usize,
}

impl TurnSequence {
    #[must_use]
    pub const fn new(n_turns: usize) -> Self {
        Self {
            maps: Vec::new(),
            turn: 0,
            n_turns,
        }
    }

    pub fn push(&mut self, map: impl Into<TrackingMap>) -> &mut Self {
        self.maps.push(map.into());
        self
    }

    #[must_use]
    pub fn with(mut self, map: impl Into<TrackingMap>) -> Self {
        self.maps.push(map.into());
        self
    }

    /// Next turn to be tracked.
    #[must_use]
    pub const fn turn(&self) -> usize {
        self.turn
    }

    #[must_use]
    pub const fn n_turns(&self) -> usize {
        self.n_turns
    }

    #[must_use]
    pub fn maps(&self) -> &[TrackingMap] {
        &self.maps
    }

    /// First profiling map, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.maps.iter().find_map(TrackingMap::as_profile)
    }

    /// Apply every map once and advance the counter.
    ///
    /// # Errors
    /// [`TrackError::ProgramExhausted`] once all programmed turns are used;
    /// the beam is left untouched.
    pub fn track(&mut self, beam: &mut Beam) -> Result<(), TrackError> {
        if self.turn >= self.n_turns {
            return Err(TrackError::ProgramExhausted {
                turn: self.turn,
                n_turns: self.n_turns,
            });
        }
        for map in &mut self.maps {
            map.track(beam, self.turn);
        }
        self.turn += 1;
        Ok(())
    }

    /// Track `turns` turns, calling `observer(turn, beam)` after each.
    ///
    /// # Errors
    /// [`TrackError::ProgramExhausted`] before any tracking if the request
    /// runs past the program.
    pub fn run<F>(
        &mut self,
        beam: &mut Beam,
        turns: usize,
        mut observer: F,
    ) -> Result<(), TrackError>
    where
        F: FnMut(usize, &Beam),
    {
        let last = self.turn + turns;
        if last > self.n_turns {
            return Err(TrackError::ProgramExhausted {
                turn: last - 1,
                n_turns: self.n_turns,
            });
        }
        info!(
            "tracking turns {}..{last} through {} map(s)",
            self.turn,
            self.maps.len()
        );
        for _ in 0..turns {
            let turn = self.turn;
            self.track(beam)?;
            observer(turn, beam);
        }
        Ok(())
    }
}
