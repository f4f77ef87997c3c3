//! Match clock and phase state machine.
//!
//! One simulated second is half a real second at speed 1.0: the clock
//! advances by real elapsed time x game speed x 2. Once a half's window is
//! exceeded, stoppage time accrues instead of ending the half; the half
//! ends only when elapsed stoppage reaches the allowance computed by the
//! rules engine.

use serde::{Deserialize, Serialize};

/// Regulation half length in simulated seconds.
pub const HALF_SECS: f32 = 45.0 * 60.0;
/// Extra-time half length in simulated seconds.
pub const EXTRA_HALF_SECS: f32 = 15.0 * 60.0;
/// Simulated seconds per real second at speed 1.0.
pub const SIM_RATE: f32 = 2.0;

pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Idle,
    Playing,
    Paused,
    HalfTime,
    FullTime,
}

impl MatchPhase {
    /// Legal phase transitions. Everything else is rejected by the
    /// controller.
    pub fn can_transition(self, to: MatchPhase) -> bool {
        use MatchPhase::*;
        matches!(
            (self, to),
            (Idle, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, HalfTime)
                | (HalfTime, Playing)
                | (Playing, FullTime)
        )
    }

    pub fn is_live(self) -> bool {
        matches!(self, MatchPhase::Playing)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchClock {
    /// Simulated seconds since kickoff of half 1.
    pub game_time: f32,
    /// 1..=2 in regulation, 3..=4 when extra time is engaged.
    pub half: u8,
    /// Seconds elapsed beyond the current half's window.
    pub stoppage_time: f32,
    /// Stoppage allowance for the current half, in seconds. Zero until the
    /// window is first exceeded.
    pub stoppage_added: f32,
    pub game_speed: f32,
}

impl Default for MatchClock {
    fn default() -> Self {
        Self { game_time: 0.0, half: 1, stoppage_time: 0.0, stoppage_added: 0.0, game_speed: 1.0 }
    }
}

impl MatchClock {
    /// Game time at which the given half's regulation window closes.
    pub fn half_window_end(half: u8) -> f32 {
        match half {
            1 => HALF_SECS,
            2 => 2.0 * HALF_SECS,
            3 => 2.0 * HALF_SECS + EXTRA_HALF_SECS,
            _ => 2.0 * HALF_SECS + 2.0 * EXTRA_HALF_SECS,
        }
    }

    /// Game time at which the given half begins.
    pub fn half_start(half: u8) -> f32 {
        match half {
            1 => 0.0,
            2 => HALF_SECS,
            3 => 2.0 * HALF_SECS,
            _ => 2.0 * HALF_SECS + EXTRA_HALF_SECS,
        }
    }

    /// Advance by `real_dt` real seconds; returns the simulated delta.
    /// Past the window the same delta accrues as stoppage.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let sim_dt = real_dt * self.game_speed * SIM_RATE;
        self.game_time += sim_dt;
        let window_end = Self::half_window_end(self.half);
        if self.game_time > window_end {
            self.stoppage_time = self.game_time - window_end;
        }
        sim_dt
    }

    /// Whether the current half's window has been exceeded (stoppage is
    /// running).
    pub fn in_stoppage(&self) -> bool {
        self.game_time > Self::half_window_end(self.half)
    }

    /// The half ends only once elapsed stoppage covers the allowance.
    pub fn half_over(&self) -> bool {
        self.in_stoppage() && self.stoppage_added > 0.0 && self.stoppage_time >= self.stoppage_added
    }

    /// Begin the next half: the clock snaps to the nominal start so
    /// overshoot from stoppage never leaks into the new half.
    pub fn start_half(&mut self, half: u8) {
        self.half = half;
        self.game_time = Self::half_start(half);
        self.stoppage_time = 0.0;
        self.stoppage_added = 0.0;
    }

    /// Display minute, stoppage included.
    pub fn minute(&self) -> u8 {
        (self.game_time / 60.0).floor().min(150.0) as u8
    }

    /// Seconds left of regulation (or of extra time when engaged), used by
    /// the tactical endgame table. Never negative.
    pub fn remaining_secs(&self, extra_time: bool) -> f32 {
        let end = if extra_time {
            Self::half_window_end(4)
        } else {
            Self::half_window_end(2)
        };
        (end - self.game_time).max(0.0)
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.game_speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }
}

/// Kickoff taker for a half: the side that kicked off half 1 kicks every
/// odd half, the opponent every even half.
pub fn kickoff_side_for_half(first_kicker: crate::models::TeamSide, half: u8) -> crate::models::TeamSide {
    if half % 2 == 1 {
        first_kicker
    } else {
        first_kicker.opponent()
    }
}
