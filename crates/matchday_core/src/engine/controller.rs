//! Host-facing match controller.
//!
//! The UI layer drives the match through this facade: initialize with two
//! rosters, start, advance on its own timer, pause and resume, change
//! speed, reset. Reads go through `snapshot`.

use super::clock::{MatchPhase, MAX_SPEED, MIN_SPEED};
use super::orchestrator::{MatchConfig, MatchEngine};
use super::snapshot::MatchSnapshot;
use crate::error::{ControlError, Result};
use crate::models::Team;

pub struct MatchController {
    config: MatchConfig,
    /// Rosters kept for `reset`.
    rosters: Option<(Team, Team)>,
    engine: Option<MatchEngine>,
}

impl MatchController {
    pub fn new(config: MatchConfig) -> Self {
        Self { config, rosters: None, engine: None }
    }

    /// Validate both rosters and build the engine. Shape violations are
    /// fatal here and no match state is constructed.
    pub fn initialize(&mut self, home: Team, away: Team) -> Result<()> {
        let engine = MatchEngine::new(home.clone(), away.clone(), self.config)?;
        self.rosters = Some((home, away));
        self.engine = Some(engine);
        Ok(())
    }

    pub fn start(&mut self) -> std::result::Result<(), ControlError> {
        let engine = self.engine.as_mut().ok_or(ControlError::NotInitialized)?;
        if !engine.phase.can_transition(MatchPhase::Playing) {
            return Err(ControlError::WrongPhase(format!("{:?}", engine.phase)));
        }
        engine.start();
        Ok(())
    }

    /// Stops the tick timer's effect; state is untouched.
    pub fn pause(&mut self) -> std::result::Result<(), ControlError> {
        let engine = self.engine.as_mut().ok_or(ControlError::NotInitialized)?;
        if !engine.phase.can_transition(MatchPhase::Paused) {
            return Err(ControlError::WrongPhase(format!("{:?}", engine.phase)));
        }
        engine.phase = MatchPhase::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> std::result::Result<(), ControlError> {
        let engine = self.engine.as_mut().ok_or(ControlError::NotInitialized)?;
        if engine.phase != MatchPhase::Paused {
            return Err(ControlError::WrongPhase(format!("{:?}", engine.phase)));
        }
        engine.phase = MatchPhase::Playing;
        Ok(())
    }

    /// Rebuild the engine from the stored rosters.
    pub fn reset(&mut self) -> std::result::Result<(), ControlError> {
        let (home, away) = self.rosters.clone().ok_or(ControlError::NotInitialized)?;
        self.engine = Some(
            MatchEngine::new(home, away, self.config)
                .expect("rosters validated at initialize"),
        );
        Ok(())
    }

    pub fn set_speed(&mut self, multiplier: f32) -> std::result::Result<(), ControlError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&multiplier) || !multiplier.is_finite() {
            return Err(ControlError::InvalidSpeed(multiplier));
        }
        let engine = self.engine.as_mut().ok_or(ControlError::NotInitialized)?;
        engine.clock.set_speed(multiplier);
        Ok(())
    }

    /// One timer callback: advance the simulation by `real_dt` seconds.
    /// Harmless in any non-playing phase.
    pub fn advance(&mut self, real_dt: f32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(real_dt);
        }
    }

    pub fn snapshot(&self) -> Option<MatchSnapshot> {
        self.engine.as_ref().map(MatchSnapshot::capture)
    }

    pub fn is_finished(&self) -> bool {
        self.engine
            .as_ref()
            .map(|e| e.phase == MatchPhase::FullTime)
            .unwrap_or(false)
    }

    pub fn engine(&self) -> Option<&MatchEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut MatchEngine> {
        self.engine.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::test_team;
    use crate::models::Role;

    fn controller() -> MatchController {
        let mut c = MatchController::new(MatchConfig { seed: 11, ..Default::default() });
        c.initialize(test_team("Home United"), test_team("Away Town")).expect("valid");
        c
    }

    #[test]
    fn commands_before_initialize_fail() {
        let mut c = MatchController::new(MatchConfig::default());
        assert!(matches!(c.start(), Err(ControlError::NotInitialized)));
        assert!(c.snapshot().is_none());
    }

    #[test]
    fn initialize_rejects_bad_roster() {
        let mut c = MatchController::new(MatchConfig::default());
        let mut bad = test_team("Bad FC");
        bad.players[0] = crate::models::Player::new("NotAKeeper", 1, Role::DEF);
        assert!(c.initialize(bad, test_team("Away Town")).is_err());
        assert!(c.snapshot().is_none(), "no state constructed on failure");
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut c = controller();
        c.start().expect("start");
        c.pause().expect("pause");
        let before = c.snapshot().expect("snapshot").clock.game_time;
        c.advance(1.0);
        let after = c.snapshot().expect("snapshot").clock.game_time;
        assert_eq!(before, after, "paused clock holds still");

        c.resume().expect("resume");
        c.advance(1.0);
        let moving = c.snapshot().expect("snapshot").clock.game_time;
        assert!(moving > after);
    }

    #[test]
    fn double_pause_is_rejected_softly() {
        let mut c = controller();
        c.start().expect("start");
        c.pause().expect("pause");
        assert!(matches!(c.pause(), Err(ControlError::WrongPhase(_))));
    }

    #[test]
    fn speed_bounds_are_enforced() {
        let mut c = controller();
        assert!(matches!(c.set_speed(0.0), Err(ControlError::InvalidSpeed(_))));
        assert!(matches!(c.set_speed(4.5), Err(ControlError::InvalidSpeed(_))));
        assert!(c.set_speed(2.0).is_ok());
    }

    #[test]
    fn reset_returns_to_idle_zeroes() {
        let mut c = controller();
        c.start().expect("start");
        for _ in 0..50 {
            c.advance(0.5);
        }
        c.reset().expect("reset");
        let snap = c.snapshot().expect("snapshot");
        assert_eq!(snap.clock.game_time, 0.0);
        assert_eq!(snap.home.score, 0);
        assert!(snap.events.is_empty());
    }
}
