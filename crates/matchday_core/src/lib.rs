//! # matchday_core - Real-time Football Match Simulation Core
//!
//! Two teams of autonomous players plus a ball, driven by one fixed-rate
//! tick: motion, team tactics, player decisions, rules enforcement, and
//! the match clock, producing a continuously evolving game state for a
//! presentation layer.
//!
//! ## Features
//! - Deterministic simulation (same seed + same tick cadence = same match)
//! - Hierarchical decisions: tactical posture -> behavior tree -> target
//! - Rules engine: offside line, boundary restarts, goals, fouls, cards
//! - External physics and UI collaborators behind narrow interfaces

// Game engine APIs often require many parameters for physics, state, etc.
#![allow(clippy::too_many_arguments)]

pub mod engine;
pub mod error;
pub mod models;

pub use engine::{
    Ball, MatchConfig, MatchController, MatchEngine, MatchPhase, MatchSnapshot, MatchStats,
    PhysicsCollaborator, PlayerAction, PlayerEntity, SubstitutionOutcome, TeamBehavior, Vec2,
};
pub use error::{ControlError, MatchError, Result};
pub use models::{
    EventType, Formation, MatchEvent, Player, PlayerAttributes, Role, TacticalConfig, Team,
    TeamSide,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::test_team_with_bench;

    fn run_full_match(seed: u64) -> MatchEngine {
        let mut engine = MatchEngine::new(
            test_team_with_bench("Home United"),
            test_team_with_bench("Away Town"),
            MatchConfig { seed, game_speed: 4.0, extra_time: false },
        )
        .expect("valid rosters");
        engine.start();

        // 0.25 real seconds per tick at speed 4.0 = 2 simulated seconds.
        let mut guard = 0u32;
        while engine.phase != MatchPhase::FullTime {
            engine.tick(0.25);
            guard += 1;
            assert!(guard < 100_000, "match failed to terminate");
        }
        engine
    }

    #[test]
    fn full_match_terminates_with_consistent_score() {
        let engine = run_full_match(1234);

        assert_eq!(engine.phase, MatchPhase::FullTime);
        assert!(engine.clock.game_time >= 90.0 * 60.0);

        let goal_events = engine
            .events
            .iter()
            .filter(|e| e.event_type == EventType::Goal)
            .count();
        assert_eq!(
            engine.score.0 as usize + engine.score.1 as usize,
            goal_events,
            "score matches goal events"
        );

        // Both halves were played.
        assert!(engine
            .events
            .iter()
            .any(|e| e.event_type == EventType::HalfTime));
        assert!(engine
            .events
            .iter()
            .any(|e| e.event_type == EventType::FullTime));
    }

    #[test]
    fn same_seed_replays_identically() {
        let a = run_full_match(777);
        let b = run_full_match(777);

        assert_eq!(a.score, b.score);
        assert_eq!(a.events.len(), b.events.len());
        for (ea, eb) in a.events.iter().zip(b.events.iter()) {
            assert_eq!(ea.event_type, eb.event_type);
            assert_eq!(ea.minute, eb.minute);
            assert_eq!(ea.player_id, eb.player_id);
        }
    }

    #[test]
    fn possession_tracks_the_possessor_every_tick() {
        let mut engine = MatchEngine::new(
            test_team_with_bench("Home United"),
            test_team_with_bench("Away Town"),
            MatchConfig { seed: 5, ..Default::default() },
        )
        .expect("valid rosters");
        engine.start();

        // Let the kickoff resolve, then follow the carrier for a while.
        for _ in 0..40 {
            engine.tick(0.1);
            if let Some(owner) = engine.ball.possessor {
                let holder = engine.entity(owner).expect("possessor exists");
                assert_eq!(engine.ball.position, holder.position);
                assert_eq!(engine.ball.velocity, Vec2::default());
            }
        }
    }

    #[test]
    fn possession_seconds_accumulate() {
        let engine = run_full_match(42);
        let total = engine.stats.home.possession_secs + engine.stats.away.possession_secs;
        assert!(total > 60.0, "someone held the ball, got {}", total);
        let (h, a) = engine.stats.possession_percent();
        assert_eq!(h as u32 + a as u32, 100);
    }

    #[test]
    fn stoppage_time_is_played_each_half() {
        let engine = run_full_match(9001);
        // The final whistle waits for the second half's allowance, which
        // is never below a minute.
        assert!(engine.clock.game_time >= 90.0 * 60.0 + 60.0);
    }
}
