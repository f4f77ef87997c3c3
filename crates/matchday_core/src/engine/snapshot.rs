//! Read model for the presentation layer.
//!
//! The UI store polls `MatchSnapshot::capture` and renders it; nothing in
//! the snapshot borrows engine state.

use serde::Serialize;

use super::behavior::PlayerAction;
use super::cards::BookedCard;
use super::clock::MatchPhase;
use super::entity::Ball;
use super::orchestrator::{InjuryRecord, MatchEngine, TeamUnit};
use super::pitch::Vec2;
use super::rules::Restart;
use super::stats::TeamStats;
use super::tactics::TeamBehavior;
use crate::models::{MatchEvent, Role, TeamSide};

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub name: String,
    pub squad_number: u8,
    pub role: Role,
    pub position: Vec2,
    pub fatigue: f32,
    pub has_ball: bool,
    pub last_action: PlayerAction,
    pub yellow_cards: u8,
    pub sent_off: bool,
    pub injured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSnapshot {
    pub name: String,
    pub formation: String,
    pub score: u8,
    pub behavior: TeamBehavior,
    pub possession_percent: u8,
    pub stats: TeamStats,
    pub subs_remaining: u8,
    pub players: Vec<PlayerSnapshot>,
    /// Bench roster, name and number only.
    pub bench: Vec<(u8, String)>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClockSnapshot {
    pub game_time: f32,
    pub minute: u8,
    pub half: u8,
    pub stoppage_time: f32,
    pub stoppage_added: f32,
    pub game_speed: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub clock: ClockSnapshot,
    pub home: TeamSnapshot,
    pub away: TeamSnapshot,
    pub ball: Ball,
    pub possession: Option<TeamSide>,
    pub set_piece: Option<Restart>,
    /// Offside line faced by (home attack, away attack).
    pub offside_lines: (f32, f32),
    pub cards: Vec<BookedCard>,
    pub injuries: Vec<InjuryRecord>,
    pub events: Vec<MatchEvent>,
}

fn team_snapshot(unit: &TeamUnit, score: u8, possession_percent: u8, stats: TeamStats) -> TeamSnapshot {
    TeamSnapshot {
        name: unit.team.name.clone(),
        formation: unit.team.formation.code().to_string(),
        score,
        behavior: unit.tactical.behavior,
        possession_percent,
        stats,
        subs_remaining: unit.subs_remaining,
        bench: unit
            .bench
            .iter()
            .map(|p| (p.squad_number, p.name.clone()))
            .collect(),
        players: unit
            .entities
            .iter()
            .map(|e| PlayerSnapshot {
                id: e.id,
                name: e.player.name.clone(),
                squad_number: e.player.squad_number,
                role: e.player.role,
                position: e.position,
                fatigue: e.fatigue,
                has_ball: e.has_ball,
                last_action: e.last_action,
                yellow_cards: e.yellow_cards,
                sent_off: e.sent_off,
                injured: e.injured,
            })
            .collect(),
    }
}

impl MatchSnapshot {
    pub fn capture(engine: &MatchEngine) -> Self {
        let (home_pct, away_pct) = engine.stats.possession_percent();
        Self {
            phase: engine.phase,
            clock: ClockSnapshot {
                game_time: engine.clock.game_time,
                minute: engine.clock.minute(),
                half: engine.clock.half,
                stoppage_time: engine.clock.stoppage_time,
                stoppage_added: engine.clock.stoppage_added,
                game_speed: engine.clock.game_speed,
            },
            home: team_snapshot(&engine.home, engine.score.0, home_pct, engine.stats.home),
            away: team_snapshot(&engine.away, engine.score.1, away_pct, engine.stats.away),
            ball: engine.ball.clone(),
            possession: engine.possession,
            set_piece: engine.set_piece,
            offside_lines: engine.offside_lines,
            cards: engine.cards.booked().to_vec(),
            injuries: engine.injuries.clone(),
            events: engine.events.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::orchestrator::MatchConfig;
    use crate::engine::test_support::test_team;

    #[test]
    fn snapshot_serializes_to_json() {
        let mut engine = MatchEngine::new(
            test_team("Home United"),
            test_team("Away Town"),
            MatchConfig::default(),
        )
        .expect("valid rosters");
        engine.start();
        engine.tick(0.1);

        let snapshot = MatchSnapshot::capture(&engine);
        assert_eq!(snapshot.home.players.len(), 11);
        assert_eq!(snapshot.away.players.len(), 11);

        let json = serde_json::to_string(&snapshot).expect("serializable");
        assert!(json.contains("\"phase\""));
        assert!(json.contains("Home United"));
    }

    #[test]
    fn snapshot_reflects_score_and_events() {
        let mut engine = MatchEngine::new(
            test_team("Home United"),
            test_team("Away Town"),
            MatchConfig::default(),
        )
        .expect("valid rosters");
        engine.start();
        engine.handle_goal(crate::models::TeamSide::Home);

        let snapshot = MatchSnapshot::capture(&engine);
        assert_eq!(snapshot.home.score, 1);
        assert!(snapshot
            .events
            .iter()
            .any(|e| e.event_type == crate::models::EventType::Goal));
    }
}
