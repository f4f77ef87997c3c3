//! Goal handling, boundary restarts, kickoffs, and half transitions.
//!
//! Impl-split from the orchestrator: everything here rearranges the dead
//! ball and the match phase; open play never runs while a set piece is
//! pending.

use super::clock::{kickoff_side_for_half, MatchPhase};
use super::orchestrator::MatchEngine;
use super::physics::BALL_BODY;
use super::pitch::Vec2;
use super::positioning;
use super::rules::{Restart, RestartKind};
use crate::models::{EventType, TeamSide};

impl MatchEngine {
    /// A goal: score, log, and restart with a kickoff for the conceding
    /// side. Both teams reset to formation shape around the recentred
    /// ball.
    pub(crate) fn handle_goal(&mut self, scorer_side: TeamSide) {
        match scorer_side {
            TeamSide::Home => self.score.0 = self.score.0.saturating_add(1),
            TeamSide::Away => self.score.1 = self.score.1.saturating_add(1),
        }
        self.counted_events_in_half += 1;

        let scorer = self.last_shooter.filter(|&id| {
            self.entity(id).map(|e| e.side == scorer_side).unwrap_or(false)
        });
        let message = match scorer.and_then(|id| self.entity(id)) {
            Some(e) => format!(
                "GOAL! {} scores for {} ({}-{})",
                e.player.name,
                self.unit(scorer_side).team.name,
                self.score.0,
                self.score.1
            ),
            None => format!(
                "GOAL for {} ({}-{})",
                self.unit(scorer_side).team.name,
                self.score.0,
                self.score.1
            ),
        };
        let mut event = self.event(EventType::Goal, message).with_team(scorer_side);
        if let Some(id) = scorer {
            event = event.with_player(id);
        }
        self.emit(event);
        self.last_shooter = None;

        self.setup_kickoff(scorer_side.opponent());
    }

    /// Boundary ruling. The same pending restart is never re-applied.
    pub(crate) fn handle_out_of_bounds(&mut self, restart: Restart) {
        if self.set_piece == Some(restart) {
            return;
        }

        let (event_type, noun) = match restart.kind {
            RestartKind::Corner => (EventType::Corner, "Corner"),
            RestartKind::ThrowIn => (EventType::ThrowIn, "Throw-in"),
            RestartKind::GoalKick => (EventType::GoalKick, "Goal kick"),
            RestartKind::FreeKick => (EventType::FreeKick, "Free kick"),
            RestartKind::Penalty => (EventType::Penalty, "Penalty"),
            RestartKind::KickOff => (EventType::KickOff, "Kick-off"),
        };
        if restart.kind == RestartKind::Corner {
            self.stats.team_mut(restart.team).corners += 1;
        }

        let message = format!("{} for {}", noun, self.unit(restart.team).team.name);
        self.apply_restart(restart, event_type, Some(message));
    }

    /// Place the dead ball, clear possession, and record the set piece.
    /// `message` of `None` emits the default wording.
    pub(crate) fn apply_restart(
        &mut self,
        restart: Restart,
        event_type: EventType,
        message: Option<String>,
    ) {
        let message = message.unwrap_or_else(|| {
            format!("Restart for {}", self.unit(restart.team).team.name)
        });
        let event = self
            .event(event_type, message)
            .with_team(restart.team)
            .with_position(restart.spot);
        self.emit(event);

        self.drop_possession();
        self.possession = Some(restart.team);
        self.ball.place(restart.spot);
        self.physics.set_position(BALL_BODY, restart.spot);
        self.set_piece = Some(restart);
    }

    /// Kickoff setup: ball centred, possession cleared, both teams back in
    /// formation shape.
    pub(crate) fn setup_kickoff(&mut self, kicker: TeamSide) {
        self.reset_formations();

        self.drop_possession();
        self.possession = Some(kicker);
        self.ball.place(Vec2::center());
        self.physics.set_position(BALL_BODY, Vec2::center());
        let restart = Restart { kind: RestartKind::KickOff, team: kicker, spot: Vec2::center() };
        self.set_piece = Some(restart);

        let message = format!("Kick-off: {}", self.unit(kicker).team.name);
        let event = self.event(EventType::KickOff, message).with_team(kicker);
        self.emit(event);
    }

    /// Teleport every entity back to its oriented base slot.
    pub(crate) fn reset_formations(&mut self) {
        for side in [TeamSide::Home, TeamSide::Away] {
            for i in 0..self.unit(side).entities.len() {
                let slot = self.unit(side).slots[i];
                let position = positioning::oriented(slot, side);
                let (id, active) = {
                    let e = &mut self.unit_mut(side).entities[i];
                    e.position = position;
                    e.set_target(position);
                    e.velocity = Vec2::default();
                    (e.id, e.is_active())
                };
                if active {
                    self.physics.set_position(id, position);
                }
            }
        }
    }

    /// The current half's stoppage is exhausted: break, finish, or engage
    /// extra time.
    pub(crate) fn end_half(&mut self) {
        let half = self.clock.half;
        let finished = match half {
            1 | 3 => false,
            2 => {
                if self.config.extra_time && self.score.0 == self.score.1 {
                    self.extra_time_engaged = true;
                    false
                } else {
                    true
                }
            }
            _ => true,
        };

        if finished {
            let message = format!("Full time: {}-{}", self.score.0, self.score.1);
            let event = self.event(EventType::FullTime, message);
            self.emit(event);
            self.phase = MatchPhase::FullTime;
            return;
        }

        let message = format!("End of half {}: {}-{}", half, self.score.0, self.score.1);
        let event = self.event(EventType::HalfTime, message);
        self.emit(event);
        self.phase = MatchPhase::HalfTime;
    }

    /// Resume from the half-time break into the next half, kickoff side
    /// alternating by half parity.
    pub(crate) fn begin_next_half(&mut self) {
        let next = self.clock.half + 1;
        self.clock.start_half(next);
        self.counted_events_in_half = 0;
        self.phase = MatchPhase::Playing;
        self.setup_kickoff(kickoff_side_for_half(self.first_kicker, next));
    }
}
