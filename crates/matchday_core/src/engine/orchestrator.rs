//! Match orchestrator: the per-tick driver.
//!
//! Fixed sequence every tick: clock -> entity kinematics -> team tactical
//! update (both teams, opposition swapped) -> player decisions (skipping
//! injured and sent-off players) -> formation positioning -> rules checks
//! (out of bounds, goals) -> possession accounting -> offside-line
//! recompute. Each tick completes atomically; pausing stops the timer
//! without touching state.

use serde::{Deserialize, Serialize};

use super::behavior::{self, DecisionContext, PlayerAction};
use super::cards::{CardBook, CardRuling, CardType};
use super::clock::{MatchClock, MatchPhase};
use super::deterministic::{deterministic_f32, subcase, MatchRng};
use super::entity::{Ball, PlayerEntity, DECISION_COOLDOWN_SECS};
use super::physics::{BodyLabel, KinematicPhysics, PhysicsCollaborator, BALL_BODY};
use super::pitch::{self, Vec2};
use super::positioning::{self, PositioningDials};
use super::rules::{self, Restart, RestartKind};
use super::stats::MatchStats;
use super::tactics::{TacticalContext, TacticalState, TeamBehavior};
use crate::error::Result;
use crate::models::{Attribute, EventType, MatchEvent, Team, TeamSide};

/// A ball moving faster than this cannot be collected in stride.
const CATCHABLE_SPEED: f32 = 12.0;
/// Distance inside which a tackle can be attempted on the carrier.
const TACKLE_RADIUS: f32 = 2.5;
/// Shot launch speed in pitch units per second.
const SHOT_SPEED: f32 = 40.0;
/// Pass launch speed in pitch units per second.
const PASS_SPEED: f32 = 25.0;
/// Probability that a foul also injures the fouled player.
const INJURY_ON_FOUL_P: f32 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub seed: u64,
    pub game_speed: f32,
    /// When enabled, a regulation draw continues into two 15-minute halves.
    pub extra_time: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { seed: 0, game_speed: 1.0, extra_time: false }
    }
}

/// A player injured during the match. Recorded by name: the pitch slot may
/// be re-occupied by a substitute afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjuryRecord {
    pub player_name: String,
    pub team: TeamSide,
    pub minute: u8,
}

/// One team's slice of the match state.
#[derive(Debug)]
pub struct TeamUnit {
    pub side: TeamSide,
    pub team: Team,
    /// Eleven pitch slots, entity ids fixed for the whole match.
    pub entities: Vec<PlayerEntity>,
    /// Home-oriented base slot positions aligned with `entities`.
    pub slots: Vec<Vec2>,
    pub bench: Vec<crate::models::Player>,
    pub tactical: TacticalState,
    pub dials: PositioningDials,
    pub subs_remaining: u8,
}

impl TeamUnit {
    fn build(side: TeamSide, team: Team) -> Self {
        let formation_slots = positioning::formation_slots(team.formation);

        // Pair each slot with the first unassigned roster player of the
        // slot's role. Roster validation guarantees the counts line up.
        let mut remaining: Vec<Option<crate::models::Player>> =
            team.players.iter().cloned().map(Some).collect();
        let mut entities = Vec::with_capacity(11);
        let mut slots = Vec::with_capacity(11);
        let id_base = match side {
            TeamSide::Home => 0u32,
            TeamSide::Away => 11u32,
        };

        for (i, slot) in formation_slots.iter().enumerate() {
            let picked = remaining
                .iter_mut()
                .find(|p| p.as_ref().map(|p| p.role == slot.role).unwrap_or(false))
                .and_then(Option::take)
                .expect("roster validated against formation role counts");
            let position = positioning::oriented(slot.position, side);
            entities.push(PlayerEntity::new(id_base + i as u32, picked, side, position));
            slots.push(slot.position);
        }

        let bench = team.bench.clone();
        Self {
            side,
            team,
            entities,
            slots,
            bench,
            tactical: TacticalState::new(TeamBehavior::MidBlock, 0.0),
            dials: PositioningDials::default(),
            subs_remaining: 5,
        }
    }

    pub fn entity_by_id(&self, id: u32) -> Option<&PlayerEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Switch to a new shape mid-match. Slots are re-dealt by role first;
    /// when the new shape wants different role counts, leftover players
    /// take the leftover slots in order.
    pub(crate) fn apply_formation(&mut self, formation: crate::models::Formation) {
        let new_slots = positioning::formation_slots(formation);
        let mut assigned: Vec<Option<Vec2>> = vec![None; self.entities.len()];
        let mut slot_used = vec![false; new_slots.len()];

        for (si, slot) in new_slots.iter().enumerate() {
            if let Some(ei) = self
                .entities
                .iter()
                .enumerate()
                .position(|(i, e)| assigned[i].is_none() && e.player.role == slot.role)
            {
                assigned[ei] = Some(slot.position);
                slot_used[si] = true;
            }
        }
        for (si, spare) in new_slots.iter().enumerate() {
            if slot_used[si] {
                continue;
            }
            if let Some(ei) = (0..self.entities.len()).find(|&i| assigned[i].is_none()) {
                assigned[ei] = Some(spare.position);
                slot_used[si] = true;
            }
        }

        for (i, slot) in assigned.into_iter().enumerate() {
            if let Some(position) = slot {
                self.slots[i] = position;
            }
        }
        self.team.formation = formation;
    }
}

pub struct MatchEngine {
    pub config: MatchConfig,
    pub(crate) rng: MatchRng,
    pub(crate) physics: Box<dyn PhysicsCollaborator>,

    pub clock: MatchClock,
    pub phase: MatchPhase,
    pub home: TeamUnit,
    pub away: TeamUnit,
    pub ball: Ball,

    pub score: (u8, u8),
    pub possession: Option<TeamSide>,
    pub stats: MatchStats,
    pub set_piece: Option<Restart>,
    pub cards: CardBook,
    pub injuries: Vec<InjuryRecord>,
    pub events: Vec<MatchEvent>,
    /// Offside line faced by (home attack, away attack).
    pub offside_lines: (f32, f32),

    pub(crate) first_kicker: TeamSide,
    pub(crate) tick_count: u64,
    /// Goals, substitutions, and cards in the current half; feeds the
    /// stoppage allowance.
    pub(crate) counted_events_in_half: u32,
    pub(crate) extra_time_engaged: bool,
    pub(crate) last_shooter: Option<u32>,
    pub(crate) next_sub_sweep: f32,
}

impl MatchEngine {
    pub fn new(home: Team, away: Team, config: MatchConfig) -> Result<Self> {
        Self::with_physics(home, away, config, Box::new(KinematicPhysics::new()))
    }

    /// Build the engine around a host-provided physics collaborator.
    /// Roster shape is validated before any state is constructed.
    pub fn with_physics(
        home: Team,
        away: Team,
        config: MatchConfig,
        mut physics: Box<dyn PhysicsCollaborator>,
    ) -> Result<Self> {
        home.validate()?;
        away.validate()?;

        let home_unit = TeamUnit::build(TeamSide::Home, home);
        let away_unit = TeamUnit::build(TeamSide::Away, away);

        for entity in home_unit.entities.iter().chain(away_unit.entities.iter()) {
            physics.create_body(entity.id, entity.position);
        }
        physics.create_body(BALL_BODY, Vec2::center());

        let mut clock = MatchClock::default();
        clock.set_speed(config.game_speed);

        Ok(Self {
            rng: MatchRng::seeded(config.seed),
            config,
            physics,
            clock,
            phase: MatchPhase::Idle,
            home: home_unit,
            away: away_unit,
            ball: Ball::at_center(),
            score: (0, 0),
            possession: None,
            stats: MatchStats::default(),
            set_piece: None,
            cards: CardBook::new(),
            injuries: Vec::new(),
            events: Vec::new(),
            offside_lines: (pitch::OFFSIDE_FALLBACK_HIGH, pitch::OFFSIDE_FALLBACK_LOW),
            first_kicker: TeamSide::Home,
            tick_count: 0,
            counted_events_in_half: 0,
            extra_time_engaged: false,
            last_shooter: None,
            next_sub_sweep: super::substitutions::SWEEP_INTERVAL,
        })
    }

    pub fn unit(&self, side: TeamSide) -> &TeamUnit {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn unit_mut(&mut self, side: TeamSide) -> &mut TeamUnit {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn entity(&self, id: u32) -> Option<&PlayerEntity> {
        if (id as usize) < 11 {
            self.home.entities.get(id as usize)
        } else {
            self.away.entities.get(id as usize - 11)
        }
    }

    fn entity_mut(&mut self, id: u32) -> Option<&mut PlayerEntity> {
        if (id as usize) < 11 {
            self.home.entities.get_mut(id as usize)
        } else {
            self.away.entities.get_mut(id as usize - 11)
        }
    }

    pub fn score_for(&self, side: TeamSide) -> u8 {
        match side {
            TeamSide::Home => self.score.0,
            TeamSide::Away => self.score.1,
        }
    }

    pub(crate) fn emit(&mut self, event: MatchEvent) {
        log::trace!("event: {:?} {}", event.event_type, event.message);
        self.events.push(event);
    }

    pub(crate) fn event(&self, event_type: EventType, message: impl Into<String>) -> MatchEvent {
        MatchEvent::new(self.clock.minute(), self.clock.game_time, event_type, message)
    }

    /// Kick the match off from idle.
    pub fn start(&mut self) {
        if self.phase != MatchPhase::Idle {
            return;
        }
        self.phase = MatchPhase::Playing;
        self.setup_kickoff(self.first_kicker);
    }

    // =======================================================================
    // Tick pipeline
    // =======================================================================

    /// Advance the whole simulation by `real_dt` real seconds. No step
    /// within a tick suspends; all 22 players are processed in a stable
    /// order (home roster order, then away).
    pub fn tick(&mut self, real_dt: f32) {
        match self.phase {
            MatchPhase::Playing => {}
            MatchPhase::HalfTime => {
                self.begin_next_half();
                return;
            }
            _ => return,
        }

        let sim_dt = self.clock.advance(real_dt);

        if self.clock.in_stoppage() && self.clock.stoppage_added == 0.0 {
            let minutes = rules::estimate_stoppage_minutes(
                self.config.seed,
                self.clock.half,
                self.counted_events_in_half,
            );
            self.clock.stoppage_added = minutes as f32 * 60.0;
            log::debug!("half {}: +{} minutes", self.clock.half, minutes);
        }

        if self.clock.half_over() {
            self.end_half();
            return;
        }

        self.step_kinematics(sim_dt);
        self.resume_set_piece();
        self.update_tactics();
        self.consider_formation_changes();
        self.run_decisions(sim_dt);
        self.apply_positioning();
        self.check_rules();
        self.account_possession(sim_dt);
        self.recompute_offside_lines();
        self.sweep_substitutions();

        self.tick_count += 1;
    }

    /// Entity kinematics, delegated to the physics collaborator, plus
    /// possession pickup from its collision stream.
    fn step_kinematics(&mut self, sim_dt: f32) {
        for side in [TeamSide::Home, TeamSide::Away] {
            for i in 0..self.unit(side).entities.len() {
                let (id, velocity, intensity) = {
                    let e = &self.unit(side).entities[i];
                    if !e.is_active() {
                        (e.id, Vec2::default(), 0.0)
                    } else {
                        let speed = e.max_speed();
                        let dist = e.position.distance(e.target);
                        let v = if dist < 0.2 {
                            Vec2::default()
                        } else {
                            e.position.towards(e.target).scaled(speed)
                        };
                        let intensity = match e.last_action {
                            PlayerAction::ChaseBall | PlayerAction::PressBall => 2.0,
                            PlayerAction::MakeRun | PlayerAction::Dribble => 1.5,
                            _ => 1.0,
                        };
                        (e.id, v, intensity)
                    }
                };
                self.physics.set_velocity(id, velocity);
                let e = &mut self.unit_mut(side).entities[i];
                if intensity > 0.0 {
                    e.add_fatigue(sim_dt, intensity);
                }
            }
        }

        self.physics.step(sim_dt);

        for side in [TeamSide::Home, TeamSide::Away] {
            for i in 0..self.unit(side).entities.len() {
                let id = self.unit(side).entities[i].id;
                let pos = self.physics.position_of(id);
                let vel = self.physics.velocity_of(id);
                let e = &mut self.unit_mut(side).entities[i];
                e.position = pos;
                e.velocity = vel;
            }
        }

        // The possessor carries the ball; a free ball keeps its own motion.
        // Forcing the ball after the step keeps it glued to the carrier's
        // settled position for the rest of the tick.
        if let Some(owner) = self.ball.possessor {
            if let Some(pos) = self.entity(owner).map(|e| e.position) {
                self.ball.follow(pos);
                self.physics.set_position(BALL_BODY, pos);
            }
        } else {
            self.ball.position = self.physics.position_of(BALL_BODY);
            self.ball.velocity = self.physics.velocity_of(BALL_BODY);
        }

        // Pickup: first active player touching a collectable free ball, in
        // collision order, takes possession. A placed dead ball waits for
        // its taker instead.
        let collisions = self.physics.drain_collisions();
        if self.set_piece.is_none()
            && self.ball.possessor.is_none()
            && self.ball.velocity.length() < CATCHABLE_SPEED
        {
            for collision in &collisions {
                let (label, id) = collision.b;
                if label != BodyLabel::Player || collision.a.0 != BodyLabel::Ball {
                    continue;
                }
                let Some(player) = self.entity(id) else { continue };
                if !player.is_active() {
                    continue;
                }
                let side = player.side;
                self.take_possession(id, side);
                break;
            }
        }
    }

    pub(crate) fn take_possession(&mut self, id: u32, side: TeamSide) {
        for e in self.home.entities.iter_mut().chain(self.away.entities.iter_mut()) {
            e.has_ball = e.id == id;
        }
        if let Some(pos) = self.entity(id).map(|e| e.position) {
            self.ball.follow(pos);
            self.physics.set_position(BALL_BODY, pos);
        }
        self.ball.set_possessor(id, side);
        self.possession = Some(side);
    }

    pub(crate) fn drop_possession(&mut self) {
        for e in self.home.entities.iter_mut().chain(self.away.entities.iter_mut()) {
            e.has_ball = false;
        }
        self.ball.clear_possessor();
    }

    /// Tactical refresh for both teams; opposition is always the other
    /// team. Dials and marking relations follow the refreshed state.
    fn update_tactics(&mut self) {
        let remaining = self.clock.remaining_secs(self.extra_time_engaged);
        for side in [TeamSide::Home, TeamSide::Away] {
            let ctx = TacticalContext {
                score_for: self.score_for(side),
                score_against: self.score_for(side.opponent()),
                remaining_secs: remaining,
                set_piece: self.set_piece.as_ref(),
                possession: self.possession,
            };
            // Split borrows: tactical state is written, rosters are read.
            let (unit, opposition) = match side {
                TeamSide::Home => (&mut self.home, &self.away),
                TeamSide::Away => (&mut self.away, &self.home),
            };
            super::tactics::refresh(
                &mut unit.tactical,
                side,
                &unit.team.tactics,
                &ctx,
                &unit.entities,
                &opposition.entities,
                &self.ball,
                self.clock.game_time,
            );
            unit.dials = PositioningDials::from_params(&unit.tactical.params);
        }

        // Mirror marking assignments onto the entities. Both relation ends
        // are cleared first so dropped assignments do not linger.
        for e in self.home.entities.iter_mut().chain(self.away.entities.iter_mut()) {
            e.marking = None;
            e.marked_by = None;
        }
        for side in [TeamSide::Home, TeamSide::Away] {
            let marking = self.unit(side).tactical.marking.clone();
            for (&threat, &marker) in &marking {
                if let Some(e) = self.entity_mut(marker) {
                    e.marking = Some(threat);
                }
                if let Some(t) = self.entity_mut(threat) {
                    t.marked_by = Some(marker);
                }
            }
        }
    }

    /// Late-match shape suggestions behind the per-tick probability gate.
    fn consider_formation_changes(&mut self) {
        let remaining = self.clock.remaining_secs(self.extra_time_engaged);
        for (idx, side) in [TeamSide::Home, TeamSide::Away].into_iter().enumerate() {
            let current = self.unit(side).team.formation;
            let delta = self.score_for(side) as i16 - self.score_for(side.opponent()) as i16;
            if let Some(formation) = positioning::suggest_formation_change(
                self.config.seed,
                self.tick_count,
                idx,
                current,
                delta,
                remaining,
            ) {
                log::debug!("{:?} switches shape {} -> {}", side, current.code(), formation.code());
                self.unit_mut(side).apply_formation(formation);
            }
        }
    }

    /// Player decisions in fixed order. The cooldown repeats the previous
    /// action verbatim; newly made decisions may trigger immediate ball
    /// actions (shots, passes, tackle attempts).
    fn run_decisions(&mut self, sim_dt: f32) {
        let order: Vec<u32> = self
            .home
            .entities
            .iter()
            .chain(self.away.entities.iter())
            .filter(|e| e.is_active())
            .map(|e| e.id)
            .collect();

        for id in order {
            let Some(e) = self.entity(id) else { continue };
            let side = e.side;

            let due = {
                let e = self.entity_mut(id).expect("entity exists");
                e.decision_cooldown -= sim_dt;
                e.decision_cooldown <= 0.0
            };
            if !due {
                continue;
            }

            let action = {
                let unit = self.unit(side);
                let opposition = self.unit(side.opponent());
                let entity = unit.entity_by_id(id).expect("entity exists");
                let ctx = DecisionContext {
                    entity,
                    ball: &self.ball,
                    opponents: &opposition.entities,
                    team_has_ball: self.possession == Some(side)
                        && self.ball.possessor.is_some(),
                    tactical: Some(&unit.tactical),
                };
                behavior::decide(&ctx)
            };

            {
                let e = self.entity_mut(id).expect("entity exists");
                e.last_action = action;
                e.decision_cooldown = DECISION_COOLDOWN_SECS;
            }

            self.execute_action(id, side, action);
        }
    }

    /// Immediate consequences of a freshly chosen action.
    fn execute_action(&mut self, id: u32, side: TeamSide, action: PlayerAction) {
        let has_ball = self.ball.possessor == Some(id);
        match action {
            PlayerAction::Shoot if has_ball => self.resolve_shot(id, side),
            PlayerAction::Pass if has_ball => self.resolve_pass(id, side),
            PlayerAction::ChaseBall | PlayerAction::PressBall => {
                self.attempt_tackle(id, side);
            }
            _ => {}
        }
    }

    fn resolve_shot(&mut self, shooter_id: u32, side: TeamSide) {
        let Some(shooter) = self.entity(shooter_id) else { return };
        let from = shooter.position;
        let goal = Vec2::new(side.attacked_goal_x(), pitch::GOAL_CENTER_Y);
        let distance = from.distance(goal);
        let shooting = shooter.effective_attribute(Attribute::Shooting);
        let composure = shooter.effective_attribute(Attribute::Composure);

        self.stats.team_mut(side).shots += 1;
        self.last_shooter = Some(shooter_id);

        let on_target_p =
            (0.25 + shooting / 250.0 + composure / 500.0 - distance / 60.0).clamp(0.15, 0.9);
        let on_target = self.rng.chance(on_target_p);

        let target_y = if on_target {
            self.stats.team_mut(side).shots_on_target += 1;
            pitch::GOAL_CENTER_Y + self.rng.range_f32(-pitch::GOAL_HALF_WIDTH, pitch::GOAL_HALF_WIDTH)
        } else {
            // Wide: outside the mouth but near it.
            let miss = pitch::GOAL_HALF_WIDTH + self.rng.range_f32(1.0, 12.0);
            pitch::GOAL_CENTER_Y + if self.rng.chance(0.5) { miss } else { -miss }
        };

        // A save plants the ball in the keeper's hands before it travels.
        let keeper_id = self
            .unit(side.opponent())
            .entities
            .iter()
            .find(|e| e.player.role.is_goalkeeper() && e.is_active())
            .map(|e| e.id);
        let save_p = (0.75 - shooting / 300.0 - composure / 1000.0).clamp(0.2, 0.7);
        if on_target && keeper_id.is_some() && self.rng.chance(save_p) {
            let keeper_id = keeper_id.expect("checked above");
            let message = {
                let shooter = self.entity(shooter_id).expect("shooter exists");
                format!("{} shoots - saved", shooter.player.name)
            };
            let event = self
                .event(EventType::Shot, message)
                .with_team(side)
                .with_player(shooter_id)
                .with_position(from);
            self.emit(event);
            self.take_possession(keeper_id, side.opponent());
            return;
        }

        let message = {
            let shooter = self.entity(shooter_id).expect("shooter exists");
            format!("{} shoots", shooter.player.name)
        };
        let event = self
            .event(EventType::Shot, message)
            .with_team(side)
            .with_player(shooter_id)
            .with_position(from);
        self.emit(event);

        self.drop_possession();
        let aim = Vec2::new(side.attacked_goal_x(), target_y);
        self.ball.kick(from.towards(aim), SHOT_SPEED, side, true);
        self.physics.set_velocity(BALL_BODY, self.ball.velocity);
    }

    fn resolve_pass(&mut self, passer_id: u32, side: TeamSide) {
        let Some(passer) = self.entity(passer_id) else { return };
        let from = passer.position;
        let sign = side.attack_sign();
        let passing = passer.effective_attribute(Attribute::Passing);
        let vision = passer.effective_attribute(Attribute::Vision);

        // Best target: an active teammate ahead of the ball where possible,
        // near enough to reach, preferring forward progress.
        let receiver = {
            let unit = self.unit(side);
            let mut best: Option<(u32, f32)> = None;
            for mate in &unit.entities {
                if mate.id == passer_id || !mate.is_active() {
                    continue;
                }
                let dist = mate.position.distance(from);
                if dist < 3.0 || dist > 35.0 + vision / 5.0 {
                    continue;
                }
                let progress = (mate.position.x - from.x) * sign;
                let score = progress - dist * 0.3;
                if best.map(|(_, s)| score > s).unwrap_or(true) {
                    best = Some((mate.id, score));
                }
            }
            best.map(|(id, _)| id)
        };

        self.stats.team_mut(side).passes += 1;

        let Some(receiver_id) = receiver else {
            // No target found: fall back to a forward punt.
            let angle = deterministic_f32(
                self.config.seed,
                self.tick_count,
                passer_id as usize,
                subcase::LOOSE_KICK_ANGLE,
                -0.5,
                0.5,
            );
            let direction = Vec2::new(sign, angle).normalized();
            let message = {
                let passer = self.entity(passer_id).expect("passer exists");
                format!("{} clears upfield", passer.player.name)
            };
            let event =
                self.event(EventType::Pass, message).with_team(side).with_player(passer_id);
            self.emit(event);
            self.drop_possession();
            self.ball.kick(direction, PASS_SPEED, side, false);
            self.physics.set_velocity(BALL_BODY, self.ball.velocity);
            return;
        };

        // Offside whistle on the pass: beyond the line and beyond the ball.
        let line = match side {
            TeamSide::Home => self.offside_lines.0,
            TeamSide::Away => self.offside_lines.1,
        };
        let offside = {
            let receiver = self.entity(receiver_id).expect("receiver exists");
            rules::is_offside(receiver, &self.ball, line)
        };
        if offside {
            self.whistle_offside(receiver_id, side);
            return;
        }

        let (to, receiver_name) = {
            let receiver = self.entity(receiver_id).expect("receiver exists");
            (receiver.position, receiver.player.name.clone())
        };
        let dist = from.distance(to);
        let complete_p = (0.6 + passing / 250.0 - dist / 120.0).clamp(0.4, 0.95);
        let accurate = self.rng.chance(complete_p);

        let aim = if accurate {
            to
        } else {
            Vec2::new(to.x + self.rng.range_f32(-8.0, 8.0), to.y + self.rng.range_f32(-8.0, 8.0))
        };

        let message = {
            let passer = self.entity(passer_id).expect("passer exists");
            format!("{} plays it to {}", passer.player.name, receiver_name)
        };
        let event = self
            .event(EventType::Pass, message)
            .with_team(side)
            .with_player(passer_id)
            .with_target(receiver_id)
            .with_position(from);
        self.emit(event);

        self.drop_possession();
        self.ball.kick(from.towards(aim), PASS_SPEED, side, false);
        self.physics.set_velocity(BALL_BODY, self.ball.velocity);
    }

    fn whistle_offside(&mut self, player_id: u32, attacking: TeamSide) {
        let spot = self.entity(player_id).map(|e| e.position).unwrap_or_else(Vec2::center);
        let message = self
            .entity(player_id)
            .map(|e| format!("{} is flagged offside", e.player.name))
            .unwrap_or_else(|| "Offside".to_string());
        let event = self
            .event(EventType::Offside, message)
            .with_team(attacking)
            .with_player(player_id)
            .with_position(spot);
        self.emit(event);
        self.stats.team_mut(attacking).offsides += 1;

        self.drop_possession();
        self.possession = Some(attacking.opponent());
        let restart =
            Restart { kind: RestartKind::FreeKick, team: attacking.opponent(), spot };
        self.apply_restart(restart, EventType::FreeKick, None);
    }

    /// Tackle contest when a pressing defender reaches the carrier.
    fn attempt_tackle(&mut self, tackler_id: u32, side: TeamSide) {
        let Some(carrier_id) = self.ball.possessor else { return };
        let Some(carrier) = self.entity(carrier_id) else { return };
        if carrier.side == side {
            return;
        }
        let carrier_side = carrier.side;
        let carrier_pos = carrier.position;
        let carrier_dribbling = carrier.effective_attribute(Attribute::Dribbling);

        let Some(tackler) = self.entity(tackler_id) else { return };
        if tackler.position.distance(carrier_pos) > TACKLE_RADIUS {
            return;
        }
        let aggression = tackler.effective_attribute(Attribute::Aggression);
        let tackling = tackler.effective_attribute(Attribute::Tackling);
        let distance_to_ball = tackler.position.distance(self.ball.position);

        if let Some(foul) = rules::check_foul(
            aggression,
            tackling,
            distance_to_ball,
            carrier_pos,
            carrier_side,
            &mut self.rng,
        ) {
            self.handle_foul(tackler_id, side, carrier_id, carrier_side, carrier_pos, foul);
            return;
        }

        let win_p = (0.4 + (tackling - carrier_dribbling) / 200.0).clamp(0.2, 0.8);
        if self.rng.chance(win_p) {
            log::trace!("tackle won by {} on {}", tackler_id, carrier_id);
            self.take_possession(tackler_id, side);
        }
    }

    fn handle_foul(
        &mut self,
        offender_id: u32,
        offender_side: TeamSide,
        fouled_id: u32,
        fouled_side: TeamSide,
        spot: Vec2,
        foul: rules::FoulOutcome,
    ) {
        self.stats.team_mut(offender_side).fouls += 1;
        let message = {
            let offender = self.entity(offender_id).expect("offender exists");
            let fouled = self.entity(fouled_id).expect("fouled exists");
            format!("{} fouls {}", offender.player.name, fouled.player.name)
        };
        let event = self
            .event(EventType::Foul, message)
            .with_team(offender_side)
            .with_player(offender_id)
            .with_target(fouled_id)
            .with_position(spot);
        self.emit(event);

        if let Some(card) = foul.card {
            self.issue_card(offender_id, offender_side, card);
        }

        // A fraction of fouls injure the fouled player.
        if self.rng.chance(INJURY_ON_FOUL_P) {
            self.flag_injury(fouled_id, fouled_side);
        }

        self.drop_possession();
        self.possession = Some(fouled_side);
        let restart = if foul.penalty {
            let goal_x = fouled_side.attacked_goal_x();
            let penalty_spot = Vec2::new(
                goal_x - fouled_side.attack_sign() * 11.0,
                pitch::GOAL_CENTER_Y,
            );
            Restart { kind: RestartKind::Penalty, team: fouled_side, spot: penalty_spot }
        } else {
            Restart { kind: RestartKind::FreeKick, team: fouled_side, spot }
        };
        let event_type = if foul.penalty { EventType::Penalty } else { EventType::FreeKick };
        self.apply_restart(restart, event_type, None);
    }

    pub(crate) fn issue_card(&mut self, player_id: u32, side: TeamSide, card: CardType) {
        let minute = self.clock.minute();
        let (ruling, yellows) = self.cards.issue_card(player_id, card, minute);
        self.counted_events_in_half += 1;

        let name =
            self.entity(player_id).map(|e| e.player.name.clone()).unwrap_or_default();
        match card {
            CardType::Yellow => {
                self.stats.team_mut(side).yellow_cards += 1;
                let event = self
                    .event(EventType::YellowCard, format!("{} is booked", name))
                    .with_team(side)
                    .with_player(player_id);
                self.emit(event);
            }
            CardType::Red => {
                self.stats.team_mut(side).red_cards += 1;
                let event = self
                    .event(EventType::RedCard, format!("{} is sent off", name))
                    .with_team(side)
                    .with_player(player_id);
                self.emit(event);
            }
        }

        if let Some(e) = self.entity_mut(player_id) {
            if card == CardType::Yellow {
                e.yellow_cards = yellows;
            }
            if ruling == CardRuling::Ejection {
                e.sent_off = true;
                e.has_ball = false;
            }
        }
        if ruling == CardRuling::Ejection {
            if card == CardType::Yellow {
                // The ejection closes the second-yellow sequence.
                let event = self
                    .event(EventType::RedCard, format!("{} is sent off (second yellow)", name))
                    .with_team(side)
                    .with_player(player_id);
                self.emit(event);
                self.stats.team_mut(side).red_cards += 1;
            }
            if self.ball.possessor == Some(player_id) {
                self.drop_possession();
            }
        }
    }

    pub(crate) fn flag_injury(&mut self, player_id: u32, side: TeamSide) {
        if self.entity(player_id).map(|e| e.injured).unwrap_or(true) {
            return;
        }
        let name =
            self.entity(player_id).map(|e| e.player.name.clone()).unwrap_or_default();
        self.injuries.push(InjuryRecord {
            player_name: name.clone(),
            team: side,
            minute: self.clock.minute(),
        });
        self.counted_events_in_half += 1;
        let event = self
            .event(EventType::Injury, format!("{} is down injured", name))
            .with_team(side)
            .with_player(player_id);
        self.emit(event);
        if let Some(e) = self.entity_mut(player_id) {
            e.injured = true;
            e.has_ball = false;
        }
        if self.ball.possessor == Some(player_id) {
            self.drop_possession();
        }
        self.force_injury_substitution(player_id, side);
    }

    /// Formation positioning: every active entity gets its anchor, then the
    /// action-specific target. Set-piece takers walk to the spot instead.
    fn apply_positioning(&mut self) {
        let taker = self.set_piece.as_ref().map(|r| (r.team, r.spot)).and_then(|(team, spot)| {
            self.nearest_entity(team, spot).map(|id| (id, spot))
        });

        for side in [TeamSide::Home, TeamSide::Away] {
            let line = match side {
                TeamSide::Home => self.offside_lines.0,
                TeamSide::Away => self.offside_lines.1,
            };
            let dials = self.unit(side).dials;
            for i in 0..self.unit(side).entities.len() {
                let (id, anchor_pos, action, mark_pos) = {
                    let unit = self.unit(side);
                    let e = &unit.entities[i];
                    if !e.is_active() {
                        continue;
                    }
                    let anchor_pos = positioning::anchor(
                        unit.slots[i],
                        e.player.role,
                        side,
                        &self.ball,
                        &dials,
                    );
                    let mark_pos = e
                        .marking
                        .and_then(|mid| self.entity(mid))
                        .map(|m| m.position);
                    (e.id, anchor_pos, e.last_action, mark_pos)
                };

                let target = if let Some((taker_id, spot)) = taker {
                    if taker_id == id {
                        spot
                    } else {
                        let e = self.entity(id).expect("entity exists");
                        positioning::action_target(e, action, &self.ball, anchor_pos, line, mark_pos)
                    }
                } else {
                    let e = self.entity(id).expect("entity exists");
                    positioning::action_target(e, action, &self.ball, anchor_pos, line, mark_pos)
                };

                if let Some(e) = self.entity_mut(id) {
                    e.set_target(target);
                }
            }
        }
    }

    pub(crate) fn nearest_entity(&self, side: TeamSide, spot: Vec2) -> Option<u32> {
        self.unit(side)
            .entities
            .iter()
            .filter(|e| e.is_active() && !e.player.role.is_goalkeeper())
            .min_by(|a, b| {
                a.position
                    .distance(spot)
                    .partial_cmp(&b.position.distance(spot))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.id)
    }

    /// Hand a placed dead ball to the restart taker once they arrive.
    fn resume_set_piece(&mut self) {
        let Some(restart) = self.set_piece else { return };
        let Some(taker) = self.nearest_entity(restart.team, restart.spot) else { return };
        let close_enough = self
            .entity(taker)
            .map(|e| e.position.distance(restart.spot) < 2.0)
            .unwrap_or(false);
        if close_enough {
            self.take_possession(taker, restart.team);
            self.set_piece = None;
        }
    }

    /// Rules checks on the fresh ball state: goals first, then boundary
    /// restarts. A placed dead ball is never re-ruled, and a possessed
    /// ball resting on a line stays in play.
    fn check_rules(&mut self) {
        if self.set_piece.is_some() {
            return;
        }
        if let Some(scorer_side) = rules::detect_goal(self.ball.position) {
            self.handle_goal(scorer_side);
            return;
        }
        if self.ball.possessor.is_some() {
            return;
        }
        if let Some(restart) = rules::classify_out_of_bounds(self.ball.position, self.ball.last_touch)
        {
            self.handle_out_of_bounds(restart);
        }
    }

    fn account_possession(&mut self, sim_dt: f32) {
        if let Some(side) = self.possession {
            self.stats.add_possession(side, sim_dt);
        }
    }

    fn recompute_offside_lines(&mut self) {
        let away_defs: Vec<&PlayerEntity> = self.away.entities.iter().collect();
        let home_defs: Vec<&PlayerEntity> = self.home.entities.iter().collect();
        self.offside_lines = (
            rules::offside_line(TeamSide::Home, &away_defs),
            rules::offside_line(TeamSide::Away, &home_defs),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::test_team;
    use crate::models::{Formation, Role};

    fn engine() -> MatchEngine {
        MatchEngine::new(
            test_team("Home United"),
            test_team("Away Town"),
            MatchConfig { seed: 21, ..Default::default() },
        )
        .expect("valid rosters")
    }

    #[test]
    fn invalid_roster_is_fatal_at_initialization() {
        let mut bad = test_team("Bad FC");
        bad.players.pop();
        assert!(MatchEngine::new(bad, test_team("Away Town"), MatchConfig::default()).is_err());
    }

    #[test]
    fn start_sets_up_a_home_kickoff() {
        let mut e = engine();
        e.start();
        assert_eq!(e.phase, MatchPhase::Playing);
        let restart = e.set_piece.expect("kickoff pending");
        assert_eq!(restart.kind, RestartKind::KickOff);
        assert_eq!(restart.team, TeamSide::Home);
        assert_eq!(e.ball.position, Vec2::center());
        assert!(e.events.iter().any(|ev| ev.event_type == EventType::KickOff));
    }

    #[test]
    fn kickoff_is_taken_within_seconds() {
        let mut e = engine();
        e.start();
        for _ in 0..200 {
            e.tick(0.1);
            if e.ball.possessor.is_some() {
                break;
            }
        }
        let owner = e.ball.possessor.expect("someone took the kickoff");
        assert_eq!(e.entity(owner).expect("owner exists").side, TeamSide::Home);
        assert!(e.set_piece.is_none());
    }

    #[test]
    fn decision_cooldown_throttles_reevaluation() {
        let mut e = engine();
        e.start();
        e.tick(0.1);
        let cooldowns: Vec<f32> =
            e.home.entities.iter().map(|p| p.decision_cooldown).collect();
        // Every active player decided on the first tick and is now cooling
        // down; the next short tick only counts down.
        assert!(cooldowns.iter().all(|&c| c > 0.0));
        e.tick(0.05);
        for (p, before) in e.home.entities.iter().zip(cooldowns) {
            assert!(p.decision_cooldown < before);
        }
    }

    #[test]
    fn offside_lines_follow_defenders() {
        let mut e = engine();
        e.start();
        e.tick(0.1);
        // Away defends x = 100; their DEF/GK x positions decide home's line.
        let mut xs: Vec<f32> = e
            .away
            .entities
            .iter()
            .filter(|p| matches!(p.player.role, Role::DEF | Role::GK))
            .map(|p| p.position.x)
            .collect();
        xs.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(e.offside_lines.0, xs[1]);
    }

    #[test]
    fn tactical_params_drive_dials() {
        let mut e = engine();
        e.start();
        e.tick(0.1);
        for side in [TeamSide::Home, TeamSide::Away] {
            let unit = e.unit(side);
            assert_eq!(unit.dials.line_height, unit.tactical.params.line_height);
            assert_eq!(unit.dials.width, unit.tactical.params.width);
        }
    }

    #[test]
    fn fatigue_accrues_while_playing() {
        let mut e = engine();
        e.start();
        for _ in 0..100 {
            e.tick(0.5);
        }
        let moved: Vec<f32> = e.home.entities.iter().map(|p| p.fatigue).collect();
        assert!(moved.iter().all(|&f| f > 0.0), "everyone tires: {:?}", moved);
    }

    #[test]
    fn apply_formation_remaps_slots_by_role() {
        let mut e = engine();
        e.start();
        e.home.apply_formation(Formation::F343);
        assert_eq!(e.home.team.formation, Formation::F343);
        assert_eq!(e.home.slots.len(), 11);

        // The keeper keeps a goalkeeper slot.
        let gk_idx = e
            .home
            .entities
            .iter()
            .position(|p| p.player.role.is_goalkeeper())
            .expect("keeper on pitch");
        assert_eq!(e.home.slots[gk_idx], Vec2::new(5.0, 50.0));
    }

    #[test]
    fn sent_off_players_are_skipped_by_decisions() {
        let mut e = engine();
        e.start();
        e.issue_card(5, TeamSide::Home, CardType::Red);
        assert!(e.home.entities[5].sent_off);
        let before = e.home.entities[5].last_action;
        for _ in 0..20 {
            e.tick(0.1);
        }
        assert_eq!(e.home.entities[5].last_action, before, "no new decisions");
        assert_eq!(e.home.entities[5].velocity, Vec2::default());
    }

    #[test]
    fn stoppage_allowance_is_set_once_window_exceeded() {
        let mut e = engine();
        e.start();
        e.clock.game_time = super::super::clock::HALF_SECS - 0.1;
        e.tick(0.1);
        assert!(e.clock.stoppage_added >= 60.0, "allowance of at least a minute");
    }
}
