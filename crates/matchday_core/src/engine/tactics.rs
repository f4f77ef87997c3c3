//! Team tactical system: a finite state machine over tactical postures.
//!
//! `analyze` is a pure decision table re-evaluated every tick; a posture
//! change swaps in a parameter bundle from a fixed table. Threat
//! assessment and marking assignment are recomputed alongside, never
//! partially mutated from outside.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entity::{Ball, PlayerEntity};
use super::pitch::{self, Vec2};
use super::rules::Restart;
use crate::models::{Attribute, DefensiveStyle, PassingStyle, PlayStyle, TacticalConfig, TeamSide};

/// Threat score above which an opponent is flagged dangerous.
const DANGER_THRESHOLD: f32 = 5.0;
/// Seconds remaining under which the endgame rows of the table apply.
const ENDGAME_SECS: f32 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "snake_case")]
pub enum TeamBehavior {
    HighPress,
    MidBlock,
    LowBlock,
    TightMarking,
    Possession,
    CounterAttack,
    DirectPlay,
    WingPlay,
    ParkTheBus,
    AllOutAttack,
    SetPieceAttack,
    SetPieceDefense,
}

/// Parameter bundle derived from a posture. Dials are 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TacticalParams {
    pub line_height: u8,
    pub pressing_intensity: u8,
    pub width: u8,
    pub compactness: u8,
    pub tempo: u8,
    pub passing_style: PassingStyle,
}

/// Posture -> parameters. Pure data, not re-derived logic.
pub fn behavior_params(behavior: TeamBehavior) -> TacticalParams {
    use PassingStyle::*;
    let (line_height, pressing_intensity, width, compactness, tempo, passing_style) =
        match behavior {
            TeamBehavior::HighPress => (8, 9, 6, 7, 7, Short),
            TeamBehavior::MidBlock => (5, 5, 5, 6, 5, Mixed),
            TeamBehavior::LowBlock => (2, 3, 4, 8, 4, Long),
            TeamBehavior::TightMarking => (4, 6, 4, 7, 5, Mixed),
            TeamBehavior::Possession => (6, 4, 7, 5, 4, Short),
            TeamBehavior::CounterAttack => (3, 4, 5, 7, 8, Direct),
            TeamBehavior::DirectPlay => (5, 5, 6, 5, 7, Long),
            TeamBehavior::WingPlay => (5, 4, 9, 5, 6, Mixed),
            TeamBehavior::ParkTheBus => (1, 2, 3, 9, 3, Long),
            TeamBehavior::AllOutAttack => (9, 7, 8, 3, 9, Direct),
            TeamBehavior::SetPieceAttack => (7, 3, 7, 4, 3, Short),
            TeamBehavior::SetPieceDefense => (2, 4, 4, 9, 3, Long),
        };
    TacticalParams { line_height, pressing_intensity, width, compactness, tempo, passing_style }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThreatAssessment {
    pub dangerous: Vec<u32>,
    pub vulnerable_zones: Vec<Vec2>,
    /// 0..=10, higher means the current possession is more likely lost.
    pub possession_risk: f32,
}

/// Per-team tactical state. Owned by its team slot in the match state for
/// the duration of the match; recomputed through `refresh`, never patched
/// from outside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TacticalState {
    pub behavior: TeamBehavior,
    /// Game time at which the current behavior was entered.
    pub behavior_since: f32,
    pub params: TacticalParams,
    /// opponent id -> marker id
    pub marking: HashMap<u32, u32>,
    /// player id -> zone centre
    pub zones: HashMap<u32, Vec2>,
    pub threat: ThreatAssessment,
}

impl TacticalState {
    pub fn new(behavior: TeamBehavior, now: f32) -> Self {
        Self {
            behavior,
            behavior_since: now,
            params: behavior_params(behavior),
            marking: HashMap::new(),
            zones: HashMap::new(),
            threat: ThreatAssessment::default(),
        }
    }
}

/// Inputs the decision table reads. Everything is by value or shared
/// reference; `analyze` has no hidden state and no randomness.
pub struct TacticalContext<'a> {
    pub score_for: u8,
    pub score_against: u8,
    pub remaining_secs: f32,
    pub set_piece: Option<&'a Restart>,
    pub possession: Option<TeamSide>,
}

/// The posture decision table.
pub fn analyze(side: TeamSide, config: &TacticalConfig, ctx: &TacticalContext) -> TeamBehavior {
    // A live set piece always wins, split by ownership.
    if let Some(restart) = ctx.set_piece {
        return if restart.team == side {
            TeamBehavior::SetPieceAttack
        } else {
            TeamBehavior::SetPieceDefense
        };
    }

    // Endgame: protect a lead, chase a deficit.
    if ctx.remaining_secs < ENDGAME_SECS {
        if ctx.score_for > ctx.score_against {
            return TeamBehavior::ParkTheBus;
        }
        if ctx.score_for < ctx.score_against {
            return TeamBehavior::AllOutAttack;
        }
        return TeamBehavior::MidBlock;
    }

    if ctx.possession == Some(side) {
        match config.style {
            PlayStyle::Possession => TeamBehavior::Possession,
            PlayStyle::Counter => TeamBehavior::CounterAttack,
            PlayStyle::Direct => TeamBehavior::DirectPlay,
            PlayStyle::Wing => TeamBehavior::WingPlay,
            PlayStyle::Pressing => TeamBehavior::HighPress,
        }
    } else {
        match config.defensive_style {
            DefensiveStyle::HighPress => TeamBehavior::HighPress,
            DefensiveStyle::MidBlock => TeamBehavior::MidBlock,
            DefensiveStyle::LowBlock => TeamBehavior::LowBlock,
            DefensiveStyle::Marking => TeamBehavior::TightMarking,
        }
    }
}

/// Score one opposing outfielder: proximity to our goal, role weight,
/// attacking attributes, plus a bonus while on the ball.
fn threat_score(side: TeamSide, opponent: &PlayerEntity, ball: &Ball) -> f32 {
    let own_goal = Vec2::new(side.defended_goal_x(), pitch::GOAL_CENTER_Y);
    let max_dist = (pitch::LENGTH * pitch::LENGTH + pitch::WIDTH * pitch::WIDTH).sqrt();
    let proximity = (1.0 - opponent.position.distance(own_goal) / max_dist) * 4.0;

    let role_weight = match opponent.player.role {
        crate::models::Role::FWD => 2.0,
        crate::models::Role::MID => 1.0,
        crate::models::Role::DEF => 0.3,
        crate::models::Role::GK => 0.0,
    };

    let attrs = &opponent.player.attributes;
    let quality = (attrs.shooting as f32 + attrs.dribbling as f32 + attrs.speed as f32) / 300.0 * 3.0;

    let possession_bonus = if ball.possessor == Some(opponent.id) { 1.5 } else { 0.0 };

    proximity + role_weight + quality + possession_bonus
}

/// Threat assessment for `side` against the given opposition.
pub fn assess_threat(side: TeamSide, opponents: &[PlayerEntity], ball: &Ball) -> ThreatAssessment {
    let mut dangerous = Vec::new();
    let mut vulnerable_zones = Vec::new();

    for opponent in opponents {
        if !opponent.is_active() || opponent.player.role.is_goalkeeper() {
            continue;
        }
        if threat_score(side, opponent, ball) >= DANGER_THRESHOLD {
            dangerous.push(opponent.id);
            vulnerable_zones.push(zone_center(opponent.position));
        }
    }

    let own_half = match side {
        TeamSide::Home => ball.position.x < pitch::LENGTH / 2.0,
        TeamSide::Away => ball.position.x > pitch::LENGTH / 2.0,
    };
    let possession_risk =
        (dangerous.len() as f32 * 2.5 + if own_half { 3.0 } else { 0.0 }).min(10.0);

    ThreatAssessment { dangerous, vulnerable_zones, possession_risk }
}

/// Snap a position to the centre of its third-by-third zone.
pub fn zone_center(position: Vec2) -> Vec2 {
    let cell = |v: f32| {
        let third = (v / (pitch::LENGTH / 3.0)).floor().clamp(0.0, 2.0);
        third * (pitch::LENGTH / 3.0) + pitch::LENGTH / 6.0
    };
    Vec2::new(cell(position.x), cell(position.y))
}

/// Rank-aligned marking: our defenders sorted by tackling, their dangerous
/// players sorted by finishing + dribbling, paired by index. Unequal list
/// lengths truncate to the shorter list; no optimal assignment is
/// attempted.
pub fn assign_marking(
    own: &[PlayerEntity],
    opponents: &[PlayerEntity],
    dangerous: &[u32],
) -> HashMap<u32, u32> {
    let mut defenders: Vec<&PlayerEntity> = own
        .iter()
        .filter(|p| p.is_active() && p.player.role.is_defender())
        .collect();
    defenders.sort_by(|a, b| {
        b.effective_attribute(Attribute::Tackling)
            .partial_cmp(&a.effective_attribute(Attribute::Tackling))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut threats: Vec<&PlayerEntity> = opponents
        .iter()
        .filter(|p| dangerous.contains(&p.id))
        .collect();
    threats.sort_by(|a, b| {
        let score = |p: &PlayerEntity| {
            p.player.attributes.shooting as i32 + p.player.attributes.dribbling as i32
        };
        score(b).cmp(&score(a))
    });

    defenders
        .iter()
        .zip(threats.iter())
        .map(|(marker, threat)| (threat.id, marker.id))
        .collect()
}

/// Zonal map: every active outfielder anchored to the centre of the zone
/// they currently occupy.
pub fn assign_zones(own: &[PlayerEntity]) -> HashMap<u32, Vec2> {
    own.iter()
        .filter(|p| p.is_active() && !p.player.role.is_goalkeeper())
        .map(|p| (p.id, zone_center(p.position)))
        .collect()
}

/// Full per-tick tactical refresh for one team. Behavior changes pull a
/// fresh parameter bundle and stamp the change time.
pub fn refresh(
    state: &mut TacticalState,
    side: TeamSide,
    config: &TacticalConfig,
    ctx: &TacticalContext,
    own: &[PlayerEntity],
    opponents: &[PlayerEntity],
    ball: &Ball,
    now: f32,
) {
    let next = analyze(side, config, ctx);
    if next != state.behavior {
        log::debug!("{:?} switches posture {:?} -> {:?}", side, state.behavior, next);
        state.behavior = next;
        state.behavior_since = now;
        state.params = behavior_params(next);
    }

    state.threat = assess_threat(side, opponents, ball);
    state.marking = assign_marking(own, opponents, &state.threat.dangerous);
    state.zones = assign_zones(own);
}
