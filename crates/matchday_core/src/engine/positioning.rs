//! Formation and positioning: base slots per formation, tactical dial
//! adjustments, and per-action movement targets.
//!
//! Slot tables are written in home orientation (defending x = 0) and
//! mirrored for the away side. Adjusted targets always clamp to the
//! interior band [10,90] x [10,90].

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::behavior::PlayerAction;
use super::deterministic::{deterministic_bool, subcase};
use super::entity::{Ball, PlayerEntity};
use super::pitch::{self, Vec2};
use super::tactics::TacticalParams;
use crate::models::{Formation, Role, TeamSide};

/// The four positioning dials, 1..=10 with 5 neutral. Set by the tactical
/// system whenever the posture parameter bundle changes.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositioningDials {
    pub line_height: u8,
    pub width: u8,
    pub compactness: u8,
    pub tempo: u8,
}

impl Default for PositioningDials {
    fn default() -> Self {
        Self { line_height: 5, width: 5, compactness: 5, tempo: 5 }
    }
}

impl PositioningDials {
    pub fn from_params(params: &TacticalParams) -> Self {
        Self {
            line_height: params.line_height,
            width: params.width,
            compactness: params.compactness,
            tempo: params.tempo,
        }
    }
}

/// Base slot: role plus home-oriented coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub role: Role,
    pub position: Vec2,
}

const fn slot(role: Role, x: f32, y: f32) -> Slot {
    Slot { role, position: Vec2::new(x, y) }
}

static FORMATION_SLOTS: Lazy<HashMap<Formation, Vec<Slot>>> = Lazy::new(|| {
    use Role::*;
    let mut table = HashMap::new();
    table.insert(
        Formation::F442,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 20.0, 20.0),
            slot(DEF, 18.0, 40.0),
            slot(DEF, 18.0, 60.0),
            slot(DEF, 20.0, 80.0),
            slot(MID, 45.0, 20.0),
            slot(MID, 42.0, 40.0),
            slot(MID, 42.0, 60.0),
            slot(MID, 45.0, 80.0),
            slot(FWD, 70.0, 40.0),
            slot(FWD, 70.0, 60.0),
        ],
    );
    table.insert(
        Formation::F433,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 20.0, 20.0),
            slot(DEF, 18.0, 40.0),
            slot(DEF, 18.0, 60.0),
            slot(DEF, 20.0, 80.0),
            slot(MID, 42.0, 30.0),
            slot(MID, 40.0, 50.0),
            slot(MID, 42.0, 70.0),
            slot(FWD, 70.0, 25.0),
            slot(FWD, 72.0, 50.0),
            slot(FWD, 70.0, 75.0),
        ],
    );
    table.insert(
        Formation::F451,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 20.0, 20.0),
            slot(DEF, 18.0, 40.0),
            slot(DEF, 18.0, 60.0),
            slot(DEF, 20.0, 80.0),
            slot(MID, 45.0, 15.0),
            slot(MID, 42.0, 35.0),
            slot(MID, 40.0, 50.0),
            slot(MID, 42.0, 65.0),
            slot(MID, 45.0, 85.0),
            slot(FWD, 72.0, 50.0),
        ],
    );
    table.insert(
        Formation::F352,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 18.0, 30.0),
            slot(DEF, 16.0, 50.0),
            slot(DEF, 18.0, 70.0),
            slot(MID, 40.0, 15.0),
            slot(MID, 44.0, 35.0),
            slot(MID, 42.0, 50.0),
            slot(MID, 44.0, 65.0),
            slot(MID, 40.0, 85.0),
            slot(FWD, 70.0, 40.0),
            slot(FWD, 70.0, 60.0),
        ],
    );
    table.insert(
        Formation::F532,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 22.0, 15.0),
            slot(DEF, 18.0, 35.0),
            slot(DEF, 16.0, 50.0),
            slot(DEF, 18.0, 65.0),
            slot(DEF, 22.0, 85.0),
            slot(MID, 44.0, 30.0),
            slot(MID, 42.0, 50.0),
            slot(MID, 44.0, 70.0),
            slot(FWD, 68.0, 40.0),
            slot(FWD, 68.0, 60.0),
        ],
    );
    table.insert(
        Formation::F343,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 18.0, 30.0),
            slot(DEF, 16.0, 50.0),
            slot(DEF, 18.0, 70.0),
            slot(MID, 44.0, 20.0),
            slot(MID, 42.0, 40.0),
            slot(MID, 42.0, 60.0),
            slot(MID, 44.0, 80.0),
            slot(FWD, 70.0, 25.0),
            slot(FWD, 74.0, 50.0),
            slot(FWD, 70.0, 75.0),
        ],
    );
    table.insert(
        Formation::F4231,
        vec![
            slot(GK, 5.0, 50.0),
            slot(DEF, 20.0, 20.0),
            slot(DEF, 18.0, 40.0),
            slot(DEF, 18.0, 60.0),
            slot(DEF, 20.0, 80.0),
            slot(MID, 38.0, 40.0),
            slot(MID, 38.0, 60.0),
            slot(MID, 52.0, 25.0),
            slot(MID, 54.0, 50.0),
            slot(MID, 52.0, 75.0),
            slot(FWD, 72.0, 50.0),
        ],
    );
    table
});

/// Base slots for a formation, home-oriented, goalkeeper first.
pub fn formation_slots(formation: Formation) -> &'static [Slot] {
    &FORMATION_SLOTS[&formation]
}

/// A slot position in the given side's orientation.
pub fn oriented(slot_position: Vec2, side: TeamSide) -> Vec2 {
    match side {
        TeamSide::Home => slot_position,
        TeamSide::Away => Vec2::new(pitch::LENGTH - slot_position.x, slot_position.y),
    }
}

/// The formation anchor for one player: base slot shifted by the dials and
/// the ball, clamped to the interior band.
///
/// Shifts, in order: defensive-line height (DEF/MID only), width push away
/// from centre, compactness pull-back while defending, ball-side
/// attraction on the shared lateral half.
pub fn anchor(
    slot_position: Vec2,
    role: Role,
    side: TeamSide,
    ball: &Ball,
    dials: &PositioningDials,
) -> Vec2 {
    let base = oriented(slot_position, side);
    let sign = side.attack_sign();
    let mut x = base.x;
    let mut y = base.y;

    if role.holds_line() {
        x += (dials.line_height as f32 - 5.0) * 1.5 * sign;
    }

    let lateral = y - pitch::WIDTH / 2.0;
    if lateral.abs() > 1e-3 {
        y += lateral.signum() * (dials.width as f32 - 5.0) * 1.2;
    }

    let defending_half = match side {
        TeamSide::Home => ball.position.x < pitch::LENGTH / 2.0,
        TeamSide::Away => ball.position.x > pitch::LENGTH / 2.0,
    };
    if defending_half {
        x -= (dials.compactness as f32 - 5.0) * sign;
    }

    let ball_lateral = ball.position.y - pitch::WIDTH / 2.0;
    if lateral * ball_lateral > 0.0 {
        y += (ball.position.y - y) * 0.15;
    }

    Vec2::new(x, y).clamped_interior()
}

/// Turn a chosen action into a movement target. The anchor is the
/// formation-adjusted position computed by `anchor`.
pub fn action_target(
    entity: &PlayerEntity,
    action: PlayerAction,
    ball: &Ball,
    anchor_position: Vec2,
    offside_line: f32,
    mark_position: Option<Vec2>,
) -> Vec2 {
    let sign = entity.side.attack_sign();
    let goal = Vec2::new(entity.side.attacked_goal_x(), pitch::GOAL_CENTER_Y);

    match action {
        // Striking actions keep the player planted; the ball does the
        // travelling.
        PlayerAction::Shoot | PlayerAction::Pass => entity.position,

        PlayerAction::Dribble => {
            let ahead = Vec2::new(
                entity.position.x + 10.0 * sign,
                entity.position.y + (goal.y - entity.position.y) * 0.2,
            );
            ahead.clamped_interior()
        }

        PlayerAction::MakeRun => {
            // Advance, but stay onside: never target beyond the line.
            let desired = entity.position.x + 15.0 * sign;
            let capped = match entity.side {
                TeamSide::Home => desired.min(offside_line - 1.0),
                TeamSide::Away => desired.max(offside_line + 1.0),
            };
            Vec2::new(capped, anchor_position.y).clamped_interior()
        }

        PlayerAction::SupportNear => {
            let toward_anchor = ball.position.towards(anchor_position);
            ball.position.plus(toward_anchor.scaled(8.0)).clamped_interior()
        }

        PlayerAction::ChaseBall | PlayerAction::PressBall => ball.position.clamped(),

        PlayerAction::MarkOpponent => match mark_position {
            // Goal-side of the marked opponent.
            Some(threat) => {
                let own_goal = Vec2::new(entity.side.defended_goal_x(), pitch::GOAL_CENTER_Y);
                Vec2::new(
                    (threat.x + own_goal.x) / 2.0 + (threat.x - own_goal.x) * 0.3,
                    (threat.y + own_goal.y) / 2.0 + (threat.y - own_goal.y) * 0.3,
                )
                .clamped()
            }
            None => anchor_position,
        },

        PlayerAction::MaintainFormation | PlayerAction::HoldPosition => anchor_position,
    }
}

/// Late-match formation suggestion. A low per-tick probability gate keeps
/// the shape from flapping; the suggestion prefers attacking shapes when
/// trailing by two or more, defensive shapes when leading.
pub fn suggest_formation_change(
    seed: u64,
    tick: u64,
    team_idx: usize,
    current: Formation,
    score_delta: i16,
    remaining_secs: f32,
) -> Option<Formation> {
    if remaining_secs > 900.0 {
        return None;
    }
    if !deterministic_bool(seed, tick, team_idx, subcase::FORMATION_GATE, 0.2) {
        return None;
    }

    let preferred = if score_delta <= -2 {
        Formation::F343
    } else if score_delta > 0 {
        Formation::F532
    } else {
        Formation::F442
    };

    if preferred == current {
        None
    } else {
        Some(preferred)
    }
}
