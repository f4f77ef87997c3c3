//! Player decision system: a behavior tree evaluated per player per
//! decision interval.
//!
//! Nodes return one of {Success, Failure, Running}. Composites own their
//! children (a tree, no cycles). Leaf actions are intent markers: they set
//! the chosen action and succeed unconditionally; movement is produced
//! downstream by the positioning system.
//!
//! Team tactical posture can short-circuit the tree entirely; that
//! override is checked before the tree is consulted.

use serde::{Deserialize, Serialize};

use super::entity::{Ball, PlayerEntity};
use super::tactics::{TacticalState, TeamBehavior};

/// Distance from the attacked goal inside which shooting is considered.
pub const SHOOTING_RANGE: f32 = 25.0;
/// An opponent closer than this means the carrier is under pressure.
pub const PRESSURE_RADIUS: f32 = 10.0;
/// High-press posture forces a chase inside this radius.
pub const PRESS_OVERRIDE_RADIUS: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Success,
    Failure,
    Running,
}

/// Discrete intent chosen once per decision interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    Shoot,
    Pass,
    Dribble,
    MakeRun,
    SupportNear,
    MaintainFormation,
    ChaseBall,
    MarkOpponent,
    PressBall,
    HoldPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionKind {
    HasBall,
    TeamHasBall,
    InShootingRange,
    UnderPressure,
    /// Ball within the given distance of this player.
    BallWithin(f32),
    HasMarkTarget,
    IsForward,
}

/// Tagged-variant behavior tree. Composites hold owned child lists.
#[derive(Debug, Clone)]
pub enum BehaviorNode {
    /// First non-failure child wins.
    Selector(Vec<BehaviorNode>),
    /// First non-success child stops the chain.
    Sequence(Vec<BehaviorNode>),
    Inverter(Box<BehaviorNode>),
    /// Succeeds when the child fails; otherwise keeps running.
    RepeatUntilFailure(Box<BehaviorNode>),
    /// Succeeds once at least `threshold` children succeed.
    Parallel { threshold: usize, children: Vec<BehaviorNode> },
    Condition(ConditionKind),
    Action(PlayerAction),
}

/// Read-only view of the world for one player's decision.
pub struct DecisionContext<'a> {
    pub entity: &'a PlayerEntity,
    pub ball: &'a Ball,
    pub opponents: &'a [PlayerEntity],
    pub team_has_ball: bool,
    pub tactical: Option<&'a TacticalState>,
}

impl<'a> DecisionContext<'a> {
    fn check(&self, condition: ConditionKind) -> bool {
        match condition {
            ConditionKind::HasBall => self.entity.has_ball,
            ConditionKind::TeamHasBall => self.team_has_ball,
            ConditionKind::InShootingRange => {
                let goal = super::pitch::Vec2::new(
                    self.entity.side.attacked_goal_x(),
                    super::pitch::GOAL_CENTER_Y,
                );
                self.entity.distance_to_point(goal) < SHOOTING_RANGE
            }
            ConditionKind::UnderPressure => self
                .opponents
                .iter()
                .filter(|o| o.is_active())
                .map(|o| o.distance_to(self.entity))
                .fold(f32::INFINITY, f32::min)
                < PRESSURE_RADIUS,
            ConditionKind::BallWithin(radius) => {
                self.entity.distance_to_point(self.ball.position) < radius
            }
            ConditionKind::HasMarkTarget => self.entity.marking.is_some(),
            ConditionKind::IsForward => self.entity.player.role.is_forward(),
        }
    }
}

impl BehaviorNode {
    /// Evaluate top-down. The first action leaf reached on a successful
    /// path records itself in `chosen`.
    pub fn evaluate(&self, ctx: &DecisionContext, chosen: &mut Option<PlayerAction>) -> NodeStatus {
        match self {
            BehaviorNode::Selector(children) => {
                for child in children {
                    match child.evaluate(ctx, chosen) {
                        NodeStatus::Failure => continue,
                        status => return status,
                    }
                }
                NodeStatus::Failure
            }
            BehaviorNode::Sequence(children) => {
                for child in children {
                    match child.evaluate(ctx, chosen) {
                        NodeStatus::Success => continue,
                        status => return status,
                    }
                }
                NodeStatus::Success
            }
            BehaviorNode::Inverter(child) => match child.evaluate(ctx, chosen) {
                NodeStatus::Success => NodeStatus::Failure,
                NodeStatus::Failure => NodeStatus::Success,
                NodeStatus::Running => NodeStatus::Running,
            },
            BehaviorNode::RepeatUntilFailure(child) => match child.evaluate(ctx, chosen) {
                NodeStatus::Failure => NodeStatus::Success,
                _ => NodeStatus::Running,
            },
            BehaviorNode::Parallel { threshold, children } => {
                let mut successes = 0;
                let mut running = false;
                for child in children {
                    match child.evaluate(ctx, chosen) {
                        NodeStatus::Success => successes += 1,
                        NodeStatus::Running => running = true,
                        NodeStatus::Failure => {}
                    }
                }
                if successes >= *threshold {
                    NodeStatus::Success
                } else if running {
                    NodeStatus::Running
                } else {
                    NodeStatus::Failure
                }
            }
            BehaviorNode::Condition(kind) => {
                if ctx.check(*kind) {
                    NodeStatus::Success
                } else {
                    NodeStatus::Failure
                }
            }
            BehaviorNode::Action(action) => {
                if chosen.is_none() {
                    *chosen = Some(*action);
                }
                NodeStatus::Success
            }
        }
    }
}

fn guarded(condition: ConditionKind, action: PlayerAction) -> BehaviorNode {
    BehaviorNode::Sequence(vec![BehaviorNode::Condition(condition), BehaviorNode::Action(action)])
}

/// The canonical outfield tree: on the ball, shoot/pass/dribble; in
/// possession off the ball, run/support/keep shape; out of possession,
/// chase/mark/press/hold.
pub fn field_player_tree() -> BehaviorNode {
    BehaviorNode::Selector(vec![
        BehaviorNode::Sequence(vec![
            BehaviorNode::Condition(ConditionKind::HasBall),
            BehaviorNode::Selector(vec![
                guarded(ConditionKind::InShootingRange, PlayerAction::Shoot),
                guarded(ConditionKind::UnderPressure, PlayerAction::Pass),
                BehaviorNode::Action(PlayerAction::Dribble),
            ]),
        ]),
        BehaviorNode::Sequence(vec![
            BehaviorNode::Condition(ConditionKind::TeamHasBall),
            BehaviorNode::Selector(vec![
                guarded(ConditionKind::IsForward, PlayerAction::MakeRun),
                guarded(ConditionKind::BallWithin(30.0), PlayerAction::SupportNear),
                BehaviorNode::Action(PlayerAction::MaintainFormation),
            ]),
        ]),
        BehaviorNode::Selector(vec![
            guarded(ConditionKind::BallWithin(15.0), PlayerAction::ChaseBall),
            guarded(ConditionKind::HasMarkTarget, PlayerAction::MarkOpponent),
            guarded(ConditionKind::BallWithin(25.0), PlayerAction::PressBall),
            BehaviorNode::Action(PlayerAction::HoldPosition),
        ]),
    ])
}

/// Goalkeepers distribute when holding the ball and otherwise stay home.
pub fn goalkeeper_tree() -> BehaviorNode {
    BehaviorNode::Selector(vec![
        guarded(ConditionKind::HasBall, PlayerAction::Pass),
        BehaviorNode::Sequence(vec![
            BehaviorNode::Inverter(Box::new(BehaviorNode::Condition(ConditionKind::HasBall))),
            BehaviorNode::Action(PlayerAction::HoldPosition),
        ]),
    ])
}

/// Posture override, evaluated before the tree. High press forces a chase
/// near the ball; park-the-bus pins defenders and midfielders.
pub fn tactical_override(ctx: &DecisionContext) -> Option<PlayerAction> {
    let tactical = ctx.tactical?;
    match tactical.behavior {
        TeamBehavior::HighPress
            if !ctx.entity.has_ball
                && !ctx.team_has_ball
                && ctx.entity.distance_to_point(ctx.ball.position) < PRESS_OVERRIDE_RADIUS =>
        {
            Some(PlayerAction::ChaseBall)
        }
        TeamBehavior::ParkTheBus
            if ctx.entity.player.role.holds_line() && !ctx.entity.has_ball =>
        {
            Some(PlayerAction::HoldPosition)
        }
        _ => None,
    }
}

/// Full decision for one player: override first, then the role tree.
pub fn decide(ctx: &DecisionContext) -> PlayerAction {
    if let Some(forced) = tactical_override(ctx) {
        return forced;
    }

    let tree = if ctx.entity.player.role.is_goalkeeper() {
        goalkeeper_tree()
    } else {
        field_player_tree()
    };

    let mut chosen = None;
    tree.evaluate(ctx, &mut chosen);
    chosen.unwrap_or(PlayerAction::HoldPosition)
}
