//! Entity model: on-pitch player state and the ball.
//!
//! Entities hold kinematic and transient match state only. Decisions are
//! made by the behavior tree, movement targets by the positioning system,
//! rules by the rules engine. Nothing here reaches outside its own state.

use serde::{Deserialize, Serialize};

use super::behavior::PlayerAction;
use super::pitch::Vec2;
use crate::models::{Attribute, Player, TeamSide};

/// Sprint speed in pitch units per second for a 100-rated, fresh player.
pub const MAX_PLAYER_SPEED: f32 = 8.0;

/// Seconds between behavior-tree re-evaluations for one player.
pub const DECISION_COOLDOWN_SECS: f32 = 0.5;

/// Base fatigue accrual per simulated second at neutral intensity.
/// Tuned so an average outfielder sits around 0.6 after 90 minutes.
const FATIGUE_BASE_RATE: f32 = 0.00012;

/// A player on the pitch. Created at match initialization from a roster
/// record, mutated every tick, never destroyed mid-match; substitution
/// swaps the roster record occupying this slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerEntity {
    pub id: u32,
    pub player: Player,
    pub side: TeamSide,

    pub position: Vec2,
    pub target: Vec2,
    pub velocity: Vec2,

    pub fatigue: f32,
    pub has_ball: bool,

    /// Opponent this player is man-marking, if any.
    pub marking: Option<u32>,
    /// Opponent marking this player, if any.
    pub marked_by: Option<u32>,

    pub yellow_cards: u8,
    pub sent_off: bool,
    pub injured: bool,

    pub last_action: PlayerAction,
    /// Remaining seconds until the behavior tree is consulted again.
    pub decision_cooldown: f32,
}

impl PlayerEntity {
    pub fn new(id: u32, player: Player, side: TeamSide, position: Vec2) -> Self {
        Self {
            id,
            player,
            side,
            position,
            target: position,
            velocity: Vec2::default(),
            fatigue: 0.0,
            has_ball: false,
            marking: None,
            marked_by: None,
            yellow_cards: 0,
            sent_off: false,
            injured: false,
            last_action: PlayerAction::HoldPosition,
            decision_cooldown: 0.0,
        }
    }

    /// Assign a movement target, clamped to pitch bounds.
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target.clamped();
    }

    pub fn distance_to(&self, other: &PlayerEntity) -> f32 {
        self.position.distance(other.position)
    }

    pub fn distance_to_point(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Fatigue degrades every attribute-driven decision and speed
    /// uniformly: base x (1 - fatigue x 0.5).
    pub fn effective_attribute(&self, attr: Attribute) -> f32 {
        let base = self.player.attributes.get(attr) as f32;
        base * (1.0 - self.fatigue * 0.5)
    }

    /// Current top speed in pitch units per second.
    pub fn max_speed(&self) -> f32 {
        MAX_PLAYER_SPEED * self.effective_attribute(Attribute::Speed) / 100.0
    }

    /// Accrue fatigue over `dt` simulated seconds. `intensity` is 1.0 for
    /// routine movement, higher when sprinting or pressing. Low stamina
    /// tires faster; fatigue never decreases during play.
    pub fn add_fatigue(&mut self, dt: f32, intensity: f32) {
        let stamina = self.player.attributes.stamina as f32;
        let stamina_factor = 1.5 - stamina / 100.0;
        self.fatigue = (self.fatigue + FATIGUE_BASE_RATE * dt * intensity * stamina_factor).min(1.0);
    }

    /// Whether this player participates in the decision pass.
    pub fn is_active(&self) -> bool {
        !self.sent_off && !self.injured
    }

    /// Reset transient state for a new occupant of this pitch slot.
    pub fn reset_for_substitute(&mut self, player: Player, position: Vec2) {
        self.player = player;
        self.position = position;
        self.target = position;
        self.velocity = Vec2::default();
        self.fatigue = 0.0;
        self.has_ball = false;
        self.marking = None;
        self.marked_by = None;
        self.injured = false;
        self.last_action = PlayerAction::HoldPosition;
        self.decision_cooldown = 0.0;
    }
}

/// The ball. Position authority belongs to the possessor while one exists;
/// otherwise the physics collaborator integrates the velocity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Ball {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Id of the controlling player. Motion authority, not ownership.
    pub possessor: Option<u32>,
    pub last_touch: Option<TeamSide>,
    pub airborne: bool,
    /// Visual height scalar; not physically simulated.
    pub height: f32,
}

impl Ball {
    pub fn at_center() -> Self {
        Self { position: Vec2::center(), ..Default::default() }
    }

    /// Give the ball to a player: velocity dies, the ball snaps to the
    /// player every tick until possession is cleared.
    pub fn set_possessor(&mut self, id: u32, side: TeamSide) {
        self.possessor = Some(id);
        self.velocity = Vec2::default();
        self.airborne = false;
        self.height = 0.0;
        self.last_touch = Some(side);
    }

    pub fn clear_possessor(&mut self) {
        self.possessor = None;
    }

    /// Strike the ball: possession clears and the ball travels on its own.
    pub fn kick(&mut self, direction: Vec2, speed: f32, by: TeamSide, airborne: bool) {
        self.possessor = None;
        self.velocity = direction.normalized().scaled(speed);
        self.last_touch = Some(by);
        self.airborne = airborne;
        self.height = if airborne { 2.0 } else { 0.0 };
    }

    /// Snap to the possessor's position. Called once per tick while a
    /// possessor exists.
    pub fn follow(&mut self, possessor_position: Vec2) {
        self.position = possessor_position;
        self.velocity = Vec2::default();
    }

    /// Restart placement: dead ball at a spot, no owner, no motion.
    pub fn place(&mut self, spot: Vec2) {
        self.position = spot.clamped();
        self.velocity = Vec2::default();
        self.possessor = None;
        self.airborne = false;
        self.height = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerAttributes, Role};

    fn entity(fatigue: f32) -> PlayerEntity {
        let player = Player::new("Test", 7, Role::MID)
            .with_attributes(PlayerAttributes::from_uniform(80));
        let mut e = PlayerEntity::new(3, player, TeamSide::Home, Vec2::center());
        e.fatigue = fatigue;
        e
    }

    #[test]
    fn set_target_clamps_to_pitch() {
        let mut e = entity(0.0);
        e.set_target(Vec2::new(-10.0, 140.0));
        assert_eq!(e.target, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn effective_attribute_degrades_with_fatigue() {
        let fresh = entity(0.0);
        assert!((fresh.effective_attribute(Attribute::Passing) - 80.0).abs() < 1e-4);

        let tired = entity(1.0);
        assert!((tired.effective_attribute(Attribute::Passing) - 40.0).abs() < 1e-4);
    }

    #[test]
    fn fatigue_is_monotonic_and_saturates() {
        let mut e = entity(0.0);
        let mut last = 0.0;
        for _ in 0..2_000_000 {
            e.add_fatigue(1.0, 2.0);
            assert!(e.fatigue >= last);
            last = e.fatigue;
            if e.fatigue >= 1.0 {
                break;
            }
        }
        e.add_fatigue(10.0, 5.0);
        assert!(e.fatigue <= 1.0);
    }

    #[test]
    fn possession_zeroes_velocity_and_tracks_touch() {
        let mut ball = Ball::at_center();
        ball.velocity = Vec2::new(5.0, 2.0);
        ball.set_possessor(4, TeamSide::Away);
        assert_eq!(ball.velocity, Vec2::default());
        assert_eq!(ball.possessor, Some(4));
        assert_eq!(ball.last_touch, Some(TeamSide::Away));
    }

    #[test]
    fn follow_forces_ball_to_player() {
        let mut ball = Ball::at_center();
        ball.set_possessor(4, TeamSide::Home);
        let spot = Vec2::new(30.0, 60.0);
        ball.follow(spot);
        assert_eq!(ball.position, spot);
    }

    #[test]
    fn kick_clears_possession() {
        let mut ball = Ball::at_center();
        ball.set_possessor(4, TeamSide::Home);
        ball.kick(Vec2::new(1.0, 0.0), 20.0, TeamSide::Home, false);
        assert_eq!(ball.possessor, None);
        assert!(ball.velocity.x > 19.9);
    }
}
