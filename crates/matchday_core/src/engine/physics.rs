//! Physics collaborator boundary.
//!
//! The core owns decisions and targets; a physics collaborator owns motion
//! integration and collision detection. `KinematicPhysics` is the built-in
//! collaborator: straight-line integration with ball friction, enough to
//! run headless matches and tests. A host with a real physics engine
//! implements `PhysicsCollaborator` and the core never knows the
//! difference.

use std::collections::BTreeMap;

use super::pitch::{self, Vec2};

/// Body id reserved for the ball. Player bodies use their entity ids.
pub const BALL_BODY: u32 = u32::MAX;

/// Per-second velocity retention lost to rolling friction.
const BALL_FRICTION: f32 = 0.8;

/// Contact distance for ball/player collision events.
const CONTACT_RADIUS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyLabel {
    Ball,
    Player,
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: (BodyLabel, u32),
    pub b: (BodyLabel, u32),
}

pub trait PhysicsCollaborator {
    fn create_body(&mut self, id: u32, position: Vec2);
    fn remove_body(&mut self, id: u32);
    fn apply_force(&mut self, id: u32, force: Vec2);
    fn set_velocity(&mut self, id: u32, velocity: Vec2);
    fn set_position(&mut self, id: u32, position: Vec2);
    fn position_of(&self, id: u32) -> Vec2;
    fn velocity_of(&self, id: u32) -> Vec2;
    /// Integrate all bodies over `dt` seconds.
    fn step(&mut self, dt: f32);
    /// Drain collision events observed since the last drain.
    fn drain_collisions(&mut self) -> Vec<CollisionEvent>;
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    position: Vec2,
    velocity: Vec2,
}

/// Built-in collaborator: players clamp to the pitch, the ball rolls with
/// friction and may leave the field (bounds rulings read the raw position).
#[derive(Debug, Default)]
pub struct KinematicPhysics {
    bodies: BTreeMap<u32, Body>,
    collisions: Vec<CollisionEvent>,
}

impl KinematicPhysics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhysicsCollaborator for KinematicPhysics {
    fn create_body(&mut self, id: u32, position: Vec2) {
        self.bodies.insert(id, Body { position, velocity: Vec2::default() });
    }

    fn remove_body(&mut self, id: u32) {
        self.bodies.remove(&id);
    }

    fn apply_force(&mut self, id: u32, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = body.velocity.plus(force);
        }
    }

    fn set_velocity(&mut self, id: u32, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn set_position(&mut self, id: u32, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
            body.velocity = Vec2::default();
        }
    }

    fn position_of(&self, id: u32) -> Vec2 {
        self.bodies.get(&id).map(|b| b.position).unwrap_or_default()
    }

    fn velocity_of(&self, id: u32) -> Vec2 {
        self.bodies.get(&id).map(|b| b.velocity).unwrap_or_default()
    }

    fn step(&mut self, dt: f32) {
        for (&id, body) in self.bodies.iter_mut() {
            body.position = Vec2::new(
                body.position.x + body.velocity.x * dt,
                body.position.y + body.velocity.y * dt,
            );

            if id == BALL_BODY {
                let retain = (1.0 - BALL_FRICTION * dt).max(0.0);
                body.velocity = body.velocity.scaled(retain);
            } else {
                let clamped = body.position.clamped();
                if clamped != body.position {
                    body.position = clamped;
                    self.collisions.push(CollisionEvent {
                        a: (BodyLabel::Player, id),
                        b: (BodyLabel::Boundary, 0),
                    });
                }
            }
        }

        // Ball contact sweep after integration.
        if let Some(ball) = self.bodies.get(&BALL_BODY).copied() {
            let mut hits = Vec::new();
            for (&id, body) in self.bodies.iter() {
                if id == BALL_BODY {
                    continue;
                }
                if body.position.distance(ball.position) <= CONTACT_RADIUS {
                    hits.push(CollisionEvent {
                        a: (BodyLabel::Ball, BALL_BODY),
                        b: (BodyLabel::Player, id),
                    });
                }
            }
            self.collisions.extend(hits);
        }
    }

    fn drain_collisions(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.collisions)
    }
}
