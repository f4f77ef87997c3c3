//! Match simulation engine.
//!
//! Layering, leaves first: `pitch` and `entity` hold geometry and state;
//! `rules` is stateless law; `behavior`, `tactics`, and `positioning`
//! produce intents and targets; `clock` owns time; `orchestrator` (with
//! its `restarts` and `substitutions` impl splits) sequences one tick; the
//! `controller` is the host boundary.

pub mod behavior;
pub mod cards;
pub mod clock;
pub mod controller;
pub mod deterministic;
pub mod entity;
pub mod orchestrator;
pub mod physics;
pub mod pitch;
pub mod positioning;
pub mod restarts;
pub mod rules;
pub mod snapshot;
pub mod stats;
pub mod substitutions;
pub mod tactics;

#[cfg(test)]
pub(crate) mod test_support;

pub use behavior::{BehaviorNode, NodeStatus, PlayerAction};
pub use cards::{BookedCard, CardBook, CardType};
pub use clock::{MatchClock, MatchPhase};
pub use controller::MatchController;
pub use deterministic::MatchRng;
pub use entity::{Ball, PlayerEntity};
pub use orchestrator::{InjuryRecord, MatchConfig, MatchEngine, TeamUnit};
pub use physics::{CollisionEvent, KinematicPhysics, PhysicsCollaborator};
pub use pitch::Vec2;
pub use positioning::PositioningDials;
pub use rules::{Restart, RestartKind};
pub use snapshot::MatchSnapshot;
pub use stats::{MatchStats, TeamStats};
pub use substitutions::SubstitutionOutcome;
pub use tactics::{TacticalParams, TacticalState, TeamBehavior};
