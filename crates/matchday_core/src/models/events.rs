use serde::{Deserialize, Serialize};

use super::TeamSide;
use crate::engine::pitch::Vec2;

/// A single entry of the append-only match event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEvent {
    pub minute: u8,
    /// Simulated game time in seconds at emission.
    pub game_time: f32,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamSide>,
    /// Primary actor (on-pitch entity id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<u32>,
    /// Secondary actor (pass receiver, fouled player, replacement).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    KickOff,
    Goal,
    Shot,
    Pass,
    Foul,
    Penalty,
    Offside,
    YellowCard,
    RedCard,
    Corner,
    ThrowIn,
    GoalKick,
    FreeKick,
    Substitution,
    Injury,
    HalfTime,
    FullTime,
}

impl MatchEvent {
    pub fn new(minute: u8, game_time: f32, event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            minute,
            game_time,
            event_type,
            message: message.into(),
            team: None,
            player_id: None,
            target_id: None,
            position: None,
        }
    }

    pub fn with_team(mut self, team: TeamSide) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_player(mut self, id: u32) -> Self {
        self.player_id = Some(id);
        self
    }

    pub fn with_target(mut self, id: u32) -> Self {
        self.target_id = Some(id);
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn event_types_serialize_snake_case() {
        for event_type in EventType::iter() {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, json.to_lowercase(), "{:?} not snake_case", event_type);
            let back: EventType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event_type);
        }
    }

    #[test]
    fn optional_fields_are_omitted() {
        let event = MatchEvent::new(12, 700.0, EventType::Pass, "Pass");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("player_id"));
        assert!(!json.contains("position"));
    }
}
