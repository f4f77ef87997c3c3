use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Player roster record consumed by the match engine.
///
/// This is the static part of a player: identity and ratings. Everything
/// that changes during a match (position, fatigue, cards) lives in
/// `engine::entity::PlayerEntity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub name: String,
    pub squad_number: u8,
    pub role: Role,

    #[serde(default)]
    pub attributes: PlayerAttributes,
}

impl Player {
    pub fn new(name: impl Into<String>, squad_number: u8, role: Role) -> Self {
        Self {
            name: name.into(),
            squad_number,
            role,
            attributes: PlayerAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: PlayerAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Tactical line role. The engine only reasons about lines, not about the
/// sub-positions within them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    GK,
    DEF,
    MID,
    FWD,
}

impl Role {
    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, Role::GK)
    }

    pub fn is_defender(&self) -> bool {
        matches!(self, Role::DEF)
    }

    pub fn is_midfielder(&self) -> bool {
        matches!(self, Role::MID)
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Role::FWD)
    }

    /// Whether this role takes part in the defensive-line shift applied by
    /// the positioning system.
    pub fn holds_line(&self) -> bool {
        matches!(self, Role::DEF | Role::MID)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::GK => "Goalkeeper",
            Role::DEF => "Defender",
            Role::MID => "Midfielder",
            Role::FWD => "Forward",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GK" => Ok(Role::GK),
            "DF" | "DEF" => Ok(Role::DEF),
            "MF" | "MID" => Ok(Role::MID),
            "FW" | "FWD" => Ok(Role::FWD),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Numeric ratings on a 0-100 scale, grouped the way scouts group them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAttributes {
    // Technical
    pub passing: u8,
    pub shooting: u8,
    pub dribbling: u8,
    pub tackling: u8,
    pub marking: u8,

    // Mental
    pub positioning: u8,
    pub vision: u8,
    pub aggression: u8,
    pub composure: u8,

    // Physical
    pub speed: u8,
    pub stamina: u8,
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self::from_uniform(50)
    }
}

impl PlayerAttributes {
    /// Creates attributes with a uniform value (clamped to 1..=100).
    pub fn from_uniform(val: u8) -> Self {
        let v = val.clamp(1, 100);
        Self {
            passing: v,
            shooting: v,
            dribbling: v,
            tackling: v,
            marking: v,
            positioning: v,
            vision: v,
            aggression: v,
            composure: v,
            speed: v,
            stamina: v,
        }
    }

    pub fn get(&self, attr: Attribute) -> u8 {
        match attr {
            Attribute::Passing => self.passing,
            Attribute::Shooting => self.shooting,
            Attribute::Dribbling => self.dribbling,
            Attribute::Tackling => self.tackling,
            Attribute::Marking => self.marking,
            Attribute::Positioning => self.positioning,
            Attribute::Vision => self.vision,
            Attribute::Aggression => self.aggression,
            Attribute::Composure => self.composure,
            Attribute::Speed => self.speed,
            Attribute::Stamina => self.stamina,
        }
    }
}

/// Attribute selector used by `PlayerEntity::effective_attribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Passing,
    Shooting,
    Dribbling,
    Tackling,
    Marking,
    Positioning,
    Vision,
    Aggression,
    Composure,
    Speed,
    Stamina,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uniform_sets_all_fields() {
        let attrs = PlayerAttributes::from_uniform(80);
        assert_eq!(attrs.passing, 80);
        assert_eq!(attrs.aggression, 80);
        assert_eq!(attrs.speed, 80);
    }

    #[test]
    fn from_uniform_clamps_to_bounds() {
        let low = PlayerAttributes::from_uniform(0);
        assert_eq!(low.speed, 1);
        let high = PlayerAttributes::from_uniform(120);
        assert_eq!(high.speed, 100);
    }

    #[test]
    fn role_parsing_accepts_aliases() {
        assert_eq!(Role::from_str("fwd").unwrap(), Role::FWD);
        assert_eq!(Role::from_str("DF").unwrap(), Role::DEF);
        assert!(Role::from_str("SWEEPER").is_err());
    }

    #[test]
    fn holds_line_excludes_keeper_and_forwards() {
        assert!(Role::DEF.holds_line());
        assert!(Role::MID.holds_line());
        assert!(!Role::GK.holds_line());
        assert!(!Role::FWD.holds_line());
    }
}
