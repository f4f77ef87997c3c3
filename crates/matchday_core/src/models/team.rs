use serde::{Deserialize, Serialize};

use super::{Player, Role};
use crate::error::{MatchError, Result};

/// Which bench a team occupies. Home always attacks toward `x = 100`,
/// away toward `x = 0`; ends do not swap at half time, only the kickoff does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }

    pub fn is_home(self) -> bool {
        matches!(self, TeamSide::Home)
    }

    /// Sign of the attacking direction along the x axis.
    pub fn attack_sign(self) -> f32 {
        match self {
            TeamSide::Home => 1.0,
            TeamSide::Away => -1.0,
        }
    }

    /// x coordinate of the goal this side attacks.
    pub fn attacked_goal_x(self) -> f32 {
        match self {
            TeamSide::Home => 100.0,
            TeamSide::Away => 0.0,
        }
    }

    /// x coordinate of the goal this side defends.
    pub fn defended_goal_x(self) -> f32 {
        self.opponent().attacked_goal_x()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Formation {
    #[serde(rename = "4-4-2")]
    F442,
    #[serde(rename = "4-3-3")]
    F433,
    #[serde(rename = "4-5-1")]
    F451,
    #[serde(rename = "3-5-2")]
    F352,
    #[serde(rename = "5-3-2")]
    F532,
    #[serde(rename = "3-4-3")]
    F343,
    #[serde(rename = "4-2-3-1")]
    F4231,
}

impl Formation {
    /// Returns (defenders, midfielders, forwards). Always sums to 10.
    pub fn role_counts(&self) -> (u8, u8, u8) {
        match self {
            Formation::F442 => (4, 4, 2),
            Formation::F433 => (4, 3, 3),
            Formation::F451 => (4, 5, 1),
            Formation::F352 => (3, 5, 2),
            Formation::F532 => (5, 3, 2),
            Formation::F343 => (3, 4, 3),
            Formation::F4231 => (4, 5, 1),
        }
    }

    /// Canonical formation code string (e.g., "4-3-3").
    pub fn code(&self) -> &'static str {
        match self {
            Formation::F442 => "4-4-2",
            Formation::F433 => "4-3-3",
            Formation::F451 => "4-5-1",
            Formation::F352 => "3-5-2",
            Formation::F532 => "5-3-2",
            Formation::F343 => "3-4-3",
            Formation::F4231 => "4-2-3-1",
        }
    }

    /// How attack-minded the shape is, used when late-match formation
    /// changes are suggested.
    pub fn is_attacking(&self) -> bool {
        matches!(self, Formation::F433 | Formation::F343)
    }

    pub fn is_defensive(&self) -> bool {
        matches!(self, Formation::F532 | Formation::F451)
    }
}

/// In-possession play style configured per team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayStyle {
    #[default]
    Possession,
    Counter,
    Direct,
    Wing,
    Pressing,
}

/// Out-of-possession shape configured per team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefensiveStyle {
    HighPress,
    #[default]
    MidBlock,
    LowBlock,
    Marking,
}

/// How the team prefers to move the ball.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PassingStyle {
    Short,
    #[default]
    Mixed,
    Direct,
    Long,
}

/// Coach-configured tactical dials. All numeric dials are 1..=10, 5 neutral.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TacticalConfig {
    #[serde(default)]
    pub style: PlayStyle,
    #[serde(default)]
    pub defensive_style: DefensiveStyle,
    #[serde(default = "default_dial")]
    pub pressing_intensity: u8,
    #[serde(default = "default_dial")]
    pub line_height: u8,
    #[serde(default = "default_dial")]
    pub width: u8,
    #[serde(default = "default_dial")]
    pub tempo: u8,
    #[serde(default)]
    pub passing_style: PassingStyle,
}

fn default_dial() -> u8 {
    5
}

impl Default for TacticalConfig {
    fn default() -> Self {
        Self {
            style: PlayStyle::default(),
            defensive_style: DefensiveStyle::default(),
            pressing_intensity: 5,
            line_height: 5,
            width: 5,
            tempo: 5,
            passing_style: PassingStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub formation: Formation,
    #[serde(default)]
    pub tactics: TacticalConfig,
    /// Starting eleven, goalkeeper included.
    pub players: Vec<Player>,
    /// Bench, any length. Substitutes enter through the substitution API.
    #[serde(default)]
    pub bench: Vec<Player>,
}

impl Team {
    /// Roster-shape validation. Violations are fatal at initialization and
    /// must prevent match start.
    pub fn validate(&self) -> Result<()> {
        if self.players.len() != 11 {
            return Err(MatchError::InvalidTeamSize { expected: 11, found: self.players.len() });
        }

        let gk_count = self.players.iter().filter(|p| p.role.is_goalkeeper()).count();
        if gk_count == 0 {
            return Err(MatchError::MissingGoalkeeper(self.name.clone()));
        }
        if gk_count > 1 {
            return Err(MatchError::ValidationError(format!(
                "Team {} fields {} goalkeepers, exactly one allowed",
                self.name, gk_count
            )));
        }

        let outfield = self.players.iter().filter(|p| !p.role.is_goalkeeper()).count();
        if outfield != 10 {
            return Err(MatchError::ValidationError(format!(
                "Team {} outfield count is {}, expected 10",
                self.name, outfield
            )));
        }

        let (def_needed, mid_needed, fwd_needed) = self.formation.role_counts();
        let defenders = self.players.iter().filter(|p| p.role.is_defender()).count() as u8;
        let midfielders = self.players.iter().filter(|p| p.role.is_midfielder()).count() as u8;
        let forwards = self.players.iter().filter(|p| p.role.is_forward()).count() as u8;

        if defenders != def_needed {
            return Err(MatchError::InvalidRoleCount {
                role: Role::DEF.display_name().to_string(),
                expected: def_needed,
                found: defenders,
            });
        }
        if midfielders != mid_needed {
            return Err(MatchError::InvalidRoleCount {
                role: Role::MID.display_name().to_string(),
                expected: mid_needed,
                found: midfielders,
            });
        }
        if forwards != fwd_needed {
            return Err(MatchError::InvalidRoleCount {
                role: Role::FWD.display_name().to_string(),
                expected: fwd_needed,
                found: forwards,
            });
        }

        Ok(())
    }

    pub fn goalkeeper(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.role.is_goalkeeper())
    }
}
