pub mod events;
pub mod player;
pub mod team;

pub use events::{EventType, MatchEvent};
pub use player::{Attribute, Player, PlayerAttributes, Role};
pub use team::{DefensiveStyle, Formation, PassingStyle, PlayStyle, TacticalConfig, Team, TeamSide};
