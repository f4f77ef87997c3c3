use std::fmt;

#[derive(Debug)]
pub enum MatchError {
    InvalidFormation(String),
    InvalidTeamSize { expected: usize, found: usize },
    MissingGoalkeeper(String),
    InvalidRoleCount { role: String, expected: u8, found: u8 },
    ValidationError(String),
    SerializationError(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchError::InvalidFormation(formation) => {
                write!(f, "Invalid formation: {}", formation)
            }
            MatchError::InvalidTeamSize { expected, found } => {
                write!(f, "Invalid team size: expected {}, found {}", expected, found)
            }
            MatchError::MissingGoalkeeper(team) => {
                write!(f, "Team {} has no designated goalkeeper", team)
            }
            MatchError::InvalidRoleCount { role, expected, found } => {
                write!(f, "Invalid {} count: expected {}, found {}", role, expected, found)
            }
            MatchError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
            MatchError::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchError {}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        MatchError::SerializationError(err.to_string())
    }
}

/// Controller-command errors. These never abort a running match loop; they
/// are returned to the host that issued the command.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Match not initialized")]
    NotInitialized,

    #[error("Invalid speed multiplier: {0} (allowed 0.1..=4.0)")]
    InvalidSpeed(f32),

    #[error("Command not valid in phase {0}")]
    WrongPhase(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
