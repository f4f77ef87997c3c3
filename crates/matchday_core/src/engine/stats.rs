//! Aggregate match statistics, accumulated by the orchestrator.

use serde::{Deserialize, Serialize};

use crate::models::TeamSide;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamStats {
    pub possession_secs: f32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub passes: u32,
    pub fouls: u32,
    pub corners: u32,
    pub offsides: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchStats {
    pub home: TeamStats,
    pub away: TeamStats,
}

impl MatchStats {
    pub fn team(&self, side: TeamSide) -> &TeamStats {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut TeamStats {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn add_possession(&mut self, side: TeamSide, secs: f32) {
        self.team_mut(side).possession_secs += secs;
    }

    /// Possession split in percent; (50, 50) before any possession exists.
    pub fn possession_percent(&self) -> (u8, u8) {
        let total = self.home.possession_secs + self.away.possession_secs;
        if total <= 0.0 {
            return (50, 50);
        }
        let home = ((self.home.possession_secs / total) * 100.0).round() as u8;
        (home, 100 - home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn possession_percent_splits() {
        let mut stats = MatchStats::default();
        stats.add_possession(TeamSide::Home, 90.0);
        stats.add_possession(TeamSide::Away, 30.0);
        assert_eq!(stats.possession_percent(), (75, 25));
    }

    #[test]
    fn empty_possession_is_even() {
        assert_eq!(MatchStats::default().possession_percent(), (50, 50));
    }

    #[test]
    fn team_accessors_route_by_side() {
        let mut stats = MatchStats::default();
        stats.team_mut(TeamSide::Away).shots += 3;
        assert_eq!(stats.team(TeamSide::Away).shots, 3);
        assert_eq!(stats.team(TeamSide::Home).shots, 0);
    }
}
