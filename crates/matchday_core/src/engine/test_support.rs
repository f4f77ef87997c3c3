//! Shared roster builders for engine tests.

use crate::models::{Formation, Player, PlayerAttributes, Role, TacticalConfig, Team};

/// A valid 4-4-2 starting eleven with mildly varied ratings.
pub fn test_team(name: &str) -> Team {
    let mut players = vec![Player::new(format!("{} Keeper", name), 1, Role::GK)
        .with_attributes(PlayerAttributes::from_uniform(60))];
    let mut number = 2;
    for role in [
        Role::DEF,
        Role::DEF,
        Role::DEF,
        Role::DEF,
        Role::MID,
        Role::MID,
        Role::MID,
        Role::MID,
        Role::FWD,
        Role::FWD,
    ] {
        let rating = 55 + (number % 4) * 5;
        players.push(
            Player::new(format!("{} #{}", name, number), number, role)
                .with_attributes(PlayerAttributes::from_uniform(rating)),
        );
        number += 1;
    }

    Team {
        name: name.to_string(),
        formation: Formation::F442,
        tactics: TacticalConfig::default(),
        players,
        bench: Vec::new(),
    }
}

/// Same roster plus a five-man bench covering every zone.
pub fn test_team_with_bench(name: &str) -> Team {
    let mut team = test_team(name);
    team.bench = vec![
        Player::new(format!("{} Sub GK", name), 12, Role::GK)
            .with_attributes(PlayerAttributes::from_uniform(55)),
        Player::new(format!("{} Sub DEF", name), 13, Role::DEF)
            .with_attributes(PlayerAttributes::from_uniform(58)),
        Player::new(format!("{} Sub MID", name), 14, Role::MID)
            .with_attributes(PlayerAttributes::from_uniform(58)),
        Player::new(format!("{} Sub MID 2", name), 15, Role::MID)
            .with_attributes(PlayerAttributes::from_uniform(56)),
        Player::new(format!("{} Sub FWD", name), 16, Role::FWD)
            .with_attributes(PlayerAttributes::from_uniform(60)),
    ];
    team
}
