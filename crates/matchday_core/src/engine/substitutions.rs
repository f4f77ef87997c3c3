//! Player substitutions: the host-facing request API, fatigue-based
//! automatic swaps, and forced injury replacements.
//!
//! Mid-match "not found" conditions surface as a structured outcome, never
//! as a fault; the match loop keeps running regardless.

use serde::{Deserialize, Serialize};

use super::orchestrator::MatchEngine;
use super::positioning;
use crate::models::{EventType, Role, TeamSide};

/// Fatigue above which a player becomes an automatic-substitution
/// candidate.
const AUTO_SUB_FATIGUE: f32 = 0.75;
/// Simulated seconds between automatic sweeps.
pub(crate) const SWEEP_INTERVAL: f32 = 60.0;

/// Result of a substitution request. `success` is false for any "not
/// found" or budget condition; the message explains which.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubstitutionOutcome {
    pub success: bool,
    pub message: String,
}

impl SubstitutionOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

fn same_zone(a: Role, b: Role) -> bool {
    a == b
        || (a.is_defender() && b.is_defender())
        || (a.is_midfielder() && b.is_midfielder())
        || (a.is_forward() && b.is_forward())
}

impl MatchEngine {
    /// Host-requested substitution by squad numbers. Requesting the same
    /// swap twice succeeds once; the second attempt fails because the
    /// player is no longer on the field.
    pub fn request_substitution(
        &mut self,
        side: TeamSide,
        off_number: u8,
        on_number: u8,
    ) -> SubstitutionOutcome {
        let unit = self.unit(side);

        let Some(slot_idx) = unit
            .entities
            .iter()
            .position(|e| e.player.squad_number == off_number)
        else {
            return SubstitutionOutcome::fail(format!(
                "Player #{} not found on field",
                off_number
            ));
        };

        if unit.entities[slot_idx].sent_off {
            return SubstitutionOutcome::fail(format!(
                "Player #{} was sent off and cannot be replaced",
                off_number
            ));
        }

        let Some(bench_idx) =
            unit.bench.iter().position(|p| p.squad_number == on_number)
        else {
            return SubstitutionOutcome::fail(format!("Player #{} not found on bench", on_number));
        };

        if unit.subs_remaining == 0 {
            return SubstitutionOutcome::fail("No substitutions remaining");
        }

        let (in_name, out_name) = self.execute_substitution(side, slot_idx, bench_idx);
        SubstitutionOutcome::ok(format!("{} replaces {}", in_name, out_name))
    }

    /// Roster swap for one pitch slot: the bench player takes over the
    /// slot (and its entity id); the outgoing roster record joins the
    /// bench. Returns (incoming, outgoing) names.
    pub(crate) fn execute_substitution(
        &mut self,
        side: TeamSide,
        slot_idx: usize,
        bench_idx: usize,
    ) -> (String, String) {
        let spawn = {
            let unit = self.unit(side);
            positioning::oriented(unit.slots[slot_idx], side)
        };

        let (entity_id, in_name, out_name) = {
            let unit = self.unit_mut(side);
            let incoming = unit.bench.remove(bench_idx);
            let entity = &mut unit.entities[slot_idx];
            let outgoing = entity.player.clone();
            let in_name = incoming.name.clone();
            let out_name = outgoing.name.clone();
            entity.reset_for_substitute(incoming, spawn);
            unit.bench.push(outgoing);
            unit.subs_remaining = unit.subs_remaining.saturating_sub(1);
            (entity.id, in_name, out_name)
        };

        if self.ball.possessor == Some(entity_id) {
            self.drop_possession();
        }
        self.physics.set_position(entity_id, spawn);
        self.counted_events_in_half += 1;

        log::debug!("{:?}: {} on for {}", side, in_name, out_name);
        let message = format!("Substitution: {} on for {}", in_name, out_name);
        let event = self
            .event(EventType::Substitution, message)
            .with_team(side)
            .with_player(entity_id);
        self.emit(event);

        (in_name, out_name)
    }

    /// Fatigue sweep, run once per simulated minute: the most tired
    /// outfielder above the threshold comes off for a same-zone bench
    /// player while the budget lasts.
    pub(crate) fn sweep_substitutions(&mut self) {
        if self.clock.game_time < self.next_sub_sweep {
            return;
        }
        self.next_sub_sweep = self.clock.game_time + SWEEP_INTERVAL;

        for side in [TeamSide::Home, TeamSide::Away] {
            if self.unit(side).subs_remaining == 0 {
                continue;
            }
            if let Some((slot_idx, bench_idx)) = self.find_substitution_candidate(side) {
                self.execute_substitution(side, slot_idx, bench_idx);
            }
        }
    }

    /// The most fatigued replaceable outfielder past the threshold, paired
    /// with a bench player, preferring the same zone.
    pub(crate) fn find_substitution_candidate(&self, side: TeamSide) -> Option<(usize, usize)> {
        let unit = self.unit(side);

        let mut most_tired: Option<usize> = None;
        let mut max_fatigue = AUTO_SUB_FATIGUE;
        for (i, e) in unit.entities.iter().enumerate() {
            if e.player.role.is_goalkeeper() || e.sent_off || e.injured {
                continue;
            }
            if e.fatigue > max_fatigue {
                max_fatigue = e.fatigue;
                most_tired = Some(i);
            }
        }
        let slot_idx = most_tired?;

        self.bench_candidate(side, unit.entities[slot_idx].player.role)
            .map(|bench_idx| (slot_idx, bench_idx))
    }

    /// Same-zone bench player if one exists, otherwise the first bench
    /// player, otherwise `None`.
    pub(crate) fn bench_candidate(&self, side: TeamSide, role: Role) -> Option<usize> {
        let bench = &self.unit(side).bench;
        bench
            .iter()
            .position(|p| same_zone(p.role, role))
            .or_else(|| if bench.is_empty() { None } else { Some(0) })
    }

    /// Injury replacement. With no budget or bench left the team simply
    /// plays short.
    pub(crate) fn force_injury_substitution(&mut self, injured_id: u32, side: TeamSide) {
        if self.unit(side).subs_remaining == 0 {
            return;
        }
        let Some(slot_idx) = self
            .unit(side)
            .entities
            .iter()
            .position(|e| e.id == injured_id)
        else {
            return;
        };
        let role = self.unit(side).entities[slot_idx].player.role;
        if let Some(bench_idx) = self.bench_candidate(side, role) {
            self.execute_substitution(side, slot_idx, bench_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::orchestrator::MatchConfig;
    use crate::engine::test_support::{test_team, test_team_with_bench};

    fn engine() -> MatchEngine {
        MatchEngine::new(
            test_team_with_bench("Home United"),
            test_team_with_bench("Away Town"),
            MatchConfig { seed: 4, ..Default::default() },
        )
        .expect("valid rosters")
    }

    #[test]
    fn substitution_succeeds_once_then_not_found() {
        let mut e = engine();
        e.start();

        let off = e.home.entities[5].player.squad_number;
        let on = e.home.bench[0].squad_number;

        let first = e.request_substitution(TeamSide::Home, off, on);
        assert!(first.success, "{}", first.message);

        let second = e.request_substitution(TeamSide::Home, off, on);
        assert!(!second.success);
        assert!(second.message.contains("not found on field"), "{}", second.message);
    }

    #[test]
    fn substitution_swaps_rosters_and_resets_slot() {
        let mut e = engine();
        e.start();
        e.home.entities[5].fatigue = 0.9;

        let off = e.home.entities[5].player.squad_number;
        let off_name = e.home.entities[5].player.name.clone();
        let on = e.home.bench[0].squad_number;
        let on_name = e.home.bench[0].name.clone();

        let outcome = e.request_substitution(TeamSide::Home, off, on);
        assert!(outcome.success);
        assert_eq!(e.home.entities[5].player.name, on_name);
        assert_eq!(e.home.entities[5].fatigue, 0.0);
        assert!(e.home.bench.iter().any(|p| p.name == off_name));
        assert_eq!(e.home.subs_remaining, 4);
        assert!(e.events.iter().any(|ev| ev.event_type == EventType::Substitution));
    }

    #[test]
    fn unknown_bench_player_fails_softly() {
        let mut e = engine();
        e.start();
        let off = e.home.entities[5].player.squad_number;
        let outcome = e.request_substitution(TeamSide::Home, off, 99);
        assert!(!outcome.success);
        assert!(outcome.message.contains("bench"));
    }

    #[test]
    fn sent_off_player_cannot_be_replaced() {
        let mut e = engine();
        e.start();
        e.home.entities[5].sent_off = true;
        let off = e.home.entities[5].player.squad_number;
        let on = e.home.bench[0].squad_number;
        let outcome = e.request_substitution(TeamSide::Home, off, on);
        assert!(!outcome.success);
        assert!(outcome.message.contains("sent off"));
    }

    #[test]
    fn exhausted_budget_fails_softly() {
        let mut e = engine();
        e.start();
        e.home.subs_remaining = 0;
        let off = e.home.entities[5].player.squad_number;
        let on = e.home.bench[0].squad_number;
        let outcome = e.request_substitution(TeamSide::Home, off, on);
        assert!(!outcome.success);
        assert!(outcome.message.contains("remaining"));
    }

    #[test]
    fn auto_sweep_replaces_exhausted_player() {
        let mut e = engine();
        e.start();
        e.home.entities[7].fatigue = 0.95;
        e.clock.game_time = 61.0;
        e.sweep_substitutions();
        assert_eq!(e.home.subs_remaining, 4);
        assert_eq!(e.home.entities[7].fatigue, 0.0, "fresh legs in the slot");
    }

    #[test]
    fn fresh_team_triggers_no_auto_subs() {
        let mut e = engine();
        e.start();
        e.clock.game_time = 61.0;
        e.sweep_substitutions();
        assert_eq!(e.home.subs_remaining, 5);
        assert_eq!(e.away.subs_remaining, 5);
    }

    #[test]
    fn injury_with_empty_bench_plays_short() {
        let mut e = MatchEngine::new(
            test_team("Home United"),
            test_team("Away Town"),
            MatchConfig { seed: 4, ..Default::default() },
        )
        .expect("valid rosters");
        e.start();
        let id = e.home.entities[6].id;
        e.flag_injury(id, TeamSide::Home);
        assert!(e.home.entities[6].injured);
        assert!(!e.home.entities[6].is_active());
        assert_eq!(e.injuries.len(), 1);
    }

    #[test]
    fn injury_with_bench_forces_replacement() {
        let mut e = engine();
        e.start();
        let id = e.home.entities[6].id;
        let hurt_name = e.home.entities[6].player.name.clone();
        e.flag_injury(id, TeamSide::Home);

        // The slot was re-occupied by a substitute and plays on.
        assert!(!e.home.entities[6].injured);
        assert!(e.home.entities[6].is_active());
        assert_eq!(e.injuries[0].player_name, hurt_name);
        assert_eq!(e.home.subs_remaining, 4);
    }
}
