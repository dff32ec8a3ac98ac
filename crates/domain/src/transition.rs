//! The pure state transition applied to every accepted turn.
//!
//! The provider's delta is a proposal from an untrusted source. This module
//! owns every invariant: sanity bounds, rule de-duplication, item
//! consumption, and win/loss detection all happen here regardless of what
//! the delta contains.

use crate::value_objects::run_state::{SANITY_MAX, SANITY_MIN};
use crate::value_objects::{NarrativeDelta, RunState};

/// Narrative markers that signal the discovery of a written rule list.
///
/// When the delta narrative contains one of these, up to two proposed rules
/// are accepted for the turn instead of the usual one.
pub const BULK_DISCOVERY_MARKERS: [&str; 4] = ["rulebook", "notice", "手册", "守则"];

/// Maximum rules accepted on an ordinary turn.
const MAX_RULES_PER_TURN: usize = 1;
/// Maximum rules accepted on a bulk-discovery turn.
const MAX_RULES_BULK: usize = 2;

/// Compute the next authoritative state from the previous state and the
/// provider's delta. Pure and total: any delta produces a valid state.
pub fn apply_delta(prev: &RunState, delta: &NarrativeDelta) -> RunState {
    // Saturating: the delta is untrusted and may carry absurd magnitudes.
    let sanity = prev
        .sanity
        .saturating_add(delta.sanity_change)
        .clamp(SANITY_MIN, SANITY_MAX);

    let mut rules = prev.rules.clone();
    let budget = if is_bulk_discovery(&delta.narrative) {
        MAX_RULES_BULK
    } else {
        MAX_RULES_PER_TURN
    };
    let mut accepted = 0;
    for rule in &delta.new_rules {
        if accepted >= budget {
            break;
        }
        if rules.iter().any(|known| known == rule) {
            continue;
        }
        rules.push(rule.clone());
        accepted += 1;
    }

    let mut inventory = prev.inventory.clone();
    inventory.extend(delta.new_items.iter().cloned());
    if let Some(consumed) = &delta.consumed_item_id {
        if let Some(pos) = inventory.iter().position(|item| &item.id == consumed) {
            inventory.remove(pos);
        }
    }

    // Replace-or-retain: the provider may omit a field, but it can never
    // blank out an existing value.
    let location = match &delta.location {
        Some(location) if !location.is_empty() => location.clone(),
        _ => prev.location.clone(),
    };
    let narrative = if delta.narrative.is_empty() {
        prev.narrative.clone()
    } else {
        delta.narrative.clone()
    };
    let choices = if delta.choices.is_empty() {
        prev.choices.clone()
    } else {
        delta.choices.clone()
    };
    let image_prompt = delta.image_prompt.clone().or_else(|| prev.image_prompt.clone());

    let is_game_over = sanity <= SANITY_MIN || delta.is_game_over;
    let is_victory = delta.is_victory.unwrap_or(false);

    RunState {
        sanity,
        location,
        narrative,
        choices,
        image_prompt,
        rules,
        inventory,
        is_game_over,
        is_victory,
    }
}

fn is_bulk_discovery(narrative: &str) -> bool {
    let lowered = narrative.to_lowercase();
    BULK_DISCOVERY_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EvidenceItem, ItemKind};
    use crate::value_objects::RunConfig;

    fn initial() -> RunState {
        RunState::initial(&RunConfig::default())
    }

    fn delta() -> NarrativeDelta {
        NarrativeDelta {
            narrative: "The corridor stretches on.".to_string(),
            ..NarrativeDelta::default()
        }
    }

    fn item(id: &str) -> EvidenceItem {
        EvidenceItem {
            id: id.to_string(),
            name: format!("item {id}"),
            description: String::new(),
            kind: ItemKind::Other,
        }
    }

    #[test]
    fn sanity_drop_without_termination() {
        // initial sanity 100, change -35 => 65, no termination
        let next = apply_delta(
            &initial(),
            &NarrativeDelta {
                sanity_change: -35,
                ..delta()
            },
        );
        assert_eq!(next.sanity, 65);
        assert!(!next.is_game_over);
    }

    #[test]
    fn sanity_clamps_to_zero_and_forces_game_over() {
        // sanity 20, change -25 => clamps to 0 and forces game over even
        // though the provider said is_game_over = false
        let prev = RunState {
            sanity: 20,
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                sanity_change: -25,
                is_game_over: false,
                ..delta()
            },
        );
        assert_eq!(next.sanity, 0);
        assert!(next.is_game_over);
    }

    #[test]
    fn sanity_clamps_at_upper_bound() {
        let prev = RunState {
            sanity: 95,
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                sanity_change: 20,
                ..delta()
            },
        );
        assert_eq!(next.sanity, 100);
    }

    #[test]
    fn sanity_is_pure_function_of_delta_sequence() {
        let changes = [-10, 25, -40, -70, 15];
        let mut state = initial();
        let mut expected = 100i32;
        for change in changes {
            state = apply_delta(
                &state,
                &NarrativeDelta {
                    sanity_change: change,
                    ..delta()
                },
            );
            expected = (expected + change).clamp(0, 100);
            assert_eq!(state.sanity, expected);
            assert!((0..=100).contains(&state.sanity));
        }
    }

    #[test]
    fn duplicate_rule_is_dropped() {
        // two consecutive turns both propose "禁止回头" - only the first sticks
        let first = apply_delta(
            &initial(),
            &NarrativeDelta {
                new_rules: vec!["禁止回头".to_string()],
                ..delta()
            },
        );
        assert_eq!(first.rules, vec!["禁止回头".to_string()]);

        let second = apply_delta(
            &first,
            &NarrativeDelta {
                new_rules: vec!["禁止回头".to_string()],
                ..delta()
            },
        );
        assert_eq!(second.rules, vec!["禁止回头".to_string()]);
    }

    #[test]
    fn rules_never_shrink_and_preserve_order() {
        let mut state = initial();
        for rule in ["rule one", "rule two", "rule three"] {
            state = apply_delta(
                &state,
                &NarrativeDelta {
                    new_rules: vec![rule.to_string()],
                    ..delta()
                },
            );
        }
        assert_eq!(state.rules, vec!["rule one", "rule two", "rule three"]);

        // A delta with no rules leaves the list untouched.
        let state = apply_delta(&state, &delta());
        assert_eq!(state.rules.len(), 3);
    }

    #[test]
    fn one_rule_per_ordinary_turn() {
        let next = apply_delta(
            &initial(),
            &NarrativeDelta {
                new_rules: vec!["first".to_string(), "second".to_string()],
                ..delta()
            },
        );
        assert_eq!(next.rules, vec!["first".to_string()]);
    }

    #[test]
    fn bulk_discovery_accepts_two_rules() {
        let next = apply_delta(
            &initial(),
            &NarrativeDelta {
                narrative: "A yellowed rulebook lies open on the desk.".to_string(),
                new_rules: vec![
                    "first".to_string(),
                    "second".to_string(),
                    "third".to_string(),
                ],
                ..NarrativeDelta::default()
            },
        );
        assert_eq!(next.rules, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn bulk_discovery_matches_cjk_marker() {
        let next = apply_delta(
            &initial(),
            &NarrativeDelta {
                narrative: "墙上贴着一份员工守则。".to_string(),
                new_rules: vec!["a".to_string(), "b".to_string()],
                ..NarrativeDelta::default()
            },
        );
        assert_eq!(next.rules.len(), 2);
    }

    #[test]
    fn items_append_and_consume_by_id() {
        let with_items = apply_delta(
            &initial(),
            &NarrativeDelta {
                new_items: vec![item("key-1"), item("note-1")],
                ..delta()
            },
        );
        assert_eq!(with_items.inventory.len(), 2);

        let consumed = apply_delta(
            &with_items,
            &NarrativeDelta {
                consumed_item_id: Some("key-1".to_string()),
                ..delta()
            },
        );
        assert_eq!(consumed.inventory.len(), 1);
        assert_eq!(consumed.inventory[0].id, "note-1");
    }

    #[test]
    fn consuming_removes_only_first_match() {
        let prev = RunState {
            inventory: vec![item("dup"), item("dup")],
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                consumed_item_id: Some("dup".to_string()),
                ..delta()
            },
        );
        assert_eq!(next.inventory.len(), 1);
    }

    #[test]
    fn consuming_missing_item_is_noop() {
        let prev = RunState {
            inventory: vec![item("real")],
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                consumed_item_id: Some("ghost".to_string()),
                ..delta()
            },
        );
        assert_eq!(next.inventory.len(), 1);
    }

    #[test]
    fn provider_game_over_is_honored() {
        let next = apply_delta(
            &initial(),
            &NarrativeDelta {
                is_game_over: true,
                is_victory: Some(true),
                ..delta()
            },
        );
        assert!(next.is_game_over);
        assert!(next.is_victory);
    }

    #[test]
    fn victory_defaults_false_when_absent() {
        let next = apply_delta(&initial(), &delta());
        assert!(!next.is_victory);
    }

    #[test]
    fn missing_fields_retain_previous_values() {
        let prev = RunState {
            location: "ward 3".to_string(),
            narrative: "It is quiet.".to_string(),
            image_prompt: Some("dark hallway".to_string()),
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                narrative: String::new(),
                location: Some(String::new()),
                ..NarrativeDelta::default()
            },
        );
        assert_eq!(next.location, "ward 3");
        assert_eq!(next.narrative, "It is quiet.");
        assert_eq!(next.image_prompt, Some("dark hallway".to_string()));
    }

    #[test]
    fn provided_fields_replace_wholesale() {
        let prev = RunState {
            location: "ward 3".to_string(),
            ..initial()
        };
        let next = apply_delta(
            &prev,
            &NarrativeDelta {
                location: Some("basement".to_string()),
                image_prompt: Some("flooded stairs".to_string()),
                ..delta()
            },
        );
        assert_eq!(next.location, "basement");
        assert_eq!(next.image_prompt, Some("flooded stairs".to_string()));
    }
}
