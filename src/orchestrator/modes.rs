//! Scheduling mode selection rules.

use rand::seq::SliceRandom;

/// `round-robin`: agents cycle in registration order. `cycle_position` is
/// the number of selections made so far (successful or not — a failing
/// agent's turn still advances the cycle).
pub fn select_round_robin(agent_count: usize, cycle_position: u64) -> usize {
    (cycle_position % agent_count as u64) as usize
}

/// `reactive`: pick uniformly at random among agents whose id differs from
/// `last_speaker`. Returns `None` if only one agent is registered, so the
/// caller can re-delay and try again.
pub fn select_reactive(agent_ids: &[String], last_speaker: Option<&str>) -> Option<usize> {
    if agent_ids.len() < 2 {
        return None;
    }
    let candidates: Vec<usize> = agent_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| Some(id.as_str()) != last_speaker)
        .map(|(i, _)| i)
        .collect();
    candidates.choose(&mut rand::thread_rng()).copied()
}

/// `free-form`: every agent whose most recent message isn't their own is
/// eligible this pass, in registration order.
pub fn select_free_form(agent_ids: &[String], last_speaker: Option<&str>) -> Vec<usize> {
    agent_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| Some(id.as_str()) != last_speaker)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_in_registration_order() {
        assert_eq!(select_round_robin(3, 0), 0);
        assert_eq!(select_round_robin(3, 1), 1);
        assert_eq!(select_round_robin(3, 2), 2);
        assert_eq!(select_round_robin(3, 3), 0);
    }

    #[test]
    fn reactive_returns_none_with_a_single_agent() {
        let ids = vec!["a".to_string()];
        assert_eq!(select_reactive(&ids, Some("a")), None);
    }

    #[test]
    fn reactive_never_repeats_the_last_speaker() {
        let ids = vec!["a".to_string(), "b".to_string()];
        for _ in 0..20 {
            let picked = select_reactive(&ids, Some("a")).unwrap();
            assert_eq!(ids[picked], "b");
        }
    }

    #[test]
    fn free_form_excludes_only_the_last_speaker() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let eligible = select_free_form(&ids, Some("b"));
        assert_eq!(eligible, vec![0, 2]);
    }

    #[test]
    fn free_form_includes_everyone_when_no_last_speaker() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let eligible = select_free_form(&ids, None);
        assert_eq!(eligible, vec![0, 1]);
    }
}
