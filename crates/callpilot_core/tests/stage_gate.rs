use callpilot_core::{GateEvent, StageGate, StageId};
use pretty_assertions::assert_eq;

fn navigable(gate: &StageGate) -> Vec<StageId> {
    StageId::ALL
        .into_iter()
        .filter(|&stage| gate.is_navigable_to(stage))
        .collect()
}

#[test]
fn initial_state_allows_only_the_first_stage() {
    let gate = StageGate::new();

    assert_eq!(navigable(&gate), vec![StageId::Email]);
    assert!(StageId::ALL.iter().all(|&stage| !gate.is_ready(stage)));
    assert_eq!(gate.active(), StageId::Email);
    assert!(gate.is_interactable(StageId::Email));
    assert!(!gate.is_interactable(StageId::Plan));
}

#[test]
fn email_readiness_is_what_opens_the_plan_tab() {
    let mut gate = StageGate::new();
    assert!(!gate.is_navigable_to(StageId::Plan));

    assert!(gate.mark_ready(StageId::Email));

    assert_eq!(navigable(&gate), vec![StageId::Email, StageId::Plan]);
}

#[test]
fn plan_ready_makes_recording_navigable_before_it_is_ready() {
    let mut gate = StageGate::new();
    gate.mark_ready(StageId::Email);
    gate.mark_ready(StageId::Plan);

    assert!(gate.is_navigable_to(StageId::Recording));
    assert!(!gate.is_ready(StageId::Recording));
    assert!(!gate.is_navigable_to(StageId::Emails));
}

#[test]
fn recording_unlocks_from_plan_even_if_email_flag_was_cleared() {
    let mut gate = StageGate::new();
    gate.mark_ready(StageId::Plan);

    assert!(gate.is_navigable_to(StageId::Recording));
    assert!(!gate.is_navigable_to(StageId::Plan));
}

#[test]
fn navigating_to_a_locked_stage_is_a_noop() {
    let mut gate = StageGate::new();

    assert!(!gate.navigate(StageId::Opportunity));
    assert_eq!(gate.active(), StageId::Email);
    assert_eq!(
        gate.take_events(),
        vec![GateEvent::NavigationRejected(StageId::Opportunity)]
    );
}

#[test]
fn enable_next_walks_the_fixed_order() {
    let mut gate = StageGate::new();
    let mut unlocked = Vec::new();
    let mut current = StageId::Email;
    while let Some(next) = gate.enable_next(current) {
        unlocked.push(next);
        current = next;
    }

    assert_eq!(
        unlocked,
        vec![
            StageId::Plan,
            StageId::Recording,
            StageId::Emails,
            StageId::Opportunity,
            StageId::Coaching,
        ]
    );
    assert_eq!(gate.enable_next(StageId::Coaching), None);
}

#[test]
fn mark_ready_emits_a_single_event() {
    let mut gate = StageGate::new();

    assert!(gate.mark_ready(StageId::Email));
    assert!(!gate.mark_ready(StageId::Email));
    assert_eq!(gate.take_events(), vec![GateEvent::Ready(StageId::Email)]);
}
