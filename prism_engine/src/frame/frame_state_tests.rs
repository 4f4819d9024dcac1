use super::*;
use super::FrameState::*;

const ALL: [FrameState; 6] = [Idle, Acquiring, Recording, Submitted, Presenting, Resizing];

#[test]
fn test_nominal_cycle_is_legal() {
    let mut state = Idle;
    for next in [Acquiring, Recording, Submitted, Presenting, Idle] {
        state = state.transition(next).unwrap();
    }
    assert_eq!(state, Idle);
}

#[test]
fn test_resizing_reachable_from_every_state() {
    for state in ALL {
        assert!(state.can_transition_to(Resizing), "{} -> Resizing", state);
    }
    assert_eq!(Resizing.transition(Idle).unwrap(), Idle);
}

#[test]
fn test_recording_before_fence_wait_is_illegal() {
    let err = Idle.transition(Recording).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[test]
fn test_illegal_transitions() {
    assert!(Acquiring.transition(Acquiring).is_err());
    assert!(Recording.transition(Presenting).is_err());
    assert!(Submitted.transition(Idle).is_err());
    assert!(Resizing.transition(Acquiring).is_err());
    assert!(Idle.transition(Idle).is_err());
}

#[test]
fn test_exactly_the_expected_transitions_are_legal() {
    let legal = ALL
        .iter()
        .flat_map(|a| ALL.iter().map(move |b| (*a, *b)))
        .filter(|(a, b)| a.can_transition_to(*b))
        .count();
    // 6 into Resizing + 5 forward edges + Resizing -> Idle
    assert_eq!(legal, 12);
}
