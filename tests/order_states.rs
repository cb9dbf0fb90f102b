use axum_retail_api::models::{OrderState, UserType};

#[test]
fn states_advance_in_order() {
    use OrderState::*;
    let chain = [Basket, New, Confirmed, Assembled, Sent, Delivered];
    for pair in chain.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "{} -> {} should be allowed",
            pair[0].as_str(),
            pair[1].as_str()
        );
    }
}

#[test]
fn states_never_move_backwards_or_skip() {
    use OrderState::*;
    assert!(!New.can_transition_to(Basket));
    assert!(!Confirmed.can_transition_to(New));
    assert!(!Basket.can_transition_to(Confirmed));
    assert!(!New.can_transition_to(Sent));
    assert!(!Basket.can_transition_to(Delivered));
}

#[test]
fn cancel_is_reachable_until_delivery() {
    use OrderState::*;
    for state in [Basket, New, Confirmed, Assembled, Sent] {
        assert!(
            state.can_transition_to(Canceled),
            "{} should be cancelable",
            state.as_str()
        );
    }
    assert!(!Delivered.can_transition_to(Canceled));
}

#[test]
fn terminal_states_accept_nothing() {
    use OrderState::*;
    for next in [Basket, New, Confirmed, Assembled, Sent, Delivered, Canceled] {
        assert!(!Delivered.can_transition_to(next));
        assert!(!Canceled.can_transition_to(next));
    }
}

#[test]
fn state_names_round_trip() {
    use OrderState::*;
    for state in [Basket, New, Confirmed, Assembled, Sent, Delivered, Canceled] {
        assert_eq!(OrderState::parse(state.as_str()), Some(state));
    }
    assert_eq!(OrderState::parse("shipped"), None);
}

#[test]
fn user_types_parse_strictly() {
    assert_eq!(UserType::parse("shop"), Some(UserType::Shop));
    assert_eq!(UserType::parse("buyer"), Some(UserType::Buyer));
    assert_eq!(UserType::parse("admin"), None);
    assert_eq!(UserType::parse(""), None);
}
