//! Router totality and determinism over randomized input.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use concierge::routing::route;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 26)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Any message routes to exactly one skill without panicking.
    #[test]
    fn router_is_total(input in ".{0,200}") {
        let decision = route(&input, now());
        prop_assert!(decision.confidence > 0.0);
        prop_assert!(decision.confidence <= 1.0);
    }

    /// The same message always routes the same way.
    #[test]
    fn router_is_deterministic(input in ".{0,200}") {
        prop_assert_eq!(route(&input, now()), route(&input, now()));
    }
}

#[test]
fn empty_message_routes_to_general_chat() {
    let decision = route("", now());
    assert_eq!(decision.skill, concierge::routing::Skill::GeneralChat);
}
