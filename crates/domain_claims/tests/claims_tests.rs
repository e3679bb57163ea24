//! Tests for the claim state machine and settlement rules

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, ShopId, WarrantyId};
use domain_claims::{
    Claim, ClaimError, ClaimQueue, ClaimStatus, NewClaim, Settlement, StatusChange, TransitionTarget,
    TyreLineItem, MAX_TYRES_PER_CLAIM,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

fn new_claim() -> Claim {
    NewClaim {
        id: ClaimId::new_v7(),
        warranty_id: Some(WarrantyId::new_v7()),
        shop_id: ShopId::new_v7(),
        status: ClaimStatus::Unacknowledged,
        customer_name: "Siti Aminah".to_string(),
        phone_number: "019-8765432".to_string(),
        email: None,
        car_plate: "ABC123".to_string(),
        created_at: at(8),
    }
    .into_claim()
}

fn tyre(cost: Decimal) -> TyreLineItem {
    TyreLineItem {
        brand: "Continental".to_string(),
        size: "225/45R17".to_string(),
        cost,
    }
}

fn change_for(claim: &Claim, target: TransitionTarget) -> Option<StatusChange> {
    let now = at(10);
    match target {
        TransitionTarget::Pending => Some(StatusChange::Acknowledge { at: now }),
        TransitionTarget::Approved => {
            let (tyres, total_cost) = Settlement::new(vec![tyre(dec!(150.00))])
                .unwrap()
                .into_details(claim.id, now);
            Some(StatusChange::Approve { tyres, total_cost, at: now })
        }
        TransitionTarget::Rejected => Some(StatusChange::Reject {
            reason: "sidewall damage from kerb".to_string(),
            at: now,
        }),
        TransitionTarget::Closed => Some(StatusChange::Close { at: now }),
        TransitionTarget::Unacknowledged => None,
    }
}

/// Drives a fresh claim into the requested stage through valid moves only
fn claim_in(status: ClaimStatus, closed: bool) -> Claim {
    let mut claim = new_claim();
    let path: &[TransitionTarget] = match status {
        ClaimStatus::Unacknowledged => &[],
        ClaimStatus::Pending => &[TransitionTarget::Pending],
        ClaimStatus::Approved => &[TransitionTarget::Pending, TransitionTarget::Approved],
        ClaimStatus::Rejected => &[TransitionTarget::Pending, TransitionTarget::Rejected],
    };
    for target in path {
        let change = change_for(&claim, *target).unwrap();
        claim.apply(&change).unwrap();
    }
    if closed && status.is_settled() {
        claim.apply(&StatusChange::Close { at: at(11) }).unwrap();
    }
    claim
}

fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop::sample::select(ClaimStatus::ALL.to_vec())
}

fn target_strategy() -> impl Strategy<Value = TransitionTarget> {
    prop::sample::select(TransitionTarget::ALL.to_vec())
}

// ============================================================================
// Transition table
// ============================================================================

mod transition_tests {
    use super::*;

    const TABLE: [(ClaimStatus, bool, TransitionTarget); 5] = [
        (ClaimStatus::Unacknowledged, false, TransitionTarget::Pending),
        (ClaimStatus::Pending, false, TransitionTarget::Approved),
        (ClaimStatus::Pending, false, TransitionTarget::Rejected),
        (ClaimStatus::Approved, false, TransitionTarget::Closed),
        (ClaimStatus::Rejected, false, TransitionTarget::Closed),
    ];

    fn in_table(status: ClaimStatus, closed: bool, target: TransitionTarget) -> bool {
        let closed = closed && status.is_settled();
        TABLE.contains(&(status, closed, target))
    }

    proptest! {
        #[test]
        fn prop_table_is_total(status in status_strategy(), closed in any::<bool>(), target in target_strategy()) {
            let mut claim = claim_in(status, closed);
            let before = claim.clone();
            let result = claim.ensure_can_transition(target);

            if in_table(status, claim.is_closed(), target) {
                prop_assert!(result.is_ok());
                let change = change_for(&claim, target).unwrap();
                claim.apply(&change).unwrap();
                prop_assert!(claim.check_invariants().is_ok());
            } else {
                let closing_twice = target == TransitionTarget::Closed && claim.is_closed();
                match result {
                    Err(ClaimError::Conflict(_)) => prop_assert!(closing_twice),
                    Err(ClaimError::InvalidTransition { to, .. }) => {
                        prop_assert!(!closing_twice);
                        prop_assert_eq!(to, target.to_string());
                    }
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
                if let Some(change) = change_for(&claim, target) {
                    prop_assert!(claim.apply(&change).is_err());
                }
                prop_assert_eq!(claim, before);
            }
        }

        #[test]
        fn prop_rejection_reason_iff_rejected(status in status_strategy(), closed in any::<bool>()) {
            let claim = claim_in(status, closed);
            prop_assert_eq!(claim.rejection_reason.is_some(), claim.status == ClaimStatus::Rejected);
            prop_assert!(claim.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_unacknowledged_target_is_never_allowed() {
        for status in ClaimStatus::ALL {
            for closed in [false, true] {
                assert!(!status.can_transition_to(closed, TransitionTarget::Unacknowledged));
            }
        }
    }

    #[test]
    fn test_invalid_transition_lists_next_steps() {
        let claim = claim_in(ClaimStatus::Pending, false);
        match claim.ensure_can_transition(TransitionTarget::Closed) {
            Err(ClaimError::InvalidTransition { from, allowed, .. }) => {
                assert_eq!(from, "pending");
                assert_eq!(allowed, vec!["approved".to_string(), "rejected".to_string()]);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        let closed = claim_in(ClaimStatus::Approved, true);
        assert_eq!(closed.stage_label(), "approved (closed)");
        assert!(closed.allowed_targets().is_empty());
    }

    #[test]
    fn test_target_and_queue_parsing() {
        assert_eq!("closed".parse::<TransitionTarget>().unwrap(), TransitionTarget::Closed);
        assert!("accepted".parse::<TransitionTarget>().is_err());

        assert_eq!(
            "history".parse::<ClaimQueue>().unwrap().statuses(),
            &[ClaimStatus::Approved, ClaimStatus::Rejected]
        );
        assert!("closed".parse::<ClaimQueue>().is_err());
    }

    #[test]
    fn test_check_invariants_catches_inconsistent_rows() {
        let mut claim = claim_in(ClaimStatus::Pending, false);
        claim.rejection_reason = Some("stale".to_string());
        assert!(claim.check_invariants().is_err());

        let mut claim = claim_in(ClaimStatus::Approved, false);
        claim.total_cost = dec!(1);
        assert!(claim.check_invariants().is_err());
    }
}

// ============================================================================
// Settlement
// ============================================================================

mod settlement_tests {
    use super::*;

    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_costs(costs in prop::collection::vec(cost_strategy(), 1..=MAX_TYRES_PER_CLAIM)) {
            let expected: Decimal = costs.iter().copied().sum();
            let settlement = Settlement::new(costs.into_iter().map(tyre).collect()).unwrap();
            prop_assert_eq!(settlement.total_cost(), expected);
        }

        #[test]
        fn prop_too_many_tyres_rejected(extra in 1usize..6) {
            let items = (0..MAX_TYRES_PER_CLAIM + extra).map(|_| tyre(dec!(10))).collect();
            let is_validation = matches!(Settlement::new(items), Err(ClaimError::Validation(_)));
            prop_assert!(is_validation);
        }
    }

    #[test]
    fn test_approved_claim_serializes_tyres() {
        let claim = claim_in(ClaimStatus::Approved, false);
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["tyre_details"].as_array().unwrap().len(), 1);
        assert_eq!(json["total_cost"], "150.00");
    }
}
