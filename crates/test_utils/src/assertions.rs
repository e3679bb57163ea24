//! Custom Test Assertions
//!
//! Assertion helpers for claims that print the whole claim on failure.

use rust_decimal::Decimal;

use domain_claims::{Claim, ClaimStatus};

/// Asserts the structural invariants of a stored claim
///
/// # Panics
///
/// Panics with the violated rule and the claim when any invariant fails
pub fn assert_claim_invariants(claim: &Claim) {
    if let Err(violation) = claim.check_invariants() {
        panic!("claim invariant violated: {}\n{:#?}", violation, claim);
    }
}

/// Asserts status and closure together
pub fn assert_claim_stage(claim: &Claim, status: ClaimStatus, closed: bool) {
    assert_eq!(
        (claim.status, claim.is_closed()),
        (status, closed),
        "unexpected stage for claim {}: {}",
        claim.id,
        claim.stage_label()
    );
    assert_claim_invariants(claim);
}

/// Asserts the settled total, comparing by value rather than scale
pub fn assert_total_cost(claim: &Claim, expected: Decimal) {
    assert_eq!(
        claim.total_cost.normalize(),
        expected.normalize(),
        "total cost mismatch for claim {}",
        claim.id
    );
}
