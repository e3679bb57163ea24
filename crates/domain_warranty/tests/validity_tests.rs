//! Property tests for the validity window and plate normalisation

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use domain_warranty::{normalize_plate, ValidityWindow};

fn purchase_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

// ============================================================================
// Validity window
// ============================================================================

mod window_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_expiry_is_after_purchase(purchase in purchase_date_strategy(), months in 1u32..36, days in 1u32..400) {
            let by_months = ValidityWindow::Months(months).expiry_for(purchase).unwrap();
            let by_days = ValidityWindow::Days(days).expiry_for(purchase).unwrap();
            prop_assert!(by_months > purchase);
            prop_assert_eq!((by_days - purchase).num_days(), i64::from(days));
        }

        #[test]
        fn prop_month_window_keeps_day_of_month_when_possible(purchase in purchase_date_strategy(), months in 1u32..36) {
            // Day 1..=28 exists in every month
            let expiry = ValidityWindow::Months(months).expiry_for(purchase).unwrap();
            prop_assert_eq!(expiry.day(), purchase.day());
        }

        #[test]
        fn prop_display_parses_back(months in 1u32..120, days in 1u32..1000) {
            for window in [ValidityWindow::Months(months), ValidityWindow::Days(days)] {
                let parsed: ValidityWindow = window.to_string().parse().unwrap();
                prop_assert_eq!(parsed, window);
            }
        }
    }

    #[test]
    fn test_default_is_six_months() {
        assert_eq!(ValidityWindow::default(), ValidityWindow::Months(6));
    }
}

// ============================================================================
// Plate normalisation
// ============================================================================

mod plate_tests {
    use super::*;

    #[test]
    fn test_normalises_spacing_and_case() {
        assert_eq!(normalize_plate(" wxy 1234 "), "WXY1234");
        assert_eq!(normalize_plate("ABC123"), "ABC123");
    }

    proptest! {
        #[test]
        fn prop_normalisation_is_idempotent(raw in "[a-zA-Z0-9 ]{0,12}") {
            let once = normalize_plate(&raw);
            prop_assert_eq!(normalize_plate(&once), once.clone());
            prop_assert!(!once.contains(' '));
        }
    }
}
