use proptest::prelude::*;

use cellar_wms::services::picking::{case_barcode_matches, MIN_FALLBACK_SCAN_LEN};

proptest! {
    /// Scanning a product's own code always verifies, no matter how the
    /// label mangles case, hyphens or surrounding whitespace.
    #[test]
    fn own_code_always_matches(code in "[A-Za-z0-9]{4,16}") {
        prop_assert!(case_barcode_matches(&code, &code));
        prop_assert!(case_barcode_matches(&code.to_lowercase(), &code));
        let padded = format!("  {}  ", code);
        prop_assert!(case_barcode_matches(&padded, &code));

        let hyphenated: String = code
            .chars()
            .flat_map(|c| [c, '-'])
            .collect();
        prop_assert!(case_barcode_matches(&hyphenated, &code));
    }

    /// Any scan with enough significant characters passes the fallback,
    /// so mislabelled cases never block a pick outright.
    #[test]
    fn long_scans_pass_the_fallback(scan in "[A-Z0-9]{6,24}", code in "[A-Z0-9]{4,16}") {
        prop_assert!(case_barcode_matches(&scan, &code));
    }

    /// Short scans must be a genuine fragment of the code or be rejected.
    #[test]
    fn short_scans_need_a_real_fragment(scan in "[a-z]{1,5}", code in "[0-9]{8,12}") {
        prop_assume!(scan.to_uppercase().len() < MIN_FALLBACK_SCAN_LEN);
        // Letters cannot be a fragment of a digit-only code.
        prop_assert!(!case_barcode_matches(&scan, &code));
    }

    /// Hyphens and whitespace carry no information.
    #[test]
    fn separators_are_ignored(scan in "[A-Z0-9]{6,12}") {
        let noisy: String = scan.chars().flat_map(|c| [' ', c, '-']).collect();
        prop_assert_eq!(
            case_barcode_matches(&noisy, "LWIN1234567"),
            case_barcode_matches(&scan, "LWIN1234567")
        );
    }
}
