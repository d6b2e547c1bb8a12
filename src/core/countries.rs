//! Tax country codes of the EU VAT area.
//!
//! NAV distinguishes customers with a community VAT number (EU member states,
//! including Northern Ireland under the protocol) from third-state customers.

/// Check whether `code` is a tax country of the EU VAT area.
///
/// Tax country codes follow the VIES convention, so Greece is `EL`; the ISO
/// code `GR` is accepted as well.
pub fn is_eu_tax_country(code: &str) -> bool {
    code == "GR" || EU_TAX_COUNTRIES.binary_search(&code).is_ok()
}

/// Sorted for binary search.
static EU_TAX_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "HR", "HU", "IE", "IT",
    "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "XI",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_states() {
        assert!(is_eu_tax_country("DE"));
        assert!(is_eu_tax_country("AT"));
        assert!(is_eu_tax_country("HU"));
        assert!(is_eu_tax_country("EL"));
        assert!(is_eu_tax_country("GR"));
        assert!(is_eu_tax_country("XI"));
    }

    #[test]
    fn third_states() {
        assert!(!is_eu_tax_country("US"));
        assert!(!is_eu_tax_country("CH"));
        assert!(!is_eu_tax_country("GB"));
        assert!(!is_eu_tax_country("NO"));
        assert!(!is_eu_tax_country(""));
        assert!(!is_eu_tax_country("de"));
    }

    #[test]
    fn list_is_sorted() {
        for window in EU_TAX_COUNTRIES.windows(2) {
            assert!(
                window[0] < window[1],
                "country codes not sorted: {} >= {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn list_count() {
        assert_eq!(EU_TAX_COUNTRIES.len(), 28);
    }
}
