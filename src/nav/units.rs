//! GOBL unit keys with a NAV `unitOfMeasure` counterpart.

/// (GOBL unit, NAV unit), sorted by GOBL unit for binary search.
const UNITS: &[(&str, &str)] = &[
    ("carton", "CARTON"),
    ("day", "DAY"),
    ("h", "HOUR"),
    ("kWh", "KWH"),
    ("kg", "KILOGRAM"),
    ("km", "KILOMETER"),
    ("l", "LITRE"),
    ("m", "METER"),
    ("m3", "CUBIC_METER"),
    ("min", "MINUTE"),
    ("mon", "MONTH"),
    ("package", "PACK"),
    ("piece", "PIECE"),
    ("t", "TON"),
];

/// NAV unit of measure for a GOBL unit, `None` when it must be reported as own unit.
pub fn nav_unit(unit: &str) -> Option<&'static str> {
    UNITS
        .binary_search_by(|(k, _)| (*k).cmp(unit))
        .ok()
        .map(|i| UNITS[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted() {
        for w in UNITS.windows(2) {
            assert!(w[0].0 < w[1].0, "{} >= {}", w[0].0, w[1].0);
        }
    }

    #[test]
    fn known_units() {
        assert_eq!(nav_unit("piece"), Some("PIECE"));
        assert_eq!(nav_unit("kWh"), Some("KWH"));
        assert_eq!(nav_unit("m3"), Some("CUBIC_METER"));
        assert_eq!(nav_unit("package"), Some("PACK"));
    }

    #[test]
    fn unknown_units() {
        assert_eq!(nav_unit("box"), None);
        assert_eq!(nav_unit("KWH"), None);
        assert_eq!(nav_unit(""), None);
    }
}
