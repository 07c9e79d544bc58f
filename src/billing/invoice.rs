//! Invoice number sequences.
//!
//! Numbers look like `INV-2026-0042` (every finalized bill) and
//! `GST-2026-0007` (GST bills, independent counter). The next number is
//! derived from the most recent persisted number of the current year, not
//! from an in-memory counter, so restarts and multiple processes stay
//! consistent as long as the caller serializes the read-then-insert.

pub const GENERIC_PREFIX: &str = "INV";
pub const GST_PREFIX: &str = "GST";

/// Format the next number in a sequence given the latest persisted one.
/// `last` is expected to already be scoped to `year`; `None` starts the
/// year at 0001.
pub fn next_number(prefix: &str, year: i32, last: Option<&str>) -> String {
    let next = last.and_then(parse_sequence).map_or(1, |n| n + 1);
    format!("{prefix}-{year}-{next:04}")
}

/// Trailing numeric suffix of an invoice number, if well-formed.
fn parse_sequence(value: &str) -> Option<u32> {
    value.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_of_a_year() {
        assert_eq!(next_number(GENERIC_PREFIX, 2026, None), "INV-2026-0001");
        assert_eq!(next_number(GST_PREFIX, 2026, None), "GST-2026-0001");
    }

    #[test]
    fn increments_the_suffix() {
        assert_eq!(
            next_number(GENERIC_PREFIX, 2026, Some("INV-2026-0001")),
            "INV-2026-0002"
        );
        assert_eq!(
            next_number(GST_PREFIX, 2026, Some("GST-2026-0041")),
            "GST-2026-0042"
        );
    }

    #[test]
    fn suffix_grows_past_four_digits() {
        assert_eq!(
            next_number(GENERIC_PREFIX, 2026, Some("INV-2026-9999")),
            "INV-2026-10000"
        );
    }

    #[test]
    fn year_rollover_restarts_at_one() {
        // The lookup is year-scoped, so January sees no prior number.
        assert_eq!(next_number(GENERIC_PREFIX, 2027, None), "INV-2027-0001");
    }

    #[test]
    fn malformed_last_number_restarts_the_sequence() {
        assert_eq!(
            next_number(GENERIC_PREFIX, 2026, Some("INV-2026-x")),
            "INV-2026-0001"
        );
    }

    #[test]
    fn sequences_are_strictly_increasing() {
        let mut last: Option<String> = None;
        let mut prev_seq = 0u32;
        for _ in 0..5 {
            let n = next_number(GENERIC_PREFIX, 2026, last.as_deref());
            let seq: u32 = n.rsplit('-').next().unwrap().parse().unwrap();
            assert!(seq > prev_seq);
            prev_seq = seq;
            last = Some(n);
        }
    }
}
