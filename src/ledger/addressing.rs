/// Row 1 holds the column titles
pub const HEADER_ROWS: i64 = 1;

/// Column titles written when a ledger is (re)built
pub const HEADER: [&str; 4] = ["event number", "datetime", "photo", "video"];

/// 1-based row of the slot that holds `event_number` in a ledger of `capacity` data rows.
///
/// Numbers wrap around the capacity, so `slot_row(n, cap) == slot_row(n + cap, cap)`.
/// Zero and negative numbers wrap the same way rather than landing on the header,
/// all the way down to `i64::MIN`.
pub fn slot_row(event_number: i64, capacity: u32) -> i64 {
    let capacity = i128::from(capacity.max(1));
    // the remainder is below `capacity`, which fits in i64
    let offset = (i128::from(event_number) - 1).rem_euclid(capacity) as i64;
    offset + HEADER_ROWS + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_lands_below_the_header() {
        assert_eq!(slot_row(1, 1000), 2);
        assert_eq!(slot_row(1000, 1000), 1001);
        assert_eq!(slot_row(1001, 1000), 2);
    }

    #[test]
    fn wraps_around_capacity() {
        for cap in [1u32, 7, 1000] {
            for n in 1..3000i64 {
                assert_eq!(slot_row(n, cap), slot_row(n + i64::from(cap), cap));
                let row = slot_row(n, cap);
                assert!(row >= 2 && row <= i64::from(cap) + 1);
            }
        }
    }

    #[test]
    fn non_positive_numbers_wrap_into_data_rows() {
        assert_eq!(slot_row(0, 1000), 1001);
        assert_eq!(slot_row(-1, 1000), 1000);
        assert_eq!(slot_row(0, 1000), slot_row(1000, 1000));
    }

    #[test]
    fn extreme_numbers_stay_in_range() {
        for cap in [1u32, 7, 1000, u32::MAX] {
            for n in [i64::MIN, i64::MIN + 1, i64::MAX] {
                let row = slot_row(n, cap);
                assert!(row >= 2 && row <= i64::from(cap) + 1, "{n} in {cap}");
            }
        }
        // 2^63 = 9_223_372_036_854_775_808 is 808 mod 1000
        assert_eq!(slot_row(i64::MIN, 1000), slot_row(-808, 1000));
        assert_eq!(slot_row(i64::MAX, 1000), slot_row(807, 1000));
    }
}
