// Daily quota counting

#[cfg(test)]
mod quota_tests {
    use crate::search::quota::QuotaStore;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn missing_row_counts_as_zero() {
        let quota = QuotaStore::open_in_memory().unwrap();
        assert_eq!(quota.count_on("u1", day(1)).unwrap(), 0);
    }

    #[test]
    fn sequential_increments_have_no_gaps() {
        let quota = QuotaStore::open_in_memory().unwrap();
        for expected in 1..=5u32 {
            assert_eq!(quota.increment_on("u1", day(1)).unwrap(), expected);
        }
        assert_eq!(quota.count_on("u1", day(1)).unwrap(), 5);
    }

    #[test]
    fn counts_are_scoped_per_user() {
        let quota = QuotaStore::open_in_memory().unwrap();
        quota.increment_on("u1", day(1)).unwrap();
        quota.increment_on("u1", day(1)).unwrap();
        assert_eq!(quota.increment_on("u2", day(1)).unwrap(), 1);
        assert_eq!(quota.count_on("u1", day(1)).unwrap(), 2);
    }

    #[test]
    fn counts_reset_across_calendar_days() {
        let quota = QuotaStore::open_in_memory().unwrap();
        quota.increment_on("u1", day(1)).unwrap();
        quota.increment_on("u1", day(1)).unwrap();

        assert_eq!(quota.count_on("u1", day(2)).unwrap(), 0);
        assert_eq!(quota.increment_on("u1", day(2)).unwrap(), 1);
        // Yesterday's row is untouched
        assert_eq!(quota.count_on("u1", day(1)).unwrap(), 2);
    }

    #[test]
    fn count_today_defaults_to_zero() {
        let quota = QuotaStore::open_in_memory().unwrap();
        assert_eq!(quota.count_today("nobody").unwrap(), 0);
    }
}
