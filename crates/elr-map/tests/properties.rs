use chrono::{FixedOffset, TimeZone};
use elr_map::datetime::{OffsetUnit, add_offset};
use elr_map::livd::canonicalize_model_name;
use elr_map::mappers::HashMapper;
use proptest::prelude::*;

proptest! {
    #[test]
    fn hash_is_stable_lowercase_hex(input in ".{0,64}") {
        let first = HashMapper::digest(input.as_bytes());
        prop_assert_eq!(first.len(), 64);
        prop_assert!(first.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        prop_assert_eq!(first, HashMapper::digest(input.as_bytes()));
    }

    #[test]
    fn second_offsets_cancel_out(amount in -1_000_000i64..1_000_000) {
        let tz = FixedOffset::west_opt(6 * 3600).unwrap();
        let start = tz.with_ymd_and_hms(2021, 3, 2, 0, 0, 0).unwrap();
        let shifted = add_offset(start, OffsetUnit::Seconds, amount).unwrap();
        prop_assert_eq!(shifted.offset(), start.offset());
        prop_assert_eq!(add_offset(shifted, OffsetUnit::Seconds, -amount).unwrap(), start);
    }

    #[test]
    fn canonical_model_names_are_a_fixed_point(model in "[A-Za-z0-9 *+\\-/]{0,40}") {
        let once = canonicalize_model_name(&model);
        prop_assert_eq!(canonicalize_model_name(&once), once.clone());
        prop_assert!(once.chars().all(|c| c == ' ' || c.is_alphanumeric()));
    }
}
