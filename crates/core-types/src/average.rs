use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every reported average carries.
pub const AVERAGE_SCALE: u32 = 2;

/// Rounds an average to two decimal places, half away from zero.
///
/// This is the same rule PostgreSQL applies in `ROUND(numeric, 2)`, so averages
/// computed in SQL and averages computed in memory compare equal. The result is
/// always rescaled to exactly two places (`85` becomes `85.00`) so both
/// backends also print identically.
pub fn round_average(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(AVERAGE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AVERAGE_SCALE);
    rounded
}

/// Computes the rounded arithmetic mean of a set of grades.
///
/// Returns `None` for an empty input, mirroring SQL's `AVG` over zero rows.
pub fn rounded_average<I>(grades: I) -> Option<Decimal>
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = grades
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), grade| (sum + i64::from(grade), count + 1));

    if count == 0 {
        return None;
    }

    Some(round_average(Decimal::from(sum) / Decimal::from(count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn midpoints_round_away_from_zero() {
        assert_eq!(round_average(dec!(75.125)), dec!(75.13));
        assert_eq!(round_average(dec!(2.675)), dec!(2.68));
        assert_eq!(round_average(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_average(dec!(79.1666666)), dec!(79.17));
    }

    #[test]
    fn whole_numbers_carry_two_places() {
        assert_eq!(round_average(dec!(85)).to_string(), "85.00");
        assert_eq!(round_average(dec!(81.5)).to_string(), "81.50");
    }

    #[test]
    fn mean_of_grades() {
        assert_eq!(rounded_average([90, 85, 70, 75]), Some(dec!(80.00)));
        assert_eq!(rounded_average([75, 75, 75, 75, 75, 75, 75, 76]), Some(dec!(75.13)));
        assert_eq!(rounded_average([1, 2, 2]), Some(dec!(1.67)));
    }

    #[test]
    fn empty_input_has_no_mean() {
        assert_eq!(rounded_average(Vec::<i32>::new()), None);
    }
}
