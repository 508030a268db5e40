//! Frequency catalog: times-of-day for each dosing frequency.
//!
//! This is a pure lookup table. `Frequency` is a closed enum validated at
//! the store boundary, so there are no error conditions here.

use crate::Frequency;
use chrono::NaiveTime;
use once_cell::sync::Lazy;

/// Cached time-of-day tables - built once and reused across all operations
static TIMES: Lazy<FrequencyTimes> = Lazy::new(FrequencyTimes::build);

struct FrequencyTimes {
    once_daily: [NaiveTime; 1],
    twice_daily: [NaiveTime; 2],
    three_times_daily: [NaiveTime; 3],
    four_times_daily: [NaiveTime; 4],
}

impl FrequencyTimes {
    fn build() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time-of-day");
        Self {
            once_daily: [t(9, 0)],
            twice_daily: [t(9, 0), t(21, 0)],
            three_times_daily: [t(9, 0), t(15, 0), t(21, 0)],
            four_times_daily: [t(9, 0), t(13, 0), t(17, 0), t(21, 0)],
        }
    }
}

/// Ordered times-of-day at which doses are expected for a frequency
///
/// AsNeeded returns an empty slice: no occurrences are generated and doses
/// are logged ad hoc.
pub fn times_for_frequency(frequency: Frequency) -> &'static [NaiveTime] {
    match frequency {
        Frequency::OnceDaily => &TIMES.once_daily,
        Frequency::TwiceDaily => &TIMES.twice_daily,
        Frequency::ThreeTimesDaily => &TIMES.three_times_daily,
        Frequency::FourTimesDaily => &TIMES.four_times_daily,
        Frequency::AsNeeded => &[],
    }
}

/// Number of doses per day for a frequency
pub fn doses_per_day(frequency: Frequency) -> usize {
    times_for_frequency(frequency).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dose_counts_per_frequency() {
        assert_eq!(doses_per_day(Frequency::OnceDaily), 1);
        assert_eq!(doses_per_day(Frequency::TwiceDaily), 2);
        assert_eq!(doses_per_day(Frequency::ThreeTimesDaily), 3);
        assert_eq!(doses_per_day(Frequency::FourTimesDaily), 4);
        assert_eq!(doses_per_day(Frequency::AsNeeded), 0);
    }

    #[test]
    fn test_times_are_strictly_ordered() {
        for freq in [
            Frequency::OnceDaily,
            Frequency::TwiceDaily,
            Frequency::ThreeTimesDaily,
            Frequency::FourTimesDaily,
        ] {
            let times = times_for_frequency(freq);
            assert!(times.windows(2).all(|w| w[0] < w[1]), "{:?}", freq);
        }
    }

    #[test]
    fn test_twice_daily_times() {
        let times = times_for_frequency(Frequency::TwiceDaily);
        assert_eq!(times[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(times[1], NaiveTime::from_hms_opt(21, 0, 0).unwrap());
    }

    #[test]
    fn test_lookup_is_stable() {
        let first = times_for_frequency(Frequency::ThreeTimesDaily);
        let second = times_for_frequency(Frequency::ThreeTimesDaily);
        assert_eq!(first, second);
    }
}
